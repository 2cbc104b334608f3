//! The [`Agent`] and [`Observer`] traits.

use smallvec::SmallVec;
use thicket_core::{AgentError, CalendarDate, Field, FieldSet, Proposal, WorldState};

/// How an agent shares a field it writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitMode {
    /// The agent must be the field's only writer.
    Exclusive,
    /// Several agents may write the field. When more than one commits in
    /// the same cycle, the one registered last wins.
    Ordered,
}

/// Write declarations returned by [`Agent::writes`].
pub type WriteDecls = SmallVec<[(Field, CommitMode); 4]>;

/// One member of the lockstep team.
///
/// # Contract
///
/// - `compute()` sees a private copy of the world taken at the top of the
///   cycle and must not reach shared state any other way.
/// - Every field in the returned [`Proposal`] must appear in `writes()`.
/// - `writes()` is called once, before the team starts.
///
/// Agents own their private state (`&mut self`), such as a random stream
/// or a memory of the previous cycle.
///
/// ```
/// use thicket_core::{AgentError, Field, Proposal, WorldState};
/// use thicket_engine::{Agent, CommitMode, WriteDecls};
///
/// struct Shrinker;
///
/// impl Agent for Shrinker {
///     fn name(&self) -> &str { "shrinker" }
///
///     fn writes(&self) -> WriteDecls {
///         [(Field::VegetationHeight, CommitMode::Exclusive)].into_iter().collect()
///     }
///
///     fn compute(&mut self, snapshot: &WorldState) -> Result<Proposal, AgentError> {
///         Ok(Proposal::new().with(Field::VegetationHeight, snapshot.vegetation_height * 0.5))
///     }
/// }
///
/// assert_eq!(Shrinker.writes().len(), 1);
/// ```
pub trait Agent: Send + 'static {
    /// Name used in logs, metrics and errors. Unique within a team.
    fn name(&self) -> &str;

    /// Fields this agent may commit, with their sharing mode.
    fn writes(&self) -> WriteDecls;

    /// Compute this cycle's candidate values from `snapshot`.
    fn compute(&mut self, snapshot: &WorldState) -> Result<Proposal, AgentError>;
}

/// The single team member that runs the Observing phase.
///
/// The engine emits the month report and advances the calendar on the
/// observer's thread; the observer then proposes values for the fields it
/// owns (typically weather) for the new month. Those fields are written
/// while every agent is parked at the third barrier, so agents see them
/// from the next cycle on.
pub trait Observer: Send + 'static {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Fields this observer writes. No agent may write them, and the
    /// calendar fields are reserved to the engine.
    fn writes(&self) -> FieldSet;

    /// Fill in the observer's fields for the starting month before any
    /// thread runs.
    fn prime(&mut self, initial: &mut WorldState) -> Result<(), AgentError> {
        let _ = initial;
        Ok(())
    }

    /// Propose values for the month after `committed`.
    ///
    /// `committed` is the world as the just-finished commit window left
    /// it; `next` is the date the calendar is moving to.
    fn advance(&mut self, committed: &WorldState, next: CalendarDate)
        -> Result<Proposal, AgentError>;
}
