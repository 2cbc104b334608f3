//! Per-thread loops for agents and the observer.
//!
//! Every participant runs the same three barrier rounds per cycle and
//! evaluates the stop condition on a snapshot taken at the top of
//! Computing. Shared fields, the halt flag and the cycle counter change
//! only inside the commit and observe windows, so every participant
//! reaches the same stop decision in the same cycle.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use thicket_core::{AgentError, Field, Proposal, SharedWorld, WorldState};
use thicket_sync::CyclicBarrier;
use tracing::{debug, error, trace};

use crate::agent::{Agent, Observer};
use crate::metrics::AgentMetrics;
use crate::ownership::WriteGrant;
use crate::sink::{MonthReport, ObservationSink};

/// First error reported by any participant.
#[derive(Debug)]
pub(crate) struct Failure {
    pub participant: String,
    pub cycle: u64,
    pub error: AgentError,
}

/// State shared by every thread of one run.
pub(crate) struct Team {
    pub world: SharedWorld,
    pub barrier: CyclicBarrier,
    end_year: u32,
    failure: Mutex<Option<Failure>>,
}

impl Team {
    pub fn new(world: SharedWorld, barrier: CyclicBarrier, end_year: u32) -> Self {
        Self {
            world,
            barrier,
            end_year,
            failure: Mutex::new(None),
        }
    }

    fn should_stop(&self, snapshot: &WorldState) -> bool {
        self.world.is_halted() || snapshot.year >= self.end_year
    }

    /// Record `error` and halt the team. Only the first failure is kept.
    ///
    /// Must be called inside the commit or observe window.
    fn fail(&self, participant: &str, cycle: u64, error: AgentError) {
        error!(participant, cycle, %error, "participant failed; halting team");
        self.world.halt();
        let mut slot = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(Failure {
                participant: participant.to_string(),
                cycle,
                error,
            });
        }
    }

    pub fn take_failure(&self) -> Option<Failure> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

fn panicked(what: &str) -> AgentError {
    AgentError::ExecutionFailed {
        reason: format!("{what} panicked"),
    }
}

// ── Agent loop ─────────────────────────────────────────────────────

pub(crate) fn run_agent(team: &Team, mut agent: Box<dyn Agent>, grant: WriteGrant) -> AgentMetrics {
    let mut metrics = AgentMetrics::new(agent.name());
    debug!(agent = agent.name(), "agent started");

    loop {
        let snapshot = team.world.snapshot();
        if team.should_stop(&snapshot) {
            break;
        }

        // Computing: private work on the snapshot only.
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| agent.compute(&snapshot)))
            .unwrap_or_else(|_| Err(panicked("compute")));
        metrics.compute_time += started.elapsed();
        metrics.cycles += 1;
        team.barrier.wait();

        // Committing
        let committed = outcome.and_then(|proposal| {
            grant
                .commit(&team.world, &proposal)
                .map(|written| (proposal.len(), written))
        });
        match committed {
            Ok((proposed, written)) => {
                metrics.values_written += written as u64;
                metrics.values_outranked += (proposed - written) as u64;
            }
            Err(error) => team.fail(agent.name(), snapshot.cycle, error),
        }
        team.barrier.wait();

        // Observing happens on the observer's thread.
        team.barrier.wait();
    }

    debug!(agent = agent.name(), cycles = metrics.cycles, "agent stopped");
    metrics
}

// ── Observer loop ──────────────────────────────────────────────────

pub(crate) fn run_observer(
    team: &Team,
    mut observer: Box<dyn Observer>,
    grant: WriteGrant,
    mut sink: Box<dyn ObservationSink>,
) {
    debug!(observer = observer.name(), "observer started");

    loop {
        let snapshot = team.world.snapshot();
        if team.should_stop(&snapshot) {
            break;
        }
        team.barrier.wait();
        team.barrier.wait();

        // Observing: agents are parked at the next barrier.
        if !team.world.is_halted() {
            let cycle = snapshot.cycle;
            match observe(team, observer.as_mut(), &grant, sink.as_mut(), cycle) {
                Ok(()) => {
                    team.world.advance_cycle();
                    trace!(cycle, "cycle complete");
                }
                Err(error) => team.fail(observer.name(), cycle, error),
            }
        }
        team.barrier.wait();
    }

    debug!(observer = observer.name(), "observer stopped");
}

fn observe(
    team: &Team,
    observer: &mut dyn Observer,
    grant: &WriteGrant,
    sink: &mut dyn ObservationSink,
    cycle: u64,
) -> Result<(), AgentError> {
    let committed = team.world.snapshot();
    let report = MonthReport {
        cycle,
        state: committed,
    };
    panic::catch_unwind(AssertUnwindSafe(|| sink.emit(&report)))
        .map_err(|_| panicked("observation sink"))?;

    let next = committed.date().next();
    let proposal: Proposal =
        panic::catch_unwind(AssertUnwindSafe(|| observer.advance(&committed, next)))
            .unwrap_or_else(|_| Err(panicked("observer")))?;
    let proposal = proposal
        .with(Field::Year, next.year)
        .with(Field::Month, next.month);
    grant.commit(&team.world, &proposal)?;
    Ok(())
}
