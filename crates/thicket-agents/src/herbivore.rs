//! Deer carrying capacity.

use smallvec::smallvec;
use thicket_core::{AgentError, Field, Proposal, WorldState};
use thicket_engine::{Agent, CommitMode, WriteDecls};

/// One deer leaves when the herd outnumbers the inches of grain, otherwise
/// one arrives.
pub fn next_herbivores(state: &WorldState) -> u32 {
    if state.herbivores as f32 > state.vegetation_height {
        state.herbivores.saturating_sub(1)
    } else {
        state.herbivores.saturating_add(1)
    }
}

/// Writes [`Field::HerbivorePopulation`] every cycle, ordered so that a
/// later-registered predator can override it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Herbivore;

impl Herbivore {
    /// Create the agent.
    pub fn new() -> Self {
        Self
    }
}

impl Agent for Herbivore {
    fn name(&self) -> &str {
        "herbivore"
    }

    fn writes(&self) -> WriteDecls {
        smallvec![(Field::HerbivorePopulation, CommitMode::Ordered)]
    }

    fn compute(&mut self, snapshot: &WorldState) -> Result<Proposal, AgentError> {
        Ok(Proposal::new().with(Field::HerbivorePopulation, next_herbivores(snapshot)))
    }
}
