//! Coyotes: spring predation, a birth pulse, a population cap and an
//! extinction reset.

use std::ops::RangeInclusive;

use smallvec::smallvec;
use thicket_core::{AgentError, Field, Proposal, RandomSource, WorldState};
use thicket_engine::{Agent, CommitMode, WriteDecls};
use tracing::debug;

/// Constants of the coyote rule.
#[derive(Clone, Debug, PartialEq)]
pub struct PredatorParams {
    /// Months in which coyotes hunt fawns.
    pub hunting_months: RangeInclusive<u32>,
    /// A hunt succeeds when a draw from `0..=100` falls below this.
    pub kill_threshold: i32,
    /// Month of the birth pulse.
    pub birth_month: u32,
    /// Litter draw range; the draw is halved to give the pups added.
    pub litter: RangeInclusive<i32>,
    /// Above this the population halves.
    pub cap: u32,
    /// Population restored when the herd is gone.
    pub reset_population: u32,
}

impl Default for PredatorParams {
    fn default() -> Self {
        Self {
            hunting_months: 3..=7,
            kill_threshold: 50,
            birth_month: 3,
            litter: 5..=7,
            cap: 10,
            reset_population: 3,
        }
    }
}

/// Result of one predator cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PredatorStep {
    /// Herd size after any kill.
    pub herbivores: u32,
    /// Next coyote count.
    pub predators: u32,
    /// Whether a fawn was taken.
    pub kill: bool,
}

/// Writes [`Field::PredatorPopulation`] and, when it takes a fawn,
/// [`Field::HerbivorePopulation`]. Register it after the herbivore agent
/// so a kill overrides the herd's own update.
pub struct Predator {
    params: PredatorParams,
    rng: Box<dyn RandomSource>,
    last_seen_herbivores: u32,
}

impl Predator {
    /// Create the agent with its own random stream.
    pub fn new(params: PredatorParams, rng: Box<dyn RandomSource>) -> Self {
        Self {
            params,
            rng,
            last_seen_herbivores: 0,
        }
    }

    /// Herd size remembered from the previous cycle.
    pub fn last_seen_herbivores(&self) -> u32 {
        self.last_seen_herbivores
    }

    /// Apply the rule to `state`, drawing from the random stream.
    ///
    /// The hunt is attempted only in hunting months when the herd has
    /// grown since the last cycle, which stands in for fawns being born.
    /// The hunt draw always precedes the litter draw.
    pub fn step(&mut self, state: &WorldState) -> PredatorStep {
        let p = &self.params;
        let mut herbivores = state.herbivores;
        let mut predators = state.predators;
        let mut kill = false;

        if p.hunting_months.contains(&state.month)
            && herbivores > 0
            && self.last_seen_herbivores < herbivores
        {
            let attack = self.rng.next_int(0, 100);
            if attack < p.kill_threshold {
                herbivores -= 1;
                kill = true;
                debug!(
                    year = state.year,
                    month = state.month,
                    herbivores,
                    "coyote takes a fawn"
                );
            }
        }
        self.last_seen_herbivores = herbivores;

        if state.month == p.birth_month {
            let drawn = self.rng.next_int(*p.litter.start(), *p.litter.end());
            let pups = u32::try_from(drawn / 2).unwrap_or(0);
            predators = predators.saturating_add(pups);
        }
        if predators > p.cap {
            predators /= 2;
        }
        if herbivores == 0 {
            predators = p.reset_population;
        }

        PredatorStep {
            herbivores,
            predators,
            kill,
        }
    }
}

impl Agent for Predator {
    fn name(&self) -> &str {
        "predator"
    }

    fn writes(&self) -> WriteDecls {
        smallvec![
            (Field::PredatorPopulation, CommitMode::Exclusive),
            (Field::HerbivorePopulation, CommitMode::Ordered),
        ]
    }

    fn compute(&mut self, snapshot: &WorldState) -> Result<Proposal, AgentError> {
        let step = self.step(snapshot);
        let mut proposal = Proposal::new().with(Field::PredatorPopulation, step.predators);
        if step.kill {
            proposal.set(Field::HerbivorePopulation, step.herbivores);
        }
        Ok(proposal)
    }
}

impl std::fmt::Debug for Predator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predator")
            .field("params", &self.params)
            .field("last_seen_herbivores", &self.last_seen_herbivores)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thicket_core::LegacyRand;
    use thicket_test_utils::standard_state;

    /// Returns the same float forever.
    struct Fixed(f32);

    impl RandomSource for Fixed {
        fn next_float(&mut self, low: f32, high: f32) -> f32 {
            low + self.0 * (high - low)
        }
    }

    fn predator(unit: f32) -> Predator {
        Predator::new(PredatorParams::default(), Box::new(Fixed(unit)))
    }

    #[test]
    fn cap_halves_eleven_to_five() {
        let mut p = predator(0.0);
        let state = WorldState {
            month: 9,
            predators: 11,
            herbivores: 4,
            ..standard_state()
        };
        let step = p.step(&state);
        assert_eq!(step.predators, 5);
        assert!(!step.kill);
    }

    #[test]
    fn extinct_herd_resets_predators() {
        let mut p = predator(0.0);
        let state = WorldState {
            month: 1,
            predators: 8,
            herbivores: 0,
            ..standard_state()
        };
        assert_eq!(p.step(&state).predators, 3);
    }

    #[test]
    fn killing_the_last_fawn_resets_predators() {
        let mut p = predator(0.0);
        let state = WorldState {
            month: 5,
            predators: 9,
            herbivores: 1,
            ..standard_state()
        };
        let step = p.step(&state);
        assert!(step.kill);
        assert_eq!(step.herbivores, 0);
        assert_eq!(step.predators, 3);
    }

    #[test]
    fn no_hunt_outside_season() {
        let mut p = predator(0.0);
        let state = WorldState {
            month: 8,
            herbivores: 10,
            ..standard_state()
        };
        assert!(!p.step(&state).kill);
        assert_eq!(p.last_seen_herbivores(), 10);
    }

    #[test]
    fn no_hunt_without_births() {
        let mut p = predator(0.0);
        let state = WorldState {
            month: 5,
            herbivores: 10,
            ..standard_state()
        };
        assert!(p.step(&state).kill);
        assert_eq!(p.last_seen_herbivores(), 9);
        // Herd of 9 is not larger than the 9 remembered.
        let state = WorldState {
            herbivores: 9,
            ..state
        };
        assert!(!p.step(&state).kill);
    }

    #[test]
    fn failed_hunt_keeps_herd() {
        let mut p = predator(0.9);
        let state = WorldState {
            month: 4,
            herbivores: 10,
            ..standard_state()
        };
        let step = p.step(&state);
        assert!(!step.kill);
        assert_eq!(step.herbivores, 10);
    }

    #[test]
    fn birth_pulse_adds_half_the_litter_draw() {
        // unit 0.5 draws 0 + 0.5 * 100.9999 -> 50 for the hunt (no kill)
        // and 5 + 0.5 * 2.9999 -> 6 for the litter.
        let mut p = predator(0.5);
        let state = WorldState {
            month: 3,
            herbivores: 10,
            predators: 3,
            ..standard_state()
        };
        let step = p.step(&state);
        assert!(!step.kill);
        assert_eq!(step.predators, 6);
    }

    #[test]
    fn proposal_includes_herd_only_on_kill() {
        let mut p = predator(0.0);
        let hunting = WorldState {
            month: 6,
            herbivores: 10,
            ..standard_state()
        };
        let proposal = p.compute(&hunting).unwrap();
        assert_eq!(
            proposal.get(Field::HerbivorePopulation),
            Some(thicket_core::FieldValue::Count(9))
        );

        let winter = WorldState {
            month: 0,
            ..hunting
        };
        let proposal = p.compute(&winter).unwrap();
        assert_eq!(proposal.get(Field::HerbivorePopulation), None);
        assert_eq!(
            proposal.get(Field::PredatorPopulation),
            Some(thicket_core::FieldValue::Count(3))
        );
    }

    #[test]
    fn legacy_stream_gives_repeatable_steps() {
        let state = WorldState {
            month: 3,
            herbivores: 10,
            ..standard_state()
        };
        let mut a = Predator::new(PredatorParams::default(), Box::new(LegacyRand::new(7)));
        let mut b = Predator::new(PredatorParams::default(), Box::new(LegacyRand::new(7)));
        assert_eq!(a.step(&state), b.step(&state));
    }
}
