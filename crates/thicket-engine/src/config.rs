//! Simulation configuration and startup-time validation.

use std::error::Error;
use std::fmt;

use thicket_core::{CalendarDate, Field, GeneratorKind, RngPolicy, WorldState};
use thicket_sync::WaitStrategy;

// ── Populations ────────────────────────────────────────────────────

/// Starting biology of the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Populations {
    /// Grain height, inches.
    pub vegetation_height: f32,
    /// Deer count.
    pub herbivores: u32,
    /// Coyote count.
    pub predators: u32,
}

impl Default for Populations {
    fn default() -> Self {
        Self {
            vegetation_height: 18.0,
            herbivores: 6,
            predators: 3,
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected before a team starts.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Start month outside `0..12`.
    InvalidCalendar {
        /// The configured start date.
        start: CalendarDate,
    },
    /// Starting grain height is negative or non-finite.
    InvalidPopulations {
        /// Description of the bad value.
        reason: String,
    },
    /// No agents registered.
    EmptyTeam,
    /// More participants than a commit rank can distinguish.
    TeamTooLarge {
        /// Agents plus the observer.
        participants: usize,
        /// Largest supported team.
        max: usize,
    },
    /// Two agents share a name.
    DuplicateAgent {
        /// The repeated name.
        name: String,
    },
    /// A field has several writers and at least one claims exclusivity.
    ConflictingWriters {
        /// The contested field.
        field: Field,
        /// Name of the earlier writer.
        first_writer: String,
        /// Name of the later writer.
        second_writer: String,
    },
    /// An agent declared a field the observer owns.
    ObserverFieldContested {
        /// The contested field.
        field: Field,
        /// The agent that declared it.
        agent: String,
    },
    /// A participant declared a calendar field.
    ReservedField {
        /// The calendar field.
        field: Field,
        /// The declaring participant.
        writer: String,
    },
    /// A team thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCalendar { start } => {
                write!(f, "start month of {start} is outside 0..12")
            }
            Self::InvalidPopulations { reason } => write!(f, "invalid populations: {reason}"),
            Self::EmptyTeam => write!(f, "team has no agents"),
            Self::TeamTooLarge { participants, max } => {
                write!(f, "team of {participants} exceeds maximum of {max}")
            }
            Self::DuplicateAgent { name } => write!(f, "agent name '{name}' is used twice"),
            Self::ConflictingWriters {
                field,
                first_writer,
                second_writer,
            } => write!(
                f,
                "field {field} written by '{first_writer}' and '{second_writer}' \
                 without ordered commit"
            ),
            Self::ObserverFieldContested { field, agent } => {
                write!(f, "agent '{agent}' writes observer-owned field {field}")
            }
            Self::ReservedField { field, writer } => {
                write!(f, "'{writer}' declares calendar field {field}")
            }
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {}

// ── SimConfig ──────────────────────────────────────────────────────

/// Run parameters. `Default` gives the standard scenario: January 2020
/// through December 2025, seed 0.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Base seed for every random stream.
    pub seed: u64,
    /// Calendar date of the first cycle.
    pub start: CalendarDate,
    /// The run stops at the top of the first cycle whose year is at least
    /// this value.
    pub end_year: u32,
    /// Starting populations and grain height.
    pub initial: Populations,
    /// Random generator family.
    pub generator: GeneratorKind,
    /// Whether drawing agents own their streams or share one.
    pub rng_policy: RngPolicy,
    /// How barrier waiters spend their time.
    pub wait: WaitStrategy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            start: CalendarDate::new(2020, 0),
            end_year: 2026,
            initial: Populations::default(),
            generator: GeneratorKind::default(),
            rng_policy: RngPolicy::default(),
            wait: WaitStrategy::default(),
        }
    }
}

impl SimConfig {
    /// Check the configuration's own invariants. Team composition is
    /// checked separately by [`plan_writes`](crate::plan_writes).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.start.is_valid() {
            return Err(ConfigError::InvalidCalendar { start: self.start });
        }
        let height = self.initial.vegetation_height;
        if !height.is_finite() || height < 0.0 {
            return Err(ConfigError::InvalidPopulations {
                reason: format!("vegetation height must be finite and >= 0, got {height}"),
            });
        }
        Ok(())
    }

    /// Number of cycles a run will complete if nothing halts it.
    pub fn expected_cycles(&self) -> u64 {
        self.start.months_until_year(self.end_year)
    }

    /// The world before the observer primes it: calendar and biology set,
    /// weather zeroed.
    pub fn initial_state(&self) -> WorldState {
        WorldState {
            cycle: 0,
            year: self.start.year,
            month: self.start.month,
            precipitation: 0.0,
            temperature: 0.0,
            vegetation_height: self.initial.vegetation_height,
            herbivores: self.initial.herbivores,
            predators: self.initial.predators,
        }
    }
}
