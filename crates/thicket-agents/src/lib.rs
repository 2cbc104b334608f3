//! The grain/deer/coyote ecosystem agents.
//!
//! | Participant | Role | Writes |
//! |-------------|------|--------|
//! | [`Herbivore`] | agent | herbivore population (ordered) |
//! | [`Vegetation`] | agent | grain height |
//! | [`Predator`] | agent | predator population, herbivore population on a kill (ordered) |
//! | [`Clock`] | observer | temperature, precipitation |
//!
//! [`standard_simulation`] wires them into a four-thread team.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod herbivore;
pub mod predator;
pub mod vegetation;

pub use clock::{seasonal_weather, Clock, Weather, WeatherParams};
pub use herbivore::{next_herbivores, Herbivore};
pub use predator::{Predator, PredatorParams, PredatorStep};
pub use vegetation::{growth_factor, next_height, GrowthParams, Vegetation};

use thicket_core::RandomStreams;
use thicket_engine::{SimConfig, Simulation};

/// Random stream index of the [`Clock`].
pub const CLOCK_STREAM: u64 = 0;
/// Random stream index of the [`Predator`].
pub const PREDATOR_STREAM: u64 = 1;

/// The standard team for `config`, with default rule parameters.
///
/// Registration order is herbivore, vegetation, predator, so a fawn taken
/// by the predator overrides the herd's own update in the same cycle.
///
/// ```
/// use thicket_agents::standard_simulation;
/// use thicket_engine::{NullSink, SimConfig};
///
/// let config = SimConfig { end_year: 2021, ..SimConfig::default() };
/// let report = standard_simulation(config).with_sink(NullSink).run().unwrap();
/// assert_eq!(report.cycles, 12);
/// ```
pub fn standard_simulation(config: SimConfig) -> Simulation {
    let streams = RandomStreams::new(config.generator, config.rng_policy, config.seed);
    let clock = Clock::new(WeatherParams::default(), streams.stream(CLOCK_STREAM));
    let predator = Predator::new(PredatorParams::default(), streams.stream(PREDATOR_STREAM));
    Simulation::new(config, clock)
        .with_agent(Herbivore::new())
        .with_agent(Vegetation::new(GrowthParams::default()))
        .with_agent(predator)
}
