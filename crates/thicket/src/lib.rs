//! Thicket: a lockstep ecosystem simulation.
//!
//! Grain, deer, coyotes and weather advance one month per cycle, each on
//! its own thread, meeting at a reusable cyclic barrier three times a
//! month. This is the facade crate; it re-exports the sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use thicket::prelude::*;
//!
//! let config = SimConfig {
//!     seed: 7,
//!     end_year: 2021,
//!     ..SimConfig::default()
//! };
//! let report = standard_simulation(config).with_sink(NullSink).run().unwrap();
//! assert_eq!(report.cycles, 12);
//! assert_eq!(report.final_state.date(), CalendarDate::new(2021, 0));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `thicket-core` | fields, world state, commit cells, random sources, errors |
//! | [`sync`] | `thicket-sync` | the cyclic barrier |
//! | [`engine`] | `thicket-engine` | agent traits, ownership planning, the lockstep run |
//! | [`agents`] | `thicket-agents` | vegetation, herbivore, predator and clock rules |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`thicket-core`).
pub use thicket_core as types;

/// The reusable cyclic barrier (`thicket-sync`).
pub use thicket_sync as sync;

/// Lockstep engine (`thicket-engine`).
///
/// [`engine::Simulation`] runs a team; [`engine::plan_writes`] checks who
/// may write which field.
pub use thicket_engine as engine;

/// The ecosystem rules (`thicket-agents`).
pub use thicket_agents as agents;

/// Common imports for building and running a simulation.
pub mod prelude {
    // Core
    pub use thicket_core::{
        AgentError, CalendarDate, Field, FieldSet, FieldValue, GeneratorKind, Proposal,
        RandomSource, RngPolicy, WorldState,
    };

    // Barrier
    pub use thicket_sync::WaitStrategy;

    // Engine
    pub use thicket_engine::{
        Agent, CommitMode, MonthReport, NullSink, ObservationSink, Observer, Populations,
        RunError, RunReport, SimConfig, Simulation, TracingSink, WriteDecls,
    };

    // Agents
    pub use thicket_agents::standard_simulation;
}
