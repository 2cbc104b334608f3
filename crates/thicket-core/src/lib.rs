//! Core types for the Thicket lockstep ecosystem simulation.
//!
//! This is the leaf crate of the workspace. It defines the shared world
//! fields, the copyable [`WorldState`] snapshot agents compute from, the
//! [`SharedWorld`] commit cells they publish into, the [`RandomSource`]
//! capability, calendar arithmetic, unit conversions and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod calendar;
pub mod error;
pub mod field;
pub mod proposal;
pub mod random;
pub mod units;
pub mod world;

pub use calendar::{CalendarDate, MONTHS_PER_YEAR};
pub use error::AgentError;
pub use field::{Field, FieldSet, FieldValue, ValueKind};
pub use proposal::Proposal;
pub use random::{
    ChaChaRand, GeneratorKind, LegacyRand, RandomSource, RandomStreams, RngPolicy, SharedRandom,
};
pub use world::{SharedWorld, WorldState, MAX_RANK};
