//! Lockstep engine for Thicket simulations.
//!
//! A [`Simulation`] runs one OS thread per [`Agent`] plus one for the
//! [`Observer`], all sharing a single [`CyclicBarrier`](thicket_sync::CyclicBarrier).
//! Every simulated month is three barrier rounds:
//!
//! 1. **Computing**: each agent copies a [`WorldState`](thicket_core::WorldState)
//!    snapshot and returns a [`Proposal`](thicket_core::Proposal). Nothing
//!    is written.
//! 2. **Committing**: each agent publishes its proposal into the
//!    [`SharedWorld`](thicket_core::SharedWorld) under its write grant.
//! 3. **Observing**: the observer emits a [`MonthReport`], advances the
//!    calendar and commits the fields it owns. Agents pass straight through.
//!
//! Write ownership is checked once, before any thread starts, by
//! [`plan_writes`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod agent;
pub mod config;
pub mod metrics;
pub mod ownership;
pub mod simulation;
pub mod sink;
mod team;

pub use agent::{Agent, CommitMode, Observer, WriteDecls};
pub use config::{ConfigError, Populations, SimConfig};
pub use metrics::{AgentMetrics, RunReport};
pub use ownership::{plan_writes, WriteGrant, WritePlan};
pub use simulation::{RunError, Simulation};
pub use sink::{ChannelSink, MonthReport, NullSink, ObservationSink, TracingSink};
