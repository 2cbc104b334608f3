//! Synchronization primitives for Thicket's lockstep agent teams.
//!
//! The only primitive is [`CyclicBarrier`]: a fixed-size rendezvous that
//! every participant calls three times per simulated month and that rearms
//! itself without allocation or generation tokens.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod barrier;

pub use barrier::{BarrierError, CyclicBarrier, WaitStrategy};
