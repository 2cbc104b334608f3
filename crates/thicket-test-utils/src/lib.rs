//! Test utilities for Thicket development.
//!
//! - [`run_with_deadline`] turns a lockstep deadlock into a test failure.
//!   The barrier itself never times out; only tests watch the clock.
//! - [`fixtures`] holds scripted agents and observers.
//! - [`collecting_sink`] pairs a [`ChannelSink`] with its receiver.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{ConstAgent, EchoAgent, FailingAgent, PanickingAgent, StaticObserver};

use std::panic;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use thicket_core::WorldState;
use thicket_engine::{ChannelSink, MonthReport};

/// Run `f` on a fresh thread and return its result, panicking if it has
/// not finished within `deadline`.
///
/// A panic inside `f` is re-raised on the calling thread. On timeout the
/// worker thread is left running; the test process reaps it on exit.
pub fn run_with_deadline<T, F>(deadline: Duration, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    let handle = thread::Builder::new()
        .name("thicket-watchdog-subject".into())
        .spawn(move || {
            let _ = tx.send(f());
        })
        .expect("failed to spawn watchdog subject");

    match rx.recv_timeout(deadline) {
        Ok(value) => {
            let _ = handle.join();
            value
        }
        Err(RecvTimeoutError::Disconnected) => match handle.join() {
            Err(payload) => panic::resume_unwind(payload),
            Ok(()) => panic!("watchdog subject exited without a result"),
        },
        Err(RecvTimeoutError::Timeout) => {
            panic!("deadlock: did not finish within {deadline:?}")
        }
    }
}

/// A sink that forwards every report to the returned receiver.
pub fn collecting_sink() -> (ChannelSink, Receiver<MonthReport>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ChannelSink::new(tx), rx)
}

/// January 2020 with six deer, three coyotes and 18 in of grain. Weather
/// is zeroed.
pub fn standard_state() -> WorldState {
    WorldState {
        cycle: 0,
        year: 2020,
        month: 0,
        precipitation: 0.0,
        temperature: 0.0,
        vegetation_height: 18.0,
        herbivores: 6,
        predators: 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_returns_value() {
        assert_eq!(run_with_deadline(Duration::from_secs(5), || 7), 7);
    }

    #[test]
    #[should_panic(expected = "deadlock")]
    fn deadline_expires_on_hang() {
        run_with_deadline(Duration::from_millis(50), || {
            thread::sleep(Duration::from_secs(5));
        });
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn subject_panic_propagates() {
        run_with_deadline::<(), _>(Duration::from_secs(5), || panic!("boom"));
    }
}
