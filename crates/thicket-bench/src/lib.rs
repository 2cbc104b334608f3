//! Benchmark profiles and helpers for Thicket.
//!
//! - [`barrier_rounds`]: drive a barrier team through a fixed number of rounds
//! - [`century_profile`]: a hundred-year standard run

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thicket_core::{CalendarDate, GeneratorKind};
use thicket_engine::SimConfig;
use thicket_sync::{CyclicBarrier, WaitStrategy};

/// Run `team_size` threads through `rounds` barrier rounds and return the
/// wall-clock time from the first spawn to the last join.
///
/// # Panics
///
/// If `team_size` is zero or a thread cannot be spawned.
pub fn barrier_rounds(team_size: usize, rounds: u64, strategy: WaitStrategy) -> Duration {
    let barrier = Arc::new(
        CyclicBarrier::with_strategy(team_size, strategy).expect("team_size must be non-zero"),
    );
    let started = Instant::now();
    let handles: Vec<_> = (0..team_size)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            thread::Builder::new()
                .name(format!("bench-{i}"))
                .spawn(move || {
                    for _ in 0..rounds {
                        barrier.wait();
                    }
                })
                .expect("failed to spawn bench thread")
        })
        .collect();
    for h in handles {
        h.join().expect("bench thread panicked");
    }
    started.elapsed()
}

/// The standard scenario stretched to a hundred years (1200 cycles).
pub fn century_profile(seed: u64, generator: GeneratorKind) -> SimConfig {
    SimConfig {
        seed,
        generator,
        start: CalendarDate::new(2000, 0),
        end_year: 2100,
        ..SimConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn century_profile_spans_1200_cycles() {
        assert_eq!(
            century_profile(0, GeneratorKind::Legacy).expected_cycles(),
            1200
        );
    }

    #[test]
    fn barrier_rounds_completes() {
        barrier_rounds(3, 100, WaitStrategy::Backoff);
    }
}
