//! Lock-based reusable cyclic barrier.
//!
//! # Protocol
//!
//! One mutex guards the arrival count. A caller that is not the last to
//! arrive records itself, drops the guard and spins until the last arriver
//! resets `arrived` to zero, then bumps `departed`. The last arriver resets
//! `departed` and `arrived` and keeps holding the guard until every other
//! participant has bumped `departed`.
//!
//! Holding the guard across the departure wait is what makes the barrier
//! reusable back to back: a fast participant re-entering [`wait`] for the
//! next round blocks on the guard until every straggler from the current
//! round has stopped looking at `arrived`.
//!
//! # Failure semantics
//!
//! There is no timeout and no cancellation. A participant that never calls
//! [`wait`] leaves the rest of the team blocked forever, and so does a
//! barrier sized differently from the number of threads using it. Tests
//! guard against this with a watchdog outside the barrier.
//!
//! [`wait`]: CyclicBarrier::wait

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crossbeam_utils::{Backoff, CachePadded};

/// How a blocked participant burns time while it waits.
///
/// Both strategies poll the same counters; only CPU usage differs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Pure busy-wait with [`std::hint::spin_loop`].
    Spin,
    /// Exponential spinning that escalates to [`std::thread::yield_now`].
    #[default]
    Backoff,
}

/// Errors from barrier construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BarrierError {
    /// A barrier needs at least one participant.
    EmptyTeam,
}

impl fmt::Display for BarrierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTeam => write!(f, "team size must be at least 1"),
        }
    }
}

impl Error for BarrierError {}

/// A reusable rendezvous for a fixed team of threads.
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use thicket_sync::CyclicBarrier;
///
/// let barrier = Arc::new(CyclicBarrier::new(3).unwrap());
/// let handles: Vec<_> = (0..3)
///     .map(|_| {
///         let barrier = Arc::clone(&barrier);
///         thread::spawn(move || {
///             for _ in 0..100 {
///                 barrier.wait();
///             }
///         })
///     })
///     .collect();
/// for h in handles {
///     h.join().unwrap();
/// }
/// assert_eq!(barrier.arrived(), 0);
/// ```
pub struct CyclicBarrier {
    team_size: usize,
    guard: Mutex<()>,
    arrived: CachePadded<AtomicUsize>,
    departed: CachePadded<AtomicUsize>,
    strategy: WaitStrategy,
}

// Compile-time assertion: CyclicBarrier must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<CyclicBarrier>();
};

impl CyclicBarrier {
    /// Create a barrier for `team_size` participants using
    /// [`WaitStrategy::Backoff`].
    ///
    /// # Errors
    ///
    /// [`BarrierError::EmptyTeam`] if `team_size` is zero.
    pub fn new(team_size: usize) -> Result<Self, BarrierError> {
        Self::with_strategy(team_size, WaitStrategy::default())
    }

    /// Create a barrier with an explicit wait strategy.
    pub fn with_strategy(team_size: usize, strategy: WaitStrategy) -> Result<Self, BarrierError> {
        if team_size == 0 {
            return Err(BarrierError::EmptyTeam);
        }
        Ok(Self {
            team_size,
            guard: Mutex::new(()),
            arrived: CachePadded::new(AtomicUsize::new(0)),
            departed: CachePadded::new(AtomicUsize::new(0)),
            strategy,
        })
    }

    /// Number of participants this barrier waits for.
    pub fn team_size(&self) -> usize {
        self.team_size
    }

    /// The wait strategy in use.
    pub fn strategy(&self) -> WaitStrategy {
        self.strategy
    }

    /// Participants currently recorded as arrived. Diagnostic only.
    pub fn arrived(&self) -> usize {
        self.arrived.load(Ordering::Acquire)
    }

    /// Participants that have left the most recent round. Diagnostic only.
    ///
    /// Between rounds this equals `team_size - 1`.
    pub fn departed(&self) -> usize {
        self.departed.load(Ordering::Acquire)
    }

    /// Block until all `team_size` participants have called `wait` in this
    /// round, then return to all of them.
    pub fn wait(&self) {
        // The guard protects no data, so a poisoned lock is still usable.
        let guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let arrived = self.arrived.load(Ordering::Relaxed) + 1;

        if arrived == self.team_size {
            self.departed.store(0, Ordering::Relaxed);
            self.arrived.store(0, Ordering::Release);
            let others = self.team_size - 1;
            self.spin_until(|| self.departed.load(Ordering::Acquire) == others);
            drop(guard);
            return;
        }

        self.arrived.store(arrived, Ordering::Release);
        drop(guard);
        self.spin_until(|| self.arrived.load(Ordering::Acquire) == 0);
        self.departed.fetch_add(1, Ordering::AcqRel);
    }

    fn spin_until(&self, mut done: impl FnMut() -> bool) {
        match self.strategy {
            WaitStrategy::Spin => {
                while !done() {
                    std::hint::spin_loop();
                }
            }
            WaitStrategy::Backoff => {
                let backoff = Backoff::new();
                while !done() {
                    backoff.snooze();
                }
            }
        }
    }
}

impl fmt::Debug for CyclicBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CyclicBarrier")
            .field("team_size", &self.team_size)
            .field("arrived", &self.arrived())
            .field("departed", &self.departed())
            .field("strategy", &self.strategy)
            .finish()
    }
}
