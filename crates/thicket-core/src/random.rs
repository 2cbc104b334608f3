//! Seeded random sources and per-agent stream allocation.
//!
//! [`RandomSource`] is the only randomness capability agents receive.
//! Two generators implement it:
//!
//! - [`LegacyRand`]: the three-round linear congruential generator of the
//!   reference runs. Given the same seed it reproduces their draws bit for
//!   bit.
//! - [`ChaChaRand`]: a seeded `ChaCha8Rng`, for runs that do not need to
//!   match old output.
//!
//! A source is owned by exactly one agent. Sharing one stream between
//! agents goes through [`SharedRandom`], which serializes draws behind a
//! mutex. [`RandomStreams`] hands out sources according to an
//! [`RngPolicy`].

use std::sync::{Arc, Mutex, PoisonError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Largest raw draw of [`LegacyRand`], `2^31 - 1`.
pub const RAND_MAX: u32 = 2_147_483_647;

/// A deterministic pseudo-random draw capability.
///
/// # Contract
///
/// - `next_float(low, high)` returns a value in `[low, high)`,
///   deterministic given the current state, and advances the state.
///   [`LegacyRand`] is the exception: it divides by [`RAND_MAX`] and f32
///   rounding can land on `high`, so it returns `[low, high]`.
/// - `next_int(low, high)` returns an integer in the closed range
///   `[low, high]`, obtained by scaling a float draw just short of
///   `high + 1` and truncating.
/// - Ranges are not validated. An inverted or negative range yields
///   whatever the arithmetic produces.
pub trait RandomSource: Send {
    /// Draw a float in `[low, high)`.
    fn next_float(&mut self, low: f32, high: f32) -> f32;

    /// Draw an integer in `[low, high]`.
    fn next_int(&mut self, low: i32, high: i32) -> i32 {
        let high = high as f32 + 0.9999;
        self.next_float(low as f32, high) as i32
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_float(&mut self, low: f32, high: f32) -> f32 {
        (**self).next_float(low, high)
    }

    fn next_int(&mut self, low: i32, high: i32) -> i32 {
        (**self).next_int(low, high)
    }
}

// ── LegacyRand ─────────────────────────────────────────────────────

/// Three-round LCG producing 31-bit draws (11 + 10 + 10 bits).
///
/// Each draw advances the 32-bit state three times with the classic
/// `1103515245 * x + 12345` recurrence. Float draws divide by
/// [`RAND_MAX`], so the top of the range is reachable with probability
/// `2^-31`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyRand {
    state: u32,
}

impl LegacyRand {
    /// Create a generator from a 32-bit seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Current seed state.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Next raw draw in `[0, RAND_MAX]`.
    pub fn next_raw(&mut self) -> u32 {
        let mut next = self.state;
        next = next.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let mut result = (next / 65_536) % 2_048;
        next = next.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        result <<= 10;
        result ^= (next / 65_536) % 1_024;
        next = next.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        result <<= 10;
        result ^= (next / 65_536) % 1_024;
        self.state = next;
        result
    }
}

impl RandomSource for LegacyRand {
    fn next_float(&mut self, low: f32, high: f32) -> f32 {
        let r = self.next_raw() as f32;
        low + r * (high - low) / RAND_MAX as f32
    }
}

// ── ChaChaRand ─────────────────────────────────────────────────────

/// `ChaCha8Rng`-backed source.
#[derive(Clone, Debug)]
pub struct ChaChaRand {
    rng: ChaCha8Rng,
}

impl ChaChaRand {
    /// Create a source seeded from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for ChaChaRand {
    fn next_float(&mut self, low: f32, high: f32) -> f32 {
        let unit: f32 = self.rng.random();
        let v = low + unit * (high - low);
        if low < high && v >= high {
            high.next_down()
        } else {
            v
        }
    }

    fn next_int(&mut self, low: i32, high: i32) -> i32 {
        let unit: f32 = self.rng.random();
        let span = (high as f32 + 1.0) - low as f32;
        let v = (low as f32 + unit * span) as i32;
        if low <= high {
            v.min(high)
        } else {
            v
        }
    }
}

// ── SharedRandom ───────────────────────────────────────────────────

/// One random stream shared by several owners, draws serialized by a mutex.
///
/// Clones share the same underlying stream. The order in which owners
/// draw decides who gets which value, so sharing is deterministic only
/// when the owners' draws are themselves ordered (e.g. by barrier phases).
#[derive(Clone)]
pub struct SharedRandom {
    inner: Arc<Mutex<Box<dyn RandomSource>>>,
}

impl SharedRandom {
    /// Wrap `source` for shared use.
    pub fn new(source: Box<dyn RandomSource>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }
}

impl RandomSource for SharedRandom {
    fn next_float(&mut self, low: f32, high: f32) -> f32 {
        let mut source = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        source.next_float(low, high)
    }

    fn next_int(&mut self, low: i32, high: i32) -> i32 {
        let mut source = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        source.next_int(low, high)
    }
}

impl std::fmt::Debug for SharedRandom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRandom")
            .field("owners", &Arc::strong_count(&self.inner))
            .finish()
    }
}

// ── Stream allocation ──────────────────────────────────────────────

/// Which generator backs the random streams.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GeneratorKind {
    /// [`LegacyRand`], seeded with the low 32 bits of the stream seed.
    #[default]
    Legacy,
    /// [`ChaChaRand`].
    ChaCha,
}

impl GeneratorKind {
    /// Build a generator of this kind.
    pub fn build(self, seed: u64) -> Box<dyn RandomSource> {
        match self {
            Self::Legacy => Box::new(LegacyRand::new(seed as u32)),
            Self::ChaCha => Box::new(ChaChaRand::new(seed)),
        }
    }
}

/// How random streams are distributed among agents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RngPolicy {
    /// Each stream index gets an independent generator. Stream 0 is seeded
    /// with the base seed itself; others with a derived seed.
    #[default]
    PerAgent,
    /// Every stream index shares one generator seeded with the base seed.
    Serialized,
}

/// Hands out [`RandomSource`]s for agents by stream index.
#[derive(Debug)]
pub struct RandomStreams {
    kind: GeneratorKind,
    seed: u64,
    shared: Option<SharedRandom>,
}

impl RandomStreams {
    /// Create a stream allocator.
    pub fn new(kind: GeneratorKind, policy: RngPolicy, seed: u64) -> Self {
        let shared = match policy {
            RngPolicy::PerAgent => None,
            RngPolicy::Serialized => Some(SharedRandom::new(kind.build(seed))),
        };
        Self { kind, seed, shared }
    }

    /// The source for stream `index`.
    pub fn stream(&self, index: u64) -> Box<dyn RandomSource> {
        match &self.shared {
            Some(shared) => Box::new(shared.clone()),
            None => self.kind.build(derive_stream_seed(self.seed, index)),
        }
    }
}

/// Seed for stream `index`: the base seed for stream 0, a SplitMix64
/// scramble of `(base, index)` otherwise.
pub fn derive_stream_seed(base: u64, index: u64) -> u64 {
    if index == 0 {
        return base;
    }
    let mut z = base ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn legacy_first_draw_from_zero_seed() {
        // Hand-computed: three LCG rounds from state 0.
        let mut next: u32 = 0;
        let mut expected = 0u32;
        for (i, modulus) in [2_048u32, 1_024, 1_024].into_iter().enumerate() {
            next = next.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            if i > 0 {
                expected <<= 10;
            }
            expected ^= (next / 65_536) % modulus;
        }
        let mut rng = LegacyRand::new(0);
        assert_eq!(rng.next_raw(), expected);
        assert_eq!(rng.state(), next);
    }

    #[test]
    fn legacy_is_deterministic_per_seed() {
        let mut a = LegacyRand::new(7);
        let mut b = LegacyRand::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_raw(), b.next_raw());
        }
    }

    #[test]
    fn chacha_is_deterministic_per_seed() {
        let mut a = ChaChaRand::new(99);
        let mut b = ChaChaRand::new(99);
        for _ in 0..100 {
            assert_eq!(
                a.next_float(0.0, 1.0).to_bits(),
                b.next_float(0.0, 1.0).to_bits()
            );
        }
    }

    #[test]
    fn stream_zero_uses_base_seed() {
        let streams = RandomStreams::new(GeneratorKind::Legacy, RngPolicy::PerAgent, 12);
        let mut from_streams = streams.stream(0);
        let mut direct = LegacyRand::new(12);
        assert_eq!(
            from_streams.next_float(-1.0, 1.0).to_bits(),
            direct.next_float(-1.0, 1.0).to_bits()
        );
    }

    #[test]
    fn per_agent_streams_differ() {
        let streams = RandomStreams::new(GeneratorKind::Legacy, RngPolicy::PerAgent, 12);
        let mut a = streams.stream(0);
        let mut b = streams.stream(1);
        let da: Vec<u32> = (0..8).map(|_| a.next_float(0.0, 1.0).to_bits()).collect();
        let db: Vec<u32> = (0..8).map(|_| b.next_float(0.0, 1.0).to_bits()).collect();
        assert_ne!(da, db);
    }

    #[test]
    fn serialized_streams_share_one_sequence() {
        let streams = RandomStreams::new(GeneratorKind::Legacy, RngPolicy::Serialized, 5);
        let mut a = streams.stream(0);
        let mut b = streams.stream(1);
        let mut reference = LegacyRand::new(5);

        let first = a.next_float(0.0, 10.0);
        let second = b.next_float(0.0, 10.0);
        assert_eq!(first.to_bits(), reference.next_float(0.0, 10.0).to_bits());
        assert_eq!(second.to_bits(), reference.next_float(0.0, 10.0).to_bits());
    }

    proptest! {
        #[test]
        fn legacy_raw_fits_31_bits(seed in any::<u32>()) {
            let mut rng = LegacyRand::new(seed);
            for _ in 0..16 {
                prop_assert!(rng.next_raw() <= RAND_MAX);
            }
        }

        #[test]
        fn legacy_int_in_closed_range(seed in any::<u32>(), low in 0i32..50, width in 0i32..50) {
            let mut rng = LegacyRand::new(seed);
            let high = low + width;
            for _ in 0..16 {
                let v = rng.next_int(low, high);
                prop_assert!(v >= low && v <= high, "{} outside [{}, {}]", v, low, high);
            }
        }

        #[test]
        fn chacha_float_half_open(seed in any::<u64>()) {
            let mut rng = ChaChaRand::new(seed);
            for _ in 0..16 {
                let v = rng.next_float(-2.0, 2.0);
                prop_assert!((-2.0..2.0).contains(&v));
            }
        }

        #[test]
        fn chacha_int_in_closed_range(seed in any::<u64>(), low in 0i32..50, width in 0i32..50) {
            let mut rng = ChaChaRand::new(seed);
            let high = low + width;
            for _ in 0..16 {
                let v = rng.next_int(low, high);
                prop_assert!(v >= low && v <= high);
            }
        }
    }
}
