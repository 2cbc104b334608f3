//! The shared world: per-field commit cells and the [`WorldState`] snapshot.
//!
//! Agents never hold a reference to [`SharedWorld`]. They receive a
//! copied [`WorldState`] at the start of each cycle and return candidate
//! values; only the engine's commit window writes the cells.
//!
//! # Cell layout
//!
//! Each field is one `AtomicU64`:
//!
//! ```text
//!  63            40 39      32 31                 0
//! +----------------+----------+--------------------+
//! | epoch (24 bit) | rank (8) | value bits (32)    |
//! +----------------+----------+--------------------+
//! ```
//!
//! Within one epoch a commit only replaces the cell when its writer rank
//! is at least the rank already stored, so the outcome of several writers
//! committing the same field in the same window depends on their ranks,
//! never on which thread ran first. A commit from a different epoch
//! always replaces the cell. Epochs are compared for equality only, so
//! the 24-bit counter may wrap.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::calendar::CalendarDate;
use crate::error::AgentError;
use crate::field::{Field, FieldValue, ValueKind};

/// Highest writer rank a cell can record.
pub const MAX_RANK: u8 = u8::MAX;

const VALUE_MASK: u64 = 0xFFFF_FFFF;
const RANK_SHIFT: u32 = 32;
const EPOCH_SHIFT: u32 = 40;
const EPOCH_MASK: u64 = (1 << 24) - 1;

// ── WorldState ─────────────────────────────────────────────────────

/// A copied, read-only view of every field, taken at one instant.
///
/// Populations are unsigned, so they can never be observed below zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldState {
    /// Completed cycles since the run started.
    pub cycle: u64,
    /// Calendar year.
    pub year: u32,
    /// Zero-based calendar month.
    pub month: u32,
    /// Rainfall this month, inches.
    pub precipitation: f32,
    /// Temperature this month, degrees Fahrenheit.
    pub temperature: f32,
    /// Grain height, inches.
    pub vegetation_height: f32,
    /// Deer count.
    pub herbivores: u32,
    /// Coyote count.
    pub predators: u32,
}

impl WorldState {
    /// The current calendar date.
    pub fn date(&self) -> CalendarDate {
        CalendarDate::new(self.year, self.month)
    }

    /// Read one field.
    pub fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::Year => FieldValue::Count(self.year),
            Field::Month => FieldValue::Count(self.month),
            Field::Precipitation => FieldValue::Real(self.precipitation),
            Field::Temperature => FieldValue::Real(self.temperature),
            Field::VegetationHeight => FieldValue::Real(self.vegetation_height),
            Field::HerbivorePopulation => FieldValue::Count(self.herbivores),
            Field::PredatorPopulation => FieldValue::Count(self.predators),
        }
    }

    /// Overwrite one field, checking the value kind.
    pub fn set(&mut self, field: Field, value: FieldValue) -> Result<(), AgentError> {
        match (field, value) {
            (Field::Year, FieldValue::Count(v)) => self.year = v,
            (Field::Month, FieldValue::Count(v)) => self.month = v,
            (Field::Precipitation, FieldValue::Real(v)) => self.precipitation = v,
            (Field::Temperature, FieldValue::Real(v)) => self.temperature = v,
            (Field::VegetationHeight, FieldValue::Real(v)) => self.vegetation_height = v,
            (Field::HerbivorePopulation, FieldValue::Count(v)) => self.herbivores = v,
            (Field::PredatorPopulation, FieldValue::Count(v)) => self.predators = v,
            (field, _) => {
                return Err(AgentError::KindMismatch {
                    field,
                    expected: field.kind(),
                })
            }
        }
        Ok(())
    }
}

// ── FieldCell ──────────────────────────────────────────────────────

struct FieldCell(AtomicU64);

impl FieldCell {
    fn new(bits: u32) -> Self {
        Self(AtomicU64::new(pack(0, 0, bits)))
    }

    fn load_bits(&self) -> u32 {
        (self.0.load(Ordering::Acquire) & VALUE_MASK) as u32
    }

    /// Returns `false` when a higher-ranked commit from the same epoch
    /// already holds the cell.
    fn store_ranked(&self, epoch: u64, rank: u8, bits: u32) -> bool {
        let new = pack(epoch, rank, bits);
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let (cur_epoch, cur_rank) = unpack_header(current);
                if cur_epoch != epoch & EPOCH_MASK || rank >= cur_rank {
                    Some(new)
                } else {
                    None
                }
            })
            .is_ok()
    }
}

fn pack(epoch: u64, rank: u8, bits: u32) -> u64 {
    ((epoch & EPOCH_MASK) << EPOCH_SHIFT) | (u64::from(rank) << RANK_SHIFT) | u64::from(bits)
}

fn unpack_header(word: u64) -> (u64, u8) {
    ((word >> EPOCH_SHIFT) & EPOCH_MASK, (word >> RANK_SHIFT) as u8)
}

// ── SharedWorld ────────────────────────────────────────────────────

/// The mutable world every agent reads from and commits into.
///
/// Lives for the whole run behind an `Arc`. Reads and writes are
/// lock-free; consistency between them comes from the barrier that
/// brackets the commit window, not from this type.
pub struct SharedWorld {
    cells: [FieldCell; Field::COUNT],
    cycle: AtomicU64,
    halted: AtomicBool,
}

// Compile-time assertion: SharedWorld must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SharedWorld>();
};

impl SharedWorld {
    /// Create a world holding `initial`. The cycle counter starts at
    /// `initial.cycle`.
    pub fn new(initial: &WorldState) -> Self {
        Self {
            cells: Field::ALL.map(|field| FieldCell::new(initial.get(field).to_bits())),
            cycle: AtomicU64::new(initial.cycle),
            halted: AtomicBool::new(false),
        }
    }

    /// Copy every field into a [`WorldState`].
    ///
    /// Only mutually consistent when no commit window is open.
    pub fn snapshot(&self) -> WorldState {
        let count = |field: Field| self.read(field).as_count().unwrap_or_default();
        let real = |field: Field| self.read(field).as_real().unwrap_or_default();
        WorldState {
            cycle: self.cycle(),
            year: count(Field::Year),
            month: count(Field::Month),
            precipitation: real(Field::Precipitation),
            temperature: real(Field::Temperature),
            vegetation_height: real(Field::VegetationHeight),
            herbivores: count(Field::HerbivorePopulation),
            predators: count(Field::PredatorPopulation),
        }
    }

    /// Read a single field.
    pub fn read(&self, field: Field) -> FieldValue {
        FieldValue::from_bits(field.kind(), self.cells[field.index()].load_bits())
    }

    /// Completed cycles.
    pub fn cycle(&self) -> u64 {
        self.cycle.load(Ordering::Acquire)
    }

    /// Mark the current cycle complete. Returns the new cycle count.
    pub fn advance_cycle(&self) -> u64 {
        self.cycle.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Check `value` for `field` without writing it, returning the value
    /// that [`commit`](Self::commit) would store.
    ///
    /// Negative values for non-negative fields are floored at zero.
    ///
    /// # Errors
    ///
    /// [`AgentError::KindMismatch`] if `value` is the wrong kind,
    /// [`AgentError::NonFinite`] for NaN or infinite reals.
    pub fn admit(field: Field, value: FieldValue) -> Result<FieldValue, AgentError> {
        match value {
            FieldValue::Real(v) if field.kind() == ValueKind::Real => {
                if !v.is_finite() {
                    return Err(AgentError::NonFinite { field });
                }
                if field.is_non_negative() && v < 0.0 {
                    Ok(FieldValue::Real(0.0))
                } else {
                    Ok(FieldValue::Real(v))
                }
            }
            FieldValue::Count(v) if field.kind() == ValueKind::Count => Ok(FieldValue::Count(v)),
            _ => Err(AgentError::KindMismatch {
                field,
                expected: field.kind(),
            }),
        }
    }

    /// Commit `value` into `field` for the cycle currently being produced.
    ///
    /// The value is first passed through [`admit`](Self::admit). Returns
    /// `Ok(false)` when a higher-ranked writer already committed the field
    /// this cycle.
    ///
    /// # Errors
    ///
    /// Any error from [`admit`](Self::admit); nothing is written then.
    pub fn commit(&self, field: Field, value: FieldValue, rank: u8) -> Result<bool, AgentError> {
        let value = Self::admit(field, value)?;
        let epoch = self.cycle() + 1;
        Ok(self.cells[field.index()].store_ranked(epoch, rank, value.to_bits()))
    }

    /// Ask every participant to stop at the start of the next cycle.
    ///
    /// Must only be called while a commit or observation window is open,
    /// so that all participants see the same flag when they next check.
    pub fn halt(&self) {
        self.halted.store(true, Ordering::Release);
    }

    /// Whether [`halt`](Self::halt) has been called.
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for SharedWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedWorld")
            .field("state", &self.snapshot())
            .field("halted", &self.is_halted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn initial() -> WorldState {
        WorldState {
            cycle: 0,
            year: 2020,
            month: 0,
            precipitation: 4.0,
            temperature: 45.0,
            vegetation_height: 18.0,
            herbivores: 6,
            predators: 3,
        }
    }

    #[test]
    fn admit_floors_negatives_without_writing() {
        let world = SharedWorld::new(&initial());
        assert_eq!(
            SharedWorld::admit(Field::VegetationHeight, FieldValue::Real(-3.0)),
            Ok(FieldValue::Real(0.0))
        );
        assert_eq!(
            SharedWorld::admit(Field::Temperature, FieldValue::Real(f32::INFINITY)),
            Err(AgentError::NonFinite {
                field: Field::Temperature
            })
        );
        assert_eq!(world.read(Field::VegetationHeight), FieldValue::Real(18.0));
    }

    #[test]
    fn snapshot_returns_initial_state() {
        let world = SharedWorld::new(&initial());
        assert_eq!(world.snapshot(), initial());
    }

    #[test]
    fn higher_rank_wins_regardless_of_order() {
        let world = SharedWorld::new(&initial());
        assert!(world
            .commit(Field::HerbivorePopulation, FieldValue::Count(5), 1)
            .unwrap());
        assert!(!world
            .commit(Field::HerbivorePopulation, FieldValue::Count(7), 0)
            .unwrap());
        assert_eq!(world.snapshot().herbivores, 5);
    }

    #[test]
    fn new_epoch_resets_precedence() {
        let world = SharedWorld::new(&initial());
        world
            .commit(Field::HerbivorePopulation, FieldValue::Count(5), 1)
            .unwrap();
        world.advance_cycle();
        assert!(world
            .commit(Field::HerbivorePopulation, FieldValue::Count(9), 0)
            .unwrap());
        assert_eq!(world.snapshot().herbivores, 9);
        assert_eq!(world.snapshot().cycle, 1);
    }

    #[test]
    fn initial_value_is_replaced_by_first_commit() {
        let world = SharedWorld::new(&initial());
        assert!(world
            .commit(Field::PredatorPopulation, FieldValue::Count(4), 0)
            .unwrap());
        assert_eq!(world.snapshot().predators, 4);
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let world = SharedWorld::new(&initial());
        let err = world
            .commit(Field::VegetationHeight, FieldValue::Count(3), 0)
            .unwrap_err();
        assert_eq!(
            err,
            AgentError::KindMismatch {
                field: Field::VegetationHeight,
                expected: ValueKind::Real,
            }
        );
    }

    #[test]
    fn nan_is_rejected() {
        let world = SharedWorld::new(&initial());
        let err = world
            .commit(Field::Temperature, FieldValue::Real(f32::NAN), 0)
            .unwrap_err();
        assert_eq!(
            err,
            AgentError::NonFinite {
                field: Field::Temperature
            }
        );
    }

    #[test]
    fn negative_height_floors_at_zero_but_temperature_does_not() {
        let world = SharedWorld::new(&initial());
        world
            .commit(Field::VegetationHeight, FieldValue::Real(-2.5), 0)
            .unwrap();
        world
            .commit(Field::Temperature, FieldValue::Real(-2.5), 0)
            .unwrap();
        let snap = world.snapshot();
        assert_eq!(snap.vegetation_height, 0.0);
        assert_eq!(snap.temperature, -2.5);
    }

    #[test]
    fn halt_flag_sticks() {
        let world = SharedWorld::new(&initial());
        assert!(!world.is_halted());
        world.halt();
        assert!(world.is_halted());
    }

    #[test]
    fn state_set_checks_kind() {
        let mut state = initial();
        assert!(state.set(Field::Month, FieldValue::Count(4)).is_ok());
        assert_eq!(state.month, 4);
        assert!(state.set(Field::Month, FieldValue::Real(4.0)).is_err());
    }

    proptest! {
        #[test]
        fn pack_preserves_value_bits(epoch in any::<u64>(), rank in any::<u8>(), bits in any::<u32>()) {
            let word = pack(epoch, rank, bits);
            prop_assert_eq!((word & VALUE_MASK) as u32, bits);
            prop_assert_eq!(unpack_header(word), (epoch & EPOCH_MASK, rank));
        }

        #[test]
        fn committed_reals_never_negative(v in -1.0e6f32..1.0e6) {
            let world = SharedWorld::new(&initial());
            world.commit(Field::Precipitation, FieldValue::Real(v), 0).unwrap();
            prop_assert!(world.snapshot().precipitation >= 0.0);
        }
    }
}
