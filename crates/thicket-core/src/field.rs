//! World fields, their value kinds, and the [`FieldSet`] bitset.

use std::fmt;

/// A scalar field of the shared world.
///
/// Every field has exactly one storage cell in
/// [`SharedWorld`](crate::SharedWorld). The discriminant doubles as the
/// cell index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Calendar year. Never decreases.
    Year = 0,
    /// Calendar month, `0..12`.
    Month = 1,
    /// Rainfall this month, inches. Non-negative.
    Precipitation = 2,
    /// Mean temperature this month, degrees Fahrenheit.
    Temperature = 3,
    /// Grain height, inches. Non-negative.
    VegetationHeight = 4,
    /// Deer count.
    HerbivorePopulation = 5,
    /// Coyote count.
    PredatorPopulation = 6,
}

/// Storage class of a field's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// Unsigned integer count (calendar entries, populations).
    Count,
    /// Single-precision measurement.
    Real,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::Real => write!(f, "real"),
        }
    }
}

impl Field {
    /// Number of fields.
    pub const COUNT: usize = 7;

    /// All fields in cell order.
    pub const ALL: [Field; Self::COUNT] = [
        Field::Year,
        Field::Month,
        Field::Precipitation,
        Field::Temperature,
        Field::VegetationHeight,
        Field::HerbivorePopulation,
        Field::PredatorPopulation,
    ];

    /// Cell index of this field.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Snake-case name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Precipitation => "precipitation",
            Self::Temperature => "temperature",
            Self::VegetationHeight => "vegetation_height",
            Self::HerbivorePopulation => "herbivore_population",
            Self::PredatorPopulation => "predator_population",
        }
    }

    /// Value kind stored in this field's cell.
    pub fn kind(self) -> ValueKind {
        match self {
            Self::Precipitation | Self::Temperature | Self::VegetationHeight => ValueKind::Real,
            Self::Year | Self::Month | Self::HerbivorePopulation | Self::PredatorPopulation => {
                ValueKind::Count
            }
        }
    }

    /// Native model unit, if the field carries one.
    pub fn units(self) -> Option<&'static str> {
        match self {
            Self::Precipitation | Self::VegetationHeight => Some("inches"),
            Self::Temperature => Some("fahrenheit"),
            _ => None,
        }
    }

    /// Whether committed values are floored at zero.
    ///
    /// Count fields are non-negative by construction.
    pub fn is_non_negative(self) -> bool {
        !matches!(self, Self::Temperature)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value destined for, or read from, a field cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue {
    /// Unsigned integer count.
    Count(u32),
    /// Single-precision measurement.
    Real(f32),
}

impl FieldValue {
    /// The kind of this value.
    pub fn kind(self) -> ValueKind {
        match self {
            Self::Count(_) => ValueKind::Count,
            Self::Real(_) => ValueKind::Real,
        }
    }

    /// Raw 32-bit pattern stored in a cell.
    pub fn to_bits(self) -> u32 {
        match self {
            Self::Count(v) => v,
            Self::Real(v) => v.to_bits(),
        }
    }

    /// Reinterpret a cell's raw bits as a value of `kind`.
    pub fn from_bits(kind: ValueKind, bits: u32) -> Self {
        match kind {
            ValueKind::Count => Self::Count(bits),
            ValueKind::Real => Self::Real(f32::from_bits(bits)),
        }
    }

    /// The count, if this is a [`FieldValue::Count`].
    pub fn as_count(self) -> Option<u32> {
        match self {
            Self::Count(v) => Some(v),
            Self::Real(_) => None,
        }
    }

    /// The measurement, if this is a [`FieldValue::Real`].
    pub fn as_real(self) -> Option<f32> {
        match self {
            Self::Real(v) => Some(v),
            Self::Count(_) => None,
        }
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::Count(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        Self::Real(v)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
        }
    }
}

/// A set of fields, stored as a bitset over [`Field::index`].
///
/// Used by observers to declare the fields they own.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldSet {
    bits: u16,
}

impl FieldSet {
    /// Create an empty field set.
    pub fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Insert a field into the set.
    pub fn insert(&mut self, field: Field) {
        self.bits |= 1 << field.index();
    }

    /// Check whether the set contains a field.
    pub fn contains(&self, field: Field) -> bool {
        self.bits & (1 << field.index()) != 0
    }

    /// Return the union of two sets.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Return the intersection of two sets.
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    /// Number of fields in the set.
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Iterate over the fields in the set in cell order.
    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        Field::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl FromIterator<Field> for FieldSet {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        let mut set = Self::empty();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

impl fmt::Debug for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
