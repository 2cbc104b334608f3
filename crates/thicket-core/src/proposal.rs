//! Candidate next-state values produced during the Computing phase.

use smallvec::SmallVec;

use crate::field::{Field, FieldValue};

/// The candidate values an agent wants committed this cycle.
///
/// Sparse: fields an agent leaves out keep whatever value the cell
/// resolves to from other writers (or from the previous cycle). Setting
/// the same field twice keeps the last value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Proposal {
    entries: SmallVec<[(Field, FieldValue); 4]>,
}

impl Proposal {
    /// An empty proposal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the candidate value for `field`.
    pub fn set(&mut self, field: Field, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    /// The candidate for `field`, if any.
    pub fn get(&self, field: Field) -> Option<FieldValue> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| *v)
    }

    /// Iterate over `(field, value)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, FieldValue)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of proposed fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is proposed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_twice_keeps_last() {
        let p = Proposal::new()
            .with(Field::VegetationHeight, 3.0f32)
            .with(Field::VegetationHeight, 4.5f32);
        assert_eq!(p.len(), 1);
        assert_eq!(p.get(Field::VegetationHeight), Some(FieldValue::Real(4.5)));
    }

    #[test]
    fn missing_field_is_none() {
        let p = Proposal::new().with(Field::PredatorPopulation, 3u32);
        assert_eq!(p.get(Field::HerbivorePopulation), None);
        assert!(!p.is_empty());
    }
}
