//! Month/year calendar arithmetic.

use std::fmt;

/// Months in a simulated year.
pub const MONTHS_PER_YEAR: u32 = 12;

/// A simulated month: `month` is zero-based (`0` = January).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarDate {
    /// Calendar year.
    pub year: u32,
    /// Zero-based month, `0..12`.
    pub month: u32,
}

impl CalendarDate {
    /// Create a date. Does not validate `month`; see [`is_valid`](Self::is_valid).
    pub const fn new(year: u32, month: u32) -> Self {
        Self { year, month }
    }

    /// Whether `month` lies in `0..12`.
    pub fn is_valid(&self) -> bool {
        self.month < MONTHS_PER_YEAR
    }

    /// The following month, wrapping December into January of the next year.
    pub fn next(self) -> Self {
        if self.month + 1 >= MONTHS_PER_YEAR {
            Self::new(self.year + 1, 0)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// Months from `self` up to (not including) January of `end_year`.
    ///
    /// Zero when `self` is already at or past that point.
    pub fn months_until_year(self, end_year: u32) -> u64 {
        if self.year >= end_year {
            return 0;
        }
        u64::from(end_year - self.year) * u64::from(MONTHS_PER_YEAR) - u64::from(self.month)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn december_wraps_into_next_year() {
        assert_eq!(CalendarDate::new(2020, 11).next(), CalendarDate::new(2021, 0));
        assert_eq!(CalendarDate::new(2020, 4).next(), CalendarDate::new(2020, 5));
    }

    #[test]
    fn months_until_year_counts_remaining_cycles() {
        assert_eq!(CalendarDate::new(2020, 0).months_until_year(2026), 72);
        assert_eq!(CalendarDate::new(2025, 11).months_until_year(2026), 1);
        assert_eq!(CalendarDate::new(2026, 0).months_until_year(2026), 0);
    }

    #[test]
    fn walking_reaches_end_year_after_counted_months() {
        let mut date = CalendarDate::new(2022, 7);
        let expected = date.months_until_year(2024);
        let mut steps = 0;
        while date.year < 2024 {
            date = date.next();
            steps += 1;
        }
        assert_eq!(steps, expected);
    }
}
