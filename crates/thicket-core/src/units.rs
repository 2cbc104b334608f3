//! Conversions from model units to display units.

/// Centimetres per inch.
pub const CM_PER_INCH: f32 = 2.54;

/// Convert inches to centimetres.
pub fn inches_to_cm(inches: f32) -> f32 {
    inches * CM_PER_INCH
}

/// Convert degrees Fahrenheit to degrees Celsius.
///
/// Computed in `f64` so the displayed value matches the report layout
/// of earlier runs.
pub fn fahrenheit_to_celsius(fahrenheit: f32) -> f64 {
    5.0 / 9.0 * (f64::from(fahrenheit) - 32.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freezing_and_boiling_points() {
        assert!(fahrenheit_to_celsius(32.0).abs() < 1e-9);
        assert!((fahrenheit_to_celsius(212.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn one_inch_is_two_point_five_four_cm() {
        assert!((inches_to_cm(1.0) - 2.54).abs() < f32::EPSILON);
    }
}
