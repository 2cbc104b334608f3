//! Seasonal weather, produced by the team's observer.

use std::f64::consts::PI;

use thicket_core::{
    AgentError, CalendarDate, Field, FieldSet, Proposal, RandomSource, WorldState,
};
use thicket_engine::Observer;

/// Constants of the weather model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeatherParams {
    /// Annual mean temperature, °F.
    pub mean_temperature: f64,
    /// Seasonal temperature swing, °F.
    pub temperature_amplitude: f64,
    /// Uniform temperature noise half-width, °F.
    pub temperature_noise: f32,
    /// Annual mean monthly precipitation, inches.
    pub mean_precipitation: f64,
    /// Seasonal precipitation swing, inches.
    pub precipitation_amplitude: f64,
    /// Uniform precipitation noise half-width, inches.
    pub precipitation_noise: f32,
}

impl Default for WeatherParams {
    fn default() -> Self {
        Self {
            mean_temperature: 60.0,
            temperature_amplitude: 20.0,
            temperature_noise: 10.0,
            mean_precipitation: 7.0,
            precipitation_amplitude: 6.0,
            precipitation_noise: 2.0,
        }
    }
}

/// One month's weather.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Weather {
    /// °F.
    pub temperature: f32,
    /// Inches, never negative.
    pub precipitation: f32,
}

/// Weather for month index `month`.
///
/// `month` is not wrapped: index 12 gives the same seasonal phase as 0
/// but is accepted as is. Draws temperature noise, then precipitation
/// noise.
pub fn seasonal_weather(
    params: &WeatherParams,
    month: u32,
    rng: &mut dyn RandomSource,
) -> Weather {
    let angle = ((30.0 * month as f32 as f64 + 15.0) * (PI / 180.0)) as f32;
    let angle = f64::from(angle);

    let base_temperature =
        (params.mean_temperature - params.temperature_amplitude * angle.cos()) as f32;
    let temperature = base_temperature
        + rng.next_float(-params.temperature_noise, params.temperature_noise);

    let base_precipitation =
        (params.mean_precipitation + params.precipitation_amplitude * angle.sin()) as f32;
    let precipitation = base_precipitation
        + rng.next_float(-params.precipitation_noise, params.precipitation_noise);

    Weather {
        temperature,
        precipitation: precipitation.max(0.0),
    }
}

/// The standard team's observer: owns temperature and precipitation.
pub struct Clock {
    params: WeatherParams,
    rng: Box<dyn RandomSource>,
}

impl Clock {
    /// Create the observer with its own random stream.
    pub fn new(params: WeatherParams, rng: Box<dyn RandomSource>) -> Self {
        Self { params, rng }
    }
}

impl Observer for Clock {
    fn name(&self) -> &str {
        "clock"
    }

    fn writes(&self) -> FieldSet {
        [Field::Temperature, Field::Precipitation].into_iter().collect()
    }

    fn prime(&mut self, initial: &mut WorldState) -> Result<(), AgentError> {
        let weather = seasonal_weather(&self.params, initial.month, self.rng.as_mut());
        initial.temperature = weather.temperature;
        initial.precipitation = weather.precipitation;
        Ok(())
    }

    fn advance(
        &mut self,
        committed: &WorldState,
        next: CalendarDate,
    ) -> Result<Proposal, AgentError> {
        debug_assert_eq!(committed.date().next(), next);
        // Weather is computed before the month wraps into the new year.
        let weather = seasonal_weather(&self.params, committed.month + 1, self.rng.as_mut());
        Ok(Proposal::new()
            .with(Field::Temperature, weather.temperature)
            .with(Field::Precipitation, weather.precipitation))
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thicket_core::LegacyRand;
    use thicket_test_utils::standard_state;

    /// Always returns the middle of the range.
    struct Midpoint;

    impl RandomSource for Midpoint {
        fn next_float(&mut self, low: f32, high: f32) -> f32 {
            (low + high) / 2.0
        }
    }

    #[test]
    fn noiseless_january_is_cold_and_damp() {
        let w = seasonal_weather(&WeatherParams::default(), 0, &mut Midpoint);
        // cos(15°) ≈ 0.9659, sin(15°) ≈ 0.2588
        assert!((w.temperature - 40.681_85).abs() < 1e-3);
        assert!((w.precipitation - 8.552_91).abs() < 1e-3);
    }

    #[test]
    fn month_twelve_matches_month_zero_phase() {
        let params = WeatherParams::default();
        let a = seasonal_weather(&params, 0, &mut Midpoint);
        let b = seasonal_weather(&params, 12, &mut Midpoint);
        assert!((a.temperature - b.temperature).abs() < 1e-3);
        assert!((a.precipitation - b.precipitation).abs() < 1e-3);
    }

    #[test]
    fn precipitation_is_floored() {
        let params = WeatherParams {
            mean_precipitation: -50.0,
            ..WeatherParams::default()
        };
        let w = seasonal_weather(&params, 6, &mut LegacyRand::new(3));
        assert_eq!(w.precipitation, 0.0);
    }

    #[test]
    fn prime_uses_first_two_draws() {
        let mut clock = Clock::new(WeatherParams::default(), Box::new(LegacyRand::new(0)));
        let mut state = standard_state();
        clock.prime(&mut state).unwrap();

        let mut rng = LegacyRand::new(0);
        let expected = seasonal_weather(&WeatherParams::default(), 0, &mut rng);
        assert_eq!(state.temperature, expected.temperature);
        assert_eq!(state.precipitation, expected.precipitation);
    }

    #[test]
    fn advance_proposes_only_weather() {
        let mut clock = Clock::new(WeatherParams::default(), Box::new(LegacyRand::new(0)));
        let state = WorldState {
            month: 11,
            ..standard_state()
        };
        let proposal = clock.advance(&state, state.date().next()).unwrap();
        assert_eq!(proposal.len(), 2);
        assert!(proposal.get(Field::Month).is_none());
    }
}
