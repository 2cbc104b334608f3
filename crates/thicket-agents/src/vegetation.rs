//! Grain growth.

use smallvec::smallvec;
use thicket_core::{AgentError, Field, Proposal, WorldState};
use thicket_engine::{Agent, CommitMode, WriteDecls};

/// Constants of the grain growth rule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthParams {
    /// Inches grown per month under ideal conditions.
    pub growth_per_month: f32,
    /// Inches eaten per deer per month.
    pub eaten_per_herbivore: f32,
    /// Temperature of fastest growth, °F.
    pub ideal_temperature: f32,
    /// Precipitation of fastest growth, inches.
    pub ideal_precipitation: f32,
    /// Width of both Gaussian response curves.
    pub tolerance: f64,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            growth_per_month: 9.0,
            eaten_per_herbivore: 1.0,
            ideal_temperature: 40.0,
            ideal_precipitation: 10.0,
            tolerance: 10.0,
        }
    }
}

fn response(value: f32, ideal: f32, tolerance: f64) -> f32 {
    let x = (f64::from(value - ideal) / tolerance) as f32;
    f64::from(-(x * x)).exp() as f32
}

/// Growth multiplier in `(0, 1]` for the given weather.
pub fn growth_factor(params: &GrowthParams, temperature: f32, precipitation: f32) -> f32 {
    let temp_factor = response(temperature, params.ideal_temperature, params.tolerance);
    let precip_factor = response(precipitation, params.ideal_precipitation, params.tolerance);
    temp_factor * precip_factor
}

/// Next grain height: growth minus grazing, floored at zero.
pub fn next_height(params: &GrowthParams, state: &WorldState) -> f32 {
    let factor = growth_factor(params, state.temperature, state.precipitation);
    let mut height = state.vegetation_height;
    height += factor * params.growth_per_month;
    height -= state.herbivores as f32 * params.eaten_per_herbivore;
    height.max(0.0)
}

/// Sole writer of [`Field::VegetationHeight`].
#[derive(Clone, Debug, Default)]
pub struct Vegetation {
    params: GrowthParams,
}

impl Vegetation {
    /// Create the agent.
    pub fn new(params: GrowthParams) -> Self {
        Self { params }
    }
}

impl Agent for Vegetation {
    fn name(&self) -> &str {
        "vegetation"
    }

    fn writes(&self) -> WriteDecls {
        smallvec![(Field::VegetationHeight, CommitMode::Exclusive)]
    }

    fn compute(&mut self, snapshot: &WorldState) -> Result<Proposal, AgentError> {
        let height = next_height(&self.params, snapshot);
        Ok(Proposal::new().with(Field::VegetationHeight, height))
    }
}
