//! High-level runtime engine settings
//!
//! Selects how the integrator treats close encounters and whether
//! step sizes are adapted, used when building a `SimulationConfig`

use crate::simulation::error::SimError;

/// What the force law does when the body comes closer than `min_dist`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SingularityPolicy {
    /// Surface a `SimError::Singularity` (default)
    #[default]
    Fail,
    /// Evaluate the force at `min_dist` instead (explicit opt-in)
    Clamp,
}

/// Step-doubling error control for adaptive runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveParams {
    pub tolerance: f64,     // accepted local error per step
    pub h_min: f64,         // smallest step the controller may use
    pub h_max: f64,         // largest step the controller may use
    pub max_retries: usize, // step reductions allowed after a non-finite result
}

impl AdaptiveParams {
    pub fn new(tolerance: f64, h_min: f64, h_max: f64) -> Self {
        Self {
            tolerance,
            h_min,
            h_max,
            max_retries: 8,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SimError::Configuration(format!("adaptive tolerance must be positive, got {}", self.tolerance)));
        }
        if !(self.h_min.is_finite() && self.h_min > 0.0) {
            return Err(SimError::Configuration(format!("adaptive h_min must be positive, got {}", self.h_min)));
        }
        if !(self.h_max.is_finite() && self.h_max >= self.h_min) {
            return Err(SimError::Configuration(format!(
                "adaptive h_max ({}) must be finite and at least h_min ({})",
                self.h_max, self.h_min
            )));
        }
        Ok(())
    }
}
