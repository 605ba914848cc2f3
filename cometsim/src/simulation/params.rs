//! Numerical and physical parameters for one simulation run
//!
//! `SimulationConfig` holds runtime settings:
//! - step size and step count,
//! - gravitational constant and the singularity epsilon,
//! - integrator method, singularity policy and optional adaptive control

use crate::configuration::config::IntegratorConfig;
use crate::simulation::engine::{AdaptiveParams, SingularityPolicy};
use crate::simulation::error::SimError;

/// Distance below which the force law reports a singularity, unless overridden
pub const DEFAULT_MIN_DIST: f64 = 1e-9;

#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub h0: f64,       // step size (initial step size in adaptive mode)
    pub steps: usize,  // number of steps to record
    pub G: f64,        // gravitational constant
    pub min_dist: f64, // singularity epsilon
    pub singularity: SingularityPolicy,
    pub integrator: IntegratorConfig,
    pub adaptive: Option<AdaptiveParams>,
}

impl SimulationConfig {
    /// Fixed-step velocity-Verlet configuration, validated eagerly
    #[allow(non_snake_case)]
    pub fn new(h0: f64, steps: usize, G: f64) -> Result<Self, SimError> {
        let cfg = Self {
            h0,
            steps,
            G,
            min_dist: DEFAULT_MIN_DIST,
            singularity: SingularityPolicy::Fail,
            integrator: IntegratorConfig::Verlet,
            adaptive: None,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_integrator(mut self, integrator: IntegratorConfig) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn with_min_dist(mut self, min_dist: f64) -> Self {
        self.min_dist = min_dist;
        self
    }

    /// Opt into evaluating close encounters at `min_dist` instead of failing
    pub fn with_clamping(mut self) -> Self {
        self.singularity = SingularityPolicy::Clamp;
        self
    }

    pub fn with_adaptive(mut self, adaptive: AdaptiveParams) -> Self {
        self.adaptive = Some(adaptive);
        self
    }

    /// Check every field; fields are public, so recorders call this again before a run
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.h0.is_finite() && self.h0 > 0.0) {
            return Err(SimError::Configuration(format!("step size must be positive and finite, got {}", self.h0)));
        }
        if self.steps == 0 {
            return Err(SimError::Configuration("step count must be positive".into()));
        }
        if !(self.G.is_finite() && self.G > 0.0) {
            return Err(SimError::Configuration(format!("gravitational constant must be positive, got {}", self.G)));
        }
        if !(self.min_dist.is_finite() && self.min_dist >= 0.0) {
            return Err(SimError::Configuration(format!("min_dist must be non-negative, got {}", self.min_dist)));
        }
        if let Some(adaptive) = &self.adaptive {
            adaptive.validate()?;
        }
        Ok(())
    }
}
