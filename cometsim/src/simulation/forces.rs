//! Acceleration sources for the comet engine
//!
//! Defines the acceleration trait the integrators are generic over and
//! Newtonian gravity toward a single fixed central mass

use crate::simulation::engine::SingularityPolicy;
use crate::simulation::error::SimError;
use crate::simulation::params::{SimulationConfig, DEFAULT_MIN_DIST};
use crate::simulation::states::{CentralMass, NVec3};

/// Trait for acceleration sources acting on the body at position `x`
pub trait Acceleration {
    fn acceleration(&self, x: &NVec3) -> Result<NVec3, SimError>;
}

/// Newtonian gravity of a fixed central mass
///
/// No softening: separations below `min_dist` are a hard error unless
/// the policy is `Clamp`
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonianGravity {
    pub G: f64,                  // gravitational constant
    pub central: CentralMass,    // attractor
    pub min_dist: f64,           // singularity epsilon
    pub policy: SingularityPolicy,
}

impl NewtonianGravity {
    #[allow(non_snake_case)]
    pub fn new(G: f64, central: CentralMass) -> Self {
        Self {
            G,
            central,
            min_dist: DEFAULT_MIN_DIST,
            policy: SingularityPolicy::Fail,
        }
    }

    /// Gravity term using the constant, epsilon and policy from `cfg`
    pub fn from_config(central: &CentralMass, cfg: &SimulationConfig) -> Self {
        Self {
            G: cfg.G,
            central: *central,
            min_dist: cfg.min_dist,
            policy: cfg.singularity,
        }
    }

    /// Gravitational parameter mu = G * M
    pub fn mu(&self) -> f64 {
        self.G * self.central.m
    }
}

impl Acceleration for NewtonianGravity {
    fn acceleration(&self, x: &NVec3) -> Result<NVec3, SimError> {
        // r points from the body toward the attractor
        let r = self.central.x - x;
        let dist = r.norm();

        // Exact coincidence has no direction, so it fails even when clamping
        if dist == 0.0 {
            return Err(SimError::Singularity { distance: dist, min_dist: self.min_dist });
        }

        let d = if dist < self.min_dist {
            match self.policy {
                SingularityPolicy::Fail => {
                    return Err(SimError::Singularity { distance: dist, min_dist: self.min_dist });
                }
                SingularityPolicy::Clamp => self.min_dist,
            }
        } else {
            dist
        };

        // a = G M r_hat / d^2
        Ok(r * (self.mu() / (d * d * dist)))
    }
}

/// Gravitational acceleration of a body at `x` toward `central`
///
/// Uses [`DEFAULT_MIN_DIST`] and fails on close encounters.
#[allow(non_snake_case)]
pub fn acceleration(x: &NVec3, central: &CentralMass, G: f64) -> Result<NVec3, SimError> {
    NewtonianGravity::new(G, *central).acceleration(x)
}
