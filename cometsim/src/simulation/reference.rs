//! Circular reference orbits (planets drawn for context)
//!
//! These are not integrated and exert no force; they are sampled at the
//! comet's frame times so a renderer can place them alongside each frame.

use super::error::SimError;
use super::recorder::Trajectory;
use super::states::NVec3;

/// Circular orbit parallel to the z = 0 plane around the central mass
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceOrbit {
    pub name: String,
    pub radius: f64, // orbit radius
    pub phase: f64,  // angle at t = 0 (radians)
}

impl ReferenceOrbit {
    pub fn new(name: impl Into<String>, radius: f64, phase: f64) -> Result<Self, SimError> {
        let name = name.into();
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SimError::Configuration(format!("reference orbit '{name}' needs a positive radius, got {radius}")));
        }
        if !phase.is_finite() {
            return Err(SimError::Configuration(format!("reference orbit '{name}' has a non-finite phase")));
        }
        Ok(Self { name, radius, phase })
    }

    /// Angular rate sqrt(mu / r^3)
    pub fn angular_rate(&self, mu: f64) -> f64 {
        (mu / self.radius.powi(3)).sqrt()
    }

    /// Position at time `t` on the circle around `center`
    pub fn position_at(&self, t: f64, mu: f64, center: &NVec3) -> NVec3 {
        let theta = self.phase + self.angular_rate(mu) * t;
        center + NVec3::new(self.radius * theta.cos(), self.radius * theta.sin(), 0.0)
    }

    /// One position per trajectory frame
    pub fn sample(&self, trajectory: &Trajectory, mu: f64, center: &NVec3) -> Vec<NVec3> {
        trajectory.times().map(|t| self.position_at(t, mu, center)).collect()
    }
}
