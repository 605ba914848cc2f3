//! Core state types for the comet simulation.
//!
//! Defines the kinematic [`State`], the simulated [`Body`] and the fixed
//! [`CentralMass`] it orbits. All vectors are `NVec3` (nalgebra, f64).

use nalgebra::Vector3;

use super::error::SimError;

pub type NVec3 = Vector3<f64>;

/// Instantaneous kinematic condition of the body
///
/// A new `State` is produced every step; recorded states are never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub t: f64,   // time
}

impl State {
    pub fn new(x: NVec3, v: NVec3, t: f64) -> Self {
        Self { x, v, t }
    }

    /// True when position, velocity and time are all finite
    pub fn is_finite(&self) -> bool {
        self.t.is_finite()
            && self.x.iter().all(|c| c.is_finite())
            && self.v.iter().all(|c| c.is_finite())
    }
}

/// The simulated object (the comet)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub m: f64,         // mass
    pub initial: State, // state at the start of the run
}

impl Body {
    pub fn new(m: f64, initial: State) -> Result<Self, SimError> {
        if !(m.is_finite() && m > 0.0) {
            return Err(SimError::Configuration(format!("body mass must be positive and finite, got {m}")));
        }
        if !initial.is_finite() {
            return Err(SimError::Configuration("body initial state must be finite".into()));
        }
        Ok(Self { m, initial })
    }
}

/// Fixed attracting source of the gravitational field (the sun)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralMass {
    pub m: f64,   // mass
    pub x: NVec3, // fixed position, typically the origin
}

impl CentralMass {
    pub fn new(m: f64, x: NVec3) -> Result<Self, SimError> {
        if !(m.is_finite() && m > 0.0) {
            return Err(SimError::Configuration(format!("central mass must be positive and finite, got {m}")));
        }
        if !x.iter().all(|c| c.is_finite()) {
            return Err(SimError::Configuration("central mass position must be finite".into()));
        }
        Ok(Self { m, x })
    }

    /// Central mass at the origin
    pub fn at_origin(m: f64) -> Result<Self, SimError> {
        Self::new(m, NVec3::zeros())
    }
}
