//! Configuration types for loading comet scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – integrator method, adaptive control, singularity policy
//! - [`ParametersConfig`] – step size, step count and physical constants
//! - [`CentralConfig`]    – the fixed attractor (the sun)
//! - [`BodyConfig`]       – initial state of the comet
//! - [`OrbitConfig`]      – circular reference orbits drawn for context
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! A unit circular orbit matching these types:
//!
//! ```yaml
//! engine:
//!   integrator: "verlet"    # "verlet", "leapfrog" or "rk4"
//!   clamp_singularity: false
//!   adaptive:               # optional step-doubling control
//!     tolerance: 1.0e-9
//!     h_min: 1.0e-6
//!     h_max: 0.05
//!
//! parameters:
//!   h0: 0.01                # step size
//!   steps: 628              # number of steps
//!   G: 1.0                  # gravitational constant
//!   min_dist: 1.0e-9        # singularity epsilon
//!
//! central:
//!   m: 1.0
//!   x: [ 0.0, 0.0, 0.0 ]
//!
//! body:
//!   x: [ 1.0, 0.0, 0.0 ]
//!   v: [ 0.0, 1.0, 0.0 ]
//!   m: 1.0
//!
//! reference_orbits:
//!   - name: "earth"
//!     radius: 1.0
//!     phase: 0.0
//! ```
//!
//! The engine then maps this configuration into its runtime types
//! (`SimulationConfig`, `Body`, `CentralMass`), see `Scenario::build_scenario`.

use serde::Deserialize;

/// Which integrator method is used by the engine
/// `integrator: "verlet"`, `integrator: "leapfrog"` or `integrator: "rk4"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegratorConfig {
    #[default]
    #[serde(rename = "verlet")] // Velocity Verlet (kick-drift-kick). Symplectic, good long-term energy behavior
    Verlet,

    #[serde(rename = "leapfrog")] // Drift-kick-drift leapfrog. Symplectic, one force evaluation per step
    Leapfrog,

    #[serde(rename = "rk4")] // Classical 4th-order Runge–Kutta, higher local accuracy per step but not symplectic
    Rk4,
}

impl IntegratorConfig {
    /// Global order of accuracy
    pub fn order(self) -> u32 {
        match self {
            IntegratorConfig::Verlet | IntegratorConfig::Leapfrog => 2,
            IntegratorConfig::Rk4 => 4,
        }
    }
}

/// Step-doubling control, present only for adaptive runs
#[derive(Deserialize, Debug, Clone)]
pub struct AdaptiveConfig {
    pub tolerance: f64,              // accepted local relative error
    pub h_min: f64,                  // lower step bound
    pub h_max: f64,                  // upper step bound
    pub max_retries: Option<usize>,  // reductions allowed after a non-finite step (default 8)
}

/// High-level engine configuration
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    #[serde(default)]
    pub integrator: IntegratorConfig, // Time integrator used for advancing the state
    #[serde(default)]
    pub clamp_singularity: bool, // `true` - evaluate close encounters at min_dist instead of failing
    pub adaptive: Option<AdaptiveConfig>, // absent - fixed step
}

/// Global numerical and physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub h0: f64,               // time step size
    pub steps: usize,          // number of steps
    pub G: f64,                // gravitational constant
    pub min_dist: Option<f64>, // singularity epsilon
}

/// The fixed central mass
#[derive(Deserialize, Debug, Clone)]
pub struct CentralConfig {
    pub m: f64, // Mass of the attractor
    #[serde(default = "origin")]
    pub x: Vec<f64>, // Fixed position, origin if absent
}

/// Initial state of the comet
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: Vec<f64>, // Initial position vector `x` in simulation units
    pub v: Vec<f64>, // Initial velocity vector `v` in simulation units per time unit
    pub m: f64,      // Mass of the body
    #[serde(default)]
    pub t: f64,      // Initial time
}

/// Circular reference orbit in the z = 0 plane (planets drawn for context)
#[derive(Deserialize, Debug, Clone)]
pub struct OrbitConfig {
    pub name: String,
    pub radius: f64, // orbit radius in simulation length units
    #[serde(default)]
    pub phase: f64,  // angle at t = 0, radians
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig, // Engine-level configuration
    pub parameters: ParametersConfig, // Global numerical and physical parameters
    pub central: CentralConfig, // Attractor
    pub body: BodyConfig, // The comet
    #[serde(default)]
    pub reference_orbits: Vec<OrbitConfig>, // Context orbits for renderers
    pub marker_time: Option<f64>, // Time whose nearest frame renderers highlight
}

fn origin() -> Vec<f64> {
    vec![0.0, 0.0, 0.0]
}
