//! Conservation diagnostics for a recorded run.
//!
//! Tracks mechanical energy and angular momentum (about the central mass)
//! to detect numerical drift in the integrators.

use super::recorder::Trajectory;
use super::states::{Body, CentralMass, NVec3, State};

/// Kinetic energy: m v^2 / 2
pub fn kinetic_energy(body: &Body, s: &State) -> f64 {
    0.5 * body.m * s.v.norm_squared()
}

/// Potential energy in the central field: -G M m / r
#[allow(non_snake_case)]
pub fn potential_energy(body: &Body, s: &State, central: &CentralMass, G: f64) -> f64 {
    -G * central.m * body.m / (s.x - central.x).norm()
}

#[allow(non_snake_case)]
pub fn total_energy(body: &Body, s: &State, central: &CentralMass, G: f64) -> f64 {
    kinetic_energy(body, s) + potential_energy(body, s, central, G)
}

/// Angular momentum about the central mass: (x - x_c) × m v
pub fn angular_momentum(body: &Body, s: &State, central: &CentralMass) -> NVec3 {
    (s.x - central.x).cross(&(body.m * s.v))
}

/// Baseline conservation quantities to track drift against
#[derive(Debug, Clone, Copy)]
pub struct ConservationState {
    pub baseline_energy: f64,
    pub baseline_angular_momentum: NVec3,
}

impl ConservationState {
    #[allow(non_snake_case)]
    pub fn new(body: &Body, s: &State, central: &CentralMass, G: f64) -> Self {
        Self {
            baseline_energy: total_energy(body, s, central, G),
            baseline_angular_momentum: angular_momentum(body, s, central),
        }
    }
}

/// Conservation errors of one state relative to a baseline
#[derive(Debug, Clone, Copy)]
pub struct ConservationMonitor {
    /// |E - E0| / |E0|
    pub energy_error: f64,
    /// |L - L0| / |L0|
    pub angular_momentum_error: f64,
}

impl ConservationMonitor {
    #[allow(non_snake_case)]
    pub fn check(baseline: &ConservationState, body: &Body, s: &State, central: &CentralMass, G: f64) -> Self {
        let energy = total_energy(body, s, central, G);
        let l = angular_momentum(body, s, central);

        Self {
            energy_error: relative(energy - baseline.baseline_energy, baseline.baseline_energy.abs()),
            angular_momentum_error: relative(
                (l - baseline.baseline_angular_momentum).norm(),
                baseline.baseline_angular_momentum.norm(),
            ),
        }
    }

    pub fn is_violated(&self, energy_tol: f64, ang_momentum_tol: f64) -> bool {
        self.energy_error > energy_tol || self.angular_momentum_error > ang_momentum_tol
    }
}

/// Relative error, falling back to absolute when the baseline is ~0 (radial orbits, E = 0)
fn relative(delta: f64, scale: f64) -> f64 {
    if scale > 1e-12 {
        delta.abs() / scale
    } else {
        delta.abs()
    }
}

/// Largest drift observed over a whole trajectory, measured against frame 0
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriftReport {
    pub max_energy_error: f64,
    pub max_angular_momentum_error: f64,
}

#[allow(non_snake_case)]
pub fn conservation_drift(trajectory: &Trajectory, body: &Body, central: &CentralMass, G: f64) -> DriftReport {
    let Some(first) = trajectory.first() else {
        return DriftReport::default();
    };
    let baseline = ConservationState::new(body, first, central, G);

    trajectory.iter().fold(DriftReport::default(), |acc, s| {
        let m = ConservationMonitor::check(&baseline, body, s, central, G);
        DriftReport {
            max_energy_error: acc.max_energy_error.max(m.energy_error),
            max_angular_momentum_error: acc.max_angular_momentum_error.max(m.angular_momentum_error),
        }
    })
}
