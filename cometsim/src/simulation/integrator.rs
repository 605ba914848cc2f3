//! Time integrators for a single body under an [`Acceleration`]
//!
//! Provides fixed-step velocity-Verlet, single-evaluation leapfrog and
//! classical RK4, all pure (`&State` in, new `State` out), plus a
//! step-doubling adaptive stepper built on top of them

use tracing::{trace, warn};

use crate::configuration::config::IntegratorConfig;
use super::engine::AdaptiveParams;
use super::error::SimError;
use super::forces::{Acceleration, NewtonianGravity};
use super::params::SimulationConfig;
use super::states::{Body, CentralMass, State};

/// Advance `state` by one step of `config.h0` with the configured fixed-step method
///
/// The body's own mass does not enter a test-particle force law; it is part
/// of the signature so every step is tied to the run that owns it.
pub fn step(state: &State, _body: &Body, central: &CentralMass, config: &SimulationConfig) -> Result<State, SimError> {
    let gravity = NewtonianGravity::from_config(central, config);
    advance(state, &gravity, config.integrator, config.h0)
}

/// Advance `state` by `h` using `method`, failing on singular or non-finite results
pub fn advance<A>(state: &State, forces: &A, method: IntegratorConfig, h: f64) -> Result<State, SimError>
where
    A: Acceleration + ?Sized,
{
    let next = match method {
        IntegratorConfig::Verlet => verlet(state, forces, h)?,
        IntegratorConfig::Leapfrog => leapfrog(state, forces, h)?,
        IntegratorConfig::Rk4 => rk4(state, forces, h)?,
    };

    if !next.is_finite() {
        return Err(SimError::NonFiniteState { t: next.t });
    }
    Ok(next)
}

/// Velocity-Verlet (kick-drift-kick), two force evaluations per step
fn verlet<A: Acceleration + ?Sized>(s: &State, forces: &A, h: f64) -> Result<State, SimError> {
    let half_h = 0.5 * h;

    // a_n from x_n
    let a_old = forces.acceleration(&s.x)?;

    // Kick: v_n+1/2 = v_n + (h/2) a_n
    let v_half = s.v + half_h * a_old;

    // Drift: x_n+1 = x_n + h v_n+1/2
    let x = s.x + h * v_half;

    // a_n+1 from x_n+1
    let a_new = forces.acceleration(&x)?;

    // Second kick: v_n+1 = v_n+1/2 + (h/2) a_n+1
    let v = v_half + half_h * a_new;

    Ok(State { x, v, t: s.t + h })
}

/// Drift-kick-drift leapfrog, one force evaluation per step
fn leapfrog<A: Acceleration + ?Sized>(s: &State, forces: &A, h: f64) -> Result<State, SimError> {
    let half_h = 0.5 * h;

    // Drift: x_half = x_n + (h/2) v_n
    let x_half = s.x + half_h * s.v;

    // Kick: v_n+1 = v_n + h a(x_half)
    let a_mid = forces.acceleration(&x_half)?;
    let v = s.v + h * a_mid;

    // Second drift: x_n+1 = x_half + (h/2) v_n+1
    let x = x_half + half_h * v;

    Ok(State { x, v, t: s.t + h })
}

/// Classical fourth-order Runge-Kutta on (x, v), four force evaluations per step
fn rk4<A: Acceleration + ?Sized>(s: &State, forces: &A, h: f64) -> Result<State, SimError> {
    let half_h = 0.5 * h;

    let k1x = s.v;
    let k1v = forces.acceleration(&s.x)?;

    let k2x = s.v + half_h * k1v;
    let k2v = forces.acceleration(&(s.x + half_h * k1x))?;

    let k3x = s.v + half_h * k2v;
    let k3v = forces.acceleration(&(s.x + half_h * k2x))?;

    let k4x = s.v + h * k3v;
    let k4v = forces.acceleration(&(s.x + h * k3x))?;

    let sixth_h = h / 6.0;
    let x = s.x + sixth_h * (k1x + 2.0 * k2x + 2.0 * k3x + k4x);
    let v = s.v + sixth_h * (k1v + 2.0 * k2v + 2.0 * k3v + k4v);

    Ok(State { x, v, t: s.t + h })
}

/// Adaptive step-size controller using step doubling.
///
/// Each step is taken once with `h` and once as two `h/2` steps. The
/// difference estimates the local truncation error:
/// - above `tolerance`: reject, halve `h` (never below `h_min`)
/// - below `tolerance / 2^(order+1)`: accept, double `h` for the next step (never above `h_max`)
/// - otherwise: accept and keep `h`
///
/// The more accurate two-half-step result is the one returned.
#[derive(Debug, Clone)]
pub struct AdaptiveStepper {
    params: AdaptiveParams,
    method: IntegratorConfig,
    h: f64,
    /// Number of accepted steps
    pub accepted_steps: usize,
    /// Number of rejected trial steps
    pub rejected_steps: usize,
}

impl AdaptiveStepper {
    pub fn new(params: AdaptiveParams, method: IntegratorConfig, h0: f64) -> Self {
        Self {
            params,
            method,
            h: h0.clamp(params.h_min, params.h_max),
            accepted_steps: 0,
            rejected_steps: 0,
        }
    }

    /// Step size the next call to [`step`](Self::step) will try first
    pub fn h(&self) -> f64 {
        self.h
    }

    pub fn step<A: Acceleration + ?Sized>(&mut self, s: &State, forces: &A) -> Result<State, SimError> {
        let AdaptiveParams { tolerance, h_min, h_max, max_retries } = self.params;
        let grow_below = tolerance / f64::powi(2.0, self.method.order() as i32 + 1);
        let mut retries = 0;

        loop {
            let h = self.h;
            let trial = advance(s, forces, self.method, h).and_then(|full| {
                let half = advance(s, forces, self.method, 0.5 * h)?;
                let two_half = advance(&half, forces, self.method, 0.5 * h)?;
                Ok((full, two_half))
            });

            match trial {
                Ok((full, two_half)) => {
                    let err = local_error(&full, &two_half);

                    if err > tolerance && h > h_min {
                        self.h = (0.5 * h).max(h_min);
                        self.rejected_steps += 1;
                        trace!(t = s.t, h, err, "adaptive step rejected");
                        continue;
                    }
                    if err > tolerance {
                        warn!(t = s.t, h, err, tolerance, "accepting step at h_min above tolerance");
                    }

                    self.accepted_steps += 1;
                    if err < grow_below {
                        self.h = (2.0 * h).min(h_max);
                    }
                    // Two half steps may round differently from t + h
                    return Ok(State { t: s.t + h, ..two_half });
                }
                Err(SimError::NonFiniteState { t }) if retries < max_retries && h > h_min => {
                    retries += 1;
                    self.rejected_steps += 1;
                    self.h = (0.5 * h).max(h_min);
                    trace!(t, h, retries, "non-finite trial step, reducing h");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Largest relative difference between two estimates of the same step
fn local_error(coarse: &State, fine: &State) -> f64 {
    let ex = (coarse.x - fine.x).norm() / fine.x.norm().max(1e-6);
    let ev = (coarse.v - fine.v).norm() / fine.v.norm().max(1e-6);
    ex.max(ev)
}
