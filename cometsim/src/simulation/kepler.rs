//! Closed-form two-body propagation
//!
//! Converts a state into a conic (elliptic or hyperbolic) about a fixed
//! central mass and evaluates it at any time by solving Kepler's equation.
//! Used as the reference solution the integrators converge to.

use std::f64::consts::PI;

use super::states::{CentralMass, NVec3, State};

/// Eccentricities this close to 0 are treated as circular
const CIRCULAR_EPS: f64 = 1e-10;
/// Eccentricities this close to 1 are treated as parabolic (unsupported)
const PARABOLIC_EPS: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conic {
    Elliptic,
    Hyperbolic,
}

/// Keplerian orbit fixed at an epoch
#[derive(Debug, Clone, Copy)]
pub struct KeplerOrbit {
    mu: f64,      // G M
    a: f64,       // semi-major axis (negative for hyperbolae)
    e: f64,       // eccentricity
    n: f64,       // mean motion
    p_hat: NVec3, // unit vector toward periapsis
    q_hat: NVec3, // completes the perifocal frame in the direction of motion
    center: NVec3,
    m0: f64, // mean anomaly at epoch
    t0: f64, // epoch
}

impl KeplerOrbit {
    /// Orbit through `s` around `central`
    ///
    /// `None` for radial, parabolic or zero-radius states.
    #[allow(non_snake_case)]
    pub fn from_state(s: &State, central: &CentralMass, G: f64) -> Option<Self> {
        let mu = G * central.m;
        let r = s.x - central.x;
        let v = s.v;
        let rn = r.norm();
        let h = r.cross(&v);
        let hn = h.norm();
        if rn == 0.0 || hn <= f64::EPSILON * rn * v.norm() {
            return None;
        }

        // Eccentricity vector: ((v^2 - mu/r) r - (r.v) v) / mu
        let rv = r.dot(&v);
        let e_vec = ((v.norm_squared() - mu / rn) * r - rv * v) / mu;
        let e = e_vec.norm();
        if (e - 1.0).abs() < PARABOLIC_EPS {
            return None;
        }

        let energy = 0.5 * v.norm_squared() - mu / rn;
        let a = -mu / (2.0 * energy);

        let circular = e < CIRCULAR_EPS;
        let p_hat = if circular { r / rn } else { e_vec / e };
        let q_hat = (h / hn).cross(&p_hat);

        let (n, m0) = if e < 1.0 {
            let n = (mu / (a * a * a)).sqrt();
            let ecc_anomaly = if circular {
                0.0
            } else {
                let cos_e = (1.0 - rn / a) / e;
                let sin_e = rv / (e * (mu * a).sqrt());
                sin_e.atan2(cos_e)
            };
            (n, ecc_anomaly - e * ecc_anomaly.sin())
        } else {
            let big_a = -a;
            let n = (mu / (big_a * big_a * big_a)).sqrt();
            let sinh_h = rv / (e * (mu * big_a).sqrt());
            let hyp_anomaly = sinh_h.asinh();
            (n, e * hyp_anomaly.sinh() - hyp_anomaly)
        };

        Some(Self {
            mu,
            a,
            e: if circular { 0.0 } else { e },
            n,
            p_hat,
            q_hat,
            center: central.x,
            m0,
            t0: s.t,
        })
    }

    pub fn conic(&self) -> Conic {
        if self.e < 1.0 {
            Conic::Elliptic
        } else {
            Conic::Hyperbolic
        }
    }

    pub fn eccentricity(&self) -> f64 {
        self.e
    }

    pub fn semi_major_axis(&self) -> f64 {
        self.a
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Orbital period; `None` for hyperbolic orbits
    pub fn period(&self) -> Option<f64> {
        match self.conic() {
            Conic::Elliptic => Some(2.0 * PI / self.n),
            Conic::Hyperbolic => None,
        }
    }

    /// Closest approach to the central mass
    pub fn periapsis(&self) -> f64 {
        (self.a * (1.0 - self.e)).abs()
    }

    /// Exact state at time `t`
    pub fn state_at(&self, t: f64) -> State {
        let m = self.m0 + self.n * (t - self.t0);

        let (x_pf, y_pf, vx_pf, vy_pf) = match self.conic() {
            Conic::Elliptic => {
                let ea = solve_elliptic(m, self.e);
                let (sin_e, cos_e) = ea.sin_cos();
                let b = self.a * (1.0 - self.e * self.e).sqrt();
                let e_dot = self.n / (1.0 - self.e * cos_e);
                (
                    self.a * (cos_e - self.e),
                    b * sin_e,
                    -self.a * sin_e * e_dot,
                    b * cos_e * e_dot,
                )
            }
            Conic::Hyperbolic => {
                let big_a = -self.a;
                let ha = solve_hyperbolic(m, self.e);
                let (sinh_h, cosh_h) = (ha.sinh(), ha.cosh());
                let b = big_a * (self.e * self.e - 1.0).sqrt();
                let h_dot = self.n / (self.e * cosh_h - 1.0);
                (
                    big_a * (self.e - cosh_h),
                    b * sinh_h,
                    -big_a * sinh_h * h_dot,
                    b * cosh_h * h_dot,
                )
            }
        };

        State {
            x: self.center + x_pf * self.p_hat + y_pf * self.q_hat,
            v: vx_pf * self.p_hat + vy_pf * self.q_hat,
            t,
        }
    }
}

/// Solve M = E - e sin(E) for E (Newton-Raphson)
fn solve_elliptic(mean_anomaly: f64, e: f64) -> f64 {
    // Position only depends on E mod 2pi, so wrap M into (-pi, pi]
    let m = mean_anomaly - 2.0 * PI * (mean_anomaly / (2.0 * PI)).round();
    let mut ea = if e < 0.8 { m } else { PI.copysign(m) };

    for _ in 0..100 {
        let f = ea - e * ea.sin() - m;
        let fp = 1.0 - e * ea.cos();
        let delta = f / fp;
        ea -= delta;
        if delta.abs() < 1e-15 {
            break;
        }
    }
    ea
}

/// Solve M = e sinh(H) - H for H (Newton-Raphson)
fn solve_hyperbolic(m: f64, e: f64) -> f64 {
    let mut ha = (m / e).asinh();

    for _ in 0..100 {
        let f = e * ha.sinh() - ha - m;
        let fp = e * ha.cosh() - 1.0;
        let delta = f / fp;
        ha -= delta;
        if delta.abs() < 1e-15 {
            break;
        }
    }
    ha
}
