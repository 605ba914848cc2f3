use std::time::Instant;

use crate::configuration::config::IntegratorConfig;
use crate::simulation::forces::NewtonianGravity;
use crate::simulation::integrator::advance;
use crate::simulation::kepler::KeplerOrbit;
use crate::simulation::params::SimulationConfig;
use crate::simulation::recorder::Recorder;
use crate::simulation::states::{Body, CentralMass, NVec3, State};

const METHODS: [IntegratorConfig; 3] = [IntegratorConfig::Verlet, IntegratorConfig::Leapfrog, IntegratorConfig::Rk4];

/// Eccentric (e = 0.44) bound orbit around a unit central mass, starting at periapsis
fn eccentric_start() -> State {
    State::new(NVec3::new(1.0, 0.0, 0.0), NVec3::new(0.0, 1.2, 0.0), 0.0)
}

/// Time a single integrator step for each method
pub fn bench_step() {
    let steps = 1_000_000;
    let sun = CentralMass { m: 1.0, x: NVec3::zeros() };
    let gravity = NewtonianGravity::new(1.0, sun);

    for method in METHODS {
        let mut s = eccentric_start();

        // Warm-up
        for _ in 0..1000 {
            if let Ok(next) = advance(&s, &gravity, method, 1e-3) {
                s = next;
            }
        }

        let t0 = Instant::now();
        for _ in 0..steps {
            match advance(&s, &gravity, method, 1e-3) {
                Ok(next) => s = next,
                Err(e) => {
                    println!("{method:?}: step failed: {e}");
                    break;
                }
            }
        }
        let ns_per_step = t0.elapsed().as_secs_f64() * 1e9 / steps as f64;

        println!("{:>8}: {:8.2} ns/step", format!("{method:?}"), ns_per_step);
    }
}

/// Position error against the Kepler solution at t = 2 for halving step sizes
/// Paste output directly into a spreadsheet to graph
pub fn bench_convergence() {
    let sun = CentralMass { m: 1.0, x: NVec3::zeros() };
    let start = eccentric_start();
    let Some(orbit) = KeplerOrbit::from_state(&start, &sun, 1.0) else {
        println!("start state has no Kepler orbit");
        return;
    };

    let t_end = 2.0;
    let exact = orbit.state_at(t_end).x;

    println!("h,verlet_err,leapfrog_err,rk4_err");

    // Powers of two keep t_end exactly representable as steps * h
    for k in 4..=12 {
        let steps = 1usize << k;
        let h = t_end / steps as f64;

        let errors: Vec<String> = METHODS
            .iter()
            .map(|&method| {
                let err = SimulationConfig::new(h, steps, 1.0)
                    .map(|cfg| cfg.with_integrator(method))
                    .and_then(|cfg| Recorder::new(Body { m: 1.0, initial: start }, sun, cfg))
                    .ok()
                    .and_then(|rec| rec.run().ok())
                    .and_then(|traj| traj.last().map(|s| (s.x - exact).norm()));
                match err {
                    Some(e) => format!("{e:.3e}"),
                    None => "nan".to_string(),
                }
            })
            .collect();

        println!("{},{}", h, errors.join(","));
    }
}
