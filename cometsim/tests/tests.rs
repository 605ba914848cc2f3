use std::sync::atomic::AtomicBool;

use approx::assert_relative_eq;

use cometsim::simulation::integrator::step;
use cometsim::{acceleration, conservation_drift, run_sweep, write_csv};
use cometsim::{AdaptiveParams, Body, CentralMass, IntegratorConfig, KeplerOrbit, NVec3, Recorder, ReferenceOrbit, Scenario, SimError, SimulationConfig, State};

const METHODS: [IntegratorConfig; 3] = [IntegratorConfig::Verlet, IntegratorConfig::Leapfrog, IntegratorConfig::Rk4];

/// Unit central mass at the origin
pub fn sun() -> CentralMass {
    CentralMass::at_origin(1.0).unwrap()
}

/// Body of unit mass starting at `x` with velocity `v`
pub fn comet(x: [f64; 3], v: [f64; 3]) -> Body {
    Body::new(1.0, State::new(x.into(), v.into(), 0.0)).unwrap()
}

/// Unit circular orbit (period 2 pi with G = M = 1)
pub fn circular() -> Body {
    comet([1.0, 0.0, 0.0], [0.0, 1.0, 0.0])
}

/// e = 0.44 orbit starting at periapsis
pub fn eccentric() -> Body {
    comet([1.0, 0.0, 0.0], [0.0, 1.2, 0.0])
}

pub fn recorder(body: Body, h: f64, steps: usize, method: IntegratorConfig) -> Recorder {
    let cfg = SimulationConfig::new(h, steps, 1.0).unwrap().with_integrator(method);
    Recorder::new(body, sun(), cfg).unwrap()
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_points_toward_central_mass() {
    let x = NVec3::new(2.0, -1.0, 0.5);
    let a = acceleration(&x, &sun(), 1.0).unwrap();

    assert!(a.dot(&(-x)) > 0.0, "Acceleration is not toward the central mass");
    assert_relative_eq!(a.normalize().dot(&(-x.normalize())), 1.0, epsilon = 1e-12);
}

#[test]
fn gravity_inverse_square_law() {
    let a_r = acceleration(&NVec3::new(1.0, 0.0, 0.0), &sun(), 0.1).unwrap();
    let a_2r = acceleration(&NVec3::new(2.0, 0.0, 0.0), &sun(), 0.1).unwrap();

    assert_relative_eq!(a_r.norm(), 0.1, epsilon = 1e-15);
    assert_relative_eq!(a_r.norm() / a_2r.norm(), 4.0, epsilon = 1e-12);
}

#[test]
fn gravity_singularity_is_an_error() {
    let near = acceleration(&NVec3::new(1e-12, 0.0, 0.0), &sun(), 1.0);
    assert!(matches!(near, Err(SimError::Singularity { .. })));

    let exact = acceleration(&NVec3::zeros(), &sun(), 1.0);
    assert!(matches!(exact, Err(SimError::Singularity { .. })));
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn step_advances_time_by_step_size() {
    let body = circular();
    let cfg = SimulationConfig::new(0.25, 1, 1.0).unwrap();

    let s1 = step(&body.initial, &body, &sun(), &cfg).unwrap();
    assert_eq!(s1.t, 0.25);
    assert!(s1.x.y > 0.0);
}

#[test]
fn unit_circle_closes_after_one_period() {
    for method in METHODS {
        let traj = recorder(circular(), 0.01, 628, method).run().unwrap();
        assert_eq!(traj.len(), 629);

        let last = traj.last().unwrap();
        let gap = (last.x - NVec3::new(1.0, 0.0, 0.0)).norm();
        assert!(gap < 1e-2, "{method:?}: orbit did not close, gap = {gap}");
        assert_relative_eq!(last.x.norm(), 1.0, epsilon = 1e-3);
    }
}

#[test]
fn energy_and_angular_momentum_drift_bounded() {
    let body = eccentric();
    let period = KeplerOrbit::from_state(&body.initial, &sun(), 1.0).unwrap().period().unwrap();
    let h = 1e-3;
    let steps = (2.0 * period / h).ceil() as usize;

    for method in METHODS {
        let traj = recorder(body, h, steps, method).run().unwrap();
        assert!(traj.last().unwrap().t >= 2.0 * period);
        let drift = conservation_drift(&traj, &body, &sun(), 1.0);

        assert!(drift.max_energy_error < 1e-2, "{method:?}: energy drift {}", drift.max_energy_error);
        assert!(
            drift.max_angular_momentum_error < 1e-2,
            "{method:?}: angular momentum drift {}",
            drift.max_angular_momentum_error
        );
    }
}

#[test]
fn runs_are_deterministic() {
    for method in METHODS {
        let rec = recorder(eccentric(), 0.01, 1000, method);
        let a = rec.run().unwrap();
        let b = rec.run().unwrap();
        assert_eq!(a.states(), b.states());

        // a fresh recorder with the same inputs gives the same frames too
        let c = recorder(eccentric(), 0.01, 1000, method).run().unwrap();
        assert_eq!(a, c);
    }
}

#[test]
fn halving_step_size_reduces_error_against_kepler() {
    let body = eccentric();
    let orbit = KeplerOrbit::from_state(&body.initial, &sun(), 1.0).unwrap();
    assert_relative_eq!(orbit.eccentricity(), 0.44, epsilon = 1e-12);

    let t_end = 2.0;
    let exact = orbit.state_at(t_end);

    for method in METHODS {
        let errors: Vec<f64> = [128usize, 256, 512]
            .iter()
            .map(|&steps| {
                let traj = recorder(body, t_end / steps as f64, steps, method).run().unwrap();
                let last = traj.last().unwrap();
                assert_eq!(last.t, t_end);
                (last.x - exact.x).norm()
            })
            .collect();

        assert!(errors[1] < errors[0], "{method:?}: {errors:?}");
        assert!(errors[2] < errors[1], "{method:?}: {errors:?}");
    }
}

#[test]
fn time_advances_by_exactly_one_step() {
    // dyadic step: every t = i * h is exactly representable
    let h = 1.0 / 128.0;
    let traj = recorder(circular(), h, 300, IntegratorConfig::Verlet).run().unwrap();
    for w in traj.states().windows(2) {
        assert_eq!(w[1].t - w[0].t, h);
    }

    let h = 0.01;
    let traj = recorder(circular(), h, 300, IntegratorConfig::Rk4).run().unwrap();
    for w in traj.states().windows(2) {
        assert_relative_eq!(w[1].t - w[0].t, h, epsilon = 1e-12);
        assert!(w[1].t > w[0].t);
    }
}

// ==================================================================================
// Failure tests
// ==================================================================================

#[test]
fn singularity_at_step_zero_keeps_initial_frame() {
    let body = comet([1e-12, 0.0, 0.0], [0.0, 0.0, 0.0]);
    let failure = recorder(body, 0.01, 100, IntegratorConfig::Verlet).run().unwrap_err();

    assert!(matches!(failure.error, SimError::Singularity { .. }));
    assert_eq!(failure.partial.len(), 1);
    assert_eq!(failure.partial[0], body.initial);
}

#[test]
fn frames_stop_after_an_error() {
    let body = comet([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
    let rec = recorder(body, 0.01, 100, IntegratorConfig::Rk4);
    let mut frames = rec.frames();

    assert!(matches!(frames.next(), Some(Ok(_))));
    assert!(matches!(frames.next(), Some(Err(SimError::Singularity { .. }))));
    assert!(frames.next().is_none());
    assert!(frames.next().is_none());
}

#[test]
fn clamping_is_opt_in() {
    let body = comet([1e-12, 0.0, 0.0], [0.0, 0.0, 0.0]);
    let cfg = SimulationConfig::new(0.01, 10, 1.0).unwrap().with_clamping();
    let traj = Recorder::new(body, sun(), cfg).unwrap().run().unwrap();

    assert_eq!(traj.len(), 11);
    assert!(traj.iter().all(State::is_finite));
}

#[test]
fn non_finite_state_is_detected() {
    let body = comet([1.0, 0.0, 0.0], [0.0, 1e300, 0.0]);
    let failure = recorder(body, 1e10, 5, IntegratorConfig::Verlet).run().unwrap_err();

    assert!(matches!(failure.error, SimError::NonFiniteState { .. }));
    assert_eq!(failure.partial.len(), 1);
}

#[test]
fn adaptive_gives_up_after_bounded_retries() {
    let body = comet([1.0, 0.0, 0.0], [0.0, 1e300, 0.0]);
    let adaptive = AdaptiveParams::new(1e-6, 1e9, 1e10).with_max_retries(3);
    let cfg = SimulationConfig::new(1e10, 5, 1.0).unwrap().with_adaptive(adaptive);
    let failure = Recorder::new(body, sun(), cfg).unwrap().run().unwrap_err();

    assert!(matches!(failure.error, SimError::NonFiniteState { .. }));
    assert_eq!(failure.partial.len(), 1);
}

#[test]
fn invalid_configuration_is_rejected_before_running() {
    let mut cfg = SimulationConfig::new(0.01, 10, 1.0).unwrap();
    cfg.steps = 0;
    assert!(matches!(Recorder::new(circular(), sun(), cfg), Err(SimError::Configuration(_))));

    let mut body = circular();
    body.m = -1.0;
    let cfg = SimulationConfig::new(0.01, 10, 1.0).unwrap();
    assert!(matches!(Recorder::new(body, sun(), cfg), Err(SimError::Configuration(_))));
}

#[test]
fn cancellation_stops_between_steps() {
    let rec = recorder(circular(), 0.01, 100, IntegratorConfig::Verlet);

    let cancel = AtomicBool::new(true);
    let failure = rec.run_with_cancel(&cancel).unwrap_err();
    assert_eq!(failure.error, SimError::Cancelled { step: 0 });
    assert_eq!(failure.partial.len(), 1);

    let cancel = AtomicBool::new(false);
    assert_eq!(rec.run_with_cancel(&cancel).unwrap().len(), 101);
}

// ==================================================================================
// Adaptive tests
// ==================================================================================

#[test]
fn adaptive_steps_shrink_near_periapsis() {
    let body = comet([1.0, 0.0, 0.0], [0.0, 0.3, 0.0]);
    let adaptive = AdaptiveParams::new(1e-9, 1e-6, 0.05);
    let cfg = SimulationConfig::new(0.01, 4000, 1.0)
        .unwrap()
        .with_integrator(IntegratorConfig::Rk4)
        .with_adaptive(adaptive);
    let traj = Recorder::new(body, sun(), cfg).unwrap().run().unwrap();
    assert_eq!(traj.len(), 4001);

    let dts: Vec<f64> = traj.states().windows(2).map(|w| w[1].t - w[0].t).collect();
    let min_dt = dts.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_dt = dts.iter().cloned().fold(0.0, f64::max);
    assert!(min_dt > 0.0);
    assert!(max_dt <= 0.05 + 1e-12);
    assert!(min_dt < 0.1 * max_dt, "steps did not adapt: {min_dt} .. {max_dt}");

    let drift = conservation_drift(&traj, &body, &sun(), 1.0);
    assert!(drift.max_energy_error < 1e-3, "energy drift {}", drift.max_energy_error);
}

// ==================================================================================
// Recorder / sweep tests
// ==================================================================================

#[test]
fn frames_are_lazy_and_restartable() {
    let rec = recorder(eccentric(), 0.01, 50, IntegratorConfig::Leapfrog);

    let first: Vec<State> = rec.frames().take(3).map(Result::unwrap).collect();
    assert_eq!(first.len(), 3);
    assert_eq!(first[0], rec.body().initial);

    let all: Vec<State> = rec.frames().collect::<Result<_, _>>().unwrap();
    assert_eq!(all.len(), 51);
    assert_eq!(&all[..3], &first[..]);
    assert_eq!(all, rec.run().unwrap().states());
}

#[test]
fn sweep_matches_sequential_runs() {
    let runs: Vec<Recorder> = [0.02, 0.01, 0.005]
        .iter()
        .map(|&h| recorder(eccentric(), h, 200, IntegratorConfig::Rk4))
        .chain(std::iter::once(recorder(
            comet([1e-12, 0.0, 0.0], [0.0, 0.0, 0.0]),
            0.01,
            10,
            IntegratorConfig::Verlet,
        )))
        .collect();

    let results = run_sweep(&runs);
    assert_eq!(results.len(), runs.len());
    for (rec, result) in runs.iter().zip(&results) {
        assert_eq!(&rec.run(), result);
    }
    assert!(results[3].is_err());
}

// ==================================================================================
// Scenario / export tests
// ==================================================================================

#[test]
fn unit_circle_scenario_loads_and_runs() {
    let scenario = Scenario::from_yaml(include_str!("../scenarios/unit_circle.yaml")).unwrap();
    assert_eq!(scenario.parameters.steps, 628);
    assert_eq!(scenario.parameters.integrator, IntegratorConfig::Verlet);
    assert_eq!(scenario.reference_orbits.len(), 1);

    let traj = scenario.recorder().unwrap().run().unwrap();
    assert_eq!(traj.len(), 629);
}

#[test]
fn hyperbolic_comet_scenario_tracks_kepler() {
    let scenario = Scenario::from_yaml(include_str!("../scenarios/atlas_2025.yaml")).unwrap();
    let orbit = KeplerOrbit::from_state(&scenario.body.initial, &scenario.central, scenario.parameters.G).unwrap();
    assert!(orbit.eccentricity() > 1.0);
    assert_relative_eq!(orbit.periapsis(), 1.36, epsilon = 1e-6);

    let traj = scenario.recorder().unwrap().run().unwrap();
    let last = traj.last().unwrap();
    assert_eq!(last.t, 150.0);
    assert!((last.x - orbit.state_at(last.t).x).norm() < 1e-3);

    let marker = scenario.marker_time.and_then(|t| traj.index_at_time(t));
    assert_eq!(marker, Some(1));
}

#[test]
fn scenario_rejects_bad_vectors() {
    let yaml = r#"
engine:
  integrator: "verlet"
parameters:
  h0: 0.01
  steps: 10
  G: 1.0
central:
  m: 1.0
body:
  x: [ 1.0, 0.0 ]
  v: [ 0.0, 1.0, 0.0 ]
  m: 1.0
"#;
    assert!(matches!(Scenario::from_yaml(yaml), Err(SimError::Configuration(_))));
}

#[test]
fn csv_export_has_one_row_per_frame() {
    let scenario = Scenario::from_yaml(include_str!("../scenarios/unit_circle.yaml")).unwrap();
    let body = comet([1e-12, 0.0, 0.0], [0.0, 0.0, 0.0]);
    let partial = recorder(body, 0.01, 10, IntegratorConfig::Verlet).run().unwrap_err().partial;
    let full = recorder(circular(), 0.01, 10, IntegratorConfig::Verlet).run().unwrap();

    let mut buf = Vec::new();
    write_csv(&mut buf, &full, &scenario.reference_orbits, &scenario.central.x, scenario.mu()).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "frame,t,x,y,z,vx,vy,vz,inner_x,inner_y,inner_z");
    assert_eq!(lines.len(), 12);
    assert!(lines[1].starts_with("0,0,1,0,0,0,1,0,0.5,0,0"));

    let mut buf = Vec::new();
    write_csv(&mut buf, &partial, &[], &NVec3::zeros(), 1.0).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 2);
}

#[test]
fn csv_export_quotes_orbit_names() {
    let traj = recorder(circular(), 0.01, 3, IntegratorConfig::Verlet).run().unwrap();
    let refs = [
        ReferenceOrbit::new("Jupiter, scaled", 5.2, 0.0).unwrap(),
        ReferenceOrbit::new("the \"red\" one", 1.5, 0.0).unwrap(),
    ];

    let mut buf = Vec::new();
    write_csv(&mut buf, &traj, &refs, &NVec3::zeros(), 1.0).unwrap();

    let mut reader = csv::Reader::from_reader(buf.as_slice());
    let header = reader.headers().unwrap().clone();
    assert_eq!(header.len(), 14);
    assert_eq!(&header[8], "Jupiter, scaled_x");
    assert_eq!(&header[13], "the \"red\" one_z");

    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 4);
    for row in &rows {
        assert_eq!(row.len(), header.len());
    }
    assert_eq!(&rows[0][8], "5.2");
}

#[test]
fn reference_orbits_circle_an_offset_central_mass() {
    let yaml = r#"
engine: {}
parameters:
  h0: 0.01
  steps: 5
  G: 1.0
central:
  m: 1.0
  x: [ 5.0, 0.0, 0.0 ]
body:
  x: [ 6.0, 0.0, 0.0 ]
  v: [ 0.0, 1.0, 0.0 ]
  m: 1.0
reference_orbits:
  - { name: earth, radius: 1.0, phase: 0.0 }
"#;
    let scenario = Scenario::from_yaml(yaml).unwrap();
    let traj = scenario.recorder().unwrap().run().unwrap();
    let earth = &scenario.reference_orbits[0];

    for p in earth.sample(&traj, scenario.mu(), &scenario.central.x) {
        assert_relative_eq!((p - scenario.central.x).norm(), 1.0, epsilon = 1e-12);
    }

    let mut buf = Vec::new();
    write_csv(&mut buf, &traj, &scenario.reference_orbits, &scenario.central.x, scenario.mu()).unwrap();
    let mut reader = csv::Reader::from_reader(buf.as_slice());
    let first = reader.records().next().unwrap().unwrap();
    assert_eq!(&first[8], "6");
    assert_eq!(&first[9], "0");
}
