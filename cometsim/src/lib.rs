pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;

pub use simulation::states::{Body, CentralMass, State, NVec3};
pub use simulation::error::{SimError, RunFailure};
pub use simulation::params::{SimulationConfig, DEFAULT_MIN_DIST};
pub use simulation::engine::{AdaptiveParams, SingularityPolicy};
pub use simulation::forces::{acceleration, Acceleration, NewtonianGravity};
pub use simulation::integrator::{step, advance, AdaptiveStepper};
pub use simulation::recorder::{Recorder, Trajectory, Frames};
pub use simulation::diagnostics::{conservation_drift, total_energy, angular_momentum, DriftReport};
pub use simulation::kepler::{KeplerOrbit, Conic};
pub use simulation::reference::ReferenceOrbit;
pub use simulation::scenario::Scenario;
pub use simulation::sweep::run_sweep;

pub use configuration::config::{IntegratorConfig, EngineConfig, ParametersConfig, BodyConfig, CentralConfig, ScenarioConfig};

pub use visualization::export::write_csv;
#[cfg(feature = "viewer")]
pub use visualization::comet_vis3d::{run_3d, Playback};

pub use benchmark::benchmark::{bench_step, bench_convergence};
