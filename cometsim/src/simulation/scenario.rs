//! Build fully-initialized comet scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! `Scenario`, containing:
//! - numerical parameters (`SimulationConfig`)
//! - the comet (`Body`) and the attractor (`CentralMass`)
//! - reference orbits and the marker time for renderers
//!
//! A scenario is turned into a `Recorder` to run it.

use crate::configuration::config::{ScenarioConfig, OrbitConfig};
use crate::simulation::engine::{AdaptiveParams, SingularityPolicy};
use crate::simulation::error::SimError;
use crate::simulation::params::{SimulationConfig, DEFAULT_MIN_DIST};
use crate::simulation::recorder::Recorder;
use crate::simulation::reference::ReferenceOrbit;
use crate::simulation::states::{Body, CentralMass, NVec3, State};

/// Runtime bundle constructed from a [`ScenarioConfig`]
///
/// Holds everything one run needs plus the context a renderer draws
/// around the trajectory.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub parameters: SimulationConfig,
    pub body: Body,
    pub central: CentralMass,
    pub reference_orbits: Vec<ReferenceOrbit>,
    pub marker_time: Option<f64>,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, SimError> {
        // Central mass: map `CentralConfig` -> runtime `CentralMass`
        let central = CentralMass::new(cfg.central.m, vec3("central.x", &cfg.central.x)?)?;

        // Body: initial state at the configured time (0 unless given)
        let initial = State::new(
            vec3("body.x", &cfg.body.x)?,
            vec3("body.v", &cfg.body.v)?,
            cfg.body.t,
        );
        let body = Body::new(cfg.body.m, initial)?;

        // Engine settings
        let e_cfg = cfg.engine;
        let adaptive = e_cfg.adaptive.map(|a| {
            let params = AdaptiveParams::new(a.tolerance, a.h_min, a.h_max);
            match a.max_retries {
                Some(n) => params.with_max_retries(n),
                None => params,
            }
        });

        // Parameters (runtime) from ParametersConfig
        let p_cfg = cfg.parameters;
        let parameters = SimulationConfig {
            h0: p_cfg.h0,
            steps: p_cfg.steps,
            G: p_cfg.G,
            min_dist: p_cfg.min_dist.unwrap_or(DEFAULT_MIN_DIST),
            singularity: if e_cfg.clamp_singularity {
                SingularityPolicy::Clamp
            } else {
                SingularityPolicy::Fail
            },
            integrator: e_cfg.integrator,
            adaptive,
        };
        parameters.validate()?;

        let reference_orbits = cfg
            .reference_orbits
            .iter()
            .map(|o: &OrbitConfig| ReferenceOrbit::new(o.name.clone(), o.radius, o.phase))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            parameters,
            body,
            central,
            reference_orbits,
            marker_time: cfg.marker_time,
        })
    }

    /// Parse and build a scenario from YAML text
    pub fn from_yaml(text: &str) -> Result<Self, SimError> {
        let cfg: ScenarioConfig = serde_yaml::from_str(text)
            .map_err(|e| SimError::Configuration(format!("scenario yaml: {e}")))?;
        Self::build_scenario(cfg)
    }

    /// Gravitational parameter G M of the central mass
    pub fn mu(&self) -> f64 {
        self.parameters.G * self.central.m
    }

    pub fn recorder(&self) -> Result<Recorder, SimError> {
        Recorder::new(self.body, self.central, self.parameters)
    }
}

fn vec3(field: &str, values: &[f64]) -> Result<NVec3, SimError> {
    match values {
        [x, y, z] => Ok(NVec3::new(*x, *y, *z)),
        _ => Err(SimError::Configuration(format!(
            "{field} needs 3 components, got {}",
            values.len()
        ))),
    }
}
