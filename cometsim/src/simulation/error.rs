//! Error types for the simulation core

use thiserror::Error;

use super::recorder::Trajectory;

/// Failures raised while configuring or advancing a run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Non-positive mass, step size or step count (detected before a run starts)
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Body coincides with, or is closer than `min_dist` to, the central mass
    #[error("singularity: body is {distance:e} from the central mass (minimum {min_dist:e})")]
    Singularity { distance: f64, min_dist: f64 },

    /// A step produced a non-finite position or velocity
    #[error("non-finite state produced by step ending at t = {t}")]
    NonFiniteState { t: f64 },

    /// The driving loop observed the cancellation flag
    #[error("run cancelled before step {step}")]
    Cancelled { step: usize },
}

/// A run that stopped early, together with everything recorded up to the failure
#[derive(Error, Debug, Clone, PartialEq)]
#[error("run stopped after {} frame(s): {error}", .partial.len())]
pub struct RunFailure {
    pub partial: Trajectory,
    #[source]
    pub error: SimError,
}
