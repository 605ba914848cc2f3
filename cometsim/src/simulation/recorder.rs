//! Trajectory recording
//!
//! A [`Recorder`] owns one validated run (body, central mass, config) and
//! drives the integrator step by step. Frames are available either lazily
//! through [`Recorder::frames`] or collected into a [`Trajectory`] with
//! [`Recorder::run`]. Frame 0 is always the body's initial state.

use std::iter::FusedIterator;
use std::ops::Index;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use super::error::{RunFailure, SimError};
use super::forces::NewtonianGravity;
use super::integrator::{advance, AdaptiveStepper};
use super::params::SimulationConfig;
use super::states::{Body, CentralMass, NVec3, State};

/// Ordered, append-only sequence of states produced by one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    frames: Vec<State>,
}

impl Trajectory {
    pub fn with_capacity(n: usize) -> Self {
        Self { frames: Vec::with_capacity(n) }
    }

    pub(crate) fn push(&mut self, s: State) {
        self.frames.push(s);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&State> {
        self.frames.get(i)
    }

    pub fn first(&self) -> Option<&State> {
        self.frames.first()
    }

    pub fn last(&self) -> Option<&State> {
        self.frames.last()
    }

    pub fn states(&self) -> &[State] {
        &self.frames
    }

    pub fn iter(&self) -> std::slice::Iter<'_, State> {
        self.frames.iter()
    }

    pub fn positions(&self) -> impl Iterator<Item = NVec3> + '_ {
        self.frames.iter().map(|s| s.x)
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.frames.iter().map(|s| s.t)
    }

    /// Index of the frame whose time is closest to `t`
    ///
    /// Ties go to the earlier frame. `None` for an empty trajectory.
    pub fn index_at_time(&self, t: f64) -> Option<usize> {
        // times are non-decreasing, so binary search for the first frame at or after t
        let after = self.frames.partition_point(|s| s.t < t);
        match (after.checked_sub(1), self.frames.get(after)) {
            (None, None) => None,
            (None, Some(_)) => Some(after),
            (Some(before), None) => Some(before),
            (Some(before), Some(next)) => {
                if (t - self.frames[before].t) <= (next.t - t) {
                    Some(before)
                } else {
                    Some(after)
                }
            }
        }
    }
}

impl Index<usize> for Trajectory {
    type Output = State;

    fn index(&self, i: usize) -> &State {
        &self.frames[i]
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a State;
    type IntoIter = std::slice::Iter<'a, State>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// One validated simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct Recorder {
    body: Body,
    central: CentralMass,
    config: SimulationConfig,
}

impl Recorder {
    /// Validate inputs eagerly; nothing is integrated until frames are pulled
    pub fn new(body: Body, central: CentralMass, config: SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        // Fields are public, so re-check what the constructors check
        Body::new(body.m, body.initial)?;
        CentralMass::new(central.m, central.x)?;
        Ok(Self { body, central, config })
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn central(&self) -> &CentralMass {
        &self.central
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Lazy frame sequence, starting from the initial state
    ///
    /// Finite (at most `steps + 1` items, nothing after an error) and
    /// restartable: every call begins a fresh run.
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            recorder: self,
            gravity: NewtonianGravity::from_config(&self.central, &self.config),
            adaptive: self
                .config
                .adaptive
                .map(|p| AdaptiveStepper::new(p, self.config.integrator, self.config.h0)),
            current: None,
            step: 0,
            done: false,
        }
    }

    /// Record the whole run
    ///
    /// On failure the frames recorded so far are returned inside [`RunFailure`].
    pub fn run(&self) -> Result<Trajectory, RunFailure> {
        self.record(|| false)
    }

    /// Like [`run`](Self::run), checking `cancel` between steps
    pub fn run_with_cancel(&self, cancel: &AtomicBool) -> Result<Trajectory, RunFailure> {
        self.record(|| cancel.load(Ordering::Relaxed))
    }

    /// `cancelled` is consulted only while a step remains to be taken
    fn record(&self, mut cancelled: impl FnMut() -> bool) -> Result<Trajectory, RunFailure> {
        debug!(
            steps = self.config.steps,
            h0 = self.config.h0,
            integrator = ?self.config.integrator,
            adaptive = self.config.adaptive.is_some(),
            "starting run"
        );

        let mut trajectory = Trajectory::with_capacity(self.config.steps + 1);
        let mut frames = self.frames();

        loop {
            // frame 0 is the initial state, so frame n + 1 is produced by step n
            let pending = !trajectory.is_empty() && frames.steps_taken() < self.config.steps;
            if pending && cancelled() {
                let step = frames.steps_taken();
                warn!(step, "run cancelled");
                return Err(RunFailure { partial: trajectory, error: SimError::Cancelled { step } });
            }

            match frames.next() {
                Some(Ok(s)) => trajectory.push(s),
                Some(Err(error)) => {
                    warn!(frames = trajectory.len(), "run stopped early: {error}");
                    return Err(RunFailure { partial: trajectory, error });
                }
                None => break,
            }
        }

        debug!(frames = trajectory.len(), "run complete");
        Ok(trajectory)
    }
}

/// Lazy, finite frame producer returned by [`Recorder::frames`]
pub struct Frames<'a> {
    recorder: &'a Recorder,
    gravity: NewtonianGravity,
    adaptive: Option<AdaptiveStepper>,
    current: Option<State>,
    step: usize,
    done: bool,
}

impl Frames<'_> {
    /// Number of steps taken so far
    pub fn steps_taken(&self) -> usize {
        self.step
    }

    /// Step size the adaptive controller will try next, `None` in fixed-step mode
    pub fn adaptive_h(&self) -> Option<f64> {
        self.adaptive.as_ref().map(AdaptiveStepper::h)
    }
}

impl Iterator for Frames<'_> {
    type Item = Result<State, SimError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some(current) = self.current else {
            let initial = self.recorder.body.initial;
            self.current = Some(initial);
            return Some(Ok(initial));
        };

        if self.step >= self.recorder.config.steps {
            self.done = true;
            return None;
        }

        let cfg = &self.recorder.config;
        let next = match self.adaptive.as_mut() {
            Some(stepper) => stepper.step(&current, &self.gravity),
            None => advance(&current, &self.gravity, cfg.integrator, cfg.h0),
        };

        match next {
            Ok(s) => {
                self.step += 1;
                self.current = Some(s);
                Some(Ok(s))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = self.recorder.config.steps - self.step + usize::from(self.current.is_none());
        (0, Some(remaining))
    }
}

impl FusedIterator for Frames<'_> {}
