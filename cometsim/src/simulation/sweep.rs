//! Parallel sweeps over independent runs
//!
//! Each run owns its recorder, so runs share no mutable state and can be
//! spread across the rayon pool.

use rayon::prelude::*;
use tracing::info;

use super::error::RunFailure;
use super::recorder::{Recorder, Trajectory};

/// Run every recorder in parallel; results keep the input order
pub fn run_sweep(runs: &[Recorder]) -> Vec<Result<Trajectory, RunFailure>> {
    let results: Vec<_> = runs.par_iter().map(Recorder::run).collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(runs = runs.len(), failed, "sweep finished");

    results
}
