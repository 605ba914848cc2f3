use cometsim::{Scenario, ScenarioConfig, RunFailure};
use cometsim::{conservation_drift, write_csv};
use cometsim::{bench_step, bench_convergence};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cometsim", about = "Integrate a comet trajectory around a fixed central mass")]
struct Args {
    /// Scenario file under `scenarios/` (or a path to one)
    #[arg(short, default_value = "unit_circle.yaml")]
    file_name: String,

    /// Write frames (and reference orbit positions) as CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replay the trajectory in a 3D window (needs the `viewer` feature)
    #[arg(long)]
    view: bool,

    /// Playback rate for the viewer
    #[arg(long, default_value_t = 20.0)]
    fps: f32,

    /// Run the integrator benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let direct = PathBuf::from(file_name);
    let config_path = if direct.is_file() {
        direct
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
    };

    let file = File::open(&config_path).with_context(|| format!("opening {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("parsing {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.bench {
        bench_step();
        bench_convergence();
        return Ok(());
    }

    let scenario = Scenario::build_scenario(load_scenario_from_yaml(&args.file_name)?)
        .context("invalid scenario")?;
    let recorder = scenario.recorder()?;

    // A failed run still yields the frames recorded before the failure
    let (trajectory, failure) = match recorder.run() {
        Ok(trajectory) => (trajectory, None),
        Err(RunFailure { partial, error }) => (partial, Some(error)),
    };

    let drift = conservation_drift(&trajectory, &scenario.body, &scenario.central, scenario.parameters.G);
    if let Some(last) = trajectory.last() {
        info!(
            frames = trajectory.len(),
            t = last.t,
            x = ?[last.x.x, last.x.y, last.x.z],
            r = (last.x - scenario.central.x).norm(),
            energy_drift = drift.max_energy_error,
            angular_momentum_drift = drift.max_angular_momentum_error,
            "run finished"
        );
    }

    let marker = scenario.marker_time.and_then(|t| trajectory.index_at_time(t));
    if let Some(i) = marker {
        let s = &trajectory[i];
        info!(frame = i, t = s.t, x = s.x.x, y = s.x.y, z = s.x.z, "marker position");
    }

    if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_csv(BufWriter::new(file), &trajectory, &scenario.reference_orbits, &scenario.central.x, scenario.mu())?;
        info!(path = %path.display(), "frames written");
    }

    if args.view {
        view(&scenario, trajectory.clone(), marker, args.fps);
    }

    if let Some(error) = failure {
        warn!(frames = trajectory.len(), "partial trajectory kept");
        return Err(error).context("simulation stopped early");
    }

    Ok(())
}

#[cfg(feature = "viewer")]
fn view(scenario: &Scenario, trajectory: cometsim::Trajectory, marker: Option<usize>, fps: f32) {
    cometsim::run_3d(cometsim::Playback {
        trajectory,
        references: scenario.reference_orbits.clone(),
        mu: scenario.mu(),
        central: scenario.central.x,
        marker,
        frames_per_second: fps,
    });
}

#[cfg(not(feature = "viewer"))]
fn view(_scenario: &Scenario, _trajectory: cometsim::Trajectory, _marker: Option<usize>, _fps: f32) {
    warn!("built without the `viewer` feature; rebuild with --features viewer to open the 3D view");
}
