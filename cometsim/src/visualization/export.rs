//! CSV frame export for external plotting / video tools
//!
//! One row per frame: the comet's state followed by the position of each
//! reference orbit at that frame's time. Partial trajectories are written
//! as-is, so a consumer sees exactly how far a failed run got.

use std::io::Write;

use crate::simulation::recorder::Trajectory;
use crate::simulation::reference::ReferenceOrbit;
use crate::simulation::states::NVec3;

/// Write `trajectory` (and reference orbits sampled around `center`) as CSV
pub fn write_csv<W: Write>(
    out: W,
    trajectory: &Trajectory,
    references: &[ReferenceOrbit],
    center: &NVec3,
    mu: f64,
) -> csv::Result<()> {
    let mut w = csv::Writer::from_writer(out);

    let mut header: Vec<String> = ["frame", "t", "x", "y", "z", "vx", "vy", "vz"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    for r in references {
        header.extend(["x", "y", "z"].iter().map(|axis| format!("{}_{axis}", r.name)));
    }
    w.write_record(&header)?;

    for (i, s) in trajectory.iter().enumerate() {
        let mut row = vec![
            i.to_string(),
            s.t.to_string(),
            s.x.x.to_string(), s.x.y.to_string(), s.x.z.to_string(),
            s.v.x.to_string(), s.v.y.to_string(), s.v.z.to_string(),
        ];
        for r in references {
            let p = r.position_at(s.t, mu, center);
            row.extend([p.x.to_string(), p.y.to_string(), p.z.to_string()]);
        }
        w.write_record(&row)?;
    }

    w.flush()?;
    Ok(())
}
