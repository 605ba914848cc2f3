pub mod export;
#[cfg(feature = "viewer")]
pub mod comet_vis3d;
