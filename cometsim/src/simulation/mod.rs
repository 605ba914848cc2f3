pub mod states;
pub mod error;
pub mod params;
pub mod engine;
pub mod forces;
pub mod integrator;
pub mod recorder;
pub mod diagnostics;
pub mod kepler;
pub mod reference;
pub mod scenario;
pub mod sweep;
