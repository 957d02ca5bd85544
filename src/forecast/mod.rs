pub mod engine;

pub use engine::{build_cone, horizon_forecast, Z_60, Z_80};
