pub mod config;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod feedback;
pub mod flow;
pub mod forecast;
pub mod indicator;
pub mod model;
pub mod options;
pub mod pipeline;
pub mod regime;
pub mod service;

pub use error::ForecastError;
pub use pipeline::{ForecastPipeline, HorizonReport, PredictionReport};
pub use service::ForecastService;
