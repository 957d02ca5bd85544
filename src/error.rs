use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("invalid horizon '{0}': expected one of 1m/5m/15m/1h/4h/1d")]
    InvalidHorizon(String),

    #[error("unknown prediction {id} for horizon {horizon}")]
    UnknownPrediction { id: Uuid, horizon: String },

    #[error("invalid realized price {0}: must be positive and finite")]
    InvalidRealizedPrice(f64),

    #[error("config error: {0}")]
    Config(String),
}
