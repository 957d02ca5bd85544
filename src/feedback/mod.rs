pub mod metrics;
pub mod tracker;

pub use metrics::{
    ConeBand, ConeCalibration, ForecastMetrics, MetricsSnapshot, FORECAST_METRIC_WINDOW,
    FORECAST_R2_MIN_SAMPLES,
};
pub use tracker::{member_accuracy, MemberAccuracy, OutcomeReport, OutcomeTracker, PendingForecast};
