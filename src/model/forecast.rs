use serde::{Deserialize, Serialize};

use crate::model::horizon::Horizon;

/// Quantile band around the expected price for one horizon.
///
/// Levels are ordered `upper80 >= upper60 >= median >= lower40 >= lower20`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastCone {
    pub horizon: Horizon,
    pub current_price: f64,
    pub expected_price: f64,
    pub upper80: f64,
    pub upper60: f64,
    pub median: f64,
    pub lower40: f64,
    pub lower20: f64,
    /// Signed `mean / std`; 0 when the forecast has no spread.
    pub directional_score: f64,
    /// Log-return drift over the horizon.
    pub mean: f64,
    /// Log-return standard deviation over the horizon.
    pub std: f64,
}

impl ForecastCone {
    pub fn is_degenerate(&self) -> bool {
        self.std <= 0.0
    }

    /// Where `price` falls inside the 20-80 band: 0 at lower20, 1 at upper80.
    /// Values outside [0, 1] mean the price escaped the band.
    pub fn band_percentile(&self, price: f64) -> f64 {
        let width = self.upper80 - self.lower20;
        if width <= f64::EPSILON {
            return 0.5;
        }
        (price - self.lower20) / width
    }

    pub fn levels(&self) -> [f64; 5] {
        [
            self.upper80,
            self.upper60,
            self.median,
            self.lower40,
            self.lower20,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    pub fn from_score(score: f64, neutral_band: f64) -> Self {
        if !score.is_finite() || score.abs() < neutral_band.abs() {
            Self::Neutral
        } else if score > 0.0 {
            Self::Bullish
        } else {
            Self::Bearish
        }
    }
}

/// Cone plus the directional read-out consumers display per timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonForecast {
    pub cone: ForecastCone,
    pub direction: Direction,
    pub target: f64,
    pub stop_loss: f64,
    /// Reward over risk measured from the current price; 0 when neutral.
    pub risk_reward: f64,
}
