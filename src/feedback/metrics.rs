use std::collections::VecDeque;

use serde::Serialize;

use crate::model::ForecastCone;

pub const FORECAST_METRIC_WINDOW: usize = 500;
pub const FORECAST_R2_MIN_SAMPLES: usize = 60;

/// Rolling accuracy of fused mean forecasts against realized log returns.
#[derive(Debug, Clone)]
pub struct ForecastMetrics {
    window: usize,
    pairs: VecDeque<(f64, f64)>,
}

impl Default for ForecastMetrics {
    fn default() -> Self {
        Self::with_window(FORECAST_METRIC_WINDOW)
    }
}

impl ForecastMetrics {
    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(2),
            pairs: VecDeque::with_capacity(window.max(2)),
        }
    }

    pub fn observe(&mut self, y_real: f64, y_pred: f64) {
        if !y_real.is_finite() || !y_pred.is_finite() {
            return;
        }
        self.pairs.push_back((y_real, y_pred));
        if self.pairs.len() > self.window {
            let _ = self.pairs.pop_front();
        }
    }

    pub fn sample_count(&self) -> u64 {
        self.pairs.len() as u64
    }

    pub fn mae(&self) -> Option<f64> {
        let n = self.pairs.len();
        if n == 0 {
            return None;
        }
        let sum_abs = self
            .pairs
            .iter()
            .map(|(y, yhat)| (y - yhat).abs())
            .sum::<f64>();
        Some(sum_abs / n as f64)
    }

    pub fn hit_rate(&self) -> Option<f64> {
        let n = self.pairs.len();
        if n == 0 {
            return None;
        }
        let hit = self.pairs.iter().filter(|(y, yhat)| y * yhat > 0.0).count() as f64;
        Some(hit / n as f64)
    }

    pub fn r2(&self) -> Option<f64> {
        let n = self.pairs.len();
        if n < FORECAST_R2_MIN_SAMPLES {
            return None;
        }
        let mean_y = self.pairs.iter().map(|(y, _)| *y).sum::<f64>() / n as f64;
        let mut sse = 0.0;
        let mut sst = 0.0;
        for (y, yhat) in &self.pairs {
            let err = y - yhat;
            sse += err * err;
            let d = y - mean_y;
            sst += d * d;
        }
        if sst <= 1e-18 {
            return Some(0.0);
        }
        Some(1.0 - (sse / sst))
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples: self.sample_count(),
            mae: self.mae(),
            hit_rate: self.hit_rate(),
            r2: self.r2(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub samples: u64,
    pub mae: Option<f64>,
    pub hit_rate: Option<f64>,
    pub r2: Option<f64>,
}

/// Where a realized price landed relative to the cone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConeBand {
    /// Between lower40 and upper60.
    Inner,
    /// Inside lower20..upper80 but outside the inner band.
    Outer,
    Outside,
}

impl ConeBand {
    pub fn classify(cone: &ForecastCone, price: f64) -> Self {
        if price >= cone.lower40 && price <= cone.upper60 {
            Self::Inner
        } else if price >= cone.lower20 && price <= cone.upper80 {
            Self::Outer
        } else {
            Self::Outside
        }
    }
}

/// Hit counts per band. A well-calibrated cone lands about 60% inside the
/// inner band and 80% inside the outer one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConeCalibration {
    pub inner: u64,
    pub outer: u64,
    pub outside: u64,
}

impl ConeCalibration {
    pub fn record(&mut self, band: ConeBand) {
        match band {
            ConeBand::Inner => self.inner += 1,
            ConeBand::Outer => self.outer += 1,
            ConeBand::Outside => self.outside += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.inner + self.outer + self.outside
    }

    pub fn inner_rate(&self) -> Option<f64> {
        let n = self.total();
        (n > 0).then(|| self.inner as f64 / n as f64)
    }

    pub fn coverage_rate(&self) -> Option<f64> {
        let n = self.total();
        (n > 0).then(|| (self.inner + self.outer) as f64 / n as f64)
    }
}
