use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::FeedbackConfig;
use crate::ensemble::{Member, MemberEstimate};
use crate::error::ForecastError;
use crate::flow::FlowSample;
use crate::feedback::metrics::{
    ConeBand, ConeCalibration, ForecastMetrics, MetricsSnapshot,
};
use crate::model::{ForecastCone, Horizon};

/// A forecast waiting for its realized price.
#[derive(Debug, Clone)]
pub struct PendingForecast {
    pub prediction_id: Uuid,
    pub horizon: Horizon,
    pub issued_at: DateTime<Utc>,
    pub cone: ForecastCone,
    pub members: Vec<MemberEstimate>,
    /// Exposure regressors at issue time; `realized_return` is filled on
    /// resolution.
    pub flow: FlowSample,
}

impl PendingForecast {
    pub fn due_at(&self) -> DateTime<Utc> {
        self.issued_at + chrono::Duration::seconds((self.horizon.minutes() * 60.0) as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemberAccuracy {
    pub member: Member,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeReport {
    pub prediction_id: Uuid,
    pub horizon: Horizon,
    pub realized_price: f64,
    pub realized_return: f64,
    /// 0 at lower20, 1 at upper80; outside [0, 1] when the cone was missed.
    pub band_percentile: f64,
    pub band: ConeBand,
    pub members: Vec<MemberAccuracy>,
    pub flow_sample: FlowSample,
}

/// Half directional hit, half closeness of the mean in units of two
/// standard deviations.
pub fn member_accuracy(estimate: &MemberEstimate, realized_return: f64) -> f64 {
    let hit = if estimate.mean == 0.0 {
        0.5
    } else if estimate.mean * realized_return > 0.0 {
        1.0
    } else {
        0.0
    };
    let scale = 2.0 * estimate.variance.max(0.0).sqrt();
    let miss = (realized_return - estimate.mean).abs();
    let closeness = if scale > f64::EPSILON {
        1.0 - (miss / scale).min(1.0)
    } else if miss <= f64::EPSILON {
        1.0
    } else {
        0.0
    };
    (0.5 * hit + 0.5 * closeness).clamp(0.0, 1.0)
}

/// Bounded store of issued forecasts plus per-horizon scoring.
#[derive(Debug, Clone)]
pub struct OutcomeTracker {
    max_pending: usize,
    metric_window: usize,
    pending: HashMap<(Uuid, Horizon), PendingForecast>,
    order: VecDeque<(Uuid, Horizon)>,
    metrics: HashMap<Horizon, ForecastMetrics>,
    calibration: HashMap<Horizon, ConeCalibration>,
}

impl OutcomeTracker {
    pub fn new(cfg: &FeedbackConfig) -> Self {
        Self {
            max_pending: cfg.max_pending.max(1),
            metric_window: cfg.metric_window,
            pending: HashMap::new(),
            order: VecDeque::new(),
            metrics: HashMap::new(),
            calibration: HashMap::new(),
        }
    }

    /// Store a forecast. The oldest entry is evicted once the store is full.
    pub fn track(&mut self, forecast: PendingForecast) {
        let key = (forecast.prediction_id, forecast.horizon);
        if self.pending.insert(key, forecast).is_none() {
            self.order.push_back(key);
        }
        while self.pending.len() > self.max_pending {
            let Some(old) = self.order.pop_front() else {
                break;
            };
            if self.pending.remove(&old).is_some() {
                tracing::debug!(prediction_id = %old.0, horizon = %old.1, "evicted pending forecast");
            }
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: Uuid, horizon: Horizon) -> bool {
        self.pending.contains_key(&(id, horizon))
    }

    /// Forecasts whose horizon has elapsed by `now`, oldest first.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<(Uuid, Horizon)> {
        self.order
            .iter()
            .filter(|k| self.pending.get(*k).is_some_and(|p| p.due_at() <= now))
            .copied()
            .collect()
    }

    pub fn resolve(
        &mut self,
        id: Uuid,
        horizon: Horizon,
        realized_price: f64,
    ) -> Result<OutcomeReport, ForecastError> {
        if !realized_price.is_finite() || realized_price <= 0.0 {
            return Err(ForecastError::InvalidRealizedPrice(realized_price));
        }
        let key = (id, horizon);
        let pending = self
            .pending
            .remove(&key)
            .ok_or_else(|| ForecastError::UnknownPrediction {
                id,
                horizon: horizon.to_string(),
            })?;
        self.order.retain(|k| *k != key);

        let base = pending.cone.current_price;
        let realized_return = if base > f64::EPSILON {
            (realized_price / base).ln()
        } else {
            0.0
        };
        let members = pending
            .members
            .iter()
            .map(|m| MemberAccuracy {
                member: m.member,
                accuracy: member_accuracy(m, realized_return),
            })
            .collect();
        let band = ConeBand::classify(&pending.cone, realized_price);

        let window = self.metric_window;
        self.metrics
            .entry(horizon)
            .or_insert_with(|| ForecastMetrics::with_window(window))
            .observe(realized_return, pending.cone.mean);
        self.calibration.entry(horizon).or_default().record(band);

        Ok(OutcomeReport {
            prediction_id: id,
            horizon,
            realized_price,
            realized_return,
            band_percentile: pending.cone.band_percentile(realized_price),
            band,
            members,
            flow_sample: FlowSample {
                realized_return,
                ..pending.flow
            },
        })
    }

    pub fn metrics(&self, horizon: Horizon) -> MetricsSnapshot {
        self.metrics
            .get(&horizon)
            .map(ForecastMetrics::snapshot)
            .unwrap_or_else(|| ForecastMetrics::with_window(self.metric_window).snapshot())
    }

    pub fn calibration(&self, horizon: Horizon) -> ConeCalibration {
        self.calibration.get(&horizon).copied().unwrap_or_default()
    }
}
