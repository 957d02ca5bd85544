use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::ensemble::{
    EnsembleFusion, FusedEstimate, Member, MemberContext, MemberEstimate, MemberWeight,
};
use crate::error::ForecastError;
use crate::features::{Feature, FeatureExtractor, FeatureSet};
use crate::feedback::{ConeCalibration, MetricsSnapshot, OutcomeReport, OutcomeTracker, PendingForecast};
use crate::flow::{expected_vol_shift, CalibrationOutcome, FlowImpactKernel, FlowParams, FlowSample};
use crate::forecast::{build_cone, horizon_forecast};
use crate::model::{
    Horizon, HorizonForecast, MarketInputs, OptionTradeRecommendation, Regime, RegimeBelief,
};
use crate::options::{OptionsTradeSelector, SelectionInputs};
use crate::regime::RegimeClassifier;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonReport {
    pub horizon: Horizon,
    pub forecast: HorizonForecast,
    pub directional_score: f64,
    pub confidence: f64,
    /// Drift contributed by the dealer-flow kernel, already included in the
    /// cone mean.
    pub flow_drift: f64,
    pub breakout_probability: f64,
    pub weights: Vec<MemberWeight>,
    pub members: Vec<MemberEstimate>,
    pub recommendation: OptionTradeRecommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    pub prediction_id: Uuid,
    pub symbol: String,
    pub as_of: DateTime<Utc>,
    pub regime: Regime,
    pub belief: RegimeBelief,
    /// Mean fused confidence across the requested horizons.
    pub overall_confidence: f64,
    pub features: FeatureSet,
    pub forecasts: Vec<HorizonReport>,
}

impl PredictionReport {
    pub fn forecast(&self, horizon: Horizon) -> Option<&HorizonReport> {
        self.forecasts.iter().find(|f| f.horizon == horizon)
    }

    pub fn trades(&self) -> impl Iterator<Item = &HorizonReport> {
        self.forecasts.iter().filter(|f| f.recommendation.is_trade())
    }
}

struct HorizonDraft {
    forecast: HorizonForecast,
    flow_drift: f64,
    flow: FlowSample,
    fused: FusedEstimate,
}

/// Per-symbol forecasting state: regime belief, flow parameters, member
/// skills and pending outcomes. Callers serialize access per symbol.
#[derive(Debug)]
pub struct ForecastPipeline {
    symbol: String,
    cfg: Config,
    default_horizons: Vec<Horizon>,
    extractor: FeatureExtractor,
    regime: RegimeClassifier,
    kernel: FlowImpactKernel,
    ensemble: EnsembleFusion,
    selector: OptionsTradeSelector,
    tracker: OutcomeTracker,
    flow_history: HashMap<Horizon, VecDeque<FlowSample>>,
}

impl ForecastPipeline {
    pub fn new(symbol: impl Into<String>, cfg: Config) -> Result<Self, ForecastError> {
        let default_horizons = cfg.forecast.horizons()?;
        Ok(Self {
            symbol: symbol.into(),
            default_horizons,
            extractor: FeatureExtractor::new(cfg.forecast.clone()),
            regime: RegimeClassifier::new(cfg.regime.clone()),
            kernel: FlowImpactKernel::new(cfg.flow.clone()),
            ensemble: EnsembleFusion::new(cfg.ensemble.clone()),
            selector: OptionsTradeSelector::new(cfg.selector.clone()),
            tracker: OutcomeTracker::new(&cfg.feedback),
            flow_history: HashMap::new(),
            cfg,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// One full pass for the requested horizon ids (configured defaults when
    /// empty). Horizons are validated before any state changes.
    pub fn predict<S: AsRef<str>>(
        &mut self,
        inputs: &MarketInputs,
        horizons: &[S],
    ) -> Result<PredictionReport, ForecastError> {
        let horizons = if horizons.is_empty() {
            self.default_horizons.clone()
        } else {
            Horizon::parse_list(horizons)?
        };
        if !inputs.symbol().eq_ignore_ascii_case(&self.symbol) {
            tracing::warn!(
                pipeline = %self.symbol,
                inputs = inputs.symbol(),
                "inputs symbol differs from pipeline symbol"
            );
        }

        let features = self.extractor.extract(inputs);
        let belief = self.regime.update(&features);
        let price = features.get(Feature::Price);

        let drafts: Vec<HorizonDraft> = horizons
            .iter()
            .map(|&h| self.draft_horizon(h, &features, &belief, price))
            .collect();
        let scores: Vec<f64> = drafts
            .iter()
            .map(|d| d.forecast.cone.directional_score)
            .collect();

        let prediction_id = Uuid::new_v4();
        let as_of = inputs.as_of();
        let mut forecasts = Vec::with_capacity(drafts.len());
        for d in drafts {
            let recommendation = self.selector.select(&SelectionInputs {
                primary: &d.forecast.cone,
                scores: &scores,
                fused_confidence: d.fused.confidence,
                breakout_probability: d.fused.breakout_probability,
                belief: &belief,
                features: &features,
            });
            self.tracker.track(PendingForecast {
                prediction_id,
                horizon: d.forecast.cone.horizon,
                issued_at: as_of,
                cone: d.forecast.cone,
                members: d.fused.members.clone(),
                flow: d.flow,
            });
            forecasts.push(HorizonReport {
                horizon: d.forecast.cone.horizon,
                directional_score: d.forecast.cone.directional_score,
                confidence: d.fused.confidence,
                flow_drift: d.flow_drift,
                breakout_probability: d.fused.breakout_probability,
                weights: d.fused.weights,
                members: d.fused.members,
                forecast: d.forecast,
                recommendation,
            });
        }

        let overall_confidence = if forecasts.is_empty() {
            0.0
        } else {
            forecasts.iter().map(|f| f.confidence).sum::<f64>() / forecasts.len() as f64
        };
        let regime = belief.most_likely();
        tracing::info!(
            symbol = %self.symbol,
            prediction_id = %prediction_id,
            regime = regime.label(),
            belief_entropy = belief.entropy(),
            horizons = forecasts.len(),
            trades = forecasts.iter().filter(|f| f.recommendation.is_trade()).count(),
            overall_confidence,
            "prediction complete"
        );

        Ok(PredictionReport {
            prediction_id,
            symbol: self.symbol.clone(),
            as_of,
            regime,
            belief,
            overall_confidence,
            features,
            forecasts,
        })
    }

    pub fn predict_default(
        &mut self,
        inputs: &MarketInputs,
    ) -> Result<PredictionReport, ForecastError> {
        self.predict::<&str>(inputs, &[])
    }

    fn draft_horizon(
        &mut self,
        horizon: Horizon,
        features: &FeatureSet,
        belief: &RegimeBelief,
        price: f64,
    ) -> HorizonDraft {
        let d_vol = expected_vol_shift(
            features.get(Feature::RealizedVolAnnual),
            features.get(Feature::ImpliedVol),
            horizon,
            self.cfg.flow.iv_convergence_days,
        );
        let d_time = horizon.days();
        let (gex, vanna, charm) = (
            features.get(Feature::Gex),
            features.get(Feature::Vanna),
            features.get(Feature::Charm),
        );
        let flow_drift = self
            .kernel
            .estimate(horizon, gex, vanna, charm, d_vol, d_time);

        let ctx = MemberContext {
            features,
            belief,
            horizon,
            bar_minutes: self.cfg.forecast.bar_minutes(),
            min_sigma: self.cfg.forecast.min_sigma,
        };
        let fused = self.ensemble.fuse(&ctx);
        let cone = build_cone(price, fused.mean + flow_drift, fused.variance, horizon);

        HorizonDraft {
            forecast: horizon_forecast(cone, self.cfg.forecast.neutral_band),
            flow_drift,
            flow: FlowSample {
                realized_return: 0.0,
                gex_dvol: gex * d_vol,
                vanna_dvol: vanna * d_vol,
                charm_dt: charm * d_time,
            },
            fused,
        }
    }

    /// Score a past forecast against its realized price, feed member
    /// accuracies back into the skill book and keep the flow sample for
    /// later calibration.
    pub fn record_outcome(
        &mut self,
        prediction_id: Uuid,
        horizon: Horizon,
        realized_price: f64,
    ) -> Result<OutcomeReport, ForecastError> {
        let report = self
            .tracker
            .resolve(prediction_id, horizon, realized_price)?;
        for m in &report.members {
            self.ensemble.update_skill(m.member, horizon, m.accuracy);
        }
        let cap = self.cfg.feedback.metric_window.max(1);
        let history = self.flow_history.entry(horizon).or_default();
        history.push_back(report.flow_sample);
        while history.len() > cap {
            let _ = history.pop_front();
        }
        tracing::info!(
            symbol = %self.symbol,
            prediction_id = %prediction_id,
            horizon = %horizon,
            realized_return = report.realized_return,
            band_percentile = report.band_percentile,
            "outcome recorded"
        );
        Ok(report)
    }

    pub fn calibrate_flow(&mut self, horizon: Horizon, samples: &[FlowSample]) -> CalibrationOutcome {
        self.kernel.calibrate(horizon, samples)
    }

    /// Calibrate from the samples accumulated by [`Self::record_outcome`].
    pub fn calibrate_flow_from_history(&mut self, horizon: Horizon) -> CalibrationOutcome {
        let samples: Vec<FlowSample> = self
            .flow_history
            .get(&horizon)
            .map(|h| h.iter().copied().collect())
            .unwrap_or_default();
        self.kernel.calibrate(horizon, &samples)
    }

    pub fn update_skill(&mut self, member: Member, horizon: Horizon, accuracy: f64) -> f64 {
        self.ensemble.update_skill(member, horizon, accuracy)
    }

    pub fn skill(&self, member: Member, horizon: Horizon) -> f64 {
        self.ensemble.skill(member, horizon)
    }

    pub fn belief(&self) -> RegimeBelief {
        self.regime.belief()
    }

    pub fn regime(&self) -> Regime {
        self.regime.regime()
    }

    pub fn flow_params(&mut self, horizon: Horizon) -> FlowParams {
        self.kernel.params(horizon)
    }

    pub fn flow_history_len(&self, horizon: Horizon) -> usize {
        self.flow_history.get(&horizon).map_or(0, VecDeque::len)
    }

    pub fn pending_outcomes(&self) -> usize {
        self.tracker.pending_len()
    }

    pub fn due_outcomes(&self, now: DateTime<Utc>) -> Vec<(Uuid, Horizon)> {
        self.tracker.due(now)
    }

    pub fn metrics(&self, horizon: Horizon) -> MetricsSnapshot {
        self.tracker.metrics(horizon)
    }

    pub fn cone_calibration(&self, horizon: Horizon) -> ConeCalibration {
        self.tracker.calibration(horizon)
    }

    /// Back to a uniform belief and initial skills. Flow parameters and
    /// pending outcomes are kept.
    pub fn reset(&mut self) {
        self.regime.reset();
        self.ensemble.reset_skills();
    }
}
