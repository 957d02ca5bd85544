use crate::config::SelectorConfig;
use crate::features::{Feature, FeatureSet};
use crate::model::{
    ForecastCone, NoTradeReason, OptionSide, OptionTradeRecommendation, RegimeBelief,
    TradeRationale,
};
use crate::options::premium::{ApproxPremiumModel, PremiumModel, PremiumQuote, DAYS_PER_YEAR};

const DARK_POOL_ALIGNMENT_NUDGE: f64 = 0.1;

/// Everything the selector reads for one decision. `scores` holds the
/// directional score of every horizon in the call, `primary` the horizon
/// being traded.
#[derive(Debug, Clone, Copy)]
pub struct SelectionInputs<'a> {
    pub primary: &'a ForecastCone,
    pub scores: &'a [f64],
    pub fused_confidence: f64,
    pub breakout_probability: f64,
    pub belief: &'a RegimeBelief,
    pub features: &'a FeatureSet,
}

#[derive(Debug, Clone)]
pub struct OptionsTradeSelector<P: PremiumModel = ApproxPremiumModel> {
    cfg: SelectorConfig,
    model: P,
}

impl OptionsTradeSelector<ApproxPremiumModel> {
    pub fn new(cfg: SelectorConfig) -> Self {
        Self::with_model(cfg, ApproxPremiumModel)
    }
}

impl<P: PremiumModel> OptionsTradeSelector<P> {
    pub fn with_model(cfg: SelectorConfig, model: P) -> Self {
        Self { cfg, model }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.cfg
    }

    pub fn select(&self, inputs: &SelectionInputs<'_>) -> OptionTradeRecommendation {
        match self.try_select(inputs) {
            Ok(rec) => rec,
            Err(reason) => {
                tracing::debug!(
                    horizon = %inputs.primary.horizon,
                    reason = reason.as_str(),
                    "no option trade"
                );
                OptionTradeRecommendation::no_trade(reason)
            }
        }
    }

    fn try_select(
        &self,
        inputs: &SelectionInputs<'_>,
    ) -> Result<OptionTradeRecommendation, NoTradeReason> {
        let cone = inputs.primary;
        let spot = cone.current_price;
        if !spot.is_finite() || spot <= f64::EPSILON {
            return Err(NoTradeReason::InvalidPrice);
        }

        let side = agreed_side(inputs.scores)?;

        let breakout = inputs.breakout_probability;
        let trend_or_expansion = inputs.belief.trend_or_expansion();
        let conviction = breakout.max(trend_or_expansion);
        if conviction < self.cfg.conviction_threshold {
            return Err(NoTradeReason::LowConviction);
        }

        let gex = inputs.features.get(Feature::Gex);
        if gex > 0.0 && breakout < self.cfg.positive_gamma_breakout {
            return Err(NoTradeReason::PositiveGammaDampening);
        }

        let minutes_since_event = inputs.features.get(Feature::MinutesSinceEvent);
        let post_event = minutes_since_event >= 0.0
            && minutes_since_event <= self.cfg.post_event_window_minutes;
        let zero_dte = cone.directional_score.abs() >= self.cfg.zero_dte_score || post_event;
        let expiry_days = if zero_dte {
            0
        } else {
            self.cfg.swing_expiry_days
        };
        let days_left = if zero_dte {
            self.cfg.intraday_time_days
        } else {
            expiry_days as f64
        };
        let years = days_left / DAYS_PER_YEAR;

        let (anchor, exit_level) = match side {
            OptionSide::Call => (cone.upper60, cone.upper80),
            OptionSide::Put => (cone.lower40, cone.lower20),
        };
        let strike = round_to_increment(anchor, self.cfg.strike_increment);
        if strike <= f64::EPSILON {
            return Err(NoTradeReason::InvalidPrice);
        }

        let vol = self.pricing_vol(inputs.features);
        let quote = PremiumQuote {
            side,
            spot,
            strike,
            years,
            vol,
        };
        let entry_price = self.model.premium(&quote);
        if !entry_price.is_finite() || entry_price <= f64::EPSILON {
            return Err(NoTradeReason::InvalidPrice);
        }
        let target_exit = self.model.premium(&PremiumQuote {
            spot: exit_level,
            ..quote
        });
        let stop_loss = entry_price * (1.0 - self.cfg.stop_loss_fraction);
        let target_delta = self.model.delta(&quote);

        let dark_pool = inputs.features.get(Feature::DarkPoolRatio);
        let alignment = dark_pool * side.sign();
        let mut confidence = inputs.fused_confidence.clamp(0.0, 1.0) * (0.5 + 0.5 * conviction);
        if alignment > 0.0 {
            confidence *= 1.0 + DARK_POOL_ALIGNMENT_NUDGE;
        } else if alignment < 0.0 {
            confidence *= 1.0 - DARK_POOL_ALIGNMENT_NUDGE;
        }
        let confidence = confidence.clamp(0.0, 1.0);

        let kelly_fraction = self.kelly(confidence, entry_price, target_exit, stop_loss);

        let rationale = TradeRationale {
            direction: format!(
                "{} horizons agree {}; {} score {:+.2}",
                inputs.scores.len(),
                match side {
                    OptionSide::Call => "bullish",
                    OptionSide::Put => "bearish",
                },
                cone.horizon,
                cone.directional_score
            ),
            regime: format!(
                "{} regime; trend+expansion belief {:.2}, breakout probability {:.2}",
                inputs.belief.most_likely(),
                trend_or_expansion,
                breakout
            ),
            flow: format!(
                "{} gamma (GEX {:.3e}); dark-pool ratio {:+.2}",
                if gex < 0.0 {
                    "negative"
                } else if gex > 0.0 {
                    "positive"
                } else {
                    "flat"
                },
                gex,
                dark_pool
            ),
            timing: if zero_dte && post_event {
                format!("0DTE, {minutes_since_event:.0} min after high-importance event")
            } else if zero_dte {
                "0DTE, high-conviction intraday".to_string()
            } else {
                format!("{expiry_days}-day swing")
            },
        };

        tracing::debug!(
            horizon = %cone.horizon,
            strike,
            expiry_days,
            rationale = %rationale.summary(),
            "option trade selected"
        );

        Ok(OptionTradeRecommendation {
            side: Some(side),
            strike,
            expiry_days,
            target_delta,
            entry_price,
            target_exit,
            stop_loss,
            confidence,
            kelly_fraction,
            rationale,
            no_trade_reason: None,
        })
    }

    fn pricing_vol(&self, features: &FeatureSet) -> f64 {
        [
            features.get(Feature::ImpliedVol),
            features.get(Feature::RealizedVolAnnual),
        ]
        .into_iter()
        .find(|v| *v > f64::EPSILON)
        .unwrap_or(self.cfg.fallback_vol)
    }

    /// Scaled and capped Kelly fraction; zero without a positive edge.
    fn kelly(&self, p: f64, entry: f64, target: f64, stop: f64) -> f64 {
        let risk = entry - stop;
        let reward = target - entry;
        if risk <= f64::EPSILON || reward <= f64::EPSILON {
            return 0.0;
        }
        let b = reward / risk;
        let f = p - (1.0 - p) / b;
        f.clamp(0.0, self.cfg.kelly_cap) * self.cfg.kelly_scale
    }
}

/// Side implied by the horizon scores: at least two, all non-zero and of
/// one sign.
fn agreed_side(scores: &[f64]) -> Result<OptionSide, NoTradeReason> {
    if scores.len() < 2 {
        return Err(NoTradeReason::InsufficientHorizons);
    }
    let positive = scores.iter().any(|s| *s > 0.0);
    let negative = scores.iter().any(|s| *s < 0.0);
    if positive && negative {
        return Err(NoTradeReason::DirectionConflict);
    }
    if scores.iter().any(|s| !s.is_finite() || *s == 0.0) {
        return Err(NoTradeReason::NoDirectionalEdge);
    }
    Ok(if positive {
        OptionSide::Call
    } else {
        OptionSide::Put
    })
}

pub fn round_to_increment(price: f64, increment: f64) -> f64 {
    if increment <= 0.0 || !increment.is_finite() {
        return price;
    }
    (price / increment).round() * increment
}
