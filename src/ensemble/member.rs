use serde::{Deserialize, Serialize};

use crate::features::{Feature, FeatureSet};
use crate::model::{Horizon, Regime, RegimeBelief};

const RANGE_REVERSION: f64 = 1.0;
/// Bars over which a range deviation is expected to mostly revert.
const RANGE_REVERSION_BARS: f64 = 20.0;
const RANGE_POSITIVE_GAMMA_VARIANCE: f64 = 0.7;

const BREAKOUT_SURGE_WEIGHT: f64 = 2.0;
const BREAKOUT_SKEW_WEIGHT: f64 = 1.0;
const BREAKOUT_SKEW_SCALE: f64 = 10.0;
const BREAKOUT_DARK_POOL_WEIGHT: f64 = 1.5;
const BREAKOUT_BIAS: f64 = 2.0;
const BREAKOUT_UP_MULT: f64 = 1.2;
const BREAKOUT_DOWN_MULT: f64 = 0.9;

const CONTINUATION_NEGATIVE_GAMMA_MEAN: f64 = 1.5;
const CONTINUATION_NEGATIVE_GAMMA_VARIANCE: f64 = 1.2;

const DARK_POOL_MEAN_SCALE: f64 = 0.5;

/// Fixed ensemble panel. Each variant carries its own estimation rule and
/// the regime that boosts its weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Member {
    Range,
    Breakout,
    Continuation,
    DarkPoolBias,
}

/// What every member sees for one horizon.
#[derive(Debug, Clone, Copy)]
pub struct MemberContext<'a> {
    pub features: &'a FeatureSet,
    pub belief: &'a RegimeBelief,
    pub horizon: Horizon,
    pub bar_minutes: f64,
    pub min_sigma: f64,
}

impl MemberContext<'_> {
    /// Horizon length in bars.
    pub fn steps(&self) -> f64 {
        (self.horizon.minutes() / self.bar_minutes.max(1e-9)).max(1e-9)
    }

    /// Per-bar realized vol, floored, scaled to the horizon.
    pub fn sigma_h(&self) -> f64 {
        self.features
            .get(Feature::RealizedVol)
            .max(self.min_sigma)
            .max(f64::MIN_POSITIVE)
            * self.steps().sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemberEstimate {
    pub member: Member,
    /// Log-return drift over the horizon.
    pub mean: f64,
    pub variance: f64,
    pub confidence: f64,
}

impl Member {
    pub const ALL: [Member; 4] = [
        Member::Range,
        Member::Breakout,
        Member::Continuation,
        Member::DarkPoolBias,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Range => "range",
            Self::Breakout => "breakout",
            Self::Continuation => "continuation",
            Self::DarkPoolBias => "dark_pool_bias",
        }
    }

    pub fn target_regime(self) -> Regime {
        match self {
            Self::Range => Regime::Range,
            Self::Breakout => Regime::VolatilityExpansion,
            Self::Continuation => Regime::Trend,
            Self::DarkPoolBias => Regime::Flux,
        }
    }

    pub fn predict(self, ctx: &MemberContext<'_>) -> MemberEstimate {
        let (mean, variance, confidence) = match self {
            Self::Range => range_estimate(ctx),
            Self::Breakout => breakout_estimate(ctx),
            Self::Continuation => continuation_estimate(ctx),
            Self::DarkPoolBias => dark_pool_estimate(ctx),
        };
        let floor = ctx.min_sigma * ctx.min_sigma;
        MemberEstimate {
            member: self,
            mean: if mean.is_finite() { mean } else { 0.0 },
            variance: if variance.is_finite() {
                variance.max(floor)
            } else {
                floor
            },
            confidence: if confidence.is_finite() {
                confidence.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Logistic link over volume surge, put/call skew and dark-pool pressure.
pub fn breakout_probability(features: &FeatureSet) -> f64 {
    let surge = features.get(Feature::VolumeSurge) - 1.0;
    let skew = features.get(Feature::Skew).abs() * BREAKOUT_SKEW_SCALE;
    let dark_pool = features.get(Feature::DarkPoolRatio).abs();
    logistic(
        BREAKOUT_SURGE_WEIGHT * surge + BREAKOUT_SKEW_WEIGHT * skew
            + BREAKOUT_DARK_POOL_WEIGHT * dark_pool
            - BREAKOUT_BIAS,
    )
}

fn range_estimate(ctx: &MemberContext<'_>) -> (f64, f64, f64) {
    let p = ctx.belief.prob(Regime::Range);
    let sigma = ctx.sigma_h();
    let reach = 1.0 - (-ctx.steps() / RANGE_REVERSION_BARS).exp();
    let mean = -RANGE_REVERSION * ctx.features.get(Feature::VwapDistance) * p * reach;
    let mut variance = sigma * sigma;
    if ctx.features.get(Feature::Gex) > 0.0 {
        variance *= RANGE_POSITIVE_GAMMA_VARIANCE;
    }
    (mean, variance, 0.3 + 0.6 * p)
}

fn breakout_estimate(ctx: &MemberContext<'_>) -> (f64, f64, f64) {
    let p = breakout_probability(ctx.features);
    let sigma = ctx.sigma_h();
    let momentum = ctx.features.get(Feature::Momentum);
    let dark_pool = ctx.features.get(Feature::DarkPoolRatio);
    let direction = if momentum != 0.0 {
        momentum.signum()
    } else if dark_pool != 0.0 {
        dark_pool.signum()
    } else {
        0.0
    };
    let mean = if direction > 0.0 {
        p * sigma * BREAKOUT_UP_MULT
    } else if direction < 0.0 {
        -p * sigma * BREAKOUT_DOWN_MULT
    } else {
        0.0
    };
    (mean, sigma * sigma * (1.0 + p), p)
}

fn continuation_estimate(ctx: &MemberContext<'_>) -> (f64, f64, f64) {
    let p = ctx.belief.prob(Regime::Trend);
    let sigma = ctx.sigma_h();
    let trend = ctx.features.get(Feature::TrendStrength).abs().min(1.0);
    let short_gamma = ctx.features.get(Feature::Gex) < 0.0;
    let amp = if short_gamma {
        CONTINUATION_NEGATIVE_GAMMA_MEAN
    } else {
        1.0
    };
    let mean = ctx.features.get(Feature::Momentum) * ctx.steps() * trend * p * amp;
    let mut variance = sigma * sigma;
    if short_gamma {
        variance *= CONTINUATION_NEGATIVE_GAMMA_VARIANCE;
    }
    (mean, variance, trend * (0.5 + 0.5 * p))
}

fn dark_pool_estimate(ctx: &MemberContext<'_>) -> (f64, f64, f64) {
    let ratio = ctx.features.get(Feature::DarkPoolRatio).clamp(-1.0, 1.0);
    let sigma = ctx.sigma_h();
    (DARK_POOL_MEAN_SCALE * ratio * sigma, sigma * sigma, ratio.abs())
}
