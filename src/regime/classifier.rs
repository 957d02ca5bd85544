use crate::config::RegimeConfig;
use crate::features::{Feature, FeatureSet};
use crate::model::{Regime, RegimeBelief, NUM_REGIMES};

/// Gaussian emission over (`vol_ratio`, `|trend_strength|`) for one regime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionParams {
    pub mean_vol_ratio: f64,
    pub std_vol_ratio: f64,
    pub mean_trend: f64,
    pub std_trend: f64,
}

impl EmissionParams {
    pub fn new(mean_vol_ratio: f64, std_vol_ratio: f64, mean_trend: f64, std_trend: f64) -> Self {
        Self {
            mean_vol_ratio,
            std_vol_ratio: std_vol_ratio.max(1e-6),
            mean_trend,
            std_trend: std_trend.max(1e-6),
        }
    }

    fn log_likelihood(&self, vol_ratio: f64, trend: f64) -> f64 {
        let vz = (vol_ratio - self.mean_vol_ratio) / self.std_vol_ratio;
        let tz = (trend - self.mean_trend) / self.std_trend;
        -0.5 * vz * vz - self.std_vol_ratio.ln() - 0.5 * tz * tz - self.std_trend.ln()
    }
}

/// Indexed by [`Regime::index`].
fn default_emission_params() -> [EmissionParams; NUM_REGIMES] {
    [
        // Trend: ordinary vol, strong directional spread
        EmissionParams::new(1.0, 0.35, 0.6, 0.25),
        // Range: compressed vol, flat averages
        EmissionParams::new(0.8, 0.25, 0.15, 0.15),
        // Volatility expansion: short-window vol well above the long window
        EmissionParams::new(1.6, 0.5, 0.4, 0.35),
        // Flux: nothing in particular
        EmissionParams::new(1.0, 0.45, 0.3, 0.3),
    ]
}

fn sticky_transition_matrix(stickiness: f64) -> [[f64; NUM_REGIMES]; NUM_REGIMES] {
    let diag = stickiness.clamp(0.0, 1.0);
    let off = (1.0 - diag) / (NUM_REGIMES - 1) as f64;
    let mut m = [[off; NUM_REGIMES]; NUM_REGIMES];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = diag;
    }
    m
}

/// Log-scale transition tilt from the current features. Positive scores make
/// entering that regime more likely before the emission update.
fn feature_scores(features: &FeatureSet) -> [f64; NUM_REGIMES] {
    let trend = features.get(Feature::TrendStrength).abs().min(1.0);
    let vol_excess = (features.get(Feature::VolRatio) - 1.0).max(0.0);
    let backwardation = (-features.get(Feature::TermSlope)).max(0.0);
    let gamma_sign: f64 = {
        let g = features.get(Feature::Gex);
        if g > 0.0 {
            1.0
        } else if g < 0.0 {
            -1.0
        } else {
            0.0
        }
    };
    let dark_pool = features.get(Feature::DarkPoolRatio).abs().min(1.0);
    let event = features.get(Feature::EventFlag);

    let mut s = [0.0; NUM_REGIMES];
    s[Regime::Trend.index()] = 1.5 * trend + 0.25 * (-gamma_sign).max(0.0);
    s[Regime::Range.index()] = (1.0 - trend) + 0.5 * gamma_sign.max(0.0) - 0.5 * vol_excess;
    s[Regime::VolatilityExpansion.index()] =
        vol_excess + 5.0 * backwardation + 0.75 * event + 0.25 * (-gamma_sign).max(0.0);
    s[Regime::Flux.index()] = 0.5 * dark_pool + 0.25 * (1.0 - trend);
    s
}

/// Online regime filter: one forward step per prediction call.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    belief: RegimeBelief,
    transition: [[f64; NUM_REGIMES]; NUM_REGIMES],
    emissions: [EmissionParams; NUM_REGIMES],
    observation_count: u64,
}

impl RegimeClassifier {
    pub fn new(cfg: RegimeConfig) -> Self {
        Self {
            belief: RegimeBelief::uniform(),
            transition: sticky_transition_matrix(cfg.stickiness),
            emissions: default_emission_params(),
            observation_count: 0,
        }
    }

    pub fn with_emission_params(mut self, params: [EmissionParams; NUM_REGIMES]) -> Self {
        self.emissions = params;
        self
    }

    /// Predict through the sticky transition, tilt by the feature scores,
    /// weigh by the emission likelihood and renormalize. A zero or non-finite
    /// result leaves the previous belief in place.
    pub fn update(&mut self, features: &FeatureSet) -> RegimeBelief {
        let prev = self.belief.as_array();
        let mut predicted = [0.0; NUM_REGIMES];
        for (j, p) in predicted.iter_mut().enumerate() {
            for (i, prev_i) in prev.iter().enumerate() {
                *p += self.transition[i][j] * prev_i;
            }
        }

        let vol_ratio = features.get(Feature::VolRatio);
        let trend = features.get(Feature::TrendStrength).abs();
        let scores = feature_scores(features);

        let mut log_post = [f64::NEG_INFINITY; NUM_REGIMES];
        for j in 0..NUM_REGIMES {
            if predicted[j] > 0.0 {
                log_post[j] = predicted[j].ln()
                    + scores[j]
                    + self.emissions[j].log_likelihood(vol_ratio, trend);
            }
        }
        let max = log_post.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let next = if max.is_finite() {
            let mut w = [0.0; NUM_REGIMES];
            for (dst, lp) in w.iter_mut().zip(log_post) {
                *dst = (lp - max).exp();
            }
            RegimeBelief::from_weights(w)
        } else {
            None
        };

        match next {
            Some(belief) => self.belief = belief,
            None => tracing::warn!(
                vol_ratio,
                trend,
                "regime update degenerate; keeping previous belief"
            ),
        }
        self.observation_count += 1;
        self.belief
    }

    pub fn belief(&self) -> RegimeBelief {
        self.belief
    }

    pub fn regime(&self) -> Regime {
        self.belief.most_likely()
    }

    pub fn observation_count(&self) -> u64 {
        self.observation_count
    }

    pub fn reset(&mut self) {
        self.belief = RegimeBelief::uniform();
        self.observation_count = 0;
    }
}
