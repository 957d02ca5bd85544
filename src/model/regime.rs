use std::fmt;

use serde::{Deserialize, Serialize};

pub const NUM_REGIMES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    Trend,
    Range,
    VolatilityExpansion,
    Flux,
}

impl Regime {
    pub const ALL: [Regime; NUM_REGIMES] = [
        Regime::Trend,
        Regime::Range,
        Regime::VolatilityExpansion,
        Regime::Flux,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Trend => 0,
            Self::Range => 1,
            Self::VolatilityExpansion => 2,
            Self::Flux => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Trend => "TREND",
            Self::Range => "RANGE",
            Self::VolatilityExpansion => "VOLATILITY_EXPANSION",
            Self::Flux => "FLUX",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Probability distribution over [`Regime`]. Entries are non-negative and
/// sum to one; constructors renormalize to keep it that way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeBelief {
    probs: [f64; NUM_REGIMES],
}

impl Default for RegimeBelief {
    fn default() -> Self {
        Self::uniform()
    }
}

impl RegimeBelief {
    pub fn uniform() -> Self {
        Self {
            probs: [1.0 / NUM_REGIMES as f64; NUM_REGIMES],
        }
    }

    /// Normalize arbitrary non-negative weights. Returns `None` when the
    /// total mass is zero or not finite.
    pub fn from_weights(weights: [f64; NUM_REGIMES]) -> Option<Self> {
        let mut clean = [0.0; NUM_REGIMES];
        for (dst, w) in clean.iter_mut().zip(weights) {
            if !w.is_finite() {
                return None;
            }
            *dst = w.max(0.0);
        }
        let total: f64 = clean.iter().sum();
        if !total.is_finite() || total <= f64::MIN_POSITIVE {
            return None;
        }
        for p in clean.iter_mut() {
            *p /= total;
        }
        Some(Self { probs: clean })
    }

    pub fn prob(&self, regime: Regime) -> f64 {
        self.probs[regime.index()]
    }

    pub fn as_array(&self) -> [f64; NUM_REGIMES] {
        self.probs
    }

    pub fn most_likely(&self) -> Regime {
        let mut best = Regime::Trend;
        let mut best_p = f64::NEG_INFINITY;
        for r in Regime::ALL {
            let p = self.prob(r);
            if p > best_p {
                best = r;
                best_p = p;
            }
        }
        best
    }

    pub fn trend_or_expansion(&self) -> f64 {
        self.prob(Regime::Trend) + self.prob(Regime::VolatilityExpansion)
    }

    /// Shannon entropy in nats.
    pub fn entropy(&self) -> f64 {
        self.probs
            .iter()
            .filter(|p| **p > 0.0)
            .map(|p| -p * p.ln())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_weights_normalizes() {
        let b = RegimeBelief::from_weights([2.0, 1.0, 1.0, 0.0]).unwrap();
        assert!((b.prob(Regime::Trend) - 0.5).abs() < 1e-12);
        assert_eq!(b.most_likely(), Regime::Trend);
        assert!((b.as_array().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn from_weights_rejects_zero_or_nan_mass() {
        assert!(RegimeBelief::from_weights([0.0; 4]).is_none());
        assert!(RegimeBelief::from_weights([f64::NAN, 1.0, 1.0, 1.0]).is_none());
    }

    #[test]
    fn uniform_has_max_entropy() {
        let u = RegimeBelief::uniform();
        let peaked = RegimeBelief::from_weights([0.97, 0.01, 0.01, 0.01]).unwrap();
        assert!(u.entropy() > peaked.entropy());
    }
}
