use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    Price,
    LastReturn,
    RealizedVol,
    RealizedVolAnnual,
    VolRatio,
    Rsi,
    TrendStrength,
    Momentum,
    Vwap,
    VwapDistance,
    VolumeSurge,
    ImpliedVol,
    TermSlope,
    Skew,
    Gex,
    Vanna,
    Charm,
    DarkPoolRatio,
    DarkPoolVolume,
    EventFlag,
    MinutesSinceEvent,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::LastReturn => "last_return",
            Self::RealizedVol => "realized_vol",
            Self::RealizedVolAnnual => "realized_vol_annual",
            Self::VolRatio => "vol_ratio",
            Self::Rsi => "rsi",
            Self::TrendStrength => "trend_strength",
            Self::Momentum => "momentum",
            Self::Vwap => "vwap",
            Self::VwapDistance => "vwap_distance",
            Self::VolumeSurge => "volume_surge",
            Self::ImpliedVol => "implied_vol",
            Self::TermSlope => "term_slope",
            Self::Skew => "skew",
            Self::Gex => "gex",
            Self::Vanna => "vanna",
            Self::Charm => "charm",
            Self::DarkPoolRatio => "dark_pool_ratio",
            Self::DarkPoolVolume => "dark_pool_volume",
            Self::EventFlag => "event_flag",
            Self::MinutesSinceEvent => "minutes_since_event",
        }
    }
}

/// Immutable feature name -> value mapping produced once per prediction call.
/// Absent features read as 0.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    values: BTreeMap<Feature, f64>,
}

impl FeatureSet {
    pub fn from_pairs<I: IntoIterator<Item = (Feature, f64)>>(pairs: I) -> Self {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k, if v.is_finite() { v } else { 0.0 }))
            .collect();
        Self { values }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.values.get(&feature).copied().unwrap_or(0.0)
    }

    /// Copy with one value replaced. Used by callers that want to probe
    /// sensitivity without touching the original set.
    pub fn with(&self, feature: Feature, value: f64) -> Self {
        let mut values = self.values.clone();
        values.insert(feature, if value.is_finite() { value } else { 0.0 });
        Self { values }
    }
}

impl Serialize for FeatureSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.values.iter().map(|(k, v)| (k.as_str(), v)))
    }
}
