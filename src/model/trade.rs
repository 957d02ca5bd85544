use serde::{Deserialize, Serialize};

pub const NO_EDGE: &str = "no edge";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionSide {
    Call,
    Put,
}

impl OptionSide {
    pub fn sign(self) -> f64 {
        match self {
            Self::Call => 1.0,
            Self::Put => -1.0,
        }
    }
}

/// Stable taxonomy for why the selector declined to trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoTradeReason {
    InsufficientHorizons,
    DirectionConflict,
    NoDirectionalEdge,
    LowConviction,
    PositiveGammaDampening,
    InvalidPrice,
}

impl NoTradeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientHorizons => "no_trade.insufficient_horizons",
            Self::DirectionConflict => "no_trade.direction_conflict",
            Self::NoDirectionalEdge => "no_trade.no_directional_edge",
            Self::LowConviction => "no_trade.low_conviction",
            Self::PositiveGammaDampening => "no_trade.positive_gamma_dampening",
            Self::InvalidPrice => "no_trade.invalid_price",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRationale {
    pub direction: String,
    pub regime: String,
    pub flow: String,
    pub timing: String,
}

impl TradeRationale {
    pub fn no_edge() -> Self {
        Self {
            direction: NO_EDGE.to_string(),
            regime: NO_EDGE.to_string(),
            flow: NO_EDGE.to_string(),
            timing: NO_EDGE.to_string(),
        }
    }

    pub fn is_no_edge(&self) -> bool {
        [&self.direction, &self.regime, &self.flow, &self.timing]
            .iter()
            .all(|c| c.as_str() == NO_EDGE)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}; {}; {}; {}",
            self.direction, self.regime, self.flow, self.timing
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionTradeRecommendation {
    /// `None` means no trade.
    pub side: Option<OptionSide>,
    pub strike: f64,
    pub expiry_days: u32,
    pub target_delta: f64,
    pub entry_price: f64,
    pub target_exit: f64,
    pub stop_loss: f64,
    pub confidence: f64,
    /// Suggested fraction of capital at risk.
    pub kelly_fraction: f64,
    pub rationale: TradeRationale,
    pub no_trade_reason: Option<NoTradeReason>,
}

impl OptionTradeRecommendation {
    pub fn no_trade(reason: NoTradeReason) -> Self {
        Self {
            side: None,
            strike: 0.0,
            expiry_days: 0,
            target_delta: 0.0,
            entry_price: 0.0,
            target_exit: 0.0,
            stop_loss: 0.0,
            confidence: 0.0,
            kelly_fraction: 0.0,
            rationale: TradeRationale::no_edge(),
            no_trade_reason: Some(reason),
        }
    }

    pub fn is_trade(&self) -> bool {
        self.side.is_some()
    }
}
