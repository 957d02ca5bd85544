use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One closed OHLCV bar for the instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketObservation {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl MarketObservation {
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Call,
    Put,
}

impl OptionRight {
    /// Dealer-positioning sign: customer-long calls leave dealers long gamma,
    /// customer-long puts leave them short.
    pub fn exposure_sign(self) -> f64 {
        match self {
            Self::Call => 1.0,
            Self::Put => -1.0,
        }
    }
}

/// A single strike/expiry line from the options chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsSnapshot {
    pub underlying_price: f64,
    pub strike: f64,
    /// Time to expiry in years.
    pub time_to_expiry: f64,
    pub right: OptionRight,
    #[serde(default)]
    pub bid: f64,
    #[serde(default)]
    pub mid: f64,
    #[serde(default)]
    pub ask: f64,
    pub implied_vol: f64,
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub open_interest: f64,
    #[serde(default)]
    pub volume: f64,
}

/// Off-exchange print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DarkPoolPrint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub size: f64,
    #[serde(default)]
    pub is_short: bool,
    #[serde(default)]
    pub venue: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Fomc,
    Cpi,
    Earnings,
    Opex,
    Nfp,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub id: String,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    /// 1 (low) ..= 3 (high).
    pub importance: u8,
    #[serde(default)]
    pub scope: String,
}

impl MarketEvent {
    pub fn is_high_importance(&self) -> bool {
        self.importance >= 3
    }
}

/// Everything one prediction call consumes. `history` holds the trailing
/// bars before `observation`, oldest first; it may be empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInputs {
    pub observation: MarketObservation,
    #[serde(default)]
    pub history: Vec<MarketObservation>,
    #[serde(default)]
    pub options: Vec<OptionsSnapshot>,
    #[serde(default)]
    pub dark_pool: Vec<DarkPoolPrint>,
    #[serde(default)]
    pub events: Vec<MarketEvent>,
}

impl MarketInputs {
    pub fn new(observation: MarketObservation) -> Self {
        Self {
            observation,
            history: Vec::new(),
            options: Vec::new(),
            dark_pool: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.observation.symbol
    }

    pub fn as_of(&self) -> DateTime<Utc> {
        self.observation.timestamp
    }

    /// History followed by the current observation.
    pub fn bars(&self) -> impl Iterator<Item = &MarketObservation> {
        self.history.iter().chain(std::iter::once(&self.observation))
    }
}
