pub mod forecast;
pub mod horizon;
pub mod market;
pub mod regime;
pub mod trade;

pub use forecast::{Direction, ForecastCone, HorizonForecast};
pub use horizon::Horizon;
pub use market::{
    DarkPoolPrint, EventKind, MarketEvent, MarketInputs, MarketObservation, OptionRight,
    OptionsSnapshot,
};
pub use regime::{Regime, RegimeBelief, NUM_REGIMES};
pub use trade::{NoTradeReason, OptionSide, OptionTradeRecommendation, TradeRationale, NO_EDGE};
