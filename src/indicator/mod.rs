pub mod ema;
pub mod rsi;
pub mod sma;
pub mod volatility;

pub use ema::Ema;
pub use rsi::{Rsi, RSI_NEUTRAL};
pub use sma::Sma;
pub use volatility::{log_returns, mean_return, realized_volatility};
