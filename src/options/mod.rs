pub mod premium;
pub mod selector;

pub use premium::{normal_cdf, ApproxPremiumModel, PremiumModel, PremiumQuote, DAYS_PER_YEAR};
pub use selector::{round_to_increment, OptionsTradeSelector, SelectionInputs};
