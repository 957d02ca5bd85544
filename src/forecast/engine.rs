use crate::model::{Direction, ForecastCone, Horizon, HorizonForecast};

pub const Z_80: f64 = 1.28;
pub const Z_60: f64 = 0.84;

/// Log-normal price cone around `current_price · e^mean`.
///
/// A zero, negative or non-finite variance yields a degenerate cone with every
/// level at the expected price and a directional score of 0.
pub fn build_cone(current_price: f64, mean: f64, variance: f64, horizon: Horizon) -> ForecastCone {
    let mean = if mean.is_finite() { mean } else { 0.0 };
    let std = if variance.is_finite() && variance > 0.0 {
        variance.sqrt()
    } else {
        0.0
    };
    let expected = current_price * mean.exp();
    let level = |z: f64| current_price * (mean + z * std).exp();

    if std <= 0.0 {
        return ForecastCone {
            horizon,
            current_price,
            expected_price: expected,
            upper80: expected,
            upper60: expected,
            median: expected,
            lower40: expected,
            lower20: expected,
            directional_score: 0.0,
            mean,
            std: 0.0,
        };
    }

    ForecastCone {
        horizon,
        current_price,
        expected_price: expected,
        upper80: level(Z_80),
        upper60: level(Z_60),
        median: expected,
        lower40: level(-Z_60),
        lower20: level(-Z_80),
        directional_score: mean / std,
        mean,
        std,
    }
}

/// Direction label plus target/stop from the inner band.
pub fn horizon_forecast(cone: ForecastCone, neutral_band: f64) -> HorizonForecast {
    let direction = Direction::from_score(cone.directional_score, neutral_band);
    let (target, stop_loss) = match direction {
        Direction::Bullish => (cone.upper60, cone.lower40),
        Direction::Bearish => (cone.lower40, cone.upper60),
        Direction::Neutral => (cone.expected_price, cone.expected_price),
    };
    let reward = (target - cone.current_price).abs();
    let risk = (cone.current_price - stop_loss).abs();
    let risk_reward = if direction != Direction::Neutral && risk > f64::EPSILON {
        reward / risk
    } else {
        0.0
    };
    HorizonForecast {
        cone,
        direction,
        target,
        stop_loss,
        risk_reward,
    }
}
