use crate::model::OptionSide;

pub const DAYS_PER_YEAR: f64 = 365.0;
/// Time-value coefficient: 0.4 ≈ 1/sqrt(2π), the at-the-money Black-Scholes slope.
const TIME_VALUE_COEF: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PremiumQuote {
    pub side: OptionSide,
    pub spot: f64,
    pub strike: f64,
    /// Time to expiry in years.
    pub years: f64,
    /// Annualized volatility.
    pub vol: f64,
}

impl PremiumQuote {
    pub fn intrinsic(&self) -> f64 {
        match self.side {
            OptionSide::Call => (self.spot - self.strike).max(0.0),
            OptionSide::Put => (self.strike - self.spot).max(0.0),
        }
    }

    fn vol_root_t(&self) -> f64 {
        self.vol.max(0.0) * self.years.max(0.0).sqrt()
    }
}

/// Prices a single-leg option for the selector. Swapping the implementation
/// leaves the selector's inputs and outputs unchanged.
pub trait PremiumModel {
    fn premium(&self, quote: &PremiumQuote) -> f64;
    fn delta(&self, quote: &PremiumQuote) -> f64;
}

/// Intrinsic value plus a Gaussian-damped time value; not a full pricer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxPremiumModel;

impl PremiumModel for ApproxPremiumModel {
    fn premium(&self, q: &PremiumQuote) -> f64 {
        if q.spot <= f64::EPSILON || q.strike <= f64::EPSILON {
            return 0.0;
        }
        let s = q.vol_root_t();
        let intrinsic = q.intrinsic();
        if s <= f64::EPSILON {
            return intrinsic;
        }
        let m = (q.strike / q.spot).ln();
        let time_value = TIME_VALUE_COEF * s * q.spot * (-(m * m) / (2.0 * s * s)).exp();
        intrinsic + time_value
    }

    fn delta(&self, q: &PremiumQuote) -> f64 {
        if q.spot <= f64::EPSILON || q.strike <= f64::EPSILON {
            return 0.0;
        }
        let s = q.vol_root_t();
        let call_delta = if s <= f64::EPSILON {
            if q.spot > q.strike {
                1.0
            } else if q.spot < q.strike {
                0.0
            } else {
                0.5
            }
        } else {
            let d1 = ((q.spot / q.strike).ln() + 0.5 * s * s) / s;
            normal_cdf(d1)
        };
        match q.side {
            OptionSide::Call => call_delta,
            OptionSide::Put => call_delta - 1.0,
        }
    }
}

pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf_approx(x / 2f64.sqrt()))
}

// Abramowitz-Stegun 7.1.26; max error around 1.5e-7.
fn erf_approx(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let y = 1.0 - (((((a5 * t + a4) * t + a3) * t + a2) * t + a1) * t * (-x * x).exp());
    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(side: OptionSide, strike: f64) -> PremiumQuote {
        PremiumQuote {
            side,
            spot: 100.0,
            strike,
            years: 30.0 / DAYS_PER_YEAR,
            vol: 0.2,
        }
    }

    #[test]
    fn normal_cdf_is_symmetric() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.0) + normal_cdf(-1.0) - 1.0).abs() < 1e-7);
    }

    #[test]
    fn atm_premium_is_time_value_only() {
        let q = quote(OptionSide::Call, 100.0);
        let expected = 0.4 * 0.2 * (30.0f64 / 365.0).sqrt() * 100.0;
        assert!((ApproxPremiumModel.premium(&q) - expected).abs() < 1e-9);
    }

    #[test]
    fn put_delta_is_call_delta_minus_one() {
        let c = ApproxPremiumModel.delta(&quote(OptionSide::Call, 105.0));
        let p = ApproxPremiumModel.delta(&quote(OptionSide::Put, 105.0));
        assert!((c - p - 1.0).abs() < 1e-12);
        assert!(c > 0.0 && c < 0.5);
    }
}
