use super::sma::Sma;

/// Exponential Moving Average, seeded with the SMA of the first `period` values.
#[derive(Debug, Clone)]
pub struct Ema {
    multiplier: f64,
    ema: Option<f64>,
    seed: Sma,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            multiplier: 2.0 / (period as f64 + 1.0),
            ema: None,
            seed: Sma::new(period),
        }
    }

    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.ema = match self.ema {
            Some(prev) => Some((value - prev) * self.multiplier + prev),
            None => self.seed.push(value),
        };
        self.ema
    }

    pub fn value(&self) -> Option<f64> {
        self.ema
    }

    /// Current EMA, or the running mean while still seeding.
    pub fn value_or_partial(&self) -> Option<f64> {
        self.ema.or_else(|| self.seed.partial_mean())
    }

    pub fn period(&self) -> usize {
        self.seed.period()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_with_sma_then_smooths() {
        let mut ema = Ema::new(3);
        assert_eq!(ema.push(1.0), None);
        assert_eq!(ema.push(2.0), None);
        assert!((ema.push(3.0).unwrap() - 2.0).abs() < 1e-12);
        // multiplier 0.5
        assert!((ema.push(6.0).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn partial_value_while_seeding() {
        let mut ema = Ema::new(5);
        ema.push(4.0);
        ema.push(6.0);
        assert_eq!(ema.value(), None);
        assert!((ema.value_or_partial().unwrap() - 5.0).abs() < 1e-12);
    }
}
