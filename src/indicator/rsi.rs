/// Wilder RSI. Reports 50 (neutral) until `period` deltas have been seen.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_price: Option<f64>,
    warmup_count: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: Option<f64>,
    avg_loss: Option<f64>,
}

pub const RSI_NEUTRAL: f64 = 50.0;

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(2),
            prev_price: None,
            warmup_count: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: None,
            avg_loss: None,
        }
    }

    pub fn push(&mut self, price: f64) {
        let Some(prev) = self.prev_price.replace(price) else {
            return;
        };

        let delta = price - prev;
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        let period = self.period as f64;

        match (self.avg_gain, self.avg_loss) {
            (Some(g), Some(l)) => {
                self.avg_gain = Some((g * (period - 1.0) + gain) / period);
                self.avg_loss = Some((l * (period - 1.0) + loss) / period);
            }
            _ => {
                self.gain_sum += gain;
                self.loss_sum += loss;
                self.warmup_count += 1;
                if self.warmup_count >= self.period {
                    self.avg_gain = Some(self.gain_sum / period);
                    self.avg_loss = Some(self.loss_sum / period);
                }
            }
        }
    }

    pub fn value(&self) -> Option<f64> {
        let avg_gain = self.avg_gain?;
        let avg_loss = self.avg_loss?;
        if avg_loss <= f64::EPSILON {
            if avg_gain <= f64::EPSILON {
                return Some(RSI_NEUTRAL);
            }
            return Some(100.0);
        }
        let rs = avg_gain / avg_loss;
        Some(100.0 - (100.0 / (1.0 + rs)))
    }

    pub fn value_or_neutral(&self) -> f64 {
        self.value().unwrap_or(RSI_NEUTRAL)
    }
}
