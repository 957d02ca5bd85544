use crate::config::ForecastConfig;
use crate::features::set::{Feature, FeatureSet};
use crate::indicator::{log_returns, mean_return, realized_volatility, Ema, Rsi};
use crate::model::{
    DarkPoolPrint, MarketEvent, MarketInputs, MarketObservation, OptionRight, OptionsSnapshot,
};

const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Derives a [`FeatureSet`] from one call's raw inputs. Holds configuration
/// only; `extract` is a pure function of its arguments.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    cfg: ForecastConfig,
    bars_per_year: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowAggregates {
    pub gex: f64,
    pub vanna: f64,
    pub charm: f64,
    pub implied_vol: f64,
    pub term_slope: f64,
    pub skew: f64,
}

impl FeatureExtractor {
    pub fn new(cfg: ForecastConfig) -> Self {
        let bars_per_year = cfg.trading_minutes_per_year / cfg.bar_minutes().max(1e-9);
        Self { cfg, bars_per_year }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.cfg
    }

    pub fn extract(&self, inputs: &MarketInputs) -> FeatureSet {
        let bars: Vec<&MarketObservation> = inputs.bars().collect();
        let price = inputs.observation.close;
        let mut pairs = Vec::with_capacity(24);

        pairs.push((Feature::Price, price));
        pairs.extend(self.technical(&bars, price));

        let spot = if price > f64::EPSILON {
            price
        } else {
            inputs
                .options
                .iter()
                .map(|o| o.underlying_price)
                .find(|p| *p > f64::EPSILON)
                .unwrap_or(0.0)
        };
        let flow = options_aggregates(&inputs.options, spot);
        pairs.push((Feature::Gex, flow.gex));
        pairs.push((Feature::Vanna, flow.vanna));
        pairs.push((Feature::Charm, flow.charm));
        pairs.push((Feature::ImpliedVol, flow.implied_vol));
        pairs.push((Feature::TermSlope, flow.term_slope));
        pairs.push((Feature::Skew, flow.skew));

        let (dp_ratio, dp_volume) = dark_pool_imbalance(&inputs.dark_pool);
        pairs.push((Feature::DarkPoolRatio, dp_ratio));
        pairs.push((Feature::DarkPoolVolume, dp_volume));

        let (flag, since) = event_proximity(
            &inputs.events,
            inputs.as_of(),
            self.cfg.event_window_minutes,
        );
        pairs.push((Feature::EventFlag, flag));
        pairs.push((Feature::MinutesSinceEvent, since));

        FeatureSet::from_pairs(pairs)
    }

    fn technical(&self, bars: &[&MarketObservation], price: f64) -> Vec<(Feature, f64)> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let returns = log_returns(&closes);

        let rv = realized_volatility(&returns, self.cfg.vol_window);
        let rv_short = realized_volatility(&returns, self.cfg.short_vol_window);
        // A flat recent window against a moving long one reads as 0.
        let vol_ratio = if rv > f64::EPSILON {
            rv_short / rv
        } else {
            1.0
        };

        let mut rsi = Rsi::new(self.cfg.rsi_period);
        let mut fast = Ema::new(self.cfg.ema_fast);
        let mut slow = Ema::new(self.cfg.ema_slow);
        for c in &closes {
            rsi.push(*c);
            fast.push(*c);
            slow.push(*c);
        }

        let trend_strength = match (fast.value_or_partial(), slow.value_or_partial()) {
            (Some(f), Some(s)) if rv > f64::EPSILON && price > f64::EPSILON => {
                let scale = price * rv * (self.cfg.ema_slow as f64).sqrt();
                ((f - s) / scale).tanh()
            }
            _ => 0.0,
        };

        let window_start = bars.len().saturating_sub(self.cfg.vwap_window.max(1));
        let window = &bars[window_start..];
        let vwap = volume_weighted_price(window).unwrap_or(price);
        let vwap_distance = if vwap > f64::EPSILON {
            (price - vwap) / vwap
        } else {
            0.0
        };

        vec![
            (Feature::LastReturn, returns.last().copied().unwrap_or(0.0)),
            (Feature::RealizedVol, rv),
            (Feature::RealizedVolAnnual, rv * self.bars_per_year.sqrt()),
            (Feature::VolRatio, vol_ratio),
            (Feature::Rsi, rsi.value_or_neutral()),
            (Feature::TrendStrength, trend_strength),
            (
                Feature::Momentum,
                mean_return(&returns, self.cfg.momentum_window),
            ),
            (Feature::Vwap, vwap),
            (Feature::VwapDistance, vwap_distance),
            (Feature::VolumeSurge, volume_surge(window)),
        ]
    }
}

fn volume_weighted_price(bars: &[&MarketObservation]) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }
    let (pv, v) = bars
        .iter()
        .filter(|b| b.volume > 0.0)
        .fold((0.0, 0.0), |(pv, v), b| {
            (pv + b.typical_price() * b.volume, v + b.volume)
        });
    if v > f64::EPSILON {
        return Some(pv / v);
    }
    Some(bars.iter().map(|b| b.typical_price()).sum::<f64>() / bars.len() as f64)
}

/// Last bar's volume relative to the mean of the bars before it.
fn volume_surge(bars: &[&MarketObservation]) -> f64 {
    let Some((last, prior)) = bars.split_last() else {
        return 1.0;
    };
    if prior.is_empty() {
        return 1.0;
    }
    let mean = prior.iter().map(|b| b.volume.max(0.0)).sum::<f64>() / prior.len() as f64;
    if mean <= f64::EPSILON {
        return 1.0;
    }
    last.volume.max(0.0) / mean
}

/// Signed dealer exposures and IV structure. An empty chain yields all zeros.
pub fn options_aggregates(chain: &[OptionsSnapshot], spot: f64) -> FlowAggregates {
    let rows: Vec<&OptionsSnapshot> = chain
        .iter()
        .filter(|o| o.open_interest.is_finite() && o.open_interest >= 0.0)
        .filter(|o| has_finite_greeks(o))
        .collect();
    if rows.is_empty() {
        return FlowAggregates::default();
    }

    let mut out = FlowAggregates::default();
    for o in &rows {
        let s = if o.underlying_price > f64::EPSILON {
            o.underlying_price
        } else {
            spot
        };
        let sign = o.right.exposure_sign();
        let notional = o.open_interest * CONTRACT_MULTIPLIER;
        out.gex += sign * o.gamma * notional * s * s * 0.01;
        out.vanna += sign * o.vega * o.delta * notional;
        out.charm += sign * o.theta * notional;
    }

    let with_iv: Vec<&OptionsSnapshot> = rows
        .iter()
        .copied()
        .filter(|o| o.implied_vol > 0.0)
        .collect();
    if with_iv.is_empty() {
        return out;
    }

    let total_oi: f64 = with_iv.iter().map(|o| o.open_interest).sum();
    out.implied_vol = if total_oi > f64::EPSILON {
        with_iv
            .iter()
            .map(|o| o.implied_vol * o.open_interest)
            .sum::<f64>()
            / total_oi
    } else {
        with_iv.iter().map(|o| o.implied_vol).sum::<f64>() / with_iv.len() as f64
    };

    let mut expiries: Vec<f64> = with_iv.iter().map(|o| o.time_to_expiry).collect();
    expiries.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    expiries.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    if expiries.len() >= 2 {
        let cut = expiries[(expiries.len() - 1) / 2];
        let near = mean_iv(
            with_iv
                .iter()
                .copied()
                .filter(|o| o.time_to_expiry <= cut + 1e-9),
        );
        let far = mean_iv(
            with_iv
                .iter()
                .copied()
                .filter(|o| o.time_to_expiry > cut + 1e-9),
        );
        if let (Some(n), Some(f)) = (near, far) {
            out.term_slope = f - n;
        }
    }

    let puts = mean_iv(with_iv.iter().copied().filter(|o| o.right == OptionRight::Put));
    let calls = mean_iv(with_iv.iter().copied().filter(|o| o.right == OptionRight::Call));
    if let (Some(p), Some(c)) = (puts, calls) {
        out.skew = p - c;
    }
    out
}

fn has_finite_greeks(o: &OptionsSnapshot) -> bool {
    [o.gamma, o.vega, o.delta, o.theta, o.underlying_price]
        .iter()
        .all(|v| v.is_finite())
}

fn mean_iv<'a, I>(rows: I) -> Option<f64>
where
    I: Iterator<Item = &'a OptionsSnapshot>,
{
    let (sum, n) = rows.fold((0.0, 0usize), |(s, n), o| (s + o.implied_vol, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Net short-flagged minus other volume over total volume, plus total volume.
/// Short-flagged prints are treated as dealers selling into customer buying.
pub fn dark_pool_imbalance(prints: &[DarkPoolPrint]) -> (f64, f64) {
    let (short, total) = prints
        .iter()
        .filter(|p| p.size.is_finite() && p.size > 0.0)
        .fold((0.0, 0.0), |(short, total), p| {
            let s = if p.is_short { p.size } else { 0.0 };
            (short + s, total + p.size)
        });
    if total <= f64::EPSILON {
        return (0.0, 0.0);
    }
    (((2.0 * short) - total) / total, total)
}

/// `(flag, minutes_since)` for high-importance events. The flag is set when
/// one lies within `window_minutes` of `as_of` on either side; minutes since
/// the latest past one is -1 when there is none.
pub fn event_proximity(
    events: &[MarketEvent],
    as_of: chrono::DateTime<chrono::Utc>,
    window_minutes: f64,
) -> (f64, f64) {
    let mut flag = 0.0;
    let mut since: Option<f64> = None;
    for e in events.iter().filter(|e| e.is_high_importance()) {
        let delta_min = (as_of - e.timestamp).num_seconds() as f64 / 60.0;
        if delta_min.abs() <= window_minutes {
            flag = 1.0;
        }
        if delta_min >= 0.0 {
            since = Some(since.map_or(delta_min, |s| s.min(delta_min)));
        }
    }
    (flag, since.unwrap_or(-1.0))
}
