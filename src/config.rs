use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::error::ForecastError;
use crate::model::Horizon;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const CONFIG_PATH_ENV: &str = "SANDBOX_FORECAST_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub forecast: ForecastConfig,
    pub regime: RegimeConfig,
    pub flow: FlowConfig,
    pub ensemble: EnsembleConfig,
    pub selector: SelectorConfig,
    pub feedback: FeedbackConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Bar interval of the supplied observations, e.g. "5m".
    pub bar_interval: String,
    pub default_horizons: Vec<String>,
    pub vol_window: usize,
    pub short_vol_window: usize,
    pub rsi_period: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub momentum_window: usize,
    pub vwap_window: usize,
    pub event_window_minutes: f64,
    pub trading_minutes_per_year: f64,
    pub min_sigma: f64,
    pub neutral_band: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            bar_interval: "5m".to_string(),
            default_horizons: ["5m", "15m", "1h", "4h", "1d"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            vol_window: 20,
            short_vol_window: 5,
            rsi_period: 14,
            ema_fast: 8,
            ema_slow: 21,
            momentum_window: 10,
            vwap_window: 20,
            event_window_minutes: 60.0,
            trading_minutes_per_year: 252.0 * 390.0,
            min_sigma: 1e-4,
            neutral_band: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Probability of staying in the same regime between calls.
    pub stickiness: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self { stickiness: 0.85 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Recency half-life for calibration, in samples.
    pub half_life: f64,
    pub min_calibration_samples: usize,
    pub ridge: f64,
    /// Days over which implied vol is assumed to converge to realized.
    pub iv_convergence_days: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            half_life: 60.0,
            min_calibration_samples: 8,
            ridge: 1e-9,
            iv_convergence_days: 30.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Weight kept on the old skill in each EMA update.
    pub skill_retain: f64,
    pub initial_skill: f64,
    pub regime_boost_floor: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            skill_retain: 0.7,
            initial_skill: 0.5,
            regime_boost_floor: 0.25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub conviction_threshold: f64,
    pub positive_gamma_breakout: f64,
    pub zero_dte_score: f64,
    pub post_event_window_minutes: f64,
    pub swing_expiry_days: u32,
    pub strike_increment: f64,
    pub stop_loss_fraction: f64,
    /// Time left on a 0DTE contract, in days, for pricing.
    pub intraday_time_days: f64,
    pub fallback_vol: f64,
    pub kelly_cap: f64,
    pub kelly_scale: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            conviction_threshold: 0.6,
            positive_gamma_breakout: 0.7,
            zero_dte_score: 1.5,
            post_event_window_minutes: 120.0,
            swing_expiry_days: 5,
            strike_increment: 1.0,
            stop_loss_fraction: 0.5,
            intraday_time_days: 0.25,
            fallback_vol: 0.2,
            kelly_cap: 0.25,
            kelly_scale: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub max_pending: usize,
    pub metric_window: usize,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            max_pending: 4_096,
            metric_window: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Parse an interval string (e.g. "1s", "5m", "1h", "1d", "1w", "1M") into milliseconds.
pub fn parse_interval_ms(s: &str) -> Result<u64> {
    let Some((split, _)) = s.char_indices().next_back() else {
        bail!("invalid interval '{}': expected format like '5m'", s);
    };
    if split == 0 {
        bail!("invalid interval '{}': expected format like '5m'", s);
    }

    let (num_str, suffix) = s.split_at(split);
    let n: u64 = num_str.parse().with_context(|| {
        format!(
            "invalid interval '{}': quantity must be a positive integer",
            s
        )
    })?;
    if n == 0 {
        bail!("invalid interval '{}': quantity must be > 0", s);
    }

    let unit_ms = match suffix {
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 7 * 86_400_000,
        "M" => 30 * 86_400_000,
        _ => bail!(
            "invalid interval '{}': unsupported suffix '{}', expected one of s/m/h/d/w/M",
            s,
            suffix
        ),
    };

    n.checked_mul(unit_ms)
        .with_context(|| format!("invalid interval '{}': value is too large", s))
}

impl ForecastConfig {
    /// Bar length in minutes. Falls back to 5 when `bar_interval` does not
    /// parse; `Config::validate` rejects that case up front.
    pub fn bar_minutes(&self) -> f64 {
        parse_interval_ms(&self.bar_interval)
            .map(|ms| ms as f64 / 60_000.0)
            .unwrap_or(5.0)
    }

    pub fn horizons(&self) -> Result<Vec<Horizon>, ForecastError> {
        Horizon::parse_list(&self.default_horizons)
    }
}

fn check_unit(name: &str, v: f64) -> Result<(), ForecastError> {
    if !(0.0..=1.0).contains(&v) {
        return Err(ForecastError::Config(format!(
            "{name} must be within [0, 1], got {v}"
        )));
    }
    Ok(())
}

fn check_non_negative(name: &str, v: f64) -> Result<(), ForecastError> {
    if !v.is_finite() || v < 0.0 {
        return Err(ForecastError::Config(format!(
            "{name} must be finite and >= 0, got {v}"
        )));
    }
    Ok(())
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to load {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse config toml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        parse_interval_ms(&self.forecast.bar_interval)
            .map_err(|e| ForecastError::Config(format!("forecast.bar_interval: {e:#}")))?;
        self.forecast.horizons()?;

        let windows = [
            ("forecast.vol_window", self.forecast.vol_window),
            ("forecast.short_vol_window", self.forecast.short_vol_window),
            ("forecast.rsi_period", self.forecast.rsi_period),
            ("forecast.ema_fast", self.forecast.ema_fast),
            ("forecast.ema_slow", self.forecast.ema_slow),
            ("forecast.momentum_window", self.forecast.momentum_window),
            ("forecast.vwap_window", self.forecast.vwap_window),
        ];
        for (name, w) in windows {
            if w == 0 {
                return Err(ForecastError::Config(format!("{name} must be > 0")));
            }
        }
        if self.forecast.ema_fast >= self.forecast.ema_slow {
            return Err(ForecastError::Config(
                "forecast.ema_fast must be shorter than forecast.ema_slow".to_string(),
            ));
        }

        check_unit("regime.stickiness", self.regime.stickiness)?;
        check_unit("ensemble.skill_retain", self.ensemble.skill_retain)?;
        check_unit("ensemble.initial_skill", self.ensemble.initial_skill)?;
        check_unit("selector.conviction_threshold", self.selector.conviction_threshold)?;
        check_unit(
            "selector.positive_gamma_breakout",
            self.selector.positive_gamma_breakout,
        )?;
        check_unit("selector.stop_loss_fraction", self.selector.stop_loss_fraction)?;
        check_unit("selector.kelly_cap", self.selector.kelly_cap)?;

        check_non_negative("forecast.min_sigma", self.forecast.min_sigma)?;
        check_non_negative("flow.ridge", self.flow.ridge)?;
        check_non_negative(
            "ensemble.regime_boost_floor",
            self.ensemble.regime_boost_floor,
        )?;
        check_non_negative("selector.fallback_vol", self.selector.fallback_vol)?;
        check_non_negative("selector.kelly_scale", self.selector.kelly_scale)?;

        if self.flow.half_life <= 0.0 {
            return Err(ForecastError::Config(
                "flow.half_life must be > 0".to_string(),
            ));
        }
        if self.selector.strike_increment <= 0.0 {
            return Err(ForecastError::Config(
                "selector.strike_increment must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
