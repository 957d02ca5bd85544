use std::collections::HashMap;

use serde::Serialize;

use crate::config::FlowConfig;
use crate::model::Horizon;

/// GEX and VANNA enter the kernel in billions of notional.
pub const BILLION: f64 = 1e9;
/// CHARM enters the kernel in millions of notional.
pub const MILLION: f64 = 1e6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowParams {
    pub decay: f64,
    pub gamma_coef: f64,
    pub vanna_coef: f64,
    pub charm_coef: f64,
}

impl FlowParams {
    pub fn default_for(horizon: Horizon) -> Self {
        let decay = match horizon {
            Horizon::M1 => 0.95,
            Horizon::M5 => 0.9,
            Horizon::M15 => 0.85,
            Horizon::H1 => 0.75,
            Horizon::H4 => 0.6,
            Horizon::D1 => 0.5,
        };
        Self {
            decay,
            gamma_coef: 0.02,
            vanna_coef: 0.015,
            charm_coef: 0.01,
        }
    }

    fn drift(&self, x: [f64; 3]) -> f64 {
        self.decay * (self.gamma_coef * x[0] + self.vanna_coef * x[1] + self.charm_coef * x[2])
    }
}

/// One historical outcome in raw notional units: the realized log return
/// together with GEX·Δvol, VANNA·Δvol and CHARM·Δt at forecast time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FlowSample {
    pub realized_return: f64,
    pub gex_dvol: f64,
    pub vanna_dvol: f64,
    pub charm_dt: f64,
}

impl FlowSample {
    /// Regressors in kernel units, gamma term sign-flipped.
    fn regressors(&self) -> [f64; 3] {
        [
            -self.gex_dvol / BILLION,
            self.vanna_dvol / BILLION,
            self.charm_dt / MILLION,
        ]
    }

    fn is_finite(&self) -> bool {
        self.realized_return.is_finite()
            && self.gex_dvol.is_finite()
            && self.vanna_dvol.is_finite()
            && self.charm_dt.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooFewSamples { have: usize, need: usize },
    Singular,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TooFewSamples { .. } => "calibration.too_few_samples",
            Self::Singular => "calibration.singular",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationOutcome {
    Fitted { samples: usize, params: FlowParams },
    Skipped(SkipReason),
}

/// Per-horizon dealer-flow drift model.
#[derive(Debug, Clone)]
pub struct FlowImpactKernel {
    cfg: FlowConfig,
    params: HashMap<Horizon, FlowParams>,
}

impl FlowImpactKernel {
    pub fn new(cfg: FlowConfig) -> Self {
        Self {
            cfg,
            params: HashMap::new(),
        }
    }

    /// Parameters for `horizon`, installing the defaults on first use.
    pub fn params(&mut self, horizon: Horizon) -> FlowParams {
        *self
            .params
            .entry(horizon)
            .or_insert_with(|| FlowParams::default_for(horizon))
    }

    /// Parameters without initializing; `None` before first use.
    pub fn peek(&self, horizon: Horizon) -> Option<FlowParams> {
        self.params.get(&horizon).copied()
    }

    pub fn estimate(
        &mut self,
        horizon: Horizon,
        gex: f64,
        vanna: f64,
        charm: f64,
        d_vol: f64,
        d_time: f64,
    ) -> f64 {
        let p = self.params(horizon);
        let x = [
            -(gex / BILLION) * d_vol,
            (vanna / BILLION) * d_vol,
            (charm / MILLION) * d_time,
        ];
        let out = p.drift(x);
        if out.is_finite() {
            out
        } else {
            0.0
        }
    }

    /// Recency-weighted least squares on `samples` (newest last). The decay
    /// is held fixed and the three sensitivities are re-fit.
    pub fn calibrate(&mut self, horizon: Horizon, samples: &[FlowSample]) -> CalibrationOutcome {
        let current = self.params(horizon);
        let usable: Vec<&FlowSample> = samples.iter().filter(|s| s.is_finite()).collect();
        let need = self.cfg.min_calibration_samples.max(3);
        if usable.len() < need {
            tracing::debug!(
                horizon = %horizon,
                have = usable.len(),
                need,
                "flow calibration skipped"
            );
            return CalibrationOutcome::Skipped(SkipReason::TooFewSamples {
                have: usable.len(),
                need,
            });
        }

        let lambda = std::f64::consts::LN_2 / self.cfg.half_life.max(f64::EPSILON);
        let decay = if current.decay.abs() > f64::EPSILON {
            current.decay
        } else {
            1.0
        };
        let mut xtx = [[0.0; 3]; 3];
        let mut xty = [0.0; 3];
        let last = usable.len() - 1;
        for (i, s) in usable.iter().enumerate() {
            let w = recency_weight((last - i) as f64, lambda);
            let x = s.regressors();
            let y = s.realized_return / decay;
            for r in 0..3 {
                xty[r] += w * x[r] * y;
                for c in 0..3 {
                    xtx[r][c] += w * x[r] * x[c];
                }
            }
        }
        let scale = (0..3).map(|i| xtx[i][i]).fold(0.0, f64::max);
        if scale <= f64::EPSILON {
            tracing::warn!(horizon = %horizon, "flow calibration singular; parameters unchanged");
            return CalibrationOutcome::Skipped(SkipReason::Singular);
        }
        for (i, row) in xtx.iter_mut().enumerate() {
            row[i] += self.cfg.ridge;
        }

        let Some(beta) = solve3(xtx, xty, scale * 1e-8) else {
            tracing::warn!(horizon = %horizon, "flow calibration singular; parameters unchanged");
            return CalibrationOutcome::Skipped(SkipReason::Singular);
        };
        let params = FlowParams {
            decay: current.decay,
            gamma_coef: beta[0],
            vanna_coef: beta[1],
            charm_coef: beta[2],
        };
        self.params.insert(horizon, params);
        tracing::info!(
            horizon = %horizon,
            samples = usable.len(),
            gamma_coef = params.gamma_coef,
            vanna_coef = params.vanna_coef,
            charm_coef = params.charm_coef,
            "flow kernel calibrated"
        );
        CalibrationOutcome::Fitted {
            samples: usable.len(),
            params,
        }
    }
}

pub fn recency_weight(age: f64, lambda: f64) -> f64 {
    (-lambda.max(0.0) * age.max(0.0)).exp()
}

/// Implied vol drifting toward realized over the horizon, capped at full
/// convergence after `convergence_days`. Zero when implied vol is unknown.
pub fn expected_vol_shift(
    realized_vol_annual: f64,
    implied_vol: f64,
    horizon: Horizon,
    convergence_days: f64,
) -> f64 {
    if implied_vol <= 0.0 || convergence_days <= 0.0 {
        return 0.0;
    }
    (realized_vol_annual - implied_vol) * (horizon.days() / convergence_days).min(1.0)
}

/// Gaussian elimination with partial pivoting. `None` when a pivot falls
/// below `tol`.
fn solve3(mut a: [[f64; 3]; 3], mut b: [f64; 3], tol: f64) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot = (col..3).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if !a[pivot][col].is_finite() || a[pivot][col].abs() <= tol {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..3 {
            let f = a[row][col] / a[col][col];
            for k in col..3 {
                a[row][k] -= f * a[col][k];
            }
            b[row] -= f * b[col];
        }
    }
    let mut x = [0.0; 3];
    for row in (0..3).rev() {
        let tail: f64 = (row + 1..3).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}
