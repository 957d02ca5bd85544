use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::Config;
use crate::error::ForecastError;
use crate::feedback::OutcomeReport;
use crate::flow::{CalibrationOutcome, FlowSample};
use crate::model::{Horizon, MarketInputs};
use crate::pipeline::{ForecastPipeline, PredictionReport};

/// Routes calls to one [`ForecastPipeline`] per symbol. Work on a symbol
/// holds that symbol's lock for the whole call, so predictions, outcome
/// feedback and calibration never interleave for it; other symbols run
/// independently.
#[derive(Debug, Clone)]
pub struct ForecastService {
    cfg: Arc<Config>,
    pipelines: Arc<RwLock<HashMap<String, Arc<Mutex<ForecastPipeline>>>>>,
}

impl ForecastService {
    pub fn new(cfg: Config) -> Result<Self, ForecastError> {
        cfg.validate()?;
        Ok(Self {
            cfg: Arc::new(cfg),
            pipelines: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    async fn pipeline(&self, symbol: &str) -> Result<Arc<Mutex<ForecastPipeline>>, ForecastError> {
        let key = symbol.trim().to_ascii_uppercase();
        if let Some(p) = self.pipelines.read().await.get(&key) {
            return Ok(Arc::clone(p));
        }
        let mut map = self.pipelines.write().await;
        if let Some(p) = map.get(&key) {
            return Ok(Arc::clone(p));
        }
        let pipeline = Arc::new(Mutex::new(ForecastPipeline::new(
            key.clone(),
            (*self.cfg).clone(),
        )?));
        map.insert(key.clone(), Arc::clone(&pipeline));
        tracing::debug!(symbol = %key, "created forecast pipeline");
        Ok(pipeline)
    }

    pub async fn predict<S: AsRef<str>>(
        &self,
        inputs: &MarketInputs,
        horizons: &[S],
    ) -> Result<PredictionReport, ForecastError> {
        // Reject bad ids before a pipeline is created for the symbol.
        if !horizons.is_empty() {
            Horizon::parse_list(horizons)?;
        }
        let pipeline = self.pipeline(inputs.symbol()).await?;
        let mut guard = pipeline.lock().await;
        guard.predict(inputs, horizons)
    }

    pub async fn record_outcome(
        &self,
        symbol: &str,
        prediction_id: Uuid,
        horizon: Horizon,
        realized_price: f64,
    ) -> Result<OutcomeReport, ForecastError> {
        let pipeline = self.pipeline(symbol).await?;
        let mut guard = pipeline.lock().await;
        guard.record_outcome(prediction_id, horizon, realized_price)
    }

    pub async fn calibrate_flow(
        &self,
        symbol: &str,
        horizon: Horizon,
        samples: &[FlowSample],
    ) -> Result<CalibrationOutcome, ForecastError> {
        let pipeline = self.pipeline(symbol).await?;
        let mut guard = pipeline.lock().await;
        Ok(guard.calibrate_flow(horizon, samples))
    }

    /// Run `f` against a symbol's pipeline under its lock.
    pub async fn with_pipeline<R>(
        &self,
        symbol: &str,
        f: impl FnOnce(&mut ForecastPipeline) -> R,
    ) -> Result<R, ForecastError> {
        let pipeline = self.pipeline(symbol).await?;
        let mut guard = pipeline.lock().await;
        Ok(f(&mut guard))
    }

    pub async fn symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = self.pipelines.read().await.keys().cloned().collect();
        out.sort();
        out
    }
}
