use anyhow::{Context, Result};
use compute::{DEFAULT_MAX_DEMAND, DEFAULT_MIN_DEMAND, DemandSampler};
use session::{ApiSettings, HttpDemandApi, SyncEngine};
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

/// Runtime configuration assembled from CLI flags and the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiSettings,
    /// Seed for synthetic demand; `None` draws from the OS
    pub seed: Option<u64>,
    /// Synthetic demand bounds, upper bound exclusive
    pub demand_range: Range<u32>,
}

impl AppConfig {
    pub fn new(api_url: &str, timeout_ms: u64) -> Result<Self> {
        let api = ApiSettings::new(api_url, Duration::from_millis(timeout_ms))
            .with_context(|| format!("Invalid backend URL '{api_url}'"))?;
        Ok(Self {
            api,
            seed: None,
            demand_range: DEFAULT_MIN_DEMAND..DEFAULT_MAX_DEMAND,
        })
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_demand_range(mut self, min: u32, max: u32) -> Self {
        self.demand_range = min..max;
        self
    }
}

/// Loads `.env` into the process environment, if one exists.
pub fn load_env() {
    dotenvy::dotenv().ok();
}

/// Build a dashboard engine talking to the configured backend
pub fn initialize_engine(config: &AppConfig) -> Result<SyncEngine> {
    tracing::info!("Using forecasting backend at {}", config.api.base_url());
    let api = HttpDemandApi::new(config.api.clone()).context("Failed to build HTTP client")?;

    let (start, end) = (config.demand_range.start, config.demand_range.end);
    let sampler = match config.seed {
        Some(seed) => DemandSampler::seeded(start, end, seed),
        None => DemandSampler::new(start, end),
    }
    .context("Invalid synthetic demand range")?;
    tracing::debug!("Synthetic demand drawn from {:?}", sampler.range());

    Ok(SyncEngine::new(Arc::new(api), sampler))
}
