use anyhow::{Context, Result};
use session::{DemandApi, HttpDemandApi};
use tracing::debug;

use crate::config::AppConfig;

pub async fn list_parts(config: &AppConfig) -> Result<()> {
    let api = HttpDemandApi::new(config.api.clone())?;
    let datasets = api
        .fetch_datasets()
        .await
        .context("Failed to load initial data")?;

    debug!("Backend knows {} part numbers", datasets.len());
    for (part, record) in &datasets {
        println!("{part}\t{} observations", record.historical_data.len());
    }
    Ok(())
}
