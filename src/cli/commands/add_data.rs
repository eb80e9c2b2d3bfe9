use anyhow::{Result, bail};
use tracing::{error, info, trace};

use super::{open_session, print_view};
use crate::config::{AppConfig, initialize_engine};

pub async fn add_data(config: &AppConfig, part: Option<&str>, count: u32, json: bool) -> Result<()> {
    trace!("Entering add-data command");
    let mut engine = initialize_engine(config)?;
    open_session(&mut engine, part).await?;

    if let Some(err) = engine.dashboard().error() {
        error!("Cannot append data: {}", err);
        bail!("{err}");
    }

    for appended in 1..=count {
        engine.add_data()?;
        engine.settle().await;

        if let Some(err) = engine.dashboard().error() {
            let message = err.to_string();
            error!("Append {} of {} failed: {}", appended, count, message);
            print_view(&engine.view(), json)?;
            bail!(message);
        }
        info!("Appended observation {} of {}", appended, count);
    }

    print_view(&engine.view(), json)
}
