use anyhow::Result;
use tracing::trace;

use super::{open_session, print_view};
use crate::config::{AppConfig, initialize_engine};

pub async fn show(config: &AppConfig, part: Option<&str>, json: bool) -> Result<()> {
    trace!("Entering show command");
    let mut engine = initialize_engine(config)?;
    open_session(&mut engine, part).await?;
    print_view(&engine.view(), json)
}
