pub mod add_data;
pub mod parts;
pub mod show;

pub use add_data::add_data;
pub use parts::list_parts;
pub use show::show;

use anyhow::{Result, bail};
use session::{DashboardView, SyncEngine};
use tracing::debug;

use crate::report;

/// Loads the datasets and optionally switches to `part`, waiting until every
/// backend call triggered along the way has finished.
pub async fn open_session(engine: &mut SyncEngine, part: Option<&str>) -> Result<()> {
    engine.start();
    engine.settle().await;

    if let Some(part) = part {
        // Only an empty store (failed load) lets an unknown part through
        let store = engine.dashboard().store();
        if !store.is_empty() && !store.contains(part) {
            bail!("Unknown part number '{part}'");
        }
        debug!("Switching to part number {}", part);
        engine.select(part);
        engine.settle().await;
    }
    Ok(())
}

pub fn print_view(view: &DashboardView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        print!("{}", report::render(view));
    }
    Ok(())
}
