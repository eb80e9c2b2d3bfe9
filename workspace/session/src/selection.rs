//! Tracks the active part number and projects its series out of the store.

use common::{HistoricalPoint, PredictionPoint};
use tracing::debug;

use crate::store::DatasetStore;

/// The two series the chart consumes for the active part number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub historical: Vec<HistoricalPoint>,
    pub predictions: Vec<PredictionPoint>,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    active: Option<String>,
    auto_selected: bool,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Makes `key` active. Returns `false` when it already was.
    ///
    /// The key does not have to exist in the store yet; projecting an unknown
    /// key yields empty series.
    pub fn select(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if self.active.as_deref() == Some(key.as_str()) {
            return false;
        }
        debug!(key = %key, "Selected part number");
        self.active = Some(key);
        true
    }

    /// Selects the first key the first time the store becomes non-empty.
    ///
    /// Fires at most once. A key the user already picked is kept if the store
    /// knows it. Returns the newly selected key, if any.
    pub fn auto_select(&mut self, store: &DatasetStore) -> Option<&str> {
        if self.auto_selected || store.is_empty() {
            return None;
        }
        self.auto_selected = true;

        if let Some(current) = self.active.as_deref() {
            if store.contains(current) {
                return None;
            }
        }

        let first = store.first_key()?.to_string();
        debug!(key = %first, "Auto-selected first part number");
        self.active = Some(first);
        self.active.as_deref()
    }

    /// Reads the active entity's series. Empty when nothing (known) is selected.
    pub fn project(&self, store: &DatasetStore) -> Projection {
        self.active
            .as_deref()
            .and_then(|key| store.get(key))
            .map(|record| Projection {
                historical: record.historical_data.clone(),
                predictions: record.predictions.clone(),
            })
            .unwrap_or_default()
    }
}
