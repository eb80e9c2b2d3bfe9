//! In-memory source of truth for every part number's series.

use common::{Datasets, EntityRecord, HistoricalPoint, PredictionPoint};
use tracing::{debug, trace};

use crate::error::StoreError;

/// Fields to merge into an existing [`EntityRecord`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPatch {
    pub historical_data: Option<Vec<HistoricalPoint>>,
    pub predictions: Option<Vec<PredictionPoint>>,
}

impl EntityPatch {
    pub fn predictions(predictions: Vec<PredictionPoint>) -> Self {
        Self {
            predictions: Some(predictions),
            ..Default::default()
        }
    }
}

/// Insertion-ordered mapping from part number to its record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetStore {
    records: Datasets,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole store with a freshly loaded mapping.
    pub fn load_all(&mut self, datasets: Datasets) {
        debug!(entities = datasets.len(), "Replacing dataset store");
        self.records = datasets;
    }

    /// Merges `patch` into the record for `key`. The key must already exist.
    pub fn update_entity(&mut self, key: &str, patch: EntityPatch) -> Result<(), StoreError> {
        let record = self
            .records
            .get_mut(key)
            .ok_or_else(|| StoreError::UnknownEntity(key.to_string()))?;

        if let Some(historical) = patch.historical_data {
            record.historical_data = historical;
        }
        if let Some(predictions) = patch.predictions {
            record.predictions = predictions;
        }
        trace!(key, "Updated entity");
        Ok(())
    }

    /// Sets the record for `key`, creating it if needed.
    pub fn replace_entity(&mut self, key: &str, record: EntityRecord) {
        trace!(key, "Replaced entity");
        self.records.insert(key.to_string(), record);
    }

    pub fn get(&self, key: &str) -> Option<&EntityRecord> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Part numbers in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn first_key(&self) -> Option<&str> {
        self.records.keys().next().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy of the full mapping, used for bulk saves.
    pub fn snapshot(&self) -> Datasets {
        self.records.clone()
    }
}
