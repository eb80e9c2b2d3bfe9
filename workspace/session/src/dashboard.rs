//! Dashboard state machine.
//!
//! [`Dashboard`] owns the dataset store, the selection and the transient UI
//! state (confidence, loading, last error). It never performs I/O: commands
//! and completions go in, [`Request`]s come out, and the engine executes them.
//!
//! Ordering: every train or predict request for a part number takes the next
//! generation of that part number. A completion is applied only if its
//! generation is still the latest one issued for its key, so a slow response
//! can never overwrite state produced by a newer trigger, whatever order
//! responses arrive in.
//!
//! Bulk saves run one at a time. A save requested while another is in flight
//! is held back and sent once the running one finishes, carrying the store as
//! it is at that point, so the backend never receives an older snapshot after
//! a newer one.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use common::{Datasets, ForecastResponse, HistoricalPoint, Period, combine_series};
use compute::DemandSummary;
use tracing::{debug, error, info, trace, warn};

use crate::error::{ApiError, Result, SyncError};
use crate::events::{Completion, Event, EventQueue, Generation, Request, SaveSequence};
use crate::selection::SelectionController;
use crate::store::{DatasetStore, EntityPatch};
use crate::view::DashboardView;

/// Confidence shown before the first forecast arrives
pub const DEFAULT_CONFIDENCE: f64 = 85.0;

pub const LOAD_FAILURE: &str = "Failed to load initial data";
pub const TRAIN_FAILURE: &str = "Failed to train model";
pub const APPEND_FAILURE: &str = "Failed to update data";

#[derive(Debug)]
pub struct Dashboard {
    store: DatasetStore,
    selection: SelectionController,
    queue: EventQueue,
    /// Latest generation issued per part number
    generations: HashMap<String, Generation>,
    /// Part numbers whose latest request has not completed
    outstanding: HashSet<String>,
    /// Part numbers with an appended point still waiting for a forecast
    pending_prediction: HashSet<String>,
    /// Last save sequence handed out
    save_sequence: SaveSequence,
    /// Save currently running on the backend
    save_in_flight: Option<SaveSequence>,
    /// Part number whose change is waiting for the running save to finish
    save_queued: Option<String>,
    confidence: f64,
    initial_load: bool,
    error: Option<String>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            store: DatasetStore::new(),
            selection: SelectionController::new(),
            queue: EventQueue::new(),
            generations: HashMap::new(),
            outstanding: HashSet::new(),
            pending_prediction: HashSet::new(),
            save_sequence: 0,
            save_in_flight: None,
            save_queued: None,
            confidence: DEFAULT_CONFIDENCE,
            initial_load: true,
            error: None,
        }
    }

    // ===================== Commands =====================

    /// Requests to issue when the dashboard comes up.
    pub fn start(&mut self) -> Vec<Request> {
        info!("Loading datasets");
        vec![Request::LoadDatasets]
    }

    /// Switches the active part number and retrains it.
    pub fn select(&mut self, key: impl Into<String>) -> Vec<Request> {
        let key = key.into();
        if self.selection.select(key.clone()) {
            self.queue.emit(Event::SeriesChanged { key });
        }
        self.pump()
    }

    /// Retrains the active part number on its current series.
    pub fn retrain(&mut self) -> Vec<Request> {
        if let Some(key) = self.selection.active() {
            let key = key.to_string();
            self.queue.emit(Event::SeriesChanged { key });
        }
        self.pump()
    }

    /// Appends an observation with `demand` after the active series' last month.
    ///
    /// The point is committed to the store immediately and the part number is
    /// marked as waiting for a forecast. A retrain is queued first and the
    /// predict request is issued after it, so the predict call holds the newest
    /// generation for the key.
    pub fn add_data(&mut self, demand: f64) -> Result<Vec<Request>> {
        self.error = None;
        let (key, month) = match self.commit_point(demand) {
            Ok(committed) => committed,
            Err(err) => {
                self.fail(APPEND_FAILURE, &err);
                return Err(err);
            }
        };

        self.queue.emit(Event::SeriesChanged { key: key.clone() });
        let mut requests = self.pump();

        let generation = self.issue(&key);
        debug!(key = %key, generation, month = %month, "Requesting prediction");
        requests.push(Request::Predict {
            key,
            generation,
            last_date: month,
        });
        Ok(requests)
    }

    /// Feeds the outcome of a backend call back into the dashboard.
    pub fn apply(&mut self, completion: Completion) -> Vec<Request> {
        self.queue.emit(Event::Completed(completion));
        self.pump()
    }

    // ===================== Reads =====================

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn active(&self) -> Option<&str> {
        self.selection.active()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.initial_load || !self.outstanding.is_empty()
    }

    pub fn is_pending_prediction(&self, key: &str) -> bool {
        self.pending_prediction.contains(key)
    }

    pub fn view(&self) -> DashboardView {
        let projection = self.selection.project(&self.store);
        let active = self.selection.active();

        DashboardView {
            combined: combine_series(&projection.historical, &projection.predictions),
            confidence: self.confidence,
            summary: DemandSummary::from_series(&projection.historical),
            loading: self.is_loading(),
            error: self.error.clone(),
            entities: self.store.keys().map(str::to_string).collect(),
            active: active.map(str::to_string),
            pending_prediction: active.is_some_and(|key| self.pending_prediction.contains(key)),
        }
    }

    // ===================== Event processing =====================

    fn pump(&mut self) -> Vec<Request> {
        let mut requests = Vec::new();
        while let Some(event) = self.queue.next() {
            let issued = match event {
                Event::SeriesChanged { key } => self.on_series_changed(key),
                Event::Completed(completion) => self.on_completed(completion),
            };
            requests.extend(issued);
        }
        requests
    }

    fn on_series_changed(&mut self, key: String) -> Option<Request> {
        if self.selection.active() != Some(key.as_str()) {
            trace!(key = %key, "Ignoring change of inactive part number");
            return None;
        }

        let historical = self
            .store
            .get(&key)
            .map(|record| record.historical_data.clone())
            .unwrap_or_default();
        if historical.is_empty() {
            debug!(key = %key, "No historical data, skipping training");
            return None;
        }

        self.error = None;
        let generation = self.issue(&key);
        info!(key = %key, generation, points = historical.len(), "Training model");
        Some(Request::Train {
            key,
            generation,
            historical,
        })
    }

    fn on_completed(&mut self, completion: Completion) -> Option<Request> {
        match completion {
            Completion::Loaded(result) => {
                self.on_loaded(result);
                None
            }
            Completion::Trained {
                key,
                generation,
                result,
            } => {
                self.on_trained(&key, generation, result);
                None
            }
            Completion::Predicted {
                key,
                generation,
                result,
            } => self.on_predicted(key, generation, result),
            Completion::Saved {
                key,
                sequence,
                result,
            } => self.on_saved(key, sequence, result),
        }
    }

    fn on_loaded(&mut self, result: std::result::Result<Datasets, ApiError>) {
        self.initial_load = false;
        match result {
            Ok(datasets) => {
                self.store.load_all(datasets);
                self.error = None;
                self.selection.auto_select(&self.store);
                if let Some(key) = self.selection.active() {
                    let key = key.to_string();
                    self.queue.emit(Event::SeriesChanged { key });
                }
            }
            Err(err) => self.fail(LOAD_FAILURE, &err),
        }
    }

    fn on_trained(
        &mut self,
        key: &str,
        generation: Generation,
        result: std::result::Result<ForecastResponse, ApiError>,
    ) {
        if !self.settle(key, generation) {
            debug!(key, generation, "Discarding superseded training result");
            return;
        }
        match result {
            Ok(forecast) => self.accept_forecast(key, forecast),
            Err(err) => self.fail(TRAIN_FAILURE, &err),
        }
    }

    fn on_predicted(
        &mut self,
        key: String,
        generation: Generation,
        result: std::result::Result<ForecastResponse, ApiError>,
    ) -> Option<Request> {
        let current = self.settle(&key, generation);
        match (current, result) {
            (true, Ok(forecast)) => {
                self.accept_forecast(&key, forecast);
                self.request_save(key)
            }
            (false, Ok(_)) => {
                // The forecast is outdated but the appended point still has to reach the backend.
                debug!(key = %key, generation, "Discarding superseded prediction, saving anyway");
                self.request_save(key)
            }
            (true, Err(err)) => {
                self.fail(APPEND_FAILURE, &err);
                None
            }
            (false, Err(err)) => {
                debug!(key = %key, generation, %err, "Ignoring failure of superseded prediction");
                None
            }
        }
    }

    fn on_saved(
        &mut self,
        key: String,
        sequence: SaveSequence,
        result: std::result::Result<(), ApiError>,
    ) -> Option<Request> {
        if self.save_in_flight != Some(sequence) {
            debug!(key = %key, sequence, "Ignoring result of superseded save");
            return None;
        }
        self.save_in_flight = None;

        match (result, self.save_queued.take()) {
            (Ok(()), None) => {
                info!(key = %key, sequence, "Datasets persisted");
                None
            }
            (Ok(()), Some(next)) => {
                info!(key = %key, sequence, "Datasets persisted, sending newer snapshot");
                self.request_save(next)
            }
            (Err(err), Some(next)) => {
                warn!(key = %key, sequence, %err, "Save failed, newer snapshot replaces it");
                self.request_save(next)
            }
            (Err(err), None) => {
                self.fail(APPEND_FAILURE, &err);
                None
            }
        }
    }

    // ===================== Helpers =====================

    fn commit_point(&mut self, demand: f64) -> Result<(String, Period)> {
        let key = self
            .selection
            .active()
            .ok_or(SyncError::NoActiveEntity)?
            .to_string();

        let mut record = self
            .store
            .get(&key)
            .cloned()
            .ok_or_else(|| SyncError::EmptyHistory(key.clone()))?;
        let month = record
            .last_observed()
            .ok_or_else(|| SyncError::EmptyHistory(key.clone()))?
            .month
            .next()?;

        record.historical_data.push(HistoricalPoint::observed(month, demand));
        self.store.replace_entity(&key, record);
        self.pending_prediction.insert(key.clone());
        info!(key = %key, month = %month, demand, "Appended data point");
        Ok((key, month))
    }

    fn accept_forecast(&mut self, key: &str, forecast: ForecastResponse) {
        let ForecastResponse {
            predictions,
            confidence,
        } = forecast;

        if let Err(err) = self.store.update_entity(key, EntityPatch::predictions(predictions)) {
            error!(%err, "Forecast arrived for a part number missing from the store");
            return;
        }
        self.pending_prediction.remove(key);
        if self.selection.active() == Some(key) {
            self.confidence = confidence;
        }
        debug!(key, confidence, "Forecast applied");
    }

    /// Saves the whole store, or queues the save behind the one in flight.
    fn request_save(&mut self, key: String) -> Option<Request> {
        if let Some(running) = self.save_in_flight {
            debug!(key = %key, running, "Save in flight, queueing snapshot");
            self.save_queued = Some(key);
            return None;
        }

        self.save_sequence += 1;
        let sequence = self.save_sequence;
        self.save_in_flight = Some(sequence);
        debug!(key = %key, sequence, "Saving datasets");
        Some(Request::Save {
            key,
            sequence,
            datasets: self.store.snapshot(),
        })
    }

    /// Issues the next generation for `key` and marks it outstanding.
    fn issue(&mut self, key: &str) -> Generation {
        let counter = self.generations.entry(key.to_string()).or_insert(0);
        *counter += 1;
        let generation = *counter;
        self.outstanding.insert(key.to_string());
        generation
    }

    /// Returns whether `generation` is still the latest for `key`, clearing the
    /// outstanding marker if so.
    fn settle(&mut self, key: &str, generation: Generation) -> bool {
        let current = self.generations.get(key) == Some(&generation);
        if current {
            self.outstanding.remove(key);
        }
        current
    }

    fn fail(&mut self, context: &str, err: &dyn Display) {
        let message = format!("{context}: {err}");
        warn!("{}", message);
        self.error = Some(message);
    }
}
