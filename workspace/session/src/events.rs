//! Messages flowing through the dashboard.
//!
//! State changes never call into each other directly. They post an [`Event`]
//! to the [`EventQueue`], which the dashboard drains in FIFO order, and emit
//! [`Request`]s that the engine turns into backend calls. Each call comes back
//! as a [`Completion`] event.

use std::collections::VecDeque;

use common::{Datasets, ForecastResponse, HistoricalPoint, Period};

use crate::error::ApiError;

/// Monotonic per-part-number tag attached to train and predict requests.
pub type Generation = u64;

/// Monotonic tag attached to bulk saves, shared by all part numbers.
pub type SaveSequence = u64;

/// Backend call the dashboard wants made.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    LoadDatasets,
    Train {
        key: String,
        generation: Generation,
        historical: Vec<HistoricalPoint>,
    },
    Predict {
        key: String,
        generation: Generation,
        last_date: Period,
    },
    Save {
        key: String,
        sequence: SaveSequence,
        datasets: Datasets,
    },
}

impl Request {
    pub fn flow(&self) -> Flow {
        match self {
            Request::LoadDatasets => Flow::Load,
            Request::Train { key, generation, .. } => Flow::Train {
                key: key.clone(),
                generation: *generation,
            },
            Request::Predict { key, generation, .. } => Flow::Predict {
                key: key.clone(),
                generation: *generation,
            },
            Request::Save { key, sequence, .. } => Flow::Save {
                key: key.clone(),
                sequence: *sequence,
            },
        }
    }
}

/// Identity of a [`Request`] without its payload.
///
/// The engine keeps one per running backend call so that a call which never
/// produced a [`Completion`] (its task panicked or was aborted) can still be
/// reported back as a failure of the right flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Load,
    Train { key: String, generation: Generation },
    Predict { key: String, generation: Generation },
    Save { key: String, sequence: SaveSequence },
}

impl Flow {
    /// The completion this flow reports when it fails with `error`.
    pub fn fail(self, error: ApiError) -> Completion {
        match self {
            Flow::Load => Completion::Loaded(Err(error)),
            Flow::Train { key, generation } => Completion::Trained {
                key,
                generation,
                result: Err(error),
            },
            Flow::Predict { key, generation } => Completion::Predicted {
                key,
                generation,
                result: Err(error),
            },
            Flow::Save { key, sequence } => Completion::Saved {
                key,
                sequence,
                result: Err(error),
            },
        }
    }
}

/// Outcome of a [`Request`].
#[derive(Debug)]
pub enum Completion {
    Loaded(Result<Datasets, ApiError>),
    Trained {
        key: String,
        generation: Generation,
        result: Result<ForecastResponse, ApiError>,
    },
    Predicted {
        key: String,
        generation: Generation,
        result: Result<ForecastResponse, ApiError>,
    },
    Saved {
        key: String,
        sequence: SaveSequence,
        result: Result<(), ApiError>,
    },
}

#[derive(Debug)]
pub enum Event {
    /// The historical series of `key` changed and the model should be retrained
    SeriesChanged { key: String },
    Completed(Completion),
}

/// FIFO of pending events.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn next(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
