//! Common transport-layer types shared between the forecasting backend and the dashboard.
//! These structs mirror the backend's request/response payloads so every crate can
//! deserialize API responses without duplicating shapes.

mod period;

pub use period::{Period, PeriodError};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Every entity's record, keyed by part number.
///
/// Key order follows the order of the JSON object the backend sent, which is what
/// makes "the first part number" a meaningful default selection.
pub type Datasets = IndexMap<String, EntityRecord>;

// ===================== Series =====================

/// One observed demand value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub month: Period,
    pub demand: f64,
    #[serde(default)]
    pub prediction: Option<f64>,
}

impl HistoricalPoint {
    /// An observation that has no prediction attached yet.
    pub fn observed(month: Period, demand: f64) -> Self {
        Self {
            month,
            demand,
            prediction: None,
        }
    }
}

/// One forecast value following the historical series.
///
/// The backend stores predictions with an explicit `"demand": null`; that field is
/// ignored on read and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub month: Period,
    pub prediction: f64,
}

/// Historical and predicted series of a single part number.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub historical_data: Vec<HistoricalPoint>,
    #[serde(default)]
    pub predictions: Vec<PredictionPoint>,
}

impl EntityRecord {
    pub fn new(historical_data: Vec<HistoricalPoint>, predictions: Vec<PredictionPoint>) -> Self {
        Self {
            historical_data,
            predictions,
        }
    }

    /// Most recent observation, if any.
    pub fn last_observed(&self) -> Option<&HistoricalPoint> {
        self.historical_data.last()
    }
}

// ===================== Model endpoints =====================

/// Body of `POST /api/train`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainRequest {
    pub part_number: String,
    pub historical_data: Vec<HistoricalPoint>,
}

/// Response of both `POST /api/train` and `GET /api/predict/{part}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub predictions: Vec<PredictionPoint>,
    /// Percentage in the 0-100 range
    pub confidence: f64,
}

/// Acknowledgement of `POST /api/datasets`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub message: String,
}

/// Error body the backend returns alongside non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ===================== Chart =====================

/// One row of the combined chart series: historical rows carry `demand`,
/// forecast rows carry only `prediction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub month: Period,
    pub demand: Option<f64>,
    pub prediction: Option<f64>,
}

impl From<&HistoricalPoint> for ChartPoint {
    fn from(point: &HistoricalPoint) -> Self {
        Self {
            month: point.month,
            demand: Some(point.demand),
            prediction: point.prediction,
        }
    }
}

impl From<&PredictionPoint> for ChartPoint {
    fn from(point: &PredictionPoint) -> Self {
        Self {
            month: point.month,
            demand: None,
            prediction: Some(point.prediction),
        }
    }
}

/// Concatenates a historical series and its forecast into chart rows.
pub fn combine_series(historical: &[HistoricalPoint], predictions: &[PredictionPoint]) -> Vec<ChartPoint> {
    historical
        .iter()
        .map(ChartPoint::from)
        .chain(predictions.iter().map(ChartPoint::from))
        .collect()
}
