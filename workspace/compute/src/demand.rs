//! Quick statistics derived from a historical demand series.
//!
//! Everything here is a pure function of the series and is recomputed whenever
//! the dashboard view is rebuilt.

use common::HistoricalPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of demand between the first and last observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Increasing,
    Decreasing,
    InsufficientData,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Increasing => "Increasing",
            Trend::Decreasing => "Decreasing",
            Trend::InsufficientData => "Not enough data",
        };
        f.write_str(label)
    }
}

/// Arithmetic mean of `demand`, or `None` for an empty series.
pub fn average_demand(series: &[HistoricalPoint]) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    let total: f64 = series.iter().map(|point| point.demand).sum();
    Some(total / series.len() as f64)
}

/// Compares the first and last observation.
///
/// Equal endpoints report [`Trend::Decreasing`]. This matches the dashboard's
/// historical behaviour and is pending product review.
pub fn trend(series: &[HistoricalPoint]) -> Trend {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) if series.len() >= 2 => {
            if last.demand > first.demand {
                Trend::Increasing
            } else {
                Trend::Decreasing
            }
        }
        _ => Trend::InsufficientData,
    }
}

/// Summary shown next to the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSummary {
    pub average_demand: Option<f64>,
    pub trend: Trend,
    pub data_points: usize,
}

impl DemandSummary {
    pub fn from_series(series: &[HistoricalPoint]) -> Self {
        Self {
            average_demand: average_demand(series),
            trend: trend(series),
            data_points: series.len(),
        }
    }

    /// Average rounded to the nearest whole unit, the way it is displayed.
    pub fn rounded_average(&self) -> Option<i64> {
        self.average_demand.map(|avg| avg.round() as i64)
    }
}
