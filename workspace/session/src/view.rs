use common::ChartPoint;
use compute::DemandSummary;
use serde::Serialize;

/// Everything a renderer needs to draw the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Historical rows followed by forecast rows
    pub combined: Vec<ChartPoint>,
    pub confidence: f64,
    pub summary: DemandSummary,
    pub loading: bool,
    pub error: Option<String>,
    pub entities: Vec<String>,
    pub active: Option<String>,
    /// The active part number has an appended point whose forecast has not arrived
    pub pending_prediction: bool,
}
