//! Plain-text rendering of a [`DashboardView`].

use session::DashboardView;
use std::fmt::{self, Write};

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn render(view: &DashboardView) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    render_into(&mut out, view).map(|()| out).unwrap_or_default()
}

pub fn render_into(out: &mut impl Write, view: &DashboardView) -> fmt::Result {
    writeln!(out, "Demand Forecast Dashboard")?;
    writeln!(
        out,
        "Part number: {}",
        view.active.as_deref().unwrap_or("Select Part Number")
    )?;
    if !view.entities.is_empty() {
        writeln!(out, "Available: {}", view.entities.join(", "))?;
    }
    if let Some(error) = &view.error {
        writeln!(out, "[!] {error}")?;
    }

    writeln!(out)?;
    if view.loading {
        writeln!(out, "Loading...")?;
    } else {
        render_table(out, view)?;
    }

    writeln!(out)?;
    render_stats(out, view)?;
    if view.pending_prediction {
        writeln!(out, "Latest data point is still waiting for a forecast")?;
    }
    Ok(())
}

fn render_table(out: &mut impl Write, view: &DashboardView) -> fmt::Result {
    writeln!(out, "{:<9} {:>10} {:>12}", "Month", "Demand", "Prediction")?;
    for point in &view.combined {
        writeln!(
            out,
            "{:<9} {:>10} {:>12}",
            point.month.to_string(),
            cell(point.demand),
            cell(point.prediction)
        )?;
    }
    Ok(())
}

fn render_stats(out: &mut impl Write, view: &DashboardView) -> fmt::Result {
    writeln!(out, "Confidence: {:.1}%", view.confidence)?;
    match view.summary.rounded_average() {
        Some(average) => writeln!(out, "Average demand: {average}")?,
        None => writeln!(out, "Average demand: N/A")?,
    }
    writeln!(out, "Trend: {}", view.summary.trend)?;
    writeln!(out, "Data points: {}", view.summary.data_points)
}
