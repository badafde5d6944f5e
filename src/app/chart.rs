//! Users vs Operators pie chart on the admin dashboard.

use serde::Serialize;

use crate::error::Result;
use crate::host::ChartBackend;

/// One labelled pie slice
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slice {
    pub label: &'static str,
    pub value: u32,
    pub color: &'static str,
}

pub const DASHBOARD_SLICES: [Slice; 2] = [
    Slice {
        label: "Users",
        value: 8,
        color: "#00ffcc",
    },
    Slice {
        label: "Operators",
        value: 3,
        color: "#3399ff",
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
}

// =============================================================================
// Chart.js configuration object
// =============================================================================

/// `{type, data: {labels, datasets: [{data, backgroundColor}]}}`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: ChartData,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dataset {
    pub data: Vec<u32>,
    #[serde(rename = "backgroundColor")]
    pub background_color: Vec<String>,
}

impl ChartConfig {
    /// Single-dataset pie chart from `slices`.
    pub fn pie(slices: &[Slice]) -> Self {
        Self {
            kind: ChartKind::Pie,
            data: ChartData {
                labels: slices.iter().map(|s| s.label.to_string()).collect(),
                datasets: vec![Dataset {
                    data: slices.iter().map(|s| s.value).collect(),
                    background_color: slices.iter().map(|s| s.color.to_string()).collect(),
                }],
            },
        }
    }
}

pub struct DashboardChart {
    canvas_id: String,
    config: ChartConfig,
}

impl DashboardChart {
    pub fn new(canvas_id: impl Into<String>) -> Self {
        Self {
            canvas_id: canvas_id.into(),
            config: ChartConfig::pie(&DASHBOARD_SLICES),
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn render(&self, backend: &dyn ChartBackend) -> Result<()> {
        backend.render(&self.canvas_id, &self.config)?;
        tracing::debug!("Dashboard chart rendered into #{}", self.canvas_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PanelError;
    use crate::host::memory::RecordingCharts;

    #[test]
    fn test_dashboard_config_matches_chartjs_shape() {
        let chart = DashboardChart::new("usersChart");
        let json = serde_json::to_value(chart.config()).expect("serialize config");

        assert_eq!(
            json,
            serde_json::json!({
                "type": "pie",
                "data": {
                    "labels": ["Users", "Operators"],
                    "datasets": [{
                        "data": [8, 3],
                        "backgroundColor": ["#00ffcc", "#3399ff"]
                    }]
                }
            })
        );
    }

    #[test]
    fn test_render_targets_configured_canvas() {
        let charts = RecordingCharts::with_canvas("usersChart");
        DashboardChart::new("usersChart")
            .render(&charts)
            .expect("render");

        let rendered = charts.rendered();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].0, "usersChart");
        assert_eq!(rendered[0].1.data.datasets[0].data, vec![8, 3]);
    }

    #[test]
    fn test_missing_canvas_is_reported() {
        let charts = RecordingCharts::new();
        let err = DashboardChart::new("usersChart").render(&charts).unwrap_err();

        assert!(matches!(err, PanelError::MissingElement(ref id) if id == "#usersChart"));
        assert!(charts.rendered().is_empty());
    }
}
