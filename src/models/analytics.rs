//! Analytics payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One data series of a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: Vec<f64>,
}

/// Chart payload shared by the product and category charts.
///
/// Both lists may be empty (no active session, no documents); every field
/// defaults so partial payloads still render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() || self.series.iter().all(|s| s.data.is_empty())
    }

    /// Rows of `(label, value)` for the given series, skipping labels that
    /// have no value.
    pub fn rows(&self, series_index: usize) -> Vec<(&str, f64)> {
        let Some(series) = self.series.get(series_index) else {
            return Vec::new();
        };
        self.labels
            .iter()
            .zip(series.data.iter())
            .map(|(label, value)| (label.as_str(), *value))
            .collect()
    }

    /// Total of a series.
    pub fn total(&self, series_index: usize) -> f64 {
        self.rows(series_index).iter().map(|(_, v)| v).sum()
    }
}

/// Response of the AI insights endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiInsights {
    #[serde(default)]
    pub suggestions: Vec<serde_json::Value>,
    #[serde(default)]
    pub projections: BTreeMap<String, serde_json::Value>,
}

impl AiInsights {
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty() && self.projections.is_empty()
    }
}
