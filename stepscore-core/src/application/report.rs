// stepscore-core/src/application/report.rs

use serde::{Deserialize, Serialize};

/// Data-quality counters for one pipeline run, saved as `run_results.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub registry_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub rows_processed: usize,
    /// Non-empty item cells that could not be turned into a number.
    pub unparsable_item_cells: usize,
    /// Reverse-coding inputs outside `[1, scale_max]`, recovered as missing.
    pub invalid_scores: usize,
    pub scales: Vec<ScaleSummary>,
    pub demographics: Vec<FieldSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleSummary {
    pub name: String,
    pub items: usize,
    pub reverse_items: usize,
    pub missing_composites: usize,
    pub invalid_scores: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub name: String,
    pub position: usize,
    pub missing: usize,
}

impl RunReport {
    pub fn scale(&self, name: &str) -> Option<&ScaleSummary> {
        self.scales.iter().find(|s| s.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSummary> {
        self.demographics.iter().find(|f| f.name == name)
    }
}
