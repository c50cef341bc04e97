use std::collections::BTreeMap;

use serde::Serialize;

use crate::address::AddressStats;
use crate::edits::EditOutcome;

/// Counters for one run, printed after the tables are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub dataset: String,
    pub edits: EditOutcome,
    /// Rows per formatted dataset, keyed by dataset name.
    pub rows_formatted: BTreeMap<String, usize>,
    pub address: AddressStats,
    pub restaurants: usize,
    pub sidewalk_inspections: usize,
    pub branches: usize,
    pub merge_conflicts: usize,
    pub format_issues: usize,
}

impl RunStats {
    /// Human-readable summary, one line per entry.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("dataset: {}", self.dataset)];

        lines.push(format!(
            "edits: {} applied, {} skipped",
            self.edits.applied, self.edits.skipped
        ));
        for (name, rows) in &self.rows_formatted {
            lines.push(format!("{name}: {rows} rows formatted"));
        }
        if self.address.total > 0 {
            lines.push(format!(
                "addresses: {} standardized, {} fell back to text normalization ({:.2}%)",
                self.address.standardized,
                self.address.fallback,
                self.address.fallback_percent()
            ));
        }
        lines.push(format!(
            "tables: {} restaurants, {} sidewalk inspections, {} branches",
            self.restaurants, self.sidewalk_inspections, self.branches
        ));
        lines.push(format!("merge conflicts: {}", self.merge_conflicts));
        lines.push(format!("format issues: {}", self.format_issues));
        lines
    }
}
