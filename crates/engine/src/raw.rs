//! Raw dataset tables as loaded from CSV, before any formatting.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::EngineError;

/// Name of the optional positional index column carried by test extracts.
pub const INDEX_COLUMN: &str = "Index";

/// Raw datasets keyed by dataset name.
pub type RawRegistry = BTreeMap<String, RawTable>;

// ---------------------------------------------------------------------------
// Dataset kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DatasetKind {
    OpenRestaurantApplications,
    OpenRestaurantInspections,
    RestaurantInspections,
}

impl DatasetKind {
    /// Ordered so that the longer names are tried first: `RestaurantInspections`
    /// is a substring of `OpenRestaurantInspections`.
    pub const ALL: [DatasetKind; 3] = [
        Self::OpenRestaurantApplications,
        Self::OpenRestaurantInspections,
        Self::RestaurantInspections,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenRestaurantApplications => "OpenRestaurantApplications",
            Self::OpenRestaurantInspections => "OpenRestaurantInspections",
            Self::RestaurantInspections => "RestaurantInspections",
        }
    }

    /// Classify an input file by the dataset name embedded in its path.
    pub fn classify_file(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| path.contains(k.as_str()))
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Raw table
// ---------------------------------------------------------------------------

/// Untyped rows with an index label per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub index: Vec<i64>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse CSV text with a header row. An `Index` column, when present,
    /// supplies the row labels and is removed from the columns.
    pub fn from_csv(table: &str, data: &str) -> Result<Self, EngineError> {
        let csv_err = |message: String| EngineError::Csv { table: table.into(), message };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| csv_err(e.to_string()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let index_pos = headers.iter().position(|h| h == INDEX_COLUMN);
        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != index_pos)
            .map(|(_, h)| h.clone())
            .collect();

        let mut index = Vec::new();
        let mut rows = Vec::new();

        for (pos, record) in reader.records().enumerate() {
            let record = record.map_err(|e| csv_err(e.to_string()))?;

            let label = match index_pos {
                Some(ip) => {
                    let value = record.get(ip).unwrap_or("").trim();
                    value.parse::<i64>().map_err(|_| {
                        csv_err(format!("row {pos}: index value '{value}' is not an integer"))
                    })?
                }
                None => pos as i64,
            };

            let cells: Vec<String> = (0..headers.len())
                .filter(|i| Some(*i) != index_pos)
                .map(|i| record.get(i).unwrap_or("").to_string())
                .collect();

            index.push(label);
            rows.push(cells);
        }

        Ok(Self { columns, index, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, dataset: &str, name: &str) -> Result<usize, EngineError> {
        self.column_index(name).ok_or_else(|| EngineError::MissingColumn {
            dataset: dataset.into(),
            column: name.into(),
        })
    }

    /// Cell text, empty when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Physical positions of every row carrying `label`. Labels read from
    /// an `Index` column need not be unique.
    pub fn positions_of(&self, label: i64) -> Vec<usize> {
        self.index
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == label)
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Column position, appending an empty column when it does not exist.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(i) = self.column_index(name) {
            return i;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.columns.len() - 1
    }

    /// Renumber row labels 0..n.
    pub fn reset_index(&mut self) {
        self.index = (0..self.rows.len() as i64).collect();
    }

    /// Render back to CSV with the index as the first column.
    pub fn to_csv(&self, table: &str) -> Result<String, EngineError> {
        let csv_err = |message: String| EngineError::Csv { table: table.into(), message };

        let mut writer = csv::Writer::from_writer(Vec::new());
        let header = std::iter::once(INDEX_COLUMN).chain(self.columns.iter().map(String::as_str));
        writer.write_record(header).map_err(|e| csv_err(e.to_string()))?;

        for (label, row) in self.index.iter().zip(&self.rows) {
            let label = label.to_string();
            let record = std::iter::once(label.as_str()).chain(row.iter().map(String::as_str));
            writer.write_record(record).map_err(|e| csv_err(e.to_string()))?;
        }

        let bytes = writer.into_inner().map_err(|e| csv_err(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| csv_err(e.to_string()))
    }
}
