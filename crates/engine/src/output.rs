//! CSV rendering of output tables and debug artifacts.

use crate::error::EngineError;
use crate::model::{InspectionRow, MergeConflict};
use crate::schema::{TableName, TableRow, Tables, RESTAURANT_COLUMNS};

fn csv_err(table: &str) -> impl Fn(csv::Error) -> EngineError + '_ {
    move |e| EngineError::Csv {
        table: table.into(),
        message: e.to_string(),
    }
}

fn finish(table: &str, writer: csv::Writer<Vec<u8>>) -> Result<String, EngineError> {
    let bytes = writer.into_inner().map_err(|e| EngineError::Csv {
        table: table.into(),
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| EngineError::Csv {
        table: table.into(),
        message: e.to_string(),
    })
}

/// Header plus one record per row. The header is written even for zero rows.
pub fn render_rows<R: TableRow>(rows: &[R]) -> Result<String, EngineError> {
    let table = R::TABLE.as_str();
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(R::TABLE.columns().iter().map(|c| c.name))
        .map_err(csv_err(table))?;
    for row in rows {
        writer.write_record(row.cells()).map_err(csv_err(table))?;
    }

    finish(table, writer)
}

impl Tables {
    pub fn to_csv(&self, table: TableName) -> Result<String, EngineError> {
        match table {
            TableName::Restaurant => render_rows(&self.restaurant),
            TableName::SidewalkInspection => render_rows(&self.sidewalk_inspection),
            TableName::Branch => render_rows(&self.branch),
        }
    }
}

/// `Restaurant_match.csv`: per conflict, the message line, the `Restaurant`
/// header, the kept record and the conflicting values.
pub fn conflicts_to_csv(conflicts: &[MergeConflict]) -> Result<String, EngineError> {
    let table = "Restaurant_match";
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    for conflict in conflicts {
        writer
            .write_record([conflict.to_string()])
            .map_err(csv_err(table))?;
        writer
            .write_record(RESTAURANT_COLUMNS.iter().map(|c| c.name))
            .map_err(csv_err(table))?;
        writer
            .write_record(conflict.existing.cells())
            .map_err(csv_err(table))?;
        writer
            .write_record(conflict.incoming.cells())
            .map_err(csv_err(table))?;
    }

    finish(table, writer)
}

/// Formatted inspection rows, one column per field, `RestaurantID` last.
pub fn inspections_to_csv(rows: &[InspectionRow]) -> Result<String, EngineError> {
    let table = "OpenRestaurantInspections_formatted";
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(csv_err(table))?;
    }
    finish(table, writer)
}
