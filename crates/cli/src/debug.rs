//! `--debug` artifacts: intermediate tables for manual inspection.

use std::path::{Path, PathBuf};

use opendine_engine::output::{conflicts_to_csv, inspections_to_csv};
use opendine_engine::RunOutput;

use crate::files::write_output;
use crate::CliError;

/// Write the edited raw tables, the formatted inspections and the merge
/// conflict listing. Returns the paths written.
pub fn write_debug_artifacts(dir: &Path, out: &RunOutput) -> Result<Vec<PathBuf>, CliError> {
    let render_err = |e: opendine_engine::EngineError| CliError::output(e.to_string());
    let mut written = Vec::new();

    for (name, table) in &out.edited {
        let csv = table.to_csv(name).map_err(render_err)?;
        written.push(write_output(dir, &format!("{name}_edit.csv"), &csv)?);
    }

    if let Some(rows) = &out.formatted.inspections {
        let csv = inspections_to_csv(rows).map_err(render_err)?;
        written.push(write_output(dir, "OpenRestaurantInspections_formatted.csv", &csv)?);
    }

    if !out.conflicts.is_empty() {
        let csv = conflicts_to_csv(&out.conflicts).map_err(render_err)?;
        written.push(write_output(dir, "Restaurant_match.csv", &csv)?);
    }

    Ok(written)
}
