use std::collections::BTreeMap;

use serde::Serialize;

use crate::address::{AddressStandardizer, AddressStats};
use crate::assemble::{assemble_tables, FormattedDatasets};
use crate::edits::{apply_edits, EditDirective};
use crate::error::EngineError;
use crate::format::{format_applications, format_inspections, FormatIssue};
use crate::ids::IdGenerator;
use crate::model::MergeConflict;
use crate::raw::{DatasetKind, RawRegistry, RawTable};
use crate::schema::{TableName, Tables};
use crate::stats::RunStats;

/// Everything one run consumes, already read from disk.
#[derive(Debug, Clone, Default)]
pub struct RunInput {
    /// Configured dataset name, carried into the statistics.
    pub dataset: String,
    /// Raw tables keyed by [`DatasetKind`] name.
    pub raw: RawRegistry,
    pub edits: Vec<EditDirective>,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub tables: Tables,
    /// Tables to write, in write order.
    pub written: Vec<TableName>,
    pub conflicts: Vec<MergeConflict>,
    pub issues: Vec<FormatIssue>,
    /// Raw tables after edits.
    pub edited: RawRegistry,
    /// Formatted datasets, annotated with restaurant and branch ids.
    pub formatted: FormattedDatasets,
    pub stats: RunStats,
}

/// Machine-readable run report.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub stats: &'a RunStats,
    pub tables: BTreeMap<&'static str, usize>,
    pub conflicts: &'a [MergeConflict],
    pub issues: &'a [FormatIssue],
}

impl RunOutput {
    pub fn report(&self) -> RunReport<'_> {
        RunReport {
            stats: &self.stats,
            tables: self
                .written
                .iter()
                .map(|t| (t.as_str(), self.tables.row_count(*t)))
                .collect(),
            conflicts: &self.conflicts,
            issues: &self.issues,
        }
    }
}

/// A dataset that cannot be formatted at all is skipped and reported.
fn skipped_dataset(kind: DatasetKind, table: &RawTable, err: EngineError) -> FormatIssue {
    let column = match &err {
        EngineError::MissingColumn { column, .. } => column.clone(),
        _ => String::new(),
    };
    let issue = FormatIssue {
        dataset: kind,
        column,
        rows_affected: table.len(),
        message: format!("dataset skipped: {err}"),
    };
    log::warn!("{issue}");
    issue
}

/// Format every dataset present in `raw`. Problems become issues.
fn format_datasets(
    raw: &RawRegistry,
    standardizer: &dyn AddressStandardizer,
) -> (FormattedDatasets, Vec<FormatIssue>, AddressStats) {
    let mut formatted = FormattedDatasets::default();
    let mut issues = Vec::new();
    let mut address = AddressStats::default();

    for kind in DatasetKind::ALL {
        let Some(table) = raw.get(kind.as_str()) else {
            continue;
        };

        match kind {
            DatasetKind::OpenRestaurantInspections => match format_inspections(table, standardizer) {
                Ok((rows, report)) => {
                    issues.extend(report.issues);
                    address.merge(report.address);
                    formatted.inspections = Some(rows);
                }
                Err(e) => issues.push(skipped_dataset(kind, table, e)),
            },
            DatasetKind::OpenRestaurantApplications => match format_applications(table) {
                Ok(rows) => formatted.applications = Some(rows),
                Err(e) => issues.push(skipped_dataset(kind, table, e)),
            },
            DatasetKind::RestaurantInspections => {
                formatted.legacy = Some(table.clone());
            }
        }
    }

    (formatted, issues, address)
}

/// Run the pipeline: edits, formatting, resolution, assembly.
///
/// Only row-level problems can occur here, so the run always produces
/// tables. Configuration and load errors are raised before this point.
pub fn run(input: RunInput, standardizer: &dyn AddressStandardizer, ids: &mut IdGenerator) -> RunOutput {
    let (edited, edit_outcome) = apply_edits(input.raw, &input.edits);

    let (mut formatted, issues, address) = format_datasets(&edited, standardizer);
    let assembly = assemble_tables(Tables::new(), &mut formatted, ids);

    let mut written = vec![TableName::Restaurant, TableName::SidewalkInspection];
    if formatted.applications.is_some() {
        written.push(TableName::Branch);
    }

    let stats = RunStats {
        dataset: input.dataset,
        edits: edit_outcome,
        rows_formatted: formatted
            .kinds()
            .into_iter()
            .filter_map(|k| formatted.row_count(k).map(|n| (k.as_str().to_string(), n)))
            .collect(),
        address,
        restaurants: assembly.tables.restaurant.len(),
        sidewalk_inspections: assembly.tables.sidewalk_inspection.len(),
        branches: assembly.tables.branch.len(),
        merge_conflicts: assembly.conflicts.len(),
        format_issues: issues.len(),
    };

    RunOutput {
        tables: assembly.tables,
        written,
        conflicts: assembly.conflicts,
        issues,
        edited,
        formatted,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::UspsStandardizer;

    const INSPECTIONS: &str = "\
Index,RestaurantName,LegalBusinessName,BusinessAddress,Borough,Postcode,Latitude,Longitude,CommunityBoard,CouncilDistrict,CensusTract,BIN,BBL,NTA,InspectedOn,IsSidewayCompliant,IsRoadwayCompliant,SkippedReason,AgencyCode
0,Joe's Pizza,Joe's Pizza Inc,1 Main Street,X,10001,40.75,-73.99,105,3,109,1015862,1008350041,MN17,07/15/2020 02:30:00 PM,yes,yes,,DOT
1,Joe's Pizza,Joe's Pizza Inc,1 Main St,Staten Island,10001,40.75,-73.99,105,3,109,1015862,1008350041,MN17,07/16/2020 02:30:00 PM,yes,no,,DOT
";

    fn input(edits: Vec<EditDirective>) -> RunInput {
        let table = RawTable::from_csv("OpenRestaurantInspections", INSPECTIONS).unwrap();
        RunInput {
            dataset: "test".into(),
            raw: RawRegistry::from([("OpenRestaurantInspections".to_string(), table)]),
            edits,
        }
    }

    #[test]
    fn edits_apply_before_resolution() {
        let without = run(input(vec![]), &UspsStandardizer::new(), &mut IdGenerator::seeded(5));
        assert_eq!(without.conflicts.len(), 1);
        assert_eq!(without.conflicts[0].fields, vec!["Borough"]);

        let fix = EditDirective {
            table: "OpenRestaurantInspections".into(),
            rows: vec![0],
            column: "Borough".into(),
            value: "STATEN ISLAND".into(),
        };
        let out = run(input(vec![fix]), &UspsStandardizer::new(), &mut IdGenerator::seeded(5));
        assert!(out.conflicts.is_empty());
        assert_eq!(out.tables.restaurant.len(), 1);
        assert_eq!(out.tables.restaurant[0].borough, "STATEN ISLAND");
        assert_eq!(out.stats.edits.applied, 1);
        assert_eq!(out.edited["OpenRestaurantInspections"].rows[0][3], "STATEN ISLAND");
    }

    #[test]
    fn stats_and_report() {
        let out = run(input(vec![]), &UspsStandardizer::new(), &mut IdGenerator::seeded(5));
        assert_eq!(out.written, vec![TableName::Restaurant, TableName::SidewalkInspection]);
        assert_eq!(out.stats.rows_formatted["OpenRestaurantInspections"], 2);
        assert_eq!(out.stats.address.standardized, 2);
        assert_eq!(out.stats.sidewalk_inspections, 2);

        let report = out.report();
        assert_eq!(report.tables["Restaurant"], 1);
        assert_eq!(report.tables["SidewalkInspection"], 2);
        assert!(!report.tables.contains_key("Branch"));
    }

    #[test]
    fn missing_column_skips_dataset() {
        let table = RawTable::from_csv("OpenRestaurantInspections", "RestaurantName\nJoe\n").unwrap();
        let input = RunInput {
            dataset: "broken".into(),
            raw: RawRegistry::from([("OpenRestaurantInspections".to_string(), table)]),
            edits: vec![],
        };
        let out = run(input, &UspsStandardizer::new(), &mut IdGenerator::seeded(5));
        assert!(out.tables.restaurant.is_empty());
        assert_eq!(out.issues.len(), 1);
        assert!(out.issues[0].message.starts_with("dataset skipped"));
        assert_eq!(out.issues[0].rows_affected, 1);
        assert!(out.stats.rows_formatted.is_empty());
    }

    #[test]
    fn legacy_dataset_passes_through() {
        let table = RawTable::from_csv("RestaurantInspections", "CAMIS,DBA\n1,Joe\n").unwrap();
        let input = RunInput {
            dataset: "legacy".into(),
            raw: RawRegistry::from([("RestaurantInspections".to_string(), table.clone())]),
            edits: vec![],
        };
        let out = run(input, &UspsStandardizer::new(), &mut IdGenerator::seeded(5));
        assert_eq!(out.formatted.legacy, Some(table));
        assert_eq!(out.stats.rows_formatted["RestaurantInspections"], 1);
    }
}
