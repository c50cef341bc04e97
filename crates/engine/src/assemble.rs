//! Output table assembly.
//!
//! Tables are filled in a fixed order: `Restaurant` first (the resolver
//! writes `RestaurantID` back onto the inspection rows), then
//! `SidewalkInspection` from those annotated rows, then `Branch`.
//! New rows are appended after whatever the tables already hold.

use crate::branch::assign_branches;
use crate::ids::IdGenerator;
use crate::model::{ApplicationRow, InspectionRow, MergeConflict, SidewalkInspectionRecord};
use crate::raw::{DatasetKind, RawTable};
use crate::resolver::resolve_restaurants;
use crate::schema::Tables;

/// Formatted datasets of one run. Any subset may be present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattedDatasets {
    pub applications: Option<Vec<ApplicationRow>>,
    pub inspections: Option<Vec<InspectionRow>>,
    /// Legacy inspections, passed through unformatted.
    pub legacy: Option<RawTable>,
}

impl FormattedDatasets {
    pub fn kinds(&self) -> Vec<DatasetKind> {
        let mut kinds = Vec::new();
        if self.applications.is_some() {
            kinds.push(DatasetKind::OpenRestaurantApplications);
        }
        if self.inspections.is_some() {
            kinds.push(DatasetKind::OpenRestaurantInspections);
        }
        if self.legacy.is_some() {
            kinds.push(DatasetKind::RestaurantInspections);
        }
        kinds
    }

    pub fn row_count(&self, kind: DatasetKind) -> Option<usize> {
        match kind {
            DatasetKind::OpenRestaurantApplications => self.applications.as_ref().map(Vec::len),
            DatasetKind::OpenRestaurantInspections => self.inspections.as_ref().map(Vec::len),
            DatasetKind::RestaurantInspections => self.legacy.as_ref().map(RawTable::len),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub tables: Tables,
    pub conflicts: Vec<MergeConflict>,
}

/// Resolve restaurants for `rows` and append the new ones to the table.
pub fn fill_restaurant_table(
    tables: &mut Tables,
    rows: &mut [InspectionRow],
    ids: &mut IdGenerator,
) -> Vec<MergeConflict> {
    let resolution = resolve_restaurants(rows, ids);
    tables.restaurant.extend(resolution.restaurants);
    resolution.conflicts
}

/// One `SidewalkInspection` row per inspection row, in input order.
/// Expects `restaurant_id` to have been written by the resolver.
pub fn fill_sidewalk_inspection_table(
    tables: &mut Tables,
    rows: &[InspectionRow],
    ids: &mut IdGenerator,
) {
    let records = rows.iter().map(|row| SidewalkInspectionRecord {
        id: ids.new_id(),
        restaurant_id: row.restaurant_id.clone().unwrap_or_default(),
        inspected_on: row.inspected_on.clone(),
        sideway_compliant: row.sideway_compliant.clone(),
        skipped_reason: row.skipped_reason.clone(),
        agency_code: row.agency_code.clone(),
    });
    tables.sidewalk_inspection.extend(records);
}

pub fn fill_branch_table(tables: &mut Tables, rows: &mut [ApplicationRow], ids: &mut IdGenerator) {
    let branches = assign_branches(rows, ids);
    tables.branch.extend(branches);
}

/// Build the output tables from the formatted datasets, appending to `tables`.
///
/// Restaurants already in `tables` are not matched against: the resolver
/// indexes only this call's rows, so an address seen in an earlier call
/// gets a second `Restaurant` row.
pub fn assemble_tables(
    mut tables: Tables,
    datasets: &mut FormattedDatasets,
    ids: &mut IdGenerator,
) -> Assembly {
    let mut conflicts = Vec::new();

    if let Some(rows) = datasets.inspections.as_mut() {
        conflicts = fill_restaurant_table(&mut tables, rows, ids);
        fill_sidewalk_inspection_table(&mut tables, rows, ids);
    }

    if let Some(rows) = datasets.applications.as_mut() {
        fill_branch_table(&mut tables, rows, ids);
    }

    log::info!(
        "assembled {} restaurants, {} sidewalk inspections, {} branches",
        tables.restaurant.len(),
        tables.sidewalk_inspection.len(),
        tables.branch.len()
    );

    Assembly { tables, conflicts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::inspection;
    use crate::model::{InspectedOn, RestaurantRecord};

    fn datasets(rows: Vec<InspectionRow>) -> FormattedDatasets {
        FormattedDatasets {
            inspections: Some(rows),
            ..FormattedDatasets::default()
        }
    }

    #[test]
    fn inspections_reference_their_restaurant() {
        let mut data = datasets(vec![
            inspection("1 MAIN ST", 10001, "MANHATTAN"),
            inspection("1 MAIN ST", 10001, "MANHATTAN"),
            inspection("2 OAK AVE", 10002, "QUEENS"),
        ]);
        let out = assemble_tables(Tables::new(), &mut data, &mut IdGenerator::seeded(9));

        let t = &out.tables;
        assert_eq!(t.restaurant.len(), 2);
        assert_eq!(t.sidewalk_inspection.len(), 3);
        assert_eq!(t.sidewalk_inspection[0].restaurant_id, t.sidewalk_inspection[1].restaurant_id);
        assert_ne!(t.sidewalk_inspection[0].restaurant_id, t.sidewalk_inspection[2].restaurant_id);
        assert_eq!(t.sidewalk_inspection[2].restaurant_id, t.restaurant[1].id);
        assert!(out.conflicts.is_empty());
    }

    #[test]
    fn inspection_fields_carry_over() {
        let mut row = inspection("1 MAIN ST", 10001, "MANHATTAN");
        row.inspected_on = InspectedOn::Raw("whenever".into());
        row.skipped_reason = "No Seating".into();
        let mut data = datasets(vec![row]);
        let out = assemble_tables(Tables::new(), &mut data, &mut IdGenerator::seeded(9));

        let s = &out.tables.sidewalk_inspection[0];
        assert_eq!(s.inspected_on, InspectedOn::Raw("whenever".into()));
        assert_eq!(s.skipped_reason, "No Seating");
        assert_eq!(s.agency_code, "DOT");
        assert_ne!(s.id, s.restaurant_id);
    }

    #[test]
    fn appends_to_existing_tables() {
        let mut tables = Tables::new();
        tables.restaurant.push(RestaurantRecord {
            id: "1".into(),
            street_address: "9 PRIOR ST".into(),
            ..RestaurantRecord::default()
        });

        let mut data = datasets(vec![inspection("1 MAIN ST", 10001, "MANHATTAN")]);
        let out = assemble_tables(tables, &mut data, &mut IdGenerator::seeded(9));
        assert_eq!(out.tables.restaurant.len(), 2);
        assert_eq!(out.tables.restaurant[0].id, "1");
        assert_eq!(out.tables.restaurant[1].street_address, "1 MAIN ST");
    }

    #[test]
    fn no_datasets_no_rows() {
        let out = assemble_tables(Tables::new(), &mut FormattedDatasets::default(), &mut IdGenerator::seeded(9));
        assert_eq!(out, Assembly::default());
    }

    #[test]
    fn applications_fill_branches() {
        let mut data = FormattedDatasets {
            applications: Some(vec![ApplicationRow {
                raw_legal_business_name: "Joe's Pizza Inc.".into(),
                formatted_legal_business_name: "joespizzainc".into(),
                business_address: "7 Carmine St".into(),
                formatted_business_address: "7carminest".into(),
                branch_id: None,
            }]),
            ..FormattedDatasets::default()
        };
        let out = assemble_tables(Tables::new(), &mut data, &mut IdGenerator::seeded(9));
        assert_eq!(out.tables.branch.len(), 1);
        assert!(out.tables.restaurant.is_empty());

        let rows = data.applications.as_ref().unwrap();
        assert_eq!(rows[0].branch_id.as_deref(), Some(out.tables.branch[0].id.as_str()));
        assert_eq!(data.kinds(), vec![DatasetKind::OpenRestaurantApplications]);
        assert_eq!(data.row_count(DatasetKind::OpenRestaurantApplications), Some(1));
        assert_eq!(data.row_count(DatasetKind::RestaurantInspections), None);
    }
}
