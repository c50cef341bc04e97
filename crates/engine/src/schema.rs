//! Output table schemas and the table registry.
//!
//! Column sets are fixed: an empty table still renders its full header so
//! downstream schema validation sees the right shape.

use std::fmt;

use serde::Serialize;

use crate::model::{BranchRecord, RestaurantRecord, SidewalkInspectionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Int32,
    Float64,
    NullableBool,
    TimestampUtc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

use self::ColumnType::{Float64, Int32, NullableBool, Text, TimestampUtc};

const fn col(name: &'static str, ty: ColumnType) -> Column {
    Column { name, ty }
}

pub const RESTAURANT_COLUMNS: &[Column] = &[
    col("ID", Text),
    col("DBA", Text),
    col("Name", Text),
    col("LegalBusinessName", Text),
    col("StreetAddress", Text),
    col("Borough", Text),
    col("Zipcode", Int32),
    col("FoodServicePermit", Int32),
    col("IsPermittedToSellAlcohol", NullableBool),
    col("SLASerialNumber", Text),
    col("SLALicenseType", Text),
    col("IsLandmark", NullableBool),
    col("HasAgreedToLandmarkTerms", NullableBool),
    col("Latitude", Float64),
    col("Longitude", Float64),
    col("CommunityBoard", Int32),
    col("CouncilDistrict", Int32),
    col("CensusTract", Int32),
    col("BIN", Int32),
    col("BBL", Int32),
    col("NTA", Text),
    col("CAMIS", Int32),
    col("Phone", Text),
    col("Cuisine", Text),
];

pub const SIDEWALK_INSPECTION_COLUMNS: &[Column] = &[
    col("ID", Text),
    col("RestaurantID", Text),
    col("InspectedOn", TimestampUtc),
    col("SidewayCompliant", Text),
    col("SkippedReason", Text),
    col("AgencyCode", Text),
];

pub const BRANCH_COLUMNS: &[Column] = &[
    col("ID", Text),
    col("LegalBusinessName", Text),
    col("BusinessAddress", Text),
    col("ApplicationCount", Int32),
];

// ---------------------------------------------------------------------------
// Row rendering
// ---------------------------------------------------------------------------

/// A record type that belongs to one output table.
pub trait TableRow {
    const TABLE: TableName;

    /// Cells in [`TableName::columns`] order.
    fn cells(&self) -> Vec<String>;
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn int(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn float(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn boolean(value: Option<bool>) -> String {
    match value {
        Some(true) => "True".into(),
        Some(false) => "False".into(),
        None => String::new(),
    }
}

impl TableRow for RestaurantRecord {
    const TABLE: TableName = TableName::Restaurant;

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            text(&self.dba),
            self.name.clone(),
            self.legal_business_name.clone(),
            self.street_address.clone(),
            self.borough.clone(),
            int(self.zipcode),
            int(self.food_service_permit),
            boolean(self.is_permitted_to_sell_alcohol),
            text(&self.sla_serial_number),
            text(&self.sla_license_type),
            boolean(self.is_landmark),
            boolean(self.has_agreed_to_landmark_terms),
            float(self.latitude),
            float(self.longitude),
            int(self.community_board),
            int(self.council_district),
            int(self.census_tract),
            int(self.bin),
            int(self.bbl),
            self.nta.clone(),
            int(self.camis),
            text(&self.phone),
            text(&self.cuisine),
        ]
    }
}

impl TableRow for SidewalkInspectionRecord {
    const TABLE: TableName = TableName::SidewalkInspection;

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.restaurant_id.clone(),
            self.inspected_on.to_string(),
            self.sideway_compliant.clone(),
            self.skipped_reason.clone(),
            self.agency_code.clone(),
        ]
    }
}

impl TableRow for BranchRecord {
    const TABLE: TableName = TableName::Branch;

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.legal_business_name.clone(),
            self.business_address.clone(),
            self.application_count.to_string(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TableName {
    Restaurant,
    SidewalkInspection,
    Branch,
}

impl TableName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restaurant => "Restaurant",
            Self::SidewalkInspection => "SidewalkInspection",
            Self::Branch => "Branch",
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            Self::Restaurant => RESTAURANT_COLUMNS,
            Self::SidewalkInspection => SIDEWALK_INSPECTION_COLUMNS,
            Self::Branch => BRANCH_COLUMNS,
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.csv", self.as_str())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The output tables of a run. Starts empty; rows are appended in the
/// order they are built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub restaurant: Vec<RestaurantRecord>,
    pub sidewalk_inspection: Vec<SidewalkInspectionRecord>,
    pub branch: Vec<BranchRecord>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self, table: TableName) -> usize {
        match table {
            TableName::Restaurant => self.restaurant.len(),
            TableName::SidewalkInspection => self.sidewalk_inspection.len(),
            TableName::Branch => self.branch.len(),
        }
    }
}
