use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// `InspectedOn` after formatting. Stays as the original text when the
/// column could not be converted as a whole.
#[derive(Debug, Clone, PartialEq)]
pub enum InspectedOn {
    Utc(DateTime<Utc>),
    Raw(String),
}

impl fmt::Display for InspectedOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utc(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for InspectedOn {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One sidewalk-dining inspection, post-formatting.
///
/// Text fields use the empty string for a missing value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InspectionRow {
    pub name: String,
    pub legal_business_name: String,
    pub street_address: String,
    pub borough: String,
    pub postcode: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub community_board: Option<i64>,
    pub council_district: Option<i64>,
    pub census_tract: Option<i64>,
    #[serde(rename = "BIN")]
    pub bin: Option<i64>,
    #[serde(rename = "BBL")]
    pub bbl: Option<i64>,
    #[serde(rename = "NTA")]
    pub nta: String,
    pub inspected_on: InspectedOn,
    pub sideway_compliant: String,
    pub skipped_reason: String,
    pub agency_code: String,
    /// Written by the resolver.
    #[serde(rename = "RestaurantID")]
    pub restaurant_id: Option<String>,
}

/// One formatted row of the applications dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationRow {
    pub raw_legal_business_name: String,
    pub formatted_legal_business_name: String,
    pub business_address: String,
    pub formatted_business_address: String,
    #[serde(rename = "BranchID")]
    pub branch_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Output records
// ---------------------------------------------------------------------------

/// One physically distinct restaurant, keyed by `street_address`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestaurantRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "DBA")]
    pub dba: Option<String>,
    pub name: String,
    pub legal_business_name: String,
    pub street_address: String,
    pub borough: String,
    pub zipcode: Option<i64>,
    pub food_service_permit: Option<i64>,
    pub is_permitted_to_sell_alcohol: Option<bool>,
    #[serde(rename = "SLASerialNumber")]
    pub sla_serial_number: Option<String>,
    #[serde(rename = "SLALicenseType")]
    pub sla_license_type: Option<String>,
    pub is_landmark: Option<bool>,
    pub has_agreed_to_landmark_terms: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub community_board: Option<i64>,
    pub council_district: Option<i64>,
    pub census_tract: Option<i64>,
    #[serde(rename = "BIN")]
    pub bin: Option<i64>,
    #[serde(rename = "BBL")]
    pub bbl: Option<i64>,
    #[serde(rename = "NTA")]
    pub nta: String,
    #[serde(rename = "CAMIS")]
    pub camis: Option<i64>,
    pub phone: Option<String>,
    pub cuisine: Option<String>,
}

impl RestaurantRecord {
    /// Project an inspection row's restaurant attributes under `id`.
    pub fn from_inspection(id: String, row: &InspectionRow) -> Self {
        Self {
            id,
            name: row.name.clone(),
            legal_business_name: row.legal_business_name.clone(),
            street_address: row.street_address.clone(),
            borough: row.borough.clone(),
            zipcode: row.postcode,
            latitude: row.latitude,
            longitude: row.longitude,
            community_board: row.community_board,
            council_district: row.council_district,
            census_tract: row.census_tract,
            bin: row.bin,
            bbl: row.bbl,
            nta: row.nta.clone(),
            ..Self::default()
        }
    }

    /// Names of the attributes on which `row` disagrees with this record.
    /// `Postcode` is compared against `Zipcode`; `ID` is never compared.
    pub fn differing_fields(&self, row: &InspectionRow) -> Vec<&'static str> {
        let checks = [
            ("Name", self.name == row.name),
            ("LegalBusinessName", self.legal_business_name == row.legal_business_name),
            ("StreetAddress", self.street_address == row.street_address),
            ("Borough", self.borough == row.borough),
            ("Zipcode", self.zipcode == row.postcode),
            ("Latitude", self.latitude == row.latitude),
            ("Longitude", self.longitude == row.longitude),
            ("CommunityBoard", self.community_board == row.community_board),
            ("CouncilDistrict", self.council_district == row.council_district),
            ("CensusTract", self.census_tract == row.census_tract),
            ("BIN", self.bin == row.bin),
            ("BBL", self.bbl == row.bbl),
            ("NTA", self.nta == row.nta),
        ];

        checks
            .into_iter()
            .filter(|(_, same)| !same)
            .map(|(field, _)| field)
            .collect()
    }
}

/// One inspection event; many-to-one to [`RestaurantRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SidewalkInspectionRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "RestaurantID")]
    pub restaurant_id: String,
    pub inspected_on: InspectedOn,
    pub sideway_compliant: String,
    pub skipped_reason: String,
    pub agency_code: String,
}

/// A business location grouped from applications.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BranchRecord {
    #[serde(rename = "ID")]
    pub id: String,
    pub legal_business_name: String,
    pub business_address: String,
    pub application_count: i64,
}

// ---------------------------------------------------------------------------
// Conflicts
// ---------------------------------------------------------------------------

/// An inspection row that matched an existing restaurant by address but
/// disagrees with it on other attributes. The existing record is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeConflict {
    pub restaurant_id: String,
    /// Position of the offending row in the formatted dataset.
    pub row: usize,
    pub fields: Vec<&'static str>,
    pub existing: RestaurantRecord,
    pub incoming: RestaurantRecord,
}

impl fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "restaurant {} (row {}): unmatched keys: [{}]",
            self.restaurant_id,
            self.row,
            self.fields.join(", ")
        )
    }
}
