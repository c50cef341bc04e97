//! Per-dataset cleaning: raw string tables in, typed rows out.
//!
//! Row-level problems never fail a dataset. They are reported as
//! [`FormatIssue`]s and the affected cells keep a best-effort value.

use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use serde::Serialize;

use crate::address::{standardize_address, AddressStandardizer, AddressStats};
use crate::error::EngineError;
use crate::model::{ApplicationRow, InspectedOn, InspectionRow};
use crate::normalize::{compact_key, normalize_text};
use crate::raw::{DatasetKind, RawTable};

/// Source format of `InspectedOn`, local New York time.
pub const INSPECTED_ON_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Replacement for an empty `SkippedReason`.
pub const SKIPPED_REASON_DEFAULT: &str = "NA";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatIssue {
    pub dataset: DatasetKind,
    pub column: String,
    pub rows_affected: usize,
    pub message: String,
}

impl std::fmt::Display for FormatIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}: {} ({} rows)",
            self.dataset, self.column, self.message, self.rows_affected
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatReport {
    pub issues: Vec<FormatIssue>,
    pub address: AddressStats,
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Integer cell. Accepts float renderings of whole numbers ("10001.0").
fn parse_int(value: &str) -> Result<Option<i64>, ()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(v) = value.parse::<i64>() {
        return Ok(Some(v));
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_nan() => Ok(None),
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f as i64)),
        _ => Err(()),
    }
}

fn parse_float(value: &str) -> Result<Option<f64>, ()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_nan() => Ok(None),
        Ok(f) if f.is_finite() => Ok(Some(f)),
        _ => Err(()),
    }
}

/// Parse a local New York timestamp and convert to UTC. Ambiguous local
/// times (DST fall-back) resolve to the earlier instant.
pub fn parse_inspected_on(value: &str) -> Option<chrono::DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), INSPECTED_ON_FORMAT).ok()?;
    New_York
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Collects failed cells per column while a dataset is formatted.
struct ColumnParser<'a> {
    table: &'a RawTable,
    dataset: DatasetKind,
    issues: Vec<FormatIssue>,
}

impl<'a> ColumnParser<'a> {
    fn column<T>(
        &mut self,
        name: &str,
        parse: impl Fn(&str) -> Result<Option<T>, ()>,
    ) -> Result<Vec<Option<T>>, EngineError> {
        let col = self.table.require_column(self.dataset.as_str(), name)?;
        let mut failed = 0;
        let values = (0..self.table.len())
            .map(|row| {
                parse(self.table.cell(row, col)).unwrap_or_else(|_| {
                    failed += 1;
                    None
                })
            })
            .collect();

        if failed > 0 {
            let issue = FormatIssue {
                dataset: self.dataset,
                column: name.into(),
                rows_affected: failed,
                message: "non-numeric values left empty".into(),
            };
            log::warn!("{issue}");
            self.issues.push(issue);
        }
        Ok(values)
    }

    fn text(&self, name: &str) -> Result<Vec<String>, EngineError> {
        let col = self.table.require_column(self.dataset.as_str(), name)?;
        Ok((0..self.table.len())
            .map(|row| self.table.cell(row, col).to_string())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// OpenRestaurantInspections
// ---------------------------------------------------------------------------

/// Clean, transform and normalize the sidewalk inspections extract.
pub fn format_inspections(
    table: &RawTable,
    standardizer: &dyn AddressStandardizer,
) -> Result<(Vec<InspectionRow>, FormatReport), EngineError> {
    let dataset = DatasetKind::OpenRestaurantInspections;
    let mut p = ColumnParser { table, dataset, issues: Vec::new() };

    let borough = p.text("Borough")?;
    let names = p.text("RestaurantName")?;
    let legal_names = p.text("LegalBusinessName")?;
    let addresses = p.text("BusinessAddress")?;
    let inspected_on = p.text("InspectedOn")?;
    let compliant = p.text("IsRoadwayCompliant")?;
    let skipped = p.text("SkippedReason")?;
    let agency = p.text("AgencyCode")?;
    let nta = p.text("NTA")?;

    let postcode = p.column("Postcode", parse_int)?;
    let latitude = p.column("Latitude", parse_float)?;
    let longitude = p.column("Longitude", parse_float)?;
    let community_board = p.column("CommunityBoard", parse_int)?;
    let council_district = p.column("CouncilDistrict", parse_int)?;
    let census_tract = p.column("CensusTract", parse_int)?;
    let bin = p.column("BIN", parse_int)?;
    let bbl = p.column("BBL", parse_int)?;

    // The column converts as a whole or not at all.
    let converted: Option<Vec<_>> = inspected_on.iter().map(|v| parse_inspected_on(v)).collect();
    let inspected_on: Vec<InspectedOn> = match converted {
        Some(ts) => ts.into_iter().map(InspectedOn::Utc).collect(),
        None => {
            let bad = inspected_on.iter().filter(|v| parse_inspected_on(v).is_none()).count();
            let issue = FormatIssue {
                dataset,
                column: "InspectedOn".into(),
                rows_affected: bad,
                message: "cannot convert all values to a date; column left unconverted".into(),
            };
            log::warn!("{issue}");
            p.issues.push(issue);
            inspected_on.into_iter().map(InspectedOn::Raw).collect()
        }
    };

    let mut address_stats = AddressStats::default();
    let mut rows = Vec::with_capacity(table.len());

    for (i, inspected_on) in inspected_on.into_iter().enumerate() {
        let skipped_reason = if skipped[i].trim().is_empty() {
            SKIPPED_REASON_DEFAULT.to_string()
        } else {
            skipped[i].clone()
        };

        rows.push(InspectionRow {
            name: normalize_text(&names[i]),
            legal_business_name: normalize_text(&legal_names[i]),
            street_address: standardize_address(&addresses[i], standardizer, &mut address_stats),
            borough: borough[i].trim().to_uppercase(),
            postcode: postcode[i],
            latitude: latitude[i],
            longitude: longitude[i],
            community_board: community_board[i],
            council_district: council_district[i],
            census_tract: census_tract[i],
            bin: bin[i],
            bbl: bbl[i],
            nta: nta[i].trim().to_uppercase(),
            inspected_on,
            sideway_compliant: compliant[i].clone(),
            skipped_reason,
            agency_code: agency[i].clone(),
            restaurant_id: None,
        });
    }

    log::info!(
        "formatted {} {} rows ({} addresses fell back to text normalization)",
        rows.len(),
        dataset,
        address_stats.fallback
    );

    Ok((rows, FormatReport { issues: p.issues, address: address_stats }))
}

// ---------------------------------------------------------------------------
// OpenRestaurantApplications
// ---------------------------------------------------------------------------

/// Build the grouping keys for the applications extract.
pub fn format_applications(table: &RawTable) -> Result<Vec<ApplicationRow>, EngineError> {
    let dataset = DatasetKind::OpenRestaurantApplications;
    let p = ColumnParser { table, dataset, issues: Vec::new() };

    let legal_names = p.text("Legal Business Name")?;
    let addresses = p.text("Business Address")?;

    let rows: Vec<ApplicationRow> = legal_names
        .into_iter()
        .zip(addresses)
        .map(|(legal, address)| ApplicationRow {
            formatted_legal_business_name: compact_key(&legal),
            formatted_business_address: compact_key(&address),
            raw_legal_business_name: legal,
            business_address: address,
            branch_id: None,
        })
        .collect();

    log::info!("formatted {} {} rows", rows.len(), dataset);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::UspsStandardizer;

    const HEADER: &str = "RestaurantName,LegalBusinessName,BusinessAddress,Borough,Postcode,Latitude,Longitude,CommunityBoard,CouncilDistrict,CensusTract,BIN,BBL,NTA,InspectedOn,IsSidewayCompliant,IsRoadwayCompliant,SkippedReason,AgencyCode";

    fn inspections(rows: &[&str]) -> RawTable {
        let mut csv = format!("{HEADER}\n");
        for r in rows {
            csv.push_str(r);
            csv.push('\n');
        }
        RawTable::from_csv("OpenRestaurantInspections", &csv).unwrap()
    }

    #[test]
    fn formats_inspection_row() {
        let table = inspections(&[
            "Joe's Pizza,Joe's Pizza Inc.,7 Carmine Street,Manhattan,10014.0,40.7305,-74.0021,102,3,65,1010101,1005860001,mn23,07/15/2020 02:30:00 PM,yes,no,,DOT",
        ]);
        let (rows, report) = format_inspections(&table, &UspsStandardizer::new()).unwrap();
        assert!(report.issues.is_empty(), "{:?}", report.issues);
        assert_eq!(report.address, AddressStats { total: 1, standardized: 1, fallback: 0 });

        let r = &rows[0];
        assert_eq!(r.name, "JOES PIZZA");
        assert_eq!(r.legal_business_name, "JOES PIZZA INC");
        assert_eq!(r.street_address, "7 CARMINE ST");
        assert_eq!(r.borough, "MANHATTAN");
        assert_eq!(r.postcode, Some(10014));
        assert_eq!(r.bbl, Some(1005860001));
        assert_eq!(r.nta, "MN23");
        assert_eq!(r.sideway_compliant, "no");
        assert_eq!(r.skipped_reason, "NA");
        assert_eq!(r.inspected_on.to_string(), "2020-07-15T18:30:00Z");
        assert_eq!(r.restaurant_id, None);
    }

    #[test]
    fn winter_timestamps_use_standard_time() {
        let ts = parse_inspected_on("01/10/2021 09:05:00 AM").unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-01-10T14:05:00+00:00");
        assert!(parse_inspected_on("2021-01-10").is_none());
    }

    #[test]
    fn dst_transitions() {
        // Fall back: 01:30 happens twice, the EDT reading is taken.
        let ts = parse_inspected_on("11/01/2020 01:30:00 AM").unwrap();
        assert_eq!(ts.to_rfc3339(), "2020-11-01T05:30:00+00:00");
        // Spring forward: 02:30 never happens.
        assert!(parse_inspected_on("03/08/2020 02:30:00 AM").is_none());
    }

    #[test]
    fn unparseable_timestamp_keeps_column_raw() {
        let table = inspections(&[
            "A,A,1 Main St,Queens,11101,,,,,,,,QN31,07/15/2020 02:30:00 PM,,yes,,DOT",
            "B,B,2 Main St,Queens,11101,,,,,,,,QN31,yesterday,,yes,,DOT",
        ]);
        let (rows, report) = format_inspections(&table, &UspsStandardizer::new()).unwrap();
        assert_eq!(rows[0].inspected_on, InspectedOn::Raw("07/15/2020 02:30:00 PM".into()));
        assert_eq!(rows[1].inspected_on, InspectedOn::Raw("yesterday".into()));
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].column, "InspectedOn");
        assert_eq!(report.issues[0].rows_affected, 1);
    }

    #[test]
    fn bad_numbers_are_reported_and_emptied() {
        let table = inspections(&[
            "A,A,1 Main St,Queens,n/a,40.7,-73.9,,,,,,QN31,07/15/2020 02:30:00 PM,,yes,,DOT",
        ]);
        let (rows, report) = format_inspections(&table, &UspsStandardizer::new()).unwrap();
        assert_eq!(rows[0].postcode, None);
        assert_eq!(rows[0].latitude, Some(40.7));
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].column, "Postcode");
    }

    #[test]
    fn missing_column_is_an_error() {
        let table = RawTable::from_csv("OpenRestaurantInspections", "RestaurantName\nx\n").unwrap();
        let err = format_inspections(&table, &UspsStandardizer::new()).unwrap_err();
        assert!(matches!(err, EngineError::MissingColumn { .. }), "{err}");
    }

    #[test]
    fn parse_int_forms() {
        assert_eq!(parse_int("10001"), Ok(Some(10001)));
        assert_eq!(parse_int(" 10001.0 "), Ok(Some(10001)));
        assert_eq!(parse_int(""), Ok(None));
        assert_eq!(parse_int("nan"), Ok(None));
        assert_eq!(parse_int("10001.5"), Err(()));
        assert_eq!(parse_int("abc"), Err(()));
    }

    #[test]
    fn formats_applications() {
        let table = RawTable::from_csv(
            "OpenRestaurantApplications",
            "Legal Business Name,Business Address,Borough\nJoe's Pizza Inc.,7 Carmine St.,Manhattan\n",
        )
        .unwrap();
        let rows = format_applications(&table).unwrap();
        assert_eq!(rows[0].raw_legal_business_name, "Joe's Pizza Inc.");
        assert_eq!(rows[0].formatted_legal_business_name, "joespizzainc");
        assert_eq!(rows[0].formatted_business_address, "7carminest");
        assert_eq!(rows[0].branch_id, None);
    }
}
