//! Street address standardization.
//!
//! The standardizer is a seam: the pipeline only needs "raw address in,
//! standardized address or failure out". [`UspsStandardizer`] is a local
//! rule set following USPS Publication 28 abbreviations.

use std::fmt;

use regex::Regex;
use serde::Serialize;

use crate::normalize::normalize_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardAddress {
    pub house_number: String,
    pub street: Vec<String>,
    /// Secondary unit, e.g. `STE 2`.
    pub unit: Option<String>,
}

impl fmt::Display for StandardAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.house_number, self.street.join(" "))?;
        if let Some(unit) = &self.unit {
            write!(f, " {unit}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    Empty,
    MissingHouseNumber,
    MissingStreetName,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty address"),
            Self::MissingHouseNumber => write!(f, "no house number"),
            Self::MissingStreetName => write!(f, "no street name"),
        }
    }
}

impl std::error::Error for AddressError {}

pub trait AddressStandardizer {
    fn standardize(&self, raw: &str) -> Result<StandardAddress, AddressError>;
}

// ---------------------------------------------------------------------------
// USPS rules
// ---------------------------------------------------------------------------

const DIRECTIONALS: &[(&str, &str)] = &[
    ("NORTH", "N"),
    ("SOUTH", "S"),
    ("EAST", "E"),
    ("WEST", "W"),
    ("NORTHEAST", "NE"),
    ("NORTHWEST", "NW"),
    ("SOUTHEAST", "SE"),
    ("SOUTHWEST", "SW"),
];

const SUFFIXES: &[(&str, &str)] = &[
    ("ALLEY", "ALY"),
    ("AV", "AVE"),
    ("AVEN", "AVE"),
    ("AVENUE", "AVE"),
    ("BOULEVARD", "BLVD"),
    ("BLVRD", "BLVD"),
    ("CIRCLE", "CIR"),
    ("CONCOURSE", "CONC"),
    ("COURT", "CT"),
    ("CRESCENT", "CRES"),
    ("DRIVE", "DR"),
    ("EXPRESSWAY", "EXPY"),
    ("HIGHWAY", "HWY"),
    ("LANE", "LN"),
    ("PARKWAY", "PKWY"),
    ("PLACE", "PL"),
    ("PLAZA", "PLZ"),
    ("ROAD", "RD"),
    ("SQUARE", "SQ"),
    ("STR", "ST"),
    ("STREET", "ST"),
    ("TERRACE", "TER"),
    ("TURNPIKE", "TPKE"),
];

/// Secondary unit designators. The unit runs to the end of the address.
const UNIT_DESIGNATORS: &[(&str, &str)] = &[
    ("APARTMENT", "APT"),
    ("APT", "APT"),
    ("FL", "FL"),
    ("FLOOR", "FL"),
    ("RM", "RM"),
    ("ROOM", "RM"),
    ("STE", "STE"),
    ("SUITE", "STE"),
    ("UNIT", "UNIT"),
];

fn lookup(table: &[(&str, &'static str)], token: &str) -> Option<&'static str> {
    table.iter().find(|(long, _)| *long == token).map(|(_, short)| *short)
}

pub struct UspsStandardizer {
    house_number: Regex,
}

impl UspsStandardizer {
    pub fn new() -> Self {
        Self {
            // 123, 123A, Queens-style 37-12
            house_number: Regex::new(r"^\d+(-\d+)?[A-Z]?$").unwrap(),
        }
    }
}

impl Default for UspsStandardizer {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressStandardizer for UspsStandardizer {
    fn standardize(&self, raw: &str) -> Result<StandardAddress, AddressError> {
        let cleaned: String = raw
            .to_uppercase()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { ' ' })
            .collect();

        let mut tokens = cleaned.split_whitespace();
        let house_number = tokens.next().ok_or(AddressError::Empty)?;
        if !self.house_number.is_match(house_number) {
            return Err(AddressError::MissingHouseNumber);
        }

        let rest: Vec<&str> = tokens.collect();
        let split = rest
            .iter()
            .position(|t| lookup(UNIT_DESIGNATORS, t).is_some())
            .unwrap_or(rest.len());
        let (street, unit) = rest.split_at(split);

        let mut street: Vec<String> = street.iter().map(|t| t.to_string()).collect();
        if street.is_empty() {
            return Err(AddressError::MissingStreetName);
        }

        // Pre-directional, then suffix and post-directional at the end.
        // A lone token is the street name itself (e.g. "BROADWAY"), and so
        // is the token before a lone post-directional ("AVENUE S").
        if street.len() > 1 {
            if let Some(short) = lookup(DIRECTIONALS, &street[0]) {
                street[0] = short.to_string();
            }
            let mut last = street.len() - 1;
            if let Some(short) = lookup(DIRECTIONALS, &street[last]) {
                street[last] = short.to_string();
                last -= 1;
            }
            if last > 0 {
                if let Some(short) = lookup(SUFFIXES, &street[last]) {
                    street[last] = short.to_string();
                }
            }
        }

        let unit = unit.split_first().and_then(|(designator, ident)| {
            let short = lookup(UNIT_DESIGNATORS, designator)?;
            Some(std::iter::once(short).chain(ident.iter().copied()).collect::<Vec<_>>().join(" "))
        });

        Ok(StandardAddress {
            house_number: house_number.to_string(),
            street,
            unit,
        })
    }
}

// ---------------------------------------------------------------------------
// Fallback + statistics
// ---------------------------------------------------------------------------

/// Counts for one formatting pass; aggregated by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AddressStats {
    pub total: usize,
    pub standardized: usize,
    pub fallback: usize,
}

impl AddressStats {
    pub fn fallback_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.fallback as f64 * 100.0 / self.total as f64
        }
    }

    pub fn merge(&mut self, other: AddressStats) {
        self.total += other.total;
        self.standardized += other.standardized;
        self.fallback += other.fallback;
    }
}

/// Standardize `raw`, falling back to [`normalize_text`] on failure.
pub fn standardize_address(
    raw: &str,
    standardizer: &dyn AddressStandardizer,
    stats: &mut AddressStats,
) -> String {
    stats.total += 1;
    match standardizer.standardize(raw) {
        Ok(address) => {
            stats.standardized += 1;
            address.to_string()
        }
        Err(e) => {
            log::debug!("address '{raw}' not standardized ({e}); using text normalization");
            stats.fallback += 1;
            normalize_text(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn std(raw: &str) -> Result<String, AddressError> {
        UspsStandardizer::new().standardize(raw).map(|a| a.to_string())
    }

    #[test]
    fn abbreviates_suffix_and_directional() {
        assert_eq!(std("123 West 45th Street").unwrap(), "123 W 45TH ST");
        assert_eq!(std("1 Main St.").unwrap(), "1 MAIN ST");
        assert_eq!(std("200 park avenue south").unwrap(), "200 PARK AVE S");
        assert_eq!(std("55 Grand Concourse").unwrap(), "55 GRAND CONC");
    }

    #[test]
    fn queens_hyphenated_numbers() {
        assert_eq!(std("37-12 Broadway").unwrap(), "37-12 BROADWAY");
        assert_eq!(std("40-01A 31st Avenue").unwrap(), "40-01A 31ST AVE");
    }

    #[test]
    fn single_token_street_kept() {
        assert_eq!(std("1681 BROADWAY").unwrap(), "1681 BROADWAY");
        assert_eq!(std("10 Avenue").unwrap(), "10 AVENUE");
    }

    #[test]
    fn suffix_before_post_directional() {
        assert_eq!(std("200 Park Avenue South").unwrap(), std("200 Park Ave South").unwrap());
        assert_eq!(std("5 Central Park West").unwrap(), "5 CENTRAL PARK W");
        assert_eq!(std("10 Avenue South").unwrap(), "10 AVENUE S");
    }

    #[test]
    fn units_abbreviated_and_kept() {
        assert_eq!(std("12 E 7th St Apt 2").unwrap(), "12 E 7TH ST APT 2");
        assert_eq!(std("99 Bowery, Suite 400").unwrap(), "99 BOWERY STE 400");
        assert_eq!(std("1 Main Street Floor 2").unwrap(), "1 MAIN ST FL 2");
        assert_eq!(std("1 Main Street Ste").unwrap(), "1 MAIN ST STE");
        assert_ne!(std("12 E 7th St Suite 2").unwrap(), std("12 E 7th St Suite 3").unwrap());
    }

    #[test]
    fn failures() {
        assert_eq!(std(""), Err(AddressError::Empty));
        assert_eq!(std("  , "), Err(AddressError::Empty));
        assert_eq!(std("Broadway"), Err(AddressError::MissingHouseNumber));
        assert_eq!(std("12"), Err(AddressError::MissingStreetName));
        assert_eq!(std("12 Apt 3"), Err(AddressError::MissingStreetName));
    }

    #[test]
    fn fallback_is_counted() {
        let standardizer = UspsStandardizer::new();
        let mut stats = AddressStats::default();
        assert_eq!(standardize_address("1 Main Street", &standardizer, &mut stats), "1 MAIN ST");
        assert_eq!(standardize_address("Pier 17, South St", &standardizer, &mut stats), "PIER 17 SOUTH ST");
        assert_eq!(stats, AddressStats { total: 2, standardized: 1, fallback: 1 });
        assert_eq!(stats.fallback_percent(), 50.0);
    }

    #[test]
    fn stats_merge() {
        let mut a = AddressStats { total: 2, standardized: 1, fallback: 1 };
        a.merge(AddressStats { total: 3, standardized: 3, fallback: 0 });
        assert_eq!(a, AddressStats { total: 5, standardized: 4, fallback: 1 });
        assert_eq!(AddressStats::default().fallback_percent(), 0.0);
    }
}
