//! Manual cell overrides applied to raw datasets before formatting.
//!
//! Two file layouts are accepted:
//!
//! ```toml
//! [[edit]]
//! table  = "OpenRestaurantInspections"
//! rows   = [12, 40]
//! column = "Borough"
//! value  = "Staten Island"
//! ```
//!
//! and the legacy YAML list (`key`, `row`, `column`, `value`).

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::raw::RawRegistry;

/// Set `column` to `value` on each row labelled in `rows` of `table`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EditDirective {
    pub table: String,
    pub rows: Vec<i64>,
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    /// Cells written.
    pub applied: usize,
    /// Row targets dropped for an unknown table or an out-of-range row.
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct EditFile {
    #[serde(default)]
    edit: Vec<EditDirective>,
}

pub fn parse_edits_toml(input: &str) -> Result<Vec<EditDirective>, EngineError> {
    let file: EditFile = toml::from_str(input).map_err(|e| EngineError::EditsParse(e.to_string()))?;
    Ok(file.edit)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(i64),
    Many(Vec<i64>),
}

#[derive(Deserialize)]
struct LegacyEdit {
    key: String,
    row: OneOrMany,
    column: String,
    value: serde_yaml::Value,
}

pub fn parse_edits_yaml(input: &str) -> Result<Vec<EditDirective>, EngineError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let raw: Vec<LegacyEdit> =
        serde_yaml::from_str(input).map_err(|e| EngineError::EditsParse(e.to_string()))?;

    raw.into_iter()
        .map(|edit| {
            let value = match edit.value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Null => String::new(),
                other => {
                    return Err(EngineError::EditsParse(format!(
                        "edit on '{}'.'{}': unsupported value {other:?}",
                        edit.key, edit.column
                    )))
                }
            };
            let rows = match edit.row {
                OneOrMany::One(r) => vec![r],
                OneOrMany::Many(rs) => rs,
            };
            Ok(EditDirective { table: edit.key, rows, column: edit.column, value })
        })
        .collect()
}

/// Pick the parser by file extension (`.yaml`/`.yml` → YAML, otherwise TOML).
pub fn parse_edits(file_name: &str, input: &str) -> Result<Vec<EditDirective>, EngineError> {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        parse_edits_yaml(input)
    } else {
        parse_edits_toml(input)
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Apply directives in order and renumber every table's row labels from zero.
pub fn apply_edits(mut tables: RawRegistry, edits: &[EditDirective]) -> (RawRegistry, EditOutcome) {
    let mut outcome = EditOutcome::default();

    for edit in edits {
        let Some(table) = tables.get_mut(&edit.table) else {
            log::debug!("edit skipped: unknown table '{}'", edit.table);
            outcome.skipped += edit.rows.len();
            continue;
        };

        for &label in &edit.rows {
            let positions = table.positions_of(label);
            if positions.is_empty() {
                log::debug!("edit skipped: table '{}' has no row {label}", edit.table);
                outcome.skipped += 1;
                continue;
            }
            let col = table.ensure_column(&edit.column);
            for pos in positions {
                table.rows[pos][col] = edit.value.clone();
            }
            outcome.applied += 1;
        }
    }

    for table in tables.values_mut() {
        table.reset_index();
    }

    log::info!("made {} edits to the raw data ({} skipped)", outcome.applied, outcome.skipped);
    (tables, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawTable;

    fn registry() -> RawRegistry {
        let table = RawTable::from_csv(
            "OpenRestaurantInspections",
            "Index,Borough,Postcode\n3,X,10001\n7,Queens,11101\n",
        )
        .unwrap();
        RawRegistry::from([("OpenRestaurantInspections".to_string(), table)])
    }

    fn directive(table: &str, rows: Vec<i64>, column: &str, value: &str) -> EditDirective {
        EditDirective {
            table: table.into(),
            rows,
            column: column.into(),
            value: value.into(),
        }
    }

    #[test]
    fn duplicate_label_edits_every_row() {
        let table = RawTable::from_csv(
            "OpenRestaurantInspections",
            "Index,Borough\n3,X\n7,Queens\n3,Y\n",
        )
        .unwrap();
        let tables = RawRegistry::from([("OpenRestaurantInspections".to_string(), table)]);
        let edits = vec![directive("OpenRestaurantInspections", vec![3], "Borough", "BRONX")];
        let (tables, outcome) = apply_edits(tables, &edits);
        let t = &tables["OpenRestaurantInspections"];
        assert_eq!(t.rows[0][0], "BRONX");
        assert_eq!(t.rows[1][0], "Queens");
        assert_eq!(t.rows[2][0], "BRONX");
        assert_eq!(outcome, EditOutcome { applied: 1, skipped: 0 });
    }

    #[test]
    fn edit_targets_index_labels() {
        let edits = vec![directive("OpenRestaurantInspections", vec![3], "Borough", "STATEN ISLAND")];
        let (tables, outcome) = apply_edits(registry(), &edits);
        let t = &tables["OpenRestaurantInspections"];
        assert_eq!(t.rows[0][0], "STATEN ISLAND");
        assert_eq!(t.rows[1][0], "Queens");
        assert_eq!(outcome, EditOutcome { applied: 1, skipped: 0 });
    }

    #[test]
    fn unknown_table_and_row_are_skipped() {
        let edits = vec![
            directive("Nope", vec![0, 1], "Borough", "x"),
            directive("OpenRestaurantInspections", vec![99, 7], "Borough", "QUEENS"),
        ];
        let (tables, outcome) = apply_edits(registry(), &edits);
        assert_eq!(outcome, EditOutcome { applied: 1, skipped: 3 });
        assert_eq!(tables["OpenRestaurantInspections"].rows[1][0], "QUEENS");
    }

    #[test]
    fn later_edits_win() {
        let edits = vec![
            directive("OpenRestaurantInspections", vec![7], "Borough", "A"),
            directive("OpenRestaurantInspections", vec![7], "Borough", "B"),
        ];
        let (tables, _) = apply_edits(registry(), &edits);
        assert_eq!(tables["OpenRestaurantInspections"].rows[1][0], "B");
    }

    #[test]
    fn index_is_renumbered() {
        let (tables, _) = apply_edits(registry(), &[]);
        assert_eq!(tables["OpenRestaurantInspections"].index, vec![0, 1]);
    }

    #[test]
    fn new_column_is_added() {
        let edits = vec![directive("OpenRestaurantInspections", vec![7], "NTA", "QN31")];
        let (tables, _) = apply_edits(registry(), &edits);
        let t = &tables["OpenRestaurantInspections"];
        let col = t.column_index("NTA").unwrap();
        assert_eq!(t.rows[0][col], "");
        assert_eq!(t.rows[1][col], "QN31");
    }

    #[test]
    fn parse_toml_layout() {
        let input = r#"
[[edit]]
table = "OpenRestaurantInspections"
rows = [1, 2]
column = "Borough"
value = "Bronx"
"#;
        let edits = parse_edits("edits.toml", input).unwrap();
        assert_eq!(edits, vec![directive("OpenRestaurantInspections", vec![1, 2], "Borough", "Bronx")]);
        assert!(parse_edits("edits.toml", "").unwrap().is_empty());
    }

    #[test]
    fn parse_legacy_yaml_layout() {
        let input = "\
- key: OpenRestaurantInspections
  row: [4, 5]
  column: Postcode
  value: 10013
- key: OpenRestaurantApplications
  row: 2
  column: Legal Business Name
  value: Joe's Pizza
";
        let edits = parse_edits("edits.yaml", input).unwrap();
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].rows, vec![4, 5]);
        assert_eq!(edits[0].value, "10013");
        assert_eq!(edits[1].rows, vec![2]);
        assert_eq!(edits[1].value, "Joe's Pizza");
    }

    #[test]
    fn parse_errors_are_reported() {
        assert!(matches!(parse_edits("e.toml", "[[edit]]\ntable = 1"), Err(EngineError::EditsParse(_))));
        assert!(matches!(parse_edits("e.yml", "- key: [1"), Err(EngineError::EditsParse(_))));
    }
}
