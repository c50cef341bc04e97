use std::collections::HashSet;

use serde::Deserialize;

use crate::error::EngineError;
use crate::raw::DatasetKind;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Paths are kept as written; the caller resolves them against the
/// directory holding the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_debug_dir")]
    pub debug_dir: String,
    /// Edit directive file, TOML or YAML.
    #[serde(default)]
    pub edits: Option<String>,
    #[serde(default)]
    pub dataset: Vec<DatasetConfig>,
}

fn default_output_dir() -> String {
    "data/formatted".into()
}

fn default_debug_dir() -> String {
    "debug".into()
}

/// A named selection of raw input files, at most one per dataset kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    pub name: String,
    pub files: Vec<String>,
}

impl DatasetConfig {
    /// Files paired with the dataset kind their name identifies.
    pub fn classified_files(&self) -> Vec<(DatasetKind, &str)> {
        self.files
            .iter()
            .filter_map(|f| DatasetKind::classify_file(f).map(|kind| (kind, f.as_str())))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.dataset.is_empty() {
            return Err(EngineError::ConfigValidation(
                "at least one [[dataset]] is required".into(),
            ));
        }

        let mut names = HashSet::new();
        for ds in &self.dataset {
            if ds.name.trim().is_empty() {
                return Err(EngineError::ConfigValidation("dataset name is empty".into()));
            }
            if !names.insert(ds.name.as_str()) {
                return Err(EngineError::ConfigValidation(format!(
                    "dataset '{}' is defined more than once",
                    ds.name
                )));
            }
            if ds.files.is_empty() {
                return Err(EngineError::ConfigValidation(format!(
                    "dataset '{}': no files listed",
                    ds.name
                )));
            }

            let mut kinds = HashSet::new();
            for file in &ds.files {
                let kind = DatasetKind::classify_file(file).ok_or_else(|| {
                    EngineError::ConfigValidation(format!(
                        "dataset '{}': cannot tell which dataset '{file}' holds \
                         (file name must contain one of: {})",
                        ds.name,
                        DatasetKind::ALL.map(DatasetKind::as_str).join(", ")
                    ))
                })?;
                if !kinds.insert(kind) {
                    return Err(EngineError::ConfigValidation(format!(
                        "dataset '{}': more than one {kind} file",
                        ds.name
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn dataset_names(&self) -> Vec<String> {
        self.dataset.iter().map(|d| d.name.clone()).collect()
    }

    /// Look up a dataset by name.
    pub fn select(&self, name: &str) -> Result<&DatasetConfig, EngineError> {
        self.dataset
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| EngineError::UnknownDataset {
                name: name.into(),
                available: self.dataset_names(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
