//! Filesystem side of a run: config discovery, raw inputs, edit files,
//! output writing.

use std::io::Read;
use std::path::{Path, PathBuf};

use opendine_engine::config::DatasetConfig;
use opendine_engine::edits::{parse_edits, EditDirective};
use opendine_engine::{PipelineConfig, RawRegistry, RawTable};

use crate::CliError;

/// Read file and convert to UTF-8 if needed. Excel-exported extracts come
/// as Windows-1252.
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            log::info!("{}: not UTF-8, decoded as Windows-1252", path.display());
            Ok(decoded.into_owned())
        }
    }
}

/// A parsed config plus the directory its relative paths hang off.
pub struct LoadedConfig {
    pub path: PathBuf,
    pub base_dir: PathBuf,
    pub config: PipelineConfig,
}

impl LoadedConfig {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("cannot read config {}: {e}", path.display()))
                .with_hint("pass --config <FILE> or create opendine.toml in the working directory")
        })?;
        let config = PipelineConfig::from_toml(&text)
            .map_err(|e| CliError::config(format!("{}: {e}", path.display())))?;

        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        Ok(Self { path: path.to_path_buf(), base_dir, config })
    }

    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.base_dir.join(relative)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.config.output_dir)
    }

    pub fn debug_dir(&self) -> PathBuf {
        self.resolve(&self.config.debug_dir)
    }

    /// Pick the dataset to run. With no name given, a config holding a
    /// single dataset selects it.
    pub fn select(&self, name: Option<&str>) -> Result<&DatasetConfig, CliError> {
        let names = self.config.dataset_names();
        let name = match name {
            Some(n) => n,
            None if names.len() == 1 => names[0].as_str(),
            None => {
                return Err(CliError::usage("no dataset selected")
                    .with_hint(format!("choose one of: {}", names.join(", "))));
            }
        };

        self.config.select(name).map_err(|e| {
            CliError::config(e.to_string()).with_hint("list configured datasets with `opendine datasets`")
        })
    }

    /// Parse the configured edits file. A configured file that does not
    /// exist is a config error; no `edits` entry means no edits.
    pub fn load_edits(&self) -> Result<Vec<EditDirective>, CliError> {
        let Some(edits) = &self.config.edits else {
            return Ok(Vec::new());
        };

        let path = self.resolve(edits);
        if !path.is_file() {
            return Err(CliError::config(format!("edits file not found: {}", path.display())));
        }
        let text = read_file_as_utf8(&path)
            .map_err(|e| CliError::config(format!("cannot read {}: {e}", path.display())))?;
        parse_edits(edits, &text).map_err(|e| CliError::config(format!("{}: {e}", path.display())))
    }

    /// Load every file of `dataset`, keyed by dataset kind name.
    pub fn load_raw(&self, dataset: &DatasetConfig) -> Result<RawRegistry, CliError> {
        let mut raw = RawRegistry::new();
        for (kind, file) in dataset.classified_files() {
            let path = self.resolve(file);
            let text = read_file_as_utf8(&path)
                .map_err(|e| CliError::input(format!("cannot read {}: {e}", path.display())))?;
            let table = RawTable::from_csv(kind.as_str(), &text)
                .map_err(|e| CliError::input(format!("{}: {e}", path.display())))?;
            log::info!("loaded {} rows of {kind} from {}", table.len(), path.display());
            raw.insert(kind.as_str().to_string(), table);
        }
        Ok(raw)
    }
}

/// Write `contents` to `dir/name`, creating `dir`.
pub fn write_output(dir: &Path, name: &str, contents: &str) -> Result<PathBuf, CliError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| CliError::output(format!("cannot create {}: {e}", dir.display())))?;
    let path = dir.join(name);
    std::fs::write(&path, contents)
        .map_err(|e| CliError::output(format!("cannot write {}: {e}", path.display())))?;
    Ok(path)
}
