use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty dataset list, unknown file kind, etc.).
    ConfigValidation(String),
    /// Requested dataset selection is not in the config.
    UnknownDataset { name: String, available: Vec<String> },
    /// Missing required column in input data.
    MissingColumn { dataset: String, column: String },
    /// CSV read/write error for a named table.
    Csv { table: String, message: String },
    /// Edit directive file could not be parsed.
    EditsParse(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownDataset { name, available } => {
                write!(f, "invalid dataset option selected: {name}")?;
                if !available.is_empty() {
                    write!(f, " (available: {})", available.join(", "))?;
                }
                Ok(())
            }
            Self::MissingColumn { dataset, column } => {
                write!(f, "dataset '{dataset}': missing column '{column}'")
            }
            Self::Csv { table, message } => write!(f, "table '{table}': CSV error: {message}"),
            Self::EditsParse(msg) => write!(f, "edits parse error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
