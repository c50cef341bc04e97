// opendine - NYC open restaurant data pipeline
// Raw open-data CSV extracts in, Restaurant / SidewalkInspection / Branch tables out.

mod debug;
mod exit_codes;
mod files;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_CONFIG, EXIT_INPUT, EXIT_OUTPUT, EXIT_SUCCESS, EXIT_USAGE};
use files::LoadedConfig;
use run::{cmd_run, RunArgs};

const DEFAULT_CONFIG: &str = "opendine.toml";

#[derive(Parser)]
#[command(name = "opendine")]
#[command(about = "Build restaurant tables from NYC open-data extracts")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log progress (info level). RUST_LOG overrides.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for one configured dataset
    #[command(after_help = "\
Examples:
  opendine run test
  opendine run full --config etc/opendine.toml --debug
  opendine run full --json > report.json
  opendine run full --strict --seed 42 --output-dir /tmp/tables")]
    Run {
        /// Dataset name from the config (optional when only one is defined)
        dataset: Option<String>,

        /// Pipeline config file
        #[arg(long, short = 'c', env = "OPENDINE_CONFIG", default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Write tables here instead of the configured output_dir
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,

        /// Write intermediate tables and merge conflicts to the debug dir
        #[arg(long)]
        debug: bool,

        /// Print the run report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Exit non-zero when merge conflicts were found
        #[arg(long)]
        strict: bool,

        /// Seed the identifier generator for reproducible ids
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List the datasets defined in the config
    #[command(after_help = "\
Examples:
  opendine datasets
  opendine datasets --json")]
    Datasets {
        /// Pipeline config file
        #[arg(long, short = 'c', env = "OPENDINE_CONFIG", default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Check the config, the edits file and the input files without running
    #[command(after_help = "\
Examples:
  opendine validate
  opendine validate --config etc/opendine.toml")]
    Validate {
        /// Pipeline config file
        #[arg(long, short = 'c', env = "OPENDINE_CONFIG", default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("OPENDINE_COMMIT"), ")",
        "\nengine:  opendine-engine ", env!("CARGO_PKG_VERSION"),
    )
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            dataset,
            config,
            output_dir,
            debug,
            json,
            strict,
            seed,
        } => cmd_run(RunArgs { dataset, config, output_dir, debug, json, strict, seed }),
        Commands::Datasets { config, json } => cmd_datasets(config, json),
        Commands::Validate { config } => cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT, message: msg.into(), hint: None }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// datasets
// ============================================================================

fn cmd_datasets(config: PathBuf, json: bool) -> Result<(), CliError> {
    let loaded = LoadedConfig::load(&config)?;

    if json {
        let datasets: Vec<_> = loaded
            .config
            .dataset
            .iter()
            .map(|d| serde_json::json!({ "name": d.name, "files": d.files }))
            .collect();
        println!("{}", serde_json::Value::Array(datasets));
        return Ok(());
    }

    for d in &loaded.config.dataset {
        println!("{}", d.name);
        for file in &d.files {
            println!("  {}", loaded.resolve(file).display());
        }
    }
    Ok(())
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(config: PathBuf) -> Result<(), CliError> {
    let loaded = LoadedConfig::load(&config)?;
    let edits = loaded.load_edits()?;

    let missing: Vec<String> = loaded
        .config
        .dataset
        .iter()
        .flat_map(|d| d.files.iter())
        .map(|f| loaded.resolve(f))
        .filter(|p| !p.is_file())
        .map(|p| p.display().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CliError::input(format!("input files not found: {}", missing.join(", "))));
    }

    eprintln!(
        "{}: ok ({} datasets, {} edit directives)",
        loaded.path.display(),
        loaded.config.dataset.len(),
        edits.len()
    );
    Ok(())
}
