//! `opendine run`: load, transform and write one configured dataset.

use std::path::PathBuf;

use opendine_engine::address::UspsStandardizer;
use opendine_engine::{IdGenerator, RunInput};

use crate::debug::write_debug_artifacts;
use crate::exit_codes::{EXIT_CONFLICTS, EXIT_ERROR};
use crate::files::{write_output, LoadedConfig};
use crate::CliError;

pub struct RunArgs {
    pub dataset: Option<String>,
    pub config: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub debug: bool,
    pub json: bool,
    pub strict: bool,
    pub seed: Option<u64>,
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let loaded = LoadedConfig::load(&args.config)?;
    let dataset = loaded.select(args.dataset.as_deref())?;

    // Config problems abort before any table is built.
    let edits = loaded.load_edits()?;
    let raw = loaded.load_raw(dataset)?;

    let mut ids = match args.seed {
        Some(seed) => IdGenerator::seeded(seed),
        None => IdGenerator::from_entropy(),
    };

    let input = RunInput {
        dataset: dataset.name.clone(),
        raw,
        edits,
    };
    let out = opendine_engine::run(input, &UspsStandardizer::new(), &mut ids);

    let output_dir = args.output_dir.unwrap_or_else(|| loaded.output_dir());
    let mut written = Vec::new();
    for table in &out.written {
        let csv = out
            .tables
            .to_csv(*table)
            .map_err(|e| CliError::output(e.to_string()))?;
        written.push(write_output(&output_dir, &table.file_name(), &csv)?);
    }

    if args.debug {
        written.extend(write_debug_artifacts(&loaded.debug_dir(), &out)?);
    }

    if args.json {
        let json = serde_json::to_string_pretty(&out.report()).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{json}");
    }

    // Human summary to stderr
    for line in out.stats.summary_lines() {
        eprintln!("{line}");
    }
    for issue in &out.issues {
        eprintln!("issue: {issue}");
    }
    for path in &written {
        eprintln!("wrote {}", path.display());
    }

    if args.strict && !out.conflicts.is_empty() {
        let err = CliError {
            code: EXIT_CONFLICTS,
            message: format!("{} merge conflicts", out.conflicts.len()),
            hint: None,
        };
        return Err(if args.debug {
            err.with_hint(format!(
                "see {}; fix with edit directives",
                loaded.debug_dir().join("Restaurant_match.csv").display()
            ))
        } else {
            err.with_hint("rerun with --debug to write Restaurant_match.csv")
        });
    }

    Ok(())
}
