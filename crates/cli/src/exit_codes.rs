//! CLI Exit Code Registry
//!
//! Single source of truth for `opendine` exit codes. Scripts driving the
//! nightly refresh rely on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success (merge conflicts and format issues reported)  |
//! | 1    | General error (unspecified)                           |
//! | 2    | Usage error (bad arguments)                           |
//! | 3    | Config error: unreadable/invalid config, unknown      |
//! |      | dataset, missing or invalid edits file                |
//! | 4    | Input read error (raw CSV missing or malformed)       |
//! | 5    | Output write error                                    |
//! | 6    | Merge conflicts present and `--strict` was passed     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above

/// Success - tables written. Conflicts alone do not fail a run.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments.
pub const EXIT_USAGE: u8 = 2;

/// Config file unreadable or invalid, unknown dataset selected, or the
/// edits file is missing or malformed. Nothing has been written.
pub const EXIT_CONFIG: u8 = 3;

/// A raw input file could not be read or parsed as CSV.
pub const EXIT_INPUT: u8 = 4;

/// An output table or debug artifact could not be written.
pub const EXIT_OUTPUT: u8 = 5;

/// `--strict` run finished with merge conflicts. Tables are still written.
pub const EXIT_CONFLICTS: u8 = 6;
