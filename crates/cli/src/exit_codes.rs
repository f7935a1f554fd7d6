//! CLI Exit Code Registry
//!
//! Single source of truth for `lpair` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success, every journal entry matched                      |
//! | 1    | Run completed, at least one journal entry unmatched       |
//! | 2    | Usage error (bad arguments, unsupported output extension) |
//! | 3    | Invalid config (TOML parse or validation failure)         |
//! | 4    | Structural input error (missing column, bad date/amount)  |
//! | 5    | I/O error (cannot read or write a file)                   |
//! | 6    | Ambiguous matches present and `--fail-on-ambiguous` set   |

use ledgerpair_io::IoError;
use ledgerpair_recon::ReconError;

/// Success - every journal entry matched.
pub const EXIT_SUCCESS: u8 = 0;

/// Unmatched journal entries remain. Like `diff(1)`, 1 means "not clean".
pub const EXIT_UNMATCHED: u8 = 1;

/// Usage error - bad arguments. clap uses the same code for parse failures.
pub const EXIT_USAGE: u8 = 2;

/// Config file could not be parsed or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Input tables are malformed.
pub const EXIT_INPUT: u8 = 4;

/// File could not be read or written.
pub const EXIT_IO: u8 = 5;

/// At least one match was ambiguous and `--fail-on-ambiguous` was given.
pub const EXIT_AMBIGUOUS: u8 = 6;

pub fn recon_exit_code(err: &ReconError) -> u8 {
    if err.is_structural() {
        EXIT_INPUT
    } else {
        EXIT_INVALID_CONFIG
    }
}

pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Table(inner) => recon_exit_code(inner),
        other if other.is_structural() => EXIT_INPUT,
        _ => EXIT_IO,
    }
}
