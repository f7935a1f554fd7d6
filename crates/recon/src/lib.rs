//! `ledgerpair-recon`: Journal-to-EDW bank reconciliation engine.
//!
//! Pure engine crate: receives parsed tables, matches each journal debit to an
//! exact subset of EDW transactions sharing its account, code and date, and
//! returns per-entry results plus the paired CR/DR output rows.
//! No CLI or file IO dependencies.

pub mod amount;
pub mod config;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod grouper;
pub mod load;
pub mod model;
pub mod subset_sum;
pub mod tiebreak;

pub use config::ReconConfig;
pub use engine::{run, run_with_options, RunOptions};
pub use error::ReconError;
pub use load::{load_input, RawTable};
pub use model::{
    LedgerEntry, MatchResult, OutputRow, RawTransaction, ReconInput, ReconResult, ReconSummary,
    UnmatchedReason, OUTPUT_COLUMNS,
};
