// File I/O for reconciliation runs: CSV and Excel in, CSV and Excel out.

pub mod csv;
pub mod error;
pub mod xlsx;

pub use error::IoError;

/// Sheet names used by the workbook reader and writer.
pub const EDW_SHEET: &str = "EDW";
pub const JOURNAL_SHEET: &str = "Journal";
pub const RECONCILIATION_SHEET: &str = "Reconciliation";
