use thiserror::Error;

/// Fatal run errors. Everything else (no candidates, no exact cover, search
/// budget) is a normal outcome recorded on the result, not an error.
#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad search bounds, empty currency, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Required column missing from an input table.
    #[error("table '{table}': missing column '{column}'")]
    MissingColumn { table: String, column: String },
    /// Required cell is blank.
    ///
    /// `row` fields hold the 0-based data row; messages show the sheet row,
    /// where the header is row 1.
    #[error("table '{table}', row {}: column '{column}' is empty", .row + 2)]
    EmptyField { table: String, row: usize, column: String },
    #[error("table '{table}', row {}: cannot parse date '{value}'", .row + 2)]
    DateParse { table: String, row: usize, value: String },
    #[error("table '{table}', row {}: cannot parse amount '{value}'", .row + 2)]
    AmountParse { table: String, row: usize, value: String },
    /// Transaction identifiers must be unique across the EDW table.
    #[error(
        "table '{table}', row {}: duplicate transaction id '{id}' (first seen at row {})",
        .row + 2,
        .first_row + 2
    )]
    DuplicateTransactionId {
        table: String,
        row: usize,
        first_row: usize,
        id: String,
    },
    /// Journal debit amounts are positive magnitudes.
    #[error("table '{table}', row {}: debit amount must be positive, got '{value}'", .row + 2)]
    NonPositiveDebit { table: String, row: usize, value: String },
    /// Malformed CSV text handed to the engine.
    #[error("table '{table}': {message}")]
    Table { table: String, message: String },
    /// Worker pool could not be built.
    #[error("worker pool error: {0}")]
    Pool(String),
}

impl ReconError {
    /// True for errors caused by the shape or content of the input tables
    /// rather than by configuration.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            Self::ConfigParse(_) | Self::ConfigValidation(_) | Self::Pool(_)
        )
    }
}
