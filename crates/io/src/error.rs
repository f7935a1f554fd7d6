use std::path::PathBuf;

use ledgerpair_recon::ReconError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("{}: missing sheet '{sheet}'", path.display())]
    MissingSheet { path: PathBuf, sheet: String },

    #[error(transparent)]
    Table(#[from] ReconError),
}

impl IoError {
    /// Malformed content (as opposed to a file that could not be read or written).
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::MissingSheet { .. } | Self::Table(_))
    }
}
