use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing the stock file
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file is missing or could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The replacement file could not be written or moved into place
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file contents are not a valid stock array
    #[error("Invalid stock data: {0}")]
    Parse(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if the underlying cause is a missing file
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::Read { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
