//! Error type for the local document store.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::domain::ports::InventoryStoreError;

/// Errors raised while persisting the local document.
///
/// Plain reads never fail: an absent or malformed document reads as empty.
/// Mutations refuse to run over a document that could not be read in full.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalStoreError {
    /// The data directory could not be created or opened.
    #[error("failed to open data directory '{path}': {message}")]
    Open {
        /// Directory path.
        path: Utf8PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// A file could not be written.
    #[error("failed to write '{path}': {message}")]
    Write {
        /// Target file path.
        path: Utf8PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// The document could not be serialised.
    #[error("failed to encode inventory document: {message}")]
    Encode {
        /// Serializer error text.
        message: String,
    },

    /// The stored document could not be read in full, so rewriting it would
    /// lose data.
    #[error("inventory document is unreadable: {message}")]
    Corrupt {
        /// What could not be read.
        message: String,
    },

    /// Imported JSON is not an inventory document.
    #[error("invalid inventory backup: {message}")]
    Import {
        /// Parser error text.
        message: String,
    },
}

impl From<LocalStoreError> for InventoryStoreError {
    fn from(error: LocalStoreError) -> Self {
        match error {
            LocalStoreError::Open { .. } | LocalStoreError::Write { .. } => {
                Self::storage(error.to_string())
            }
            LocalStoreError::Corrupt { .. }
            | LocalStoreError::Encode { .. }
            | LocalStoreError::Import { .. } => {
                Self::decode(error.to_string())
            }
        }
    }
}
