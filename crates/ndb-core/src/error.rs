use thiserror::Error;

use crate::types::MetadataType;

/// Every failure the boundary can report, one variant per error kind.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to open engine: {0}")]
    Construction(String),

    #[error("Insert failed: {0}")]
    Insert(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Save failed: {0}")]
    Save(String),

    #[error("Delete failed: {0}")]
    Delete(String),

    #[error("Listing sources failed: {0}")]
    Sources(String),

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Metadata type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: MetadataType,
        found: MetadataType,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Render an engine error chain into a single line, outermost context first.
    pub(crate) fn describe(err: &anyhow::Error) -> String {
        format!("{err:#}")
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Bounds check shared by every positional accessor.
pub fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::IndexOutOfRange { index, len })
    }
}
