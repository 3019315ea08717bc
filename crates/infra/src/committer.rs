//! Atomic application of a [`MutationBatch`].

use std::sync::Arc;

use thiserror::Error;

use crate::mutation::MutationBatch;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// An insert hit an existing key.
    #[error("row already exists: {table}/{key}")]
    Conflict { table: String, key: String },

    /// An update targeted a row that does not exist.
    #[error("row not found: {table}/{key}")]
    MissingRow { table: String, key: String },

    /// The backend refused or lost the batch (connection, injected failure).
    #[error("commit unavailable: {0}")]
    Unavailable(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Applies every write of a batch or none of them.
///
/// On `Err` no write from the batch may be visible to any reader.
pub trait Committer: Send + Sync {
    fn apply(&self, batch: MutationBatch) -> Result<(), CommitError>;
}

impl<T: Committer + ?Sized> Committer for Arc<T> {
    fn apply(&self, batch: MutationBatch) -> Result<(), CommitError> {
        (**self).apply(batch)
    }
}
