use thiserror::Error;

/// Errors surfaced by index mutation and persistence.
#[derive(Debug, Error)]
pub enum Error {
    /// Removal or lookup of an identifier that has never been indexed.
    #[error("no such document: {0}")]
    NoSuchDocument(String),

    /// Re-indexing an identifier without `allow_overwrite`.
    #[error("document already indexed: {0}")]
    DuplicateDocument(String),

    /// Snapshot is missing keys, holds non-integer doc ids, or its postings
    /// disagree with its document table.
    #[error("malformed persisted index: {0}")]
    MalformedPersistedIndex(String),

    /// `commit` was called on an index that was never bound to a file.
    #[error("index has no snapshot path to commit to")]
    NoSnapshotPath,

    /// Every allocatable doc id has been handed out.
    #[error("doc id space exhausted")]
    DocIdsExhausted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(reason: impl std::fmt::Display) -> Self {
        Error::MalformedPersistedIndex(reason.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
