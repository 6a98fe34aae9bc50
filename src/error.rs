//! Error taxonomy for the profile and document store.
//!
//! Everything except `Persistence` and `Io` is an expected, recoverable
//! outcome the dispatch layer renders as a short user-facing message.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("subject not found: {name}")]
    SubjectNotFound { name: String },

    #[error("subject already exists: {name}")]
    SubjectExists { name: String },

    #[error("question #{index} is out of range (bank has {len} questions)")]
    QuestionIndexOutOfRange { index: usize, len: usize },

    #[error("only .pdf uploads are accepted: {filename}")]
    RejectedFileType { filename: String },

    #[error("document not found: {name}")]
    DocumentNotFound { name: String },

    #[error("no active subject")]
    NoActiveSubject,

    #[error("profile database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("document storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-document failure from the external text-extraction capability.
/// Aggregate extraction logs and skips the document instead of propagating.
#[derive(Debug, Error)]
#[error("text extraction failed: {0}")]
pub struct ExtractionError(pub String);
