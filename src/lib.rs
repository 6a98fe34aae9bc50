//! studybot-backend — profile and document store core for the studybot
//! study assistant.
//!
//! Each user owns a set of named subjects; a subject owns two document
//! collections (lectures, practice tests), a free-form question bank, and
//! a mnemonic-game personalization string. One subject per user is active
//! at a time and is the implicit target of document and question commands.
//!
//! The command-dispatch layer and the text-generation service sit on top of
//! [`store::StudyStore`]; PDF text extraction is injected through the
//! [`documents::TextExtractor`] seam.

pub mod config;
pub mod db;
pub mod documents;
pub mod error;
pub mod models;
pub mod store;

pub use db::Database;
pub use documents::{DocumentStore, TextExtractor};
pub use error::{ExtractionError, StoreError, StoreResult};
pub use store::{StudyMaterials, StudyStore, SubjectOverview};
