//! Data model for user study profiles.

mod subject;

pub use subject::{
    DEFAULT_GAME, DocumentCategory, Subject, SubjectView, UserProfile, subject_key,
};
