//! Subjects, profiles, and the subject-key normalization rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder mnemonic theme used until the user picks a real game.
pub const DEFAULT_GAME: &str = "popular video games";

/// Derive the stable storage key for a subject from its display name:
/// lowercased, every whitespace character replaced with an underscore.
///
/// Two display names normalizing to the same key collide; subject creation
/// enforces uniqueness on the key, never on the display name.
pub fn subject_key(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// One of the two fixed document collections a subject owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Lectures,
    PracticeTests,
}

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 2] =
        [DocumentCategory::Lectures, DocumentCategory::PracticeTests];

    /// Directory name inside a subject's tree.
    pub fn dir_name(&self) -> &'static str {
        match self {
            DocumentCategory::Lectures => "lectures",
            DocumentCategory::PracticeTests => "practice_tests",
        }
    }
}

/// A subject as stored in the profile database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub key: String,
    pub display_name: String,
    pub game: String,
    /// Ordered question bank; display index = position + 1. Duplicates allowed.
    pub question_bank: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Read view of a subject with the active flag computed against the profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectView {
    pub key: String,
    pub display_name: String,
    pub game: String,
    pub active: bool,
}

/// A user's full profile. Created lazily on first access, never destroyed;
/// only subjects come and go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub subjects: BTreeMap<String, Subject>,
    /// Invariant: when set, the key exists in `subjects`.
    pub active_subject_key: Option<String>,
}
