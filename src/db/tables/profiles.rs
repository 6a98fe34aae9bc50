//! Profile row operations (lazy creation, active-subject pointer).

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeMap;

use super::super::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{Subject, SubjectView, UserProfile, subject_key};

impl Database {
    /// Get a user's profile, creating and persisting an empty one on first
    /// access. Profiles are never destroyed; only subjects are.
    pub fn get_or_create_profile(&self, user_id: &str) -> StoreResult<UserProfile> {
        let conn = self.conn.lock().unwrap();
        Self::ensure_profile_row(&conn, user_id)?;
        Self::load_profile(&conn, user_id)
    }

    /// Resolve a display name to its key and make that subject active.
    pub fn set_active_subject(&self, user_id: &str, display_name: &str) -> StoreResult<()> {
        let key = subject_key(display_name);
        let now = Utc::now().to_rfc3339();

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::ensure_profile_row(&tx, user_id)?;

        if !Self::subject_exists(&tx, user_id, &key)? {
            return Err(StoreError::SubjectNotFound {
                name: display_name.to_string(),
            });
        }

        tx.execute(
            "UPDATE profiles SET active_subject_key = ?1, updated_at = ?2 WHERE user_id = ?3",
            params![key, now, user_id],
        )?;
        tx.commit()?;

        log::info!("[PROFILE] User {} switched to subject {}", user_id, key);
        Ok(())
    }

    /// View of the user's active subject, or None when nothing is active.
    pub fn get_active_subject(&self, user_id: &str) -> StoreResult<Option<SubjectView>> {
        let conn = self.conn.lock().unwrap();

        let view = conn
            .query_row(
                "SELECT s.subject_key, s.display_name, s.game
                 FROM profiles p
                 JOIN subjects s
                   ON s.user_id = p.user_id AND s.subject_key = p.active_subject_key
                 WHERE p.user_id = ?1",
                [user_id],
                |row| {
                    Ok(SubjectView {
                        key: row.get(0)?,
                        display_name: row.get(1)?,
                        game: row.get(2)?,
                        active: true,
                    })
                },
            )
            .optional()?;

        Ok(view)
    }

    /// Insert the profile row if this user has never been seen before.
    pub(crate) fn ensure_profile_row(conn: &Connection, user_id: &str) -> rusqlite::Result<()> {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT OR IGNORE INTO profiles (user_id, active_subject_key, created_at, updated_at)
             VALUES (?1, NULL, ?2, ?2)",
            params![user_id, now],
        )?;
        Ok(())
    }

    pub(crate) fn load_profile(conn: &Connection, user_id: &str) -> StoreResult<UserProfile> {
        let active_subject_key: Option<String> = conn.query_row(
            "SELECT active_subject_key FROM profiles WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT subject_key, display_name, game, created_at
             FROM subjects WHERE user_id = ?1 ORDER BY subject_key",
        )?;
        let rows = stmt.query_map([user_id], |row| {
            let created_at_str: String = row.get(3)?;
            // A tampered timestamp column is corrupt persisted data; report
            // it as a conversion failure rather than panicking mid-load.
            let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&chrono::Utc);
            Ok(Subject {
                key: row.get(0)?,
                display_name: row.get(1)?,
                game: row.get(2)?,
                question_bank: Vec::new(),
                created_at,
            })
        })?;

        let mut subjects = BTreeMap::new();
        for row in rows {
            let mut subject = row?;
            subject.question_bank = Self::load_questions(conn, user_id, &subject.key)?;
            subjects.insert(subject.key.clone(), subject);
        }

        Ok(UserProfile {
            user_id: user_id.to_string(),
            subjects,
            active_subject_key,
        })
    }
}
