//! Subject lifecycle operations (create, list, delete, personalization).

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use super::super::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{DEFAULT_GAME, SubjectView, subject_key};

impl Database {
    /// Create a subject and return its derived key. The user's first subject
    /// becomes active automatically. A key collision fails with
    /// `SubjectExists` and writes nothing.
    pub fn create_subject(
        &self,
        user_id: &str,
        display_name: &str,
        game: Option<&str>,
    ) -> StoreResult<String> {
        let key = subject_key(display_name);
        let game = game.unwrap_or(DEFAULT_GAME);
        let now = Utc::now().to_rfc3339();

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::ensure_profile_row(&tx, user_id)?;

        if Self::subject_exists(&tx, user_id, &key)? {
            // Dropping the transaction rolls back the profile row if it was new.
            return Err(StoreError::SubjectExists {
                name: display_name.to_string(),
            });
        }

        tx.execute(
            "INSERT INTO subjects (user_id, subject_key, display_name, game, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, key, display_name, game, now],
        )?;
        tx.execute(
            "UPDATE profiles SET active_subject_key = ?1, updated_at = ?2
             WHERE user_id = ?3 AND active_subject_key IS NULL",
            params![key, now, user_id],
        )?;
        tx.commit()?;

        log::info!(
            "[PROFILE] Created subject '{}' ({}) for user {}",
            display_name,
            key,
            user_id
        );
        Ok(key)
    }

    /// All of a user's subjects in key order, with the active flag computed.
    pub fn list_subjects(&self, user_id: &str) -> StoreResult<Vec<SubjectView>> {
        let conn = self.conn.lock().unwrap();

        let active: Option<String> = conn
            .query_row(
                "SELECT active_subject_key FROM profiles WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        let mut stmt = conn.prepare(
            "SELECT subject_key, display_name, game
             FROM subjects WHERE user_id = ?1 ORDER BY subject_key",
        )?;
        let views = stmt
            .query_map([user_id], |row| {
                let key: String = row.get(0)?;
                Ok(SubjectView {
                    active: active.as_deref() == Some(key.as_str()),
                    key,
                    display_name: row.get(1)?,
                    game: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(views)
    }

    /// Update the mnemonic-game string for one subject.
    pub fn set_game(&self, user_id: &str, subject_key: &str, game: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let affected = conn.execute(
            "UPDATE subjects SET game = ?1 WHERE user_id = ?2 AND subject_key = ?3",
            params![game, user_id, subject_key],
        )?;
        if affected == 0 {
            return Err(StoreError::SubjectNotFound {
                name: subject_key.to_string(),
            });
        }
        Ok(())
    }

    /// Delete a subject (metadata and question bank) and return its key so
    /// the caller can purge the document tree. When the deleted subject was
    /// active, the lowest remaining key becomes active; none if none remain.
    pub fn delete_subject(&self, user_id: &str, display_name: &str) -> StoreResult<String> {
        let key = subject_key(display_name);
        let now = Utc::now().to_rfc3339();

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let affected = tx.execute(
            "DELETE FROM subjects WHERE user_id = ?1 AND subject_key = ?2",
            params![user_id, key],
        )?;
        if affected == 0 {
            return Err(StoreError::SubjectNotFound {
                name: display_name.to_string(),
            });
        }

        tx.execute(
            "DELETE FROM question_bank WHERE user_id = ?1 AND subject_key = ?2",
            params![user_id, key],
        )?;

        let active: Option<String> = tx
            .query_row(
                "SELECT active_subject_key FROM profiles WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        if active.as_deref() == Some(key.as_str()) {
            let next: Option<String> = tx
                .query_row(
                    "SELECT subject_key FROM subjects WHERE user_id = ?1
                     ORDER BY subject_key LIMIT 1",
                    [user_id],
                    |row| row.get(0),
                )
                .optional()?;
            tx.execute(
                "UPDATE profiles SET active_subject_key = ?1, updated_at = ?2 WHERE user_id = ?3",
                params![next, now, user_id],
            )?;
        }

        tx.commit()?;

        log::info!("[PROFILE] Deleted subject {} for user {}", key, user_id);
        Ok(key)
    }

    pub(crate) fn subject_exists(
        conn: &Connection,
        user_id: &str,
        subject_key: &str,
    ) -> rusqlite::Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM subjects WHERE user_id = ?1 AND subject_key = ?2",
            params![user_id, subject_key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
