//! Question bank operations.
//!
//! Display indices are 1-based; storage order is insertion order (rowid).
//! Duplicate question text is allowed.

use rusqlite::{Connection, params};

use super::super::Database;
use crate::error::{StoreError, StoreResult};

impl Database {
    /// Append a question to a subject's bank. Returns false when the subject
    /// does not exist (nothing is written then).
    pub fn add_question(
        &self,
        user_id: &str,
        subject_key: &str,
        question: &str,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();

        if !Self::subject_exists(&conn, user_id, subject_key)? {
            return Ok(false);
        }

        conn.execute(
            "INSERT INTO question_bank (user_id, subject_key, question) VALUES (?1, ?2, ?3)",
            params![user_id, subject_key, question],
        )?;
        Ok(true)
    }

    /// Questions in display order.
    pub fn list_questions(&self, user_id: &str, subject_key: &str) -> StoreResult<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        Self::load_questions(&conn, user_id, subject_key)
    }

    /// Remove the question at a 1-based display index. An out-of-range index
    /// (including any index on an empty bank) fails and changes nothing.
    pub fn remove_question(
        &self,
        user_id: &str,
        subject_key: &str,
        index: usize,
    ) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let ids = {
            let mut stmt = tx.prepare(
                "SELECT id FROM question_bank
                 WHERE user_id = ?1 AND subject_key = ?2 ORDER BY id",
            )?;
            stmt.query_map(params![user_id, subject_key], |row| row.get::<_, i64>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };

        if index == 0 || index > ids.len() {
            return Err(StoreError::QuestionIndexOutOfRange {
                index,
                len: ids.len(),
            });
        }

        tx.execute(
            "DELETE FROM question_bank WHERE id = ?1",
            [ids[index - 1]],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub(crate) fn load_questions(
        conn: &Connection,
        user_id: &str,
        subject_key: &str,
    ) -> StoreResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT question FROM question_bank
             WHERE user_id = ?1 AND subject_key = ?2 ORDER BY id",
        )?;
        let questions = stmt
            .query_map(params![user_id, subject_key], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_subject() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_subject("u1", "Biology", None).unwrap();
        db
    }

    #[test]
    fn test_add_and_list_preserves_order_and_duplicates() {
        let db = db_with_subject();

        assert!(db.add_question("u1", "biology", "What is ATP?").unwrap());
        assert!(db.add_question("u1", "biology", "Name the organelles").unwrap());
        assert!(db.add_question("u1", "biology", "What is ATP?").unwrap());

        let questions = db.list_questions("u1", "biology").unwrap();
        assert_eq!(
            questions,
            vec!["What is ATP?", "Name the organelles", "What is ATP?"]
        );
    }

    #[test]
    fn test_add_question_unknown_subject_returns_false() {
        let db = db_with_subject();
        assert!(!db.add_question("u1", "chemistry", "q").unwrap());
        assert!(db.list_questions("u1", "chemistry").unwrap().is_empty());
    }

    #[test]
    fn test_remove_question_is_one_based() {
        let db = db_with_subject();
        db.add_question("u1", "biology", "first").unwrap();
        db.add_question("u1", "biology", "second").unwrap();

        db.remove_question("u1", "biology", 1).unwrap();
        assert_eq!(db.list_questions("u1", "biology").unwrap(), vec!["second"]);
    }

    #[test]
    fn test_remove_question_out_of_range() {
        let db = db_with_subject();
        db.add_question("u1", "biology", "only").unwrap();

        let err = db.remove_question("u1", "biology", 2).unwrap_err();
        assert!(matches!(
            err,
            StoreError::QuestionIndexOutOfRange { index: 2, len: 1 }
        ));
        assert_eq!(db.list_questions("u1", "biology").unwrap().len(), 1);

        // Index 0 is never valid.
        let err = db.remove_question("u1", "biology", 0).unwrap_err();
        assert!(matches!(err, StoreError::QuestionIndexOutOfRange { .. }));
    }

    #[test]
    fn test_remove_question_empty_bank() {
        let db = db_with_subject();
        let err = db.remove_question("u1", "biology", 1).unwrap_err();
        assert!(matches!(
            err,
            StoreError::QuestionIndexOutOfRange { index: 1, len: 0 }
        ));
    }
}
