//! StudyStore — the facade composing the profile database and document store.
//!
//! Command handlers call these operations 1:1; the text-generation
//! collaborator uses the read-only aggregates (`get_study_materials`,
//! `get_question_bank`, `get_active_subject_game`) to build prompts and
//! never mutates state. The facade keeps subject metadata and document
//! trees in lockstep and fails with `NoActiveSubject` where an operation
//! is meaningless without one.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::db::Database;
use crate::documents::{DocumentStore, TextExtractor};
use crate::error::{StoreError, StoreResult};
use crate::models::{DEFAULT_GAME, DocumentCategory, SubjectView, UserProfile};

/// Annotated study materials for the active subject, keyed by document name.
#[derive(Debug, Default, Serialize)]
pub struct StudyMaterials {
    pub lectures: BTreeMap<String, String>,
    pub practice_tests: BTreeMap<String, String>,
}

/// Summary of the active subject shown by the dispatch layer.
#[derive(Debug, Serialize)]
pub struct SubjectOverview {
    pub subject: SubjectView,
    pub lecture_count: usize,
    pub practice_test_count: usize,
    pub question_count: usize,
}

pub struct StudyStore {
    db: Arc<Database>,
    docs: DocumentStore,
    /// Per-user mutual exclusion for compound (profile + filesystem)
    /// mutations, so folder state and metadata are never observed out of
    /// lockstep and same-name document writes are serialized.
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl StudyStore {
    pub fn new(db: Arc<Database>, docs: DocumentStore) -> Self {
        Self {
            db,
            docs,
            user_locks: DashMap::new(),
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn require_active(&self, user_id: &str) -> StoreResult<SubjectView> {
        self.db
            .get_active_subject(user_id)?
            .ok_or(StoreError::NoActiveSubject)
    }

    // ---- Subject lifecycle ----

    pub fn get_or_create_profile(&self, user_id: &str) -> StoreResult<UserProfile> {
        self.db.get_or_create_profile(user_id)
    }

    /// Create a subject: document folders first, metadata second, so a
    /// folder-creation failure never commits a subject with missing storage.
    pub fn create_subject(
        &self,
        user_id: &str,
        display_name: &str,
        game: Option<&str>,
    ) -> StoreResult<String> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock();

        let key = crate::models::subject_key(display_name);
        self.docs.ensure_collection(user_id, &key)?;
        self.db.create_subject(user_id, display_name, game)
    }

    /// Delete a subject's metadata and purge its document tree.
    pub fn delete_subject(&self, user_id: &str, display_name: &str) -> StoreResult<()> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock();

        let key = self.db.delete_subject(user_id, display_name)?;
        self.docs.delete_collection_tree(user_id, &key)
    }

    pub fn set_active_subject(&self, user_id: &str, display_name: &str) -> StoreResult<()> {
        self.db.set_active_subject(user_id, display_name)
    }

    pub fn get_active_subject(&self, user_id: &str) -> StoreResult<Option<SubjectView>> {
        self.db.get_active_subject(user_id)
    }

    pub fn list_subjects(&self, user_id: &str) -> StoreResult<Vec<SubjectView>> {
        self.db.list_subjects(user_id)
    }

    /// Set the mnemonic game for the active subject.
    pub fn set_game(&self, user_id: &str, game: &str) -> StoreResult<()> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock();

        let subject = self.require_active(user_id)?;
        self.db.set_game(user_id, &subject.key, game)
    }

    // ---- Documents (active subject) ----

    /// Store an uploaded file in one of the active subject's collections.
    pub fn upload_document(
        &self,
        user_id: &str,
        category: DocumentCategory,
        filename: &str,
        bytes: &[u8],
    ) -> StoreResult<String> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock();

        let subject = self.require_active(user_id)?;
        self.docs
            .save_document(user_id, &subject.key, category, filename, bytes)
    }

    pub fn list_documents(
        &self,
        user_id: &str,
        category: DocumentCategory,
    ) -> StoreResult<Vec<String>> {
        let subject = self.require_active(user_id)?;
        self.docs.list_documents(user_id, &subject.key, category)
    }

    pub fn get_document_bytes(
        &self,
        user_id: &str,
        category: DocumentCategory,
        name: &str,
    ) -> StoreResult<Vec<u8>> {
        let subject = self.require_active(user_id)?;
        self.docs
            .get_document_bytes(user_id, &subject.key, category, name)
    }

    // ---- Question bank (active subject) ----

    /// Append a question; returns the new bank size.
    pub fn add_question(&self, user_id: &str, question: &str) -> StoreResult<usize> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock();

        let subject = self.require_active(user_id)?;
        if !self.db.add_question(user_id, &subject.key, question)? {
            // Active pointer always references an existing subject; a miss
            // here means the subject vanished between the two calls.
            return Err(StoreError::SubjectNotFound { name: subject.key });
        }
        Ok(self.db.list_questions(user_id, &subject.key)?.len())
    }

    /// Remove a question by 1-based display index.
    pub fn remove_question(&self, user_id: &str, index: usize) -> StoreResult<()> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock();

        let subject = self.require_active(user_id)?;
        self.db.remove_question(user_id, &subject.key, index)
    }

    pub fn get_question_bank(&self, user_id: &str) -> StoreResult<Vec<String>> {
        let subject = self.require_active(user_id)?;
        self.db.list_questions(user_id, &subject.key)
    }

    // ---- Read aggregates for the text-generation collaborator ----

    /// Annotated lecture and practice-test text for the active subject.
    pub fn get_study_materials(
        &self,
        user_id: &str,
        extractor: &dyn TextExtractor,
    ) -> StoreResult<StudyMaterials> {
        let subject = self.require_active(user_id)?;
        Ok(StudyMaterials {
            lectures: self.docs.extract_all_text(
                user_id,
                &subject.key,
                DocumentCategory::Lectures,
                extractor,
            )?,
            practice_tests: self.docs.extract_all_text(
                user_id,
                &subject.key,
                DocumentCategory::PracticeTests,
                extractor,
            )?,
        })
    }

    /// Mnemonic game for the active subject; falls back to the default
    /// placeholder when no subject is active (never errors).
    pub fn get_active_subject_game(&self, user_id: &str) -> StoreResult<String> {
        Ok(self
            .db
            .get_active_subject(user_id)?
            .map(|s| s.game)
            .unwrap_or_else(|| DEFAULT_GAME.to_string()))
    }

    /// Counts-and-settings summary of the active subject.
    pub fn subject_overview(&self, user_id: &str) -> StoreResult<SubjectOverview> {
        let subject = self.require_active(user_id)?;
        let lectures =
            self.docs
                .list_documents(user_id, &subject.key, DocumentCategory::Lectures)?;
        let practice_tests =
            self.docs
                .list_documents(user_id, &subject.key, DocumentCategory::PracticeTests)?;
        let questions = self.db.list_questions(user_id, &subject.key)?;

        Ok(SubjectOverview {
            lecture_count: lectures.len(),
            practice_test_count: practice_tests.len(),
            question_count: questions.len(),
            subject,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use std::thread;
    use tempfile::{TempDir, tempdir};

    fn new_store() -> (TempDir, Arc<StudyStore>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("profiles.db")).unwrap();
        let docs = DocumentStore::new(dir.path().join("user_data"));
        (dir, Arc::new(StudyStore::new(Arc::new(db), docs)))
    }

    fn utf8_extractor(bytes: &[u8]) -> Result<String, ExtractionError> {
        std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|e| ExtractionError(e.to_string()))
    }

    #[test]
    fn test_create_subject_makes_folders_and_activates() {
        let (dir, store) = new_store();

        let key = store.create_subject("u1", "Pokemon Biology", None).unwrap();
        assert_eq!(key, "pokemon_biology");

        let active = store.get_active_subject("u1").unwrap().unwrap();
        assert_eq!(active.key, "pokemon_biology");

        let subject_dir = dir.path().join("user_data/u1/pokemon_biology");
        assert!(subject_dir.join("lectures").is_dir());
        assert!(subject_dir.join("practice_tests").is_dir());
    }

    #[test]
    fn test_operations_without_active_subject_fail_explicitly() {
        let (_dir, store) = new_store();

        let err = store
            .upload_document("u1", DocumentCategory::Lectures, "cell.pdf", b"x")
            .unwrap_err();
        assert!(matches!(err, StoreError::NoActiveSubject));

        assert!(matches!(
            store.list_documents("u1", DocumentCategory::Lectures),
            Err(StoreError::NoActiveSubject)
        ));
        assert!(matches!(
            store.add_question("u1", "q"),
            Err(StoreError::NoActiveSubject)
        ));
        assert!(matches!(
            store.get_question_bank("u1"),
            Err(StoreError::NoActiveSubject)
        ));
        assert!(matches!(
            store.get_study_materials("u1", &utf8_extractor),
            Err(StoreError::NoActiveSubject)
        ));

        // The game query is the one soft fallback.
        assert_eq!(store.get_active_subject_game("u1").unwrap(), DEFAULT_GAME);
    }

    #[test]
    fn test_delete_subject_purges_tree_and_reassigns() {
        let (dir, store) = new_store();

        store.create_subject("u1", "Physics", None).unwrap();
        store.create_subject("u1", "Biology", None).unwrap();
        store
            .upload_document("u1", DocumentCategory::Lectures, "waves.pdf", b"w")
            .unwrap();

        store.delete_subject("u1", "Physics").unwrap();

        assert!(!dir.path().join("user_data/u1/physics").exists());
        assert_eq!(store.get_active_subject("u1").unwrap().unwrap().key, "biology");

        store.delete_subject("u1", "Biology").unwrap();
        assert!(store.get_active_subject("u1").unwrap().is_none());
        assert_eq!(store.get_active_subject_game("u1").unwrap(), DEFAULT_GAME);
    }

    #[test]
    fn test_upload_and_question_flow() {
        let (_dir, store) = new_store();
        store.create_subject("u1", "Biology", None).unwrap();

        let err = store
            .upload_document("u1", DocumentCategory::Lectures, "notes.txt", b"x")
            .unwrap_err();
        assert!(matches!(err, StoreError::RejectedFileType { .. }));

        store
            .upload_document("u1", DocumentCategory::Lectures, "notes.pdf", b"v1")
            .unwrap();
        assert_eq!(
            store.list_documents("u1", DocumentCategory::Lectures).unwrap(),
            vec!["notes"]
        );

        // Replace wholesale on same name.
        store
            .upload_document("u1", DocumentCategory::Lectures, "notes.pdf", b"v2")
            .unwrap();
        assert_eq!(
            store
                .get_document_bytes("u1", DocumentCategory::Lectures, "notes")
                .unwrap(),
            b"v2"
        );

        assert_eq!(store.add_question("u1", "What is ATP?").unwrap(), 1);
        assert_eq!(store.add_question("u1", "Define osmosis").unwrap(), 2);
        store.remove_question("u1", 1).unwrap();
        assert_eq!(store.get_question_bank("u1").unwrap(), vec!["Define osmosis"]);

        let overview = store.subject_overview("u1").unwrap();
        assert_eq!(overview.subject.key, "biology");
        assert_eq!(overview.lecture_count, 1);
        assert_eq!(overview.practice_test_count, 0);
        assert_eq!(overview.question_count, 1);
    }

    #[test]
    fn test_switching_subjects_scopes_documents() {
        let (_dir, store) = new_store();

        store.create_subject("u1", "Biology", None).unwrap();
        store
            .upload_document("u1", DocumentCategory::Lectures, "cell.pdf", b"bio")
            .unwrap();

        store.create_subject("u1", "History", None).unwrap();
        store.set_active_subject("u1", "History").unwrap();
        assert!(
            store
                .list_documents("u1", DocumentCategory::Lectures)
                .unwrap()
                .is_empty()
        );

        store.set_active_subject("u1", "biology").unwrap();
        assert_eq!(
            store.list_documents("u1", DocumentCategory::Lectures).unwrap(),
            vec!["cell"]
        );
    }

    #[test]
    fn test_profiles_persist_across_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("profiles.db");

        {
            let db = Database::open(&db_path).unwrap();
            let store = StudyStore::new(
                Arc::new(db),
                DocumentStore::new(dir.path().join("user_data")),
            );
            store.create_subject("u1", "Biology", Some("Pokemon")).unwrap();
            store.add_question("u1", "What is ATP?").unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        let store = StudyStore::new(
            Arc::new(db),
            DocumentStore::new(dir.path().join("user_data")),
        );

        let active = store.get_active_subject("u1").unwrap().unwrap();
        assert_eq!(active.key, "biology");
        assert_eq!(active.game, "Pokemon");
        assert_eq!(store.get_question_bank("u1").unwrap(), vec!["What is ATP?"]);
    }

    #[test]
    fn test_concurrent_distinct_creates_both_succeed() {
        let (_dir, store) = new_store();

        let handles: Vec<_> = ["Biology", "Chemistry"]
            .into_iter()
            .map(|name| {
                let store = store.clone();
                thread::spawn(move || store.create_subject("u1", name, None))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let keys: Vec<_> = store
            .list_subjects("u1")
            .unwrap()
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["biology", "chemistry"]);
    }

    #[test]
    fn test_concurrent_identical_creates_one_winner() {
        let (_dir, store) = new_store();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || store.create_subject("u1", "Biology", None))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(StoreError::SubjectExists { .. })))
        );
        assert_eq!(store.list_subjects("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_questions_no_lost_updates() {
        let (_dir, store) = new_store();
        store.create_subject("u1", "Biology", None).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || store.add_question("u1", &format!("question {}", i)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(store.get_question_bank("u1").unwrap().len(), 8);
    }

    #[test]
    fn test_end_to_end_study_materials() {
        let (_dir, store) = new_store();

        store
            .create_subject("u1", "Pokemon Biology", Some("Pokemon"))
            .unwrap();
        store
            .upload_document(
                "u1",
                DocumentCategory::Lectures,
                "cell.pdf",
                b"The cell is the basic unit of life.",
            )
            .unwrap();

        let materials = store.get_study_materials("u1", &utf8_extractor).unwrap();
        let cell = &materials.lectures["cell"];
        assert!(cell.starts_with("[SOURCE: cell]\n"));
        assert!(cell.contains("basic unit of life"));
        assert!(materials.practice_tests.is_empty());

        assert_eq!(store.get_active_subject_game("u1").unwrap(), "Pokemon");
    }
}
