//! DocumentStore — byte storage for uploaded study PDFs.
//!
//! Documents live under `{data_dir}/{user_id}/{subject_key}/{category}/{name}.pdf`.
//! The profile database is the source of truth for which subjects exist;
//! these trees are a derived effect kept in lockstep by the facade and are
//! never consulted to infer profile state.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use super::extract::TextExtractor;
use super::{extract, file_ops};
use crate::error::{StoreError, StoreResult};
use crate::models::DocumentCategory;

pub struct DocumentStore {
    data_dir: PathBuf,
}

impl DocumentStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn subject_dir(&self, user_id: &str, subject_key: &str) -> PathBuf {
        self.data_dir.join(user_id).join(subject_key)
    }

    fn category_dir(
        &self,
        user_id: &str,
        subject_key: &str,
        category: DocumentCategory,
    ) -> PathBuf {
        self.subject_dir(user_id, subject_key).join(category.dir_name())
    }

    /// Idempotently create both category directories for a subject.
    pub fn ensure_collection(&self, user_id: &str, subject_key: &str) -> StoreResult<()> {
        for category in DocumentCategory::ALL {
            std::fs::create_dir_all(self.category_dir(user_id, subject_key, category))?;
        }
        Ok(())
    }

    /// Store an uploaded file and return the document name it is kept under.
    ///
    /// Non-PDF filenames are rejected before anything touches disk.
    /// Re-uploading an existing name replaces the prior bytes wholesale.
    pub fn save_document(
        &self,
        user_id: &str,
        subject_key: &str,
        category: DocumentCategory,
        filename: &str,
        bytes: &[u8],
    ) -> StoreResult<String> {
        if !file_ops::is_pdf_filename(filename) {
            return Err(StoreError::RejectedFileType {
                filename: filename.to_string(),
            });
        }

        let name = file_ops::document_name(Path::new(filename)).ok_or_else(|| {
            StoreError::RejectedFileType {
                filename: filename.to_string(),
            }
        })?;

        let path = self
            .category_dir(user_id, subject_key, category)
            .join(format!("{}.pdf", name));
        file_ops::write_document(&path, bytes)?;

        log::info!(
            "[DOCS] Saved {} ({} bytes) under {}/{}/{}",
            name,
            bytes.len(),
            user_id,
            subject_key,
            category.dir_name()
        );
        Ok(name)
    }

    /// Document names in a category, sorted for stable enumeration.
    pub fn list_documents(
        &self,
        user_id: &str,
        subject_key: &str,
        category: DocumentCategory,
    ) -> StoreResult<Vec<String>> {
        let files = file_ops::list_pdfs(&self.category_dir(user_id, subject_key, category))?;
        Ok(files
            .iter()
            .filter_map(|p| file_ops::document_name(p))
            .collect())
    }

    /// Raw stored bytes of one document.
    pub fn get_document_bytes(
        &self,
        user_id: &str,
        subject_key: &str,
        category: DocumentCategory,
        name: &str,
    ) -> StoreResult<Vec<u8>> {
        let path = self
            .category_dir(user_id, subject_key, category)
            .join(format!("{}.pdf", name));

        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::DocumentNotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Recursively remove a subject's whole document tree.
    /// Safe to call when the tree does not exist.
    pub fn delete_collection_tree(&self, user_id: &str, subject_key: &str) -> StoreResult<()> {
        file_ops::remove_tree(&self.subject_dir(user_id, subject_key))?;
        log::info!("[DOCS] Purged document tree for {}/{}", user_id, subject_key);
        Ok(())
    }

    /// Extract annotated text for every document in a category, keyed by
    /// document name. A document the extractor cannot handle is logged and
    /// skipped; it never aborts extraction of the others.
    pub fn extract_all_text(
        &self,
        user_id: &str,
        subject_key: &str,
        category: DocumentCategory,
        extractor: &dyn TextExtractor,
    ) -> StoreResult<BTreeMap<String, String>> {
        let mut out = BTreeMap::new();

        for path in file_ops::list_pdfs(&self.category_dir(user_id, subject_key, category))? {
            let Some(name) = file_ops::document_name(&path) else {
                continue;
            };
            let bytes = std::fs::read(&path)?;
            match extractor.extract_text(&bytes) {
                Ok(text) => {
                    out.insert(name.clone(), extract::annotate(&name, &text));
                }
                Err(e) => {
                    log::warn!("[DOCS] Skipping {}: {}", name, e);
                }
            }
        }

        Ok(out)
    }
}
