//! File operations for the document trees.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Whether an uploaded filename is an acceptable PDF upload.
pub fn is_pdf_filename(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    lower.len() > 4 && lower.ends_with(".pdf")
}

/// Document name for a stored file: the file stem without extension.
/// Any directory components in an uploaded filename are discarded.
pub fn document_name(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}

/// Write a document file (creates parent directories as needed)
pub fn write_document(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    Ok(())
}

/// List the PDF files directly inside a category directory, sorted by path
/// so enumeration order is stable. A missing directory yields an empty list.
pub fn list_pdfs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if !dir.exists() {
        return Ok(files);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file()
            && path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Recursively remove a directory tree. A missing tree is a no-op.
pub fn remove_tree(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_pdf_filename() {
        assert!(is_pdf_filename("notes.pdf"));
        assert!(is_pdf_filename("Lecture 3.PDF"));
        assert!(!is_pdf_filename("notes.txt"));
        assert!(!is_pdf_filename("notes"));
        assert!(!is_pdf_filename(".pdf"));
    }

    #[test]
    fn test_document_name_strips_extension_and_dirs() {
        assert_eq!(document_name(Path::new("cell.pdf")).unwrap(), "cell");
        assert_eq!(document_name(Path::new("../evil.pdf")).unwrap(), "evil");
        assert_eq!(document_name(Path::new("a/b/week 1.pdf")).unwrap(), "week 1");
    }

    #[test]
    fn test_write_and_list() {
        let dir = tempdir().unwrap();
        let docs = dir.path().join("lectures");

        write_document(&docs.join("b.pdf"), b"two").unwrap();
        write_document(&docs.join("a.pdf"), b"one").unwrap();
        write_document(&docs.join("skip.txt"), b"not a pdf").unwrap();

        let files = list_pdfs(&docs).unwrap();
        let names: Vec<_> = files.iter().filter_map(|p| document_name(p)).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        assert!(list_pdfs(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_remove_tree_missing_is_noop() {
        let dir = tempdir().unwrap();
        remove_tree(&dir.path().join("nope")).unwrap();

        let sub = dir.path().join("subject");
        write_document(&sub.join("lectures/a.pdf"), b"x").unwrap();
        remove_tree(&sub).unwrap();
        assert!(!sub.exists());
    }
}
