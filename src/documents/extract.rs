//! Text-extraction seam and source annotation.
//!
//! Turning PDF bytes into text is an external capability; the store only
//! defines the trait and the citation header layered on top of it.

use crate::error::ExtractionError;

/// External capability turning raw document bytes into text.
///
/// Implementations should return best-effort partial text for malformed
/// input where they can; a hard failure is reported per document and never
/// aborts aggregate extraction.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

impl<F> TextExtractor for F
where
    F: Fn(&[u8]) -> Result<String, ExtractionError> + Send + Sync,
{
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        self(bytes)
    }
}

/// Prefix extracted text with a citation header naming its source document,
/// so generated lessons and tests can cite where material came from.
pub fn annotate(name: &str, text: &str) -> String {
    format!("[SOURCE: {}]\n{}", name, text)
}
