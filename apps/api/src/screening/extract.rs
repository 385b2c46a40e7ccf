use thiserror::Error;

/// Document-to-text extraction failed: the input was not a readable PDF.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ExtractionError(pub String);

/// Converts an uploaded document into best-effort plain text.
///
/// Extraction quality is the collaborator's problem; empty text is a valid
/// outcome and must flow through screening without special-casing.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, document: &[u8]) -> Result<String, ExtractionError>;
}

/// Production extractor over the `pdf_extract` crate.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, document: &[u8]) -> Result<String, ExtractionError> {
        pdf_extract::extract_text_from_mem(document).map_err(|e| ExtractionError(e.to_string()))
    }
}
