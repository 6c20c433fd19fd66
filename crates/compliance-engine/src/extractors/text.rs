// Flattening of document paragraphs into search buffers
use shared_docx::DocxDocument;

/// Separator between paragraphs in the scan buffer
pub const SCAN_SEPARATOR: &str = "\n";

/// Separator between paragraphs in the classification buffer. Keywords may span a
/// paragraph boundary here, which they cannot in the scan buffer.
pub const CLASSIFY_SEPARATOR: &str = " ";

/// Lowercased paragraph texts joined with `separator`
pub fn flatten_lowercase(document: &DocxDocument, separator: &str) -> String {
    document
        .paragraphs()
        .iter()
        .map(|p| p.text.to_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Buffer the clause scanner searches
pub fn scan_text(document: &DocxDocument) -> String {
    flatten_lowercase(document, SCAN_SEPARATOR)
}

/// Buffer the document classifier searches
pub fn classification_text(document: &DocxDocument) -> String {
    flatten_lowercase(document, CLASSIFY_SEPARATOR)
}
