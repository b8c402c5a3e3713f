use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Logical document category, dispatched on the declared MIME type.
///
/// The upload boundary accepts `.txt .md .pdf .xlsx .docx .csv`, but
/// categorization is driven by the MIME type the uploader declared,
/// never by the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Plain text or markdown
    Text,
    /// Word-processing document (.docx)
    Word,
    /// Spreadsheet workbook (.xlsx)
    Spreadsheet,
    /// Delimited text (.csv)
    Csv,
    /// PDF document (extraction not implemented)
    Pdf,
    /// Anything else
    Other,
}

static MIME_KINDS: Lazy<HashMap<&'static str, DocumentKind>> = Lazy::new(|| {
    [
        ("text/plain", DocumentKind::Text),
        ("text/markdown", DocumentKind::Text),
        (
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            DocumentKind::Word,
        ),
        (
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            DocumentKind::Spreadsheet,
        ),
        ("text/csv", DocumentKind::Csv),
        ("application/csv", DocumentKind::Csv),
        ("application/pdf", DocumentKind::Pdf),
    ]
    .into_iter()
    .collect()
});

impl DocumentKind {
    /// Resolves a declared MIME type to a document kind.
    ///
    /// Unknown types map to [`DocumentKind::Other`]; matching ignores
    /// surrounding whitespace and any `;charset=...` parameter.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or("").trim();
        MIME_KINDS.get(essence).copied().unwrap_or(Self::Other)
    }

    /// Returns a short human-readable label for log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Word => "word",
            Self::Spreadsheet => "spreadsheet",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
            Self::Other => "other",
        }
    }
}

/// A single uploaded file, immutable for the lifetime of the request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Filename as supplied by the uploader
    pub name: String,

    /// Resolved document kind
    pub kind: DocumentKind,

    /// Raw file bytes
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Creates an uploaded document from a declared MIME type.
    #[must_use]
    pub fn new(name: impl Into<String>, mime: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: DocumentKind::from_mime(mime),
            bytes,
        }
    }

    /// Creates an uploaded document with an already-resolved kind.
    #[must_use]
    pub fn with_kind(name: impl Into<String>, kind: DocumentKind, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind,
            bytes,
        }
    }

    /// Returns the size of the upload in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Returns true if this upload is a spreadsheet workbook.
    #[must_use]
    pub const fn is_spreadsheet(&self) -> bool {
        matches!(self.kind, DocumentKind::Spreadsheet)
    }
}
