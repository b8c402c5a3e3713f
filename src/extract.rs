use crate::docx;
use crate::document::{DocumentKind, UploadedDocument};
use crate::error::Result;
use crate::table::Table;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Placeholder line emitted for PDF uploads. PDF text extraction is not
/// implemented; the sentinel keeps the file visible in the buffer
/// instead of dropping it silently.
pub const PDF_PLACEHOLDER: &str = "PDF content parsing needed here";

/// Placeholder line emitted for unsupported or unreadable uploads.
pub const UNSUPPORTED_PLACEHOLDER: &str = "Unsupported file type.";

/// How a single upload ended up in the extraction buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The file's text was extracted and appended
    Extracted,
    /// A placeholder line was appended instead
    Placeholder {
        /// Why the file degraded to a placeholder
        reason: String,
    },
}

/// Per-file ingestion record, in upload order.
///
/// A display layer can echo names from this list before or while
/// processing, independent of extraction success.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Filename as uploaded
    pub name: String,

    /// Resolved document kind
    pub kind: DocumentKind,

    /// Outcome for this file
    pub disposition: Disposition,
}

impl FileReport {
    /// Returns true if this file degraded to a placeholder line.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self.disposition, Disposition::Placeholder { .. })
    }
}

/// The accumulated extraction buffer for one request.
///
/// Concatenation order always equals upload order, and every upload
/// contributes something: extracted text or an explicit placeholder.
#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    /// Concatenated extracted text, newline-terminated per file
    pub text: String,

    /// One report per upload, in upload order
    pub reports: Vec<FileReport>,
}

impl ExtractedContent {
    /// Number of files that degraded to placeholder lines.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.reports.iter().filter(|r| r.is_placeholder()).count()
    }

    /// Returns true if nothing was ingested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Extracts every upload into one ordered buffer.
///
/// Kinds absent from `enabled_kinds` are treated like unsupported types.
/// Extraction failure for one file never aborts the batch: the file
/// degrades to a placeholder line and processing continues.
#[must_use]
pub fn extract_all(
    documents: &[UploadedDocument],
    enabled_kinds: &HashSet<DocumentKind>,
) -> ExtractedContent {
    let mut content = ExtractedContent::default();

    for doc in documents {
        debug!(name = %doc.name, kind = doc.kind.label(), "ingesting upload");

        let (text, disposition) = if enabled_kinds.contains(&doc.kind) {
            match extract_one(doc) {
                Ok(Extraction::Text(text)) => (text, Disposition::Extracted),
                Ok(Extraction::Placeholder(line)) => (
                    format!("{line}\n"),
                    Disposition::Placeholder {
                        reason: line.to_string(),
                    },
                ),
                Err(e) => {
                    warn!(name = %doc.name, error = %e, "extraction failed, degrading to placeholder");
                    (
                        format!("{UNSUPPORTED_PLACEHOLDER}\n"),
                        Disposition::Placeholder {
                            reason: e.to_string(),
                        },
                    )
                }
            }
        } else {
            (
                format!("{UNSUPPORTED_PLACEHOLDER}\n"),
                Disposition::Placeholder {
                    reason: format!("{} uploads are disabled", doc.kind.label()),
                },
            )
        };

        content.text.push_str(&text);
        content.reports.push(FileReport {
            name: doc.name.clone(),
            kind: doc.kind,
            disposition,
        });
    }

    content
}

enum Extraction {
    Text(String),
    Placeholder(&'static str),
}

/// Extracts one upload according to its kind. Every successful text
/// extraction is newline-terminated.
fn extract_one(doc: &UploadedDocument) -> Result<Extraction> {
    match doc.kind {
        DocumentKind::Text => {
            let text = String::from_utf8(doc.bytes.clone()).map_err(|_| {
                crate::error::Error::extraction(&doc.name, "content is not valid UTF-8")
            })?;
            Ok(Extraction::Text(format!("{text}\n")))
        }
        DocumentKind::Word => {
            let paragraphs = docx::read_paragraphs(&doc.name, &doc.bytes)?;
            let mut text = String::new();
            for paragraph in paragraphs {
                text.push_str(&paragraph);
                text.push('\n');
            }
            Ok(Extraction::Text(text))
        }
        DocumentKind::Spreadsheet => {
            let table = Table::from_xlsx_bytes(&doc.name, &doc.bytes)?;
            Ok(Extraction::Text(table.to_text()))
        }
        DocumentKind::Csv => {
            let table = Table::from_csv_bytes(&doc.name, &doc.bytes)?;
            Ok(Extraction::Text(table.to_text()))
        }
        DocumentKind::Pdf => Ok(Extraction::Placeholder(PDF_PLACEHOLDER)),
        DocumentKind::Other => Ok(Extraction::Placeholder(UNSUPPORTED_PLACEHOLDER)),
    }
}
