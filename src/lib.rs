//! # cre-copilot
//!
//! A memo-generation pipeline for commercial-real-estate change
//! requests: uploaded documents in, a cleaned change memo and a
//! downloadable Word document out.
//!
//! ## Features
//!
//! - Heterogeneous document ingestion (text, Word, Excel, CSV) with
//!   explicit placeholders for unsupported types
//! - Templated prompt assembly for an OpenAI-compatible completion
//!   service, with classified error reporting
//! - Deterministic post-processing of the returned memo text
//! - Word-document export and optional DSCR chart derivation
//!
//! ## Quick Start
//!
//! ```no_run
//! use cre_copilot::{Config, MemoKind, MemoSession, Pipeline, UploadedDocument};
//!
//! # fn main() -> cre_copilot::Result<()> {
//! let config = Config::builder()
//!     .model("gpt-4")
//!     .api_key("sk-...")
//!     .chart_enabled(true)
//!     .build()?;
//!
//! let docs = vec![UploadedDocument::new(
//!     "lp_memo.txt",
//!     "text/plain",
//!     std::fs::read("lp_memo.txt").unwrap(),
//! )];
//!
//! let pipeline = Pipeline::new(config)?;
//! let mut session = MemoSession::new();
//! let outcome = pipeline.generate(
//!     MemoKind::NonMaterial,
//!     &docs,
//!     "Update the net worth figures.",
//!     &mut session,
//! )?;
//!
//! if let Some(memo) = outcome.memo() {
//!     println!("{}", memo.text);
//!     std::fs::write("Non_Material_Change_Memo.docx", &memo.document).unwrap();
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Control flows strictly forward through four stages per user action:
//! 1. **Ingestion**: extracts each upload into one ordered text buffer
//! 2. **Assembly**: merges the buffer, user instructions, and template
//! 3. **Completion**: the one blocking external call, with a timeout
//! 4. **Post-processing**: cleans the response, exports the document,
//!    and optionally derives the DSCR chart

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod chart;
mod clean;
mod completion;
mod config;
mod document;
mod docx;
mod error;
mod extract;
mod pipeline;
mod prompt;
mod session;
mod table;

pub use chart::{DscrChart, SeriesPoint, derive_chart};
pub use clean::{FINANCIAL_MARKER, clean_text};
pub use completion::{ChatMessage, CompletionRequest, CompletionService, OpenAiClient};
pub use config::{API_KEY_ENV, Config, ConfigBuilder, MemoSection};
pub use document::{DocumentKind, UploadedDocument};
pub use error::{Error, Result};
pub use extract::{
    Disposition, ExtractedContent, FileReport, PDF_PLACEHOLDER, UNSUPPORTED_PLACEHOLDER,
    extract_all,
};
pub use pipeline::{
    GeneratedMemo, MATERIAL_NOT_AVAILABLE, MemoKind, MemoOutcome, MemoStats, Pipeline,
};
pub use prompt::MemoRequest;
pub use session::MemoSession;
pub use table::Table;

/// Generates a non-material change memo with a fresh session.
///
/// This is the main entry point for one-shot use; construct a
/// [`Pipeline`] directly to reuse a session across actions.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid or no API credential is available
/// - Prompt assembly fails
/// - The completion service fails (classified per [`Error::user_message`])
/// - The export document cannot be written
pub fn generate_non_material(
    config: Config,
    documents: &[UploadedDocument],
    instructions: &str,
) -> Result<MemoOutcome> {
    let pipeline = Pipeline::new(config)?;
    let mut session = MemoSession::new();
    pipeline.generate(MemoKind::NonMaterial, documents, instructions, &mut session)
}
