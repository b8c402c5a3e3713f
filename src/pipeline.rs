use crate::chart::{DscrChart, derive_chart};
use crate::clean::clean_text;
use crate::completion::{ChatMessage, CompletionRequest, CompletionService, OpenAiClient};
use crate::config::Config;
use crate::document::UploadedDocument;
use crate::docx;
use crate::error::Result;
use crate::extract::{FileReport, extract_all};
use crate::prompt::{MemoRequest, PromptAssembler};
use crate::session::MemoSession;
use crate::table::Table;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Message reported for the unimplemented material-change path.
pub const MATERIAL_NOT_AVAILABLE: &str =
    "Material Change Memo generation is not yet available.";

/// Memo category requested by the user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoKind {
    /// Non-material change memo (implemented)
    NonMaterial,
    /// Material change memo (not yet available)
    Material,
}

/// Statistics collected during one generation action.
#[derive(Debug, Clone, Serialize)]
pub struct MemoStats {
    /// Number of files ingested
    pub files_ingested: usize,

    /// Number of files that degraded to placeholder lines
    pub placeholders: usize,

    /// Length of the assembled prompt payload in characters
    pub prompt_chars: usize,

    /// Length of the cleaned memo in characters
    pub memo_chars: usize,

    /// Time spent extracting uploads
    pub ingest_duration: Duration,

    /// Time spent in the completion call
    pub completion_duration: Duration,

    /// Total execution time
    pub duration: Duration,
}

/// A successfully generated memo with its export artifact.
#[derive(Debug, Clone)]
pub struct GeneratedMemo {
    /// Cleaned memo text for on-screen display
    pub text: String,

    /// Downloadable Word document bytes
    pub document: Vec<u8>,

    /// Derived DSCR chart, when enabled and derivable
    pub chart: Option<DscrChart>,

    /// User-facing chart failure, when derivation was attempted and failed.
    /// Chart failure never aborts memo generation.
    pub chart_error: Option<String>,

    /// Per-file ingestion reports, in upload order
    pub reports: Vec<FileReport>,

    /// Execution statistics
    pub stats: MemoStats,
}

/// Outcome of one user-triggered generation action.
#[derive(Debug, Clone)]
pub enum MemoOutcome {
    /// A memo was generated
    Generated(GeneratedMemo),

    /// The requested memo category is not implemented; not an error
    NotAvailable {
        /// Message to show the user
        message: String,
    },
}

impl MemoOutcome {
    /// Returns the generated memo, if this outcome carries one.
    #[must_use]
    pub fn memo(&self) -> Option<&GeneratedMemo> {
        match self {
            Self::Generated(memo) => Some(memo),
            Self::NotAvailable { .. } => None,
        }
    }
}

/// Orchestrates ingestion, prompt assembly, the completion call,
/// post-processing, export, and optional chart derivation.
///
/// Each generation action is independent and idempotent given identical
/// inputs and an idempotent completion service; the pipeline holds no
/// mutable state between actions.
pub struct Pipeline {
    config: Config,
    assembler: PromptAssembler,
    client: Box<dyn CompletionService>,
}

impl Pipeline {
    /// Creates a pipeline backed by the OpenAI-compatible client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or no API
    /// credential is available.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = Box::new(OpenAiClient::new(&config)?);
        Self::with_client(config, client)
    }

    /// Creates a pipeline with an injected completion service.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_client(config: Config, client: Box<dyn CompletionService>) -> Result<Self> {
        config.validate()?;
        let assembler = PromptAssembler::new()?;
        Ok(Self {
            config,
            assembler,
            client,
        })
    }

    /// Runs one generation action to completion.
    ///
    /// Control flows strictly forward: ingestion, prompt assembly, the
    /// completion call, post-processing, export, optional chart. A
    /// completion failure aborts the action with no partial memo; a
    /// chart failure is recorded on the outcome and the memo proceeds.
    ///
    /// # Errors
    ///
    /// Returns an error for template failures, completion-service
    /// failures (classified per [`crate::Error::user_message`]), or
    /// export failures.
    #[instrument(skip(self, documents, instructions, session), fields(kind = ?kind, files = documents.len()))]
    pub fn generate(
        &self,
        kind: MemoKind,
        documents: &[UploadedDocument],
        instructions: &str,
        session: &mut MemoSession,
    ) -> Result<MemoOutcome> {
        if kind == MemoKind::Material {
            info!("material change memo requested; path not implemented");
            return Ok(MemoOutcome::NotAvailable {
                message: MATERIAL_NOT_AVAILABLE.to_string(),
            });
        }

        let start = Instant::now();
        session.record_upload(documents);

        // Stage 1: ingestion
        let ingest_start = Instant::now();
        let extracted = extract_all(documents, &self.config.enabled_kinds);
        let ingest_duration = ingest_start.elapsed();
        info!(
            files = extracted.reports.len(),
            placeholders = extracted.placeholder_count(),
            "ingested uploads"
        );

        // Stage 2: prompt assembly
        let request = MemoRequest::new(
            extracted.text.clone(),
            instructions,
            self.config.prompt_template.clone(),
        );
        let payload = self.assembler.assemble(&request)?;

        // Stage 3: completion call (the sole suspension point)
        let completion_start = Instant::now();
        let raw = self.client.complete(&CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(self.config.system_message.clone()),
                ChatMessage::user(payload.clone()),
            ],
        })?;
        let completion_duration = completion_start.elapsed();
        info!(
            elapsed_ms = completion_duration.as_millis() as u64,
            "completion call finished"
        );

        // Stage 4: post-processing and export
        let text = clean_text(&raw);
        session.record_memo(text.clone());
        let document = docx::write_memo(&self.config.export_heading, &text)?;

        let (chart, chart_error) = self.derive_chart_if_enabled(documents);

        let stats = MemoStats {
            files_ingested: extracted.reports.len(),
            placeholders: extracted.placeholder_count(),
            prompt_chars: payload.chars().count(),
            memo_chars: text.chars().count(),
            ingest_duration,
            completion_duration,
            duration: start.elapsed(),
        };

        Ok(MemoOutcome::Generated(GeneratedMemo {
            text,
            document,
            chart,
            chart_error,
            reports: extracted.reports,
            stats,
        }))
    }

    /// Attempts chart derivation from the first spreadsheet upload.
    /// Any failure is reported, not propagated.
    fn derive_chart_if_enabled(
        &self,
        documents: &[UploadedDocument],
    ) -> (Option<DscrChart>, Option<String>) {
        if !self.config.chart_enabled {
            return (None, None);
        }

        let Some(doc) = documents.iter().find(|d| d.is_spreadsheet()) else {
            return (None, None);
        };

        let derived = Table::from_xlsx_bytes(&doc.name, &doc.bytes)
            .and_then(|table| derive_chart(&table));

        match derived {
            Ok(chart) => (Some(chart), None),
            Err(e) => {
                warn!(name = %doc.name, error = %e, "chart derivation failed; memo proceeds without a chart");
                (None, Some(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentKind;
    use crate::error::Error;
    use crate::table::xlsx_fixture;
    use std::sync::{Arc, Mutex};

    /// Completion stub that records the payload it was sent.
    struct StubService {
        response: String,
        seen: Arc<Mutex<Option<CompletionRequest>>>,
    }

    impl CompletionService for StubService {
        fn complete(&self, request: &CompletionRequest) -> Result<String> {
            *self.seen.lock().unwrap() = Some(request.clone());
            Ok(self.response.clone())
        }
    }

    struct FailingService {
        error: Error,
    }

    impl CompletionService for FailingService {
        fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Err(self.error.clone())
        }
    }

    fn stub_pipeline(response: &str, chart: bool) -> (Pipeline, Arc<Mutex<Option<CompletionRequest>>>) {
        let seen = Arc::new(Mutex::new(None));
        let config = Config::builder().chart_enabled(chart).build().unwrap();
        let pipeline = Pipeline::with_client(
            config,
            Box::new(StubService {
                response: response.to_string(),
                seen: Arc::clone(&seen),
            }),
        )
        .unwrap();
        (pipeline, seen)
    }

    fn text_doc(name: &str, content: &str) -> UploadedDocument {
        UploadedDocument::new(name, "text/plain", content.as_bytes().to_vec())
    }

    #[test]
    fn test_generate_non_material_end_to_end() {
        let (pipeline, seen) = stub_pipeline("**Memo** body", false);
        let mut session = MemoSession::new();
        let docs = vec![text_doc("lp_memo.txt", "LP memo content")];

        let outcome = pipeline
            .generate(MemoKind::NonMaterial, &docs, "  update rates  ", &mut session)
            .unwrap();

        let memo = outcome.memo().expect("memo generated");
        assert_eq!(memo.text, "Memo body");
        assert!(!memo.document.is_empty());
        assert_eq!(memo.stats.files_ingested, 1);
        assert_eq!(session.last_memo(), Some("Memo body"));
        assert_eq!(session.last_upload(), ["lp_memo.txt"]);

        let request = seen.lock().unwrap().clone().unwrap();
        assert_eq!(request.messages[0].role, "system");
        let user_payload = &request.messages[1].content;
        assert!(user_payload.contains("LP memo content"));
        assert!(user_payload.contains("update rates"));
        assert!(user_payload.contains("Background Information"));
    }

    #[test]
    fn test_material_memo_reports_not_available() {
        let (pipeline, seen) = stub_pipeline("unused", false);
        let mut session = MemoSession::new();

        let outcome = pipeline
            .generate(MemoKind::Material, &[], "", &mut session)
            .unwrap();

        match outcome {
            MemoOutcome::NotAvailable { message } => {
                assert_eq!(message, MATERIAL_NOT_AVAILABLE);
            }
            MemoOutcome::Generated(_) => panic!("material path must not generate"),
        }

        // No ingestion and no completion call happened
        assert!(seen.lock().unwrap().is_none());
        assert!(session.last_memo().is_none());
    }

    #[test]
    fn test_completion_failure_leaves_no_partial_memo() {
        let config = Config::builder().build().unwrap();
        let pipeline = Pipeline::with_client(
            config,
            Box::new(FailingService {
                error: Error::RateLimited {
                    message: "quota".to_string(),
                },
            }),
        )
        .unwrap();

        let mut session = MemoSession::new();
        let err = pipeline
            .generate(
                MemoKind::NonMaterial,
                &[text_doc("a.txt", "x")],
                "change",
                &mut session,
            )
            .unwrap_err();

        assert!(matches!(err, Error::RateLimited { .. }));
        assert!(err.user_message().contains("quota"));
        assert!(session.last_memo().is_none());
    }

    #[test]
    fn test_chart_derived_from_spreadsheet_upload() {
        let (pipeline, _) = stub_pipeline("memo", true);
        let mut session = MemoSession::new();
        let docs = vec![UploadedDocument::new(
            "dscr.xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            xlsx_fixture(&[
                &["Year", "DSCR", "Minimum DSCR"],
                &["2022", "1.25", "1.1"],
                &["2023", "1.4", "1.1"],
            ]),
        )];

        let outcome = pipeline
            .generate(MemoKind::NonMaterial, &docs, "", &mut session)
            .unwrap();

        let memo = outcome.memo().unwrap();
        let chart = memo.chart.as_ref().expect("chart derived");
        assert_eq!(chart.x_ticks, vec![2022, 2023]);
        assert!(memo.chart_error.is_none());
    }

    #[test]
    fn test_chart_failure_does_not_abort_memo() {
        let (pipeline, _) = stub_pipeline("memo body", true);
        let mut session = MemoSession::new();
        let docs = vec![UploadedDocument::new(
            "no_year.xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            xlsx_fixture(&[&["DSCR", "Minimum DSCR"], &["1.2", "1.0"]]),
        )];

        let outcome = pipeline
            .generate(MemoKind::NonMaterial, &docs, "", &mut session)
            .unwrap();

        let memo = outcome.memo().unwrap();
        assert_eq!(memo.text, "memo body");
        assert!(memo.chart.is_none());
        let chart_error = memo.chart_error.as_ref().expect("chart error surfaced");
        assert!(chart_error.contains("year"));
    }

    #[test]
    fn test_chart_skipped_when_disabled() {
        let (pipeline, _) = stub_pipeline("memo", false);
        let mut session = MemoSession::new();
        let docs = vec![UploadedDocument::new(
            "dscr.xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            xlsx_fixture(&[&["Year", "DSCR", "Minimum DSCR"], &["2022", "1.2", "1.0"]]),
        )];

        let outcome = pipeline
            .generate(MemoKind::NonMaterial, &docs, "", &mut session)
            .unwrap();

        let memo = outcome.memo().unwrap();
        assert!(memo.chart.is_none());
        assert!(memo.chart_error.is_none());
    }

    #[test]
    fn test_placeholder_files_counted_in_stats() {
        let (pipeline, _) = stub_pipeline("memo", false);
        let mut session = MemoSession::new();
        let docs = vec![
            text_doc("a.txt", "text"),
            UploadedDocument::new("deck.pdf", "application/pdf", vec![1]),
            UploadedDocument::with_kind("blob", DocumentKind::Other, vec![2]),
        ];

        let outcome = pipeline
            .generate(MemoKind::NonMaterial, &docs, "", &mut session)
            .unwrap();

        let memo = outcome.memo().unwrap();
        assert_eq!(memo.stats.files_ingested, 3);
        assert_eq!(memo.stats.placeholders, 2);
        assert_eq!(memo.reports.len(), 3);
    }

    #[test]
    fn test_generated_memo_document_opens_as_docx() {
        let (pipeline, _) = stub_pipeline("The memo text", false);
        let mut session = MemoSession::new();

        let outcome = pipeline
            .generate(MemoKind::NonMaterial, &[text_doc("a.txt", "x")], "", &mut session)
            .unwrap();

        let memo = outcome.memo().unwrap();
        let paragraphs =
            crate::docx::read_paragraphs("memo.docx", &memo.document).unwrap();
        assert_eq!(paragraphs[0], "Non-Material Change Memo");
        assert_eq!(paragraphs[1], "The memo text");
    }
}
