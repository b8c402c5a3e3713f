use crate::document::UploadedDocument;

/// Explicit per-session state.
///
/// The tool remembers the last upload and the last generated memo so a
/// display layer can echo them between actions. The state is owned by
/// one user session and passed through the pipeline; nothing here is
/// shared between sessions or across process restarts.
#[derive(Debug, Clone, Default)]
pub struct MemoSession {
    last_upload: Vec<String>,
    last_memo: Option<String>,
}

impl MemoSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the filenames of the most recent upload, in upload order.
    pub fn record_upload(&mut self, documents: &[UploadedDocument]) {
        self.last_upload = documents.iter().map(|d| d.name.clone()).collect();
    }

    /// Records the most recently generated memo text.
    pub fn record_memo(&mut self, memo: impl Into<String>) {
        self.last_memo = Some(memo.into());
    }

    /// Filenames of the last upload, in upload order.
    #[must_use]
    pub fn last_upload(&self) -> &[String] {
        &self.last_upload
    }

    /// The last generated memo, if any.
    #[must_use]
    pub fn last_memo(&self) -> Option<&str> {
        self.last_memo.as_deref()
    }
}
