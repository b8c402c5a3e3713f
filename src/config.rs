use crate::document::DocumentKind;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";
const DEFAULT_EXPORT_HEADING: &str = "Non-Material Change Memo";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable holding the completion-service credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// One section of the generated memo, used to synthesize the default
/// prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoSection {
    /// Section title, e.g. "Background Information"
    pub title: String,

    /// What the completion service should put in the section
    pub guidance: String,
}

impl MemoSection {
    /// Creates a memo section.
    #[must_use]
    pub fn new(title: impl Into<String>, guidance: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            guidance: guidance.into(),
        }
    }
}

fn default_sections() -> Vec<MemoSection> {
    vec![
        MemoSection::new(
            "Background Information",
            "A comprehensive overview from the LP memo in paragraph form.",
        ),
        MemoSection::new(
            "Property Information",
            "A bullet-point summary of relevant property information.",
        ),
        MemoSection::new(
            "Investment Summary",
            "Bullet-point overview of rates, terms, and financials from the LP memo.",
        ),
        MemoSection::new(
            "Updated Financial Information",
            "Previous and updated net worth figures with total asset changes.",
        ),
    ]
}

fn default_enabled_kinds() -> HashSet<DocumentKind> {
    [
        DocumentKind::Text,
        DocumentKind::Word,
        DocumentKind::Spreadsheet,
        DocumentKind::Csv,
        DocumentKind::Pdf,
        DocumentKind::Other,
    ]
    .into_iter()
    .collect()
}

/// Synthesizes the instructional template tail from a section list.
fn template_from_sections(sections: &[MemoSection]) -> String {
    let mut template = String::from("Please generate a memo with the following structure: ");
    for (i, section) in sections.iter().enumerate() {
        template.push_str(&format!("{}. {}: {} ", i + 1, section.title, section.guidance));
    }
    template.trim_end().to_string()
}

/// Configuration for the memo-generation pipeline.
///
/// One config instance collapses the cosmetic variants of the tool into
/// a single parameterized component: the prompt template text, the set
/// of ingestible file types, whether chart derivation runs, and the
/// memo section list are all data here, not code.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Model identifier sent to the completion service
    pub model: String,

    /// Completion-service credential; resolved from the builder or the
    /// `OPENAI_API_KEY` environment variable
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completion endpoint
    pub base_url: String,

    /// Timeout for the one blocking completion call
    pub request_timeout: Duration,

    /// System message prepended to every completion request
    pub system_message: String,

    /// Instructional template appended after the variable inputs
    pub prompt_template: String,

    /// Memo sections (used to synthesize the default template)
    pub sections: Vec<MemoSection>,

    /// Document kinds accepted by ingestion; others degrade to the
    /// unsupported placeholder
    pub enabled_kinds: HashSet<DocumentKind>,

    /// Whether DSCR chart derivation runs on spreadsheet uploads
    pub chart_enabled: bool,

    /// Heading of the exported Word document
    pub export_heading: String,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use cre_copilot::Config;
    ///
    /// let config = Config::builder()
    ///     .model("gpt-4o-mini")
    ///     .api_key("sk-test")
    ///     .chart_enabled(true)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the model, base URL, template, or section
    /// list is empty, or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::config("model must not be empty"));
        }

        if self.base_url.trim().is_empty() {
            return Err(Error::config("base_url must not be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::config("request_timeout must be greater than zero"));
        }

        if self.prompt_template.trim().is_empty() {
            return Err(Error::config("prompt_template must not be empty"));
        }

        if self.sections.is_empty() {
            return Err(Error::config("at least one memo section is required"));
        }

        if self.enabled_kinds.is_empty() {
            return Err(Error::config("at least one document kind must be enabled"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let sections = default_sections();
        let prompt_template = template_from_sections(&sections);
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
            prompt_template,
            sections,
            enabled_kinds: default_enabled_kinds(),
            chart_enabled: false,
            export_heading: DEFAULT_EXPORT_HEADING.to_string(),
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    request_timeout: Option<Duration>,
    system_message: Option<String>,
    prompt_template: Option<String>,
    sections: Option<Vec<MemoSection>>,
    enabled_kinds: Option<HashSet<DocumentKind>>,
    chart_enabled: bool,
    export_heading: Option<String>,
}

impl ConfigBuilder {
    /// Sets the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the completion-service credential explicitly.
    ///
    /// When not set, `build()` falls back to the `OPENAI_API_KEY`
    /// environment variable.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL of the completion endpoint.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the timeout for the blocking completion call.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the system message.
    #[must_use]
    pub fn system_message(mut self, message: impl Into<String>) -> Self {
        self.system_message = Some(message.into());
        self
    }

    /// Overrides the instructional template tail.
    ///
    /// When not set, the template is synthesized from the section list.
    #[must_use]
    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = Some(template.into());
        self
    }

    /// Sets the memo section list.
    #[must_use]
    pub fn sections(mut self, sections: Vec<MemoSection>) -> Self {
        self.sections = Some(sections);
        self
    }

    /// Sets the document kinds accepted by ingestion.
    #[must_use]
    pub fn enabled_kinds(mut self, kinds: impl IntoIterator<Item = DocumentKind>) -> Self {
        self.enabled_kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Enables or disables DSCR chart derivation.
    #[must_use]
    pub fn chart_enabled(mut self, enabled: bool) -> Self {
        self.chart_enabled = enabled;
        self
    }

    /// Sets the exported document's heading.
    #[must_use]
    pub fn export_heading(mut self, heading: impl Into<String>) -> Self {
        self.export_heading = Some(heading.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let sections = self.sections.unwrap_or_else(default_sections);
        let prompt_template = self
            .prompt_template
            .unwrap_or_else(|| template_from_sections(&sections));
        let api_key = self.api_key.or_else(|| std::env::var(API_KEY_ENV).ok());

        let config = Config {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_TIMEOUT),
            system_message: self
                .system_message
                .unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_string()),
            prompt_template,
            sections,
            enabled_kinds: self.enabled_kinds.unwrap_or_else(default_enabled_kinds),
            chart_enabled: self.chart_enabled,
            export_heading: self
                .export_heading
                .unwrap_or_else(|| DEFAULT_EXPORT_HEADING.to_string()),
        };

        config.validate()?;
        Ok(config)
    }
}
