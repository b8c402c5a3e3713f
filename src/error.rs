use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the cre-copilot library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// A file could not be parsed or decoded during ingestion.
    ///
    /// Surfaced only from format helpers; the ingestion batch itself
    /// degrades failing files to placeholder lines instead of aborting.
    #[error("Failed to extract '{name}': {message}")]
    Extraction {
        /// Name of the uploaded file
        name: String,
        /// Error message
        message: String,
    },

    /// A required chart column is missing after header normalization.
    #[error("Spreadsheet is missing required column '{column}' (accepted headers: {accepted})")]
    MissingColumn {
        /// Canonical name of the missing column
        column: String,
        /// Comma-separated list of accepted header variants
        accepted: String,
    },

    /// A chart column value could not be read as a number.
    #[error("Column '{column}' has a non-numeric value in row {row}: '{value}'")]
    NonNumericCell {
        /// Canonical column name
        column: String,
        /// One-based data row index
        row: usize,
        /// Offending cell text
        value: String,
    },

    /// The completion service rejected the request due to quota limits.
    #[error("Completion service rate limit exceeded: {message}")]
    RateLimited {
        /// Error message returned by the service
        message: String,
    },

    /// The requested model does not exist or is not accessible.
    #[error("Model '{model}' is invalid or inaccessible: {message}")]
    InvalidModel {
        /// Model identifier that was requested
        model: String,
        /// Error message returned by the service
        message: String,
    },

    /// The completion service returned an error response.
    #[error("Completion service error (HTTP {status}): {message}")]
    Service {
        /// HTTP status code
        status: u16,
        /// Error message returned by the service
        message: String,
    },

    /// Transport failure, timeout, or malformed completion response.
    #[error("Unexpected completion failure: {message}")]
    Unexpected {
        /// Error message
        message: String,
    },

    /// Word-document export failure.
    #[error("Failed to export memo document: {message}")]
    Export {
        /// Error message
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: tera::Error) -> Self {
        Self::Template {
            template: template.into(),
            message: source.to_string(),
        }
    }

    /// Creates an extraction error for a named upload.
    #[must_use]
    pub fn extraction(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an export error.
    #[must_use]
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    /// Creates an unexpected-failure error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns true if this error came from the completion service boundary.
    #[must_use]
    pub const fn is_completion(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::InvalidModel { .. }
                | Self::Service { .. }
                | Self::Unexpected { .. }
        )
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns the message to show the user who triggered the action.
    ///
    /// Each completion-failure class maps to a distinct message; other
    /// errors fall back to their `Display` form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited { .. } => {
                "You have exceeded your API quota. Please check your plan and billing details."
                    .to_string()
            }
            Self::InvalidModel { .. } => {
                "The specified model does not exist or you do not have access to it. \
                 Please check your API access."
                    .to_string()
            }
            Self::Service { status, .. } => {
                format!(
                    "The completion service returned an error (HTTP {status}). Please try again later."
                )
            }
            Self::Unexpected { message } => format!("An error occurred: {message}"),
            other => other.to_string(),
        }
    }
}

impl From<tera::Error> for Error {
    fn from(e: tera::Error) -> Self {
        Self::Template {
            template: "unknown".to_string(),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}
