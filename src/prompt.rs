use crate::error::{Error, Result};
use serde::Serialize;
use tera::{Context, Tera};

/// Name of the built-in assembly template.
const ASSEMBLY_TEMPLATE_NAME: &str = "assembly";

/// Built-in assembly template. The order is part of the contract:
/// extracted content, separator, user instructions, separator,
/// instructional template tail.
const ASSEMBLY_TEMPLATE: &str = "Uploaded content:\n{{ ctx.extracted_content }}\nUser changes:\n{{ ctx.user_instructions }}\n\n---\n\n{{ ctx.prompt_template }}";

/// One memo-generation request, immutable after construction.
#[derive(Debug, Clone, Serialize)]
pub struct MemoRequest {
    /// Concatenated extraction buffer
    pub extracted_content: String,

    /// Free-text change description, whitespace-trimmed
    pub user_instructions: String,

    /// Instructional template tail (static configuration text)
    pub prompt_template: String,
}

impl MemoRequest {
    /// Creates a request, trimming leading/trailing whitespace from the
    /// user instructions. No other validation is performed on the
    /// instruction content.
    #[must_use]
    pub fn new(
        extracted_content: impl Into<String>,
        user_instructions: &str,
        prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            extracted_content: extracted_content.into(),
            user_instructions: user_instructions.trim().to_string(),
            prompt_template: prompt_template.into(),
        }
    }
}

/// Renders memo requests into a single completion payload.
pub(crate) struct PromptAssembler {
    tera: Tera,
}

impl PromptAssembler {
    /// Creates an assembler with the built-in template registered.
    ///
    /// # Errors
    ///
    /// Returns an error if template registration fails.
    pub(crate) fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(ASSEMBLY_TEMPLATE_NAME, ASSEMBLY_TEMPLATE)
            .map_err(|e| Error::template(ASSEMBLY_TEMPLATE_NAME, e))?;
        Ok(Self { tera })
    }

    /// Renders the request into the user-message payload.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub(crate) fn assemble(&self, request: &MemoRequest) -> Result<String> {
        let mut context = Context::new();
        context.insert("ctx", request);

        self.tera
            .render(ASSEMBLY_TEMPLATE_NAME, &context)
            .map_err(|e| Error::template(ASSEMBLY_TEMPLATE_NAME, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_trims_instructions_only() {
        let request = MemoRequest::new("  content  ", "  update net worth  ", "tail");
        assert_eq!(request.extracted_content, "  content  ");
        assert_eq!(request.user_instructions, "update net worth");
    }

    #[test]
    fn test_assembled_payload_order() {
        let assembler = PromptAssembler::new().unwrap();
        let request = MemoRequest::new("EXTRACTED", "INSTRUCTIONS", "TEMPLATE");
        let payload = assembler.assemble(&request).unwrap();

        let extracted_at = payload.find("EXTRACTED").unwrap();
        let instructions_at = payload.find("INSTRUCTIONS").unwrap();
        let template_at = payload.find("TEMPLATE").unwrap();
        assert!(extracted_at < instructions_at);
        assert!(instructions_at < template_at);
        assert!(payload.contains("\n\n---\n\n"));
    }

    #[test]
    fn test_assembled_payload_labels() {
        let assembler = PromptAssembler::new().unwrap();
        let request = MemoRequest::new("doc text", "change rate to 5%", "Write a memo.");
        let payload = assembler.assemble(&request).unwrap();

        assert_eq!(
            payload,
            "Uploaded content:\ndoc text\nUser changes:\nchange rate to 5%\n\n---\n\nWrite a memo."
        );
    }

    #[test]
    fn test_markup_passes_through_unescaped() {
        let assembler = PromptAssembler::new().unwrap();
        let request = MemoRequest::new("a < b & c", "", "tail");
        let payload = assembler.assemble(&request).unwrap();
        assert!(payload.contains("a < b & c"));
    }
}
