//! Best-effort LLM summaries of exported content.

pub mod openai;

use log::{debug, warn};

use crate::domain::entry::{ContentKind, ExportFormat, ExportResult, ExportedDocument};
use crate::error::{ExportError, SummaryError};
use crate::remote::ContentExporter;

pub use openai::OpenAiChat;

/// Replaces the summary when the LLM call fails.
pub const SUMMARY_FAILED: &str = "(summary failed)";

pub const SUMMARY_CHAR_GUIDELINE: usize = 300;

const SYSTEM_PROMPT: &str =
    "You are an assistant that writes short, faithful summaries of saved articles.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Single-turn, non-streaming chat completion.
pub trait ChatModel {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, SummaryError>;
}

pub struct Summarizer {
    model: Box<dyn ChatModel>,
    language: String,
    max_input_chars: usize,
}

impl Summarizer {
    pub fn new(model: Box<dyn ChatModel>, language: impl Into<String>, max_input_chars: usize) -> Self {
        Self {
            model,
            language: language.into(),
            max_input_chars,
        }
    }

    fn messages(&self, content: &str) -> [ChatMessage; 2] {
        let clipped: String = content.chars().take(self.max_input_chars).collect();
        [
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: format!(
                    "Summarize the following content. Answer in {}, in no more than {} characters.\n\n{}",
                    self.language, SUMMARY_CHAR_GUIDELINE, clipped
                ),
            },
        ]
    }

    pub fn try_summarize(&self, content: &str) -> Result<String, SummaryError> {
        let text = self.model.complete(&self.messages(content))?;
        Ok(text.trim().to_string())
    }

    /// Summarize `content`; any failure yields [`SUMMARY_FAILED`].
    pub fn summarize(&self, content: &str) -> String {
        match self.try_summarize(content) {
            Ok(s) => s,
            Err(e) => {
                warn!("summary failed: {e}");
                SUMMARY_FAILED.to_string()
            }
        }
    }

    /// Export `id` and attach a summary of its content.
    pub fn export_and_summarize(
        &self,
        exporter: &dyn ContentExporter,
        id: &str,
        format: ExportFormat,
    ) -> Result<ExportResult, ExportError> {
        let result = exporter.export(id, format)?;
        debug!("{id}: exported, summarizing");
        let text = prompt_text(&result);
        let summary = self.summarize(&text);
        Ok(result.with_summary(summary))
    }
}

/// Text fed to the model. HTML is flattened so markup does not eat the input budget.
fn prompt_text(result: &ExportResult) -> String {
    match result {
        ExportResult::Document(ExportedDocument {
            content_type: ContentKind::Html,
            content,
            ..
        }) => html2text::from_read(content.as_bytes(), 100).unwrap_or_else(|e| {
            debug!("html to text failed, using raw html: {e}");
            content.clone()
        }),
        other => other.text(),
    }
}
