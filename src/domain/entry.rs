use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::domain::timestamp;

/// One saved item as returned by the inbox listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboxEntry {
    #[serde(rename = "userSearchEngineID", alias = "engineId", default)]
    pub engine_id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(rename = "createTime", default, deserialize_with = "lenient_text")]
    pub create_time: Option<String>,
}

/// Accept any JSON value for a text field: strings as is, numbers and booleans
/// rendered, anything else absent. A malformed field must not fail the whole page.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

impl InboxEntry {
    pub fn new(id: &str, title: &str, create_time: &str) -> Self {
        Self {
            engine_id: Some(Value::String(id.to_string())),
            title: Some(title.to_string()),
            create_time: Some(create_time.to_string()),
        }
    }

    /// Export identifier, if present and non-empty. Numeric ids are rendered as strings.
    pub fn id(&self) -> Option<String> {
        match self.engine_id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("untitled")
    }

    pub fn create_time(&self) -> &str {
        self.create_time.as_deref().unwrap_or("")
    }
}

/// Page payload of the inbox listing.
#[derive(Debug, Default, Deserialize)]
pub struct InboxPage {
    #[serde(default)]
    pub data: Option<Vec<InboxEntry>>,
}

/// Order in which the remote lists entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    pub fn ascending(self) -> bool {
        matches!(self, SortOrder::OldestFirst)
    }
}

/// Rendering requested from the export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Html,
    Text,
    Md,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Text => "text",
            ExportFormat::Md => "md",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(ExportFormat::Html),
            "text" | "txt" => Ok(ExportFormat::Text),
            "md" | "markdown" => Ok(ExportFormat::Md),
            other => Err(format!("unknown export format {other:?} (expected html, text or md)")),
        }
    }
}

/// How an exported body was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Markdown,
    /// Unrecognised declared content type, kept verbatim.
    Other(String),
}

impl ContentKind {
    pub fn label(&self) -> &str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Markdown => "markdown",
            ContentKind::Other(label) => label,
        }
    }
}

impl Serialize for ContentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A textual export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedDocument {
    pub content_type: ContentKind,
    pub content: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ExportedDocument {
    pub fn success(content_type: ContentKind, content: String) -> Self {
        Self {
            content_type,
            content,
            status: "success".to_string(),
            summary: None,
        }
    }
}

/// Result of exporting one item.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExportResult {
    Document(ExportedDocument),
    /// The service answered with JSON; kept as-is.
    Structured(Value),
}

impl ExportResult {
    pub fn is_html(&self) -> bool {
        matches!(
            self,
            ExportResult::Document(ExportedDocument {
                content_type: ContentKind::Html,
                ..
            })
        )
    }

    /// Text handed to the summarizer.
    pub fn text(&self) -> String {
        match self {
            ExportResult::Document(doc) => doc.content.clone(),
            ExportResult::Structured(v) => v.to_string(),
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            ExportResult::Document(doc) => doc.summary.as_deref(),
            ExportResult::Structured(v) => v.get("summary").and_then(Value::as_str),
        }
    }

    pub fn with_summary(self, summary: String) -> Self {
        match self {
            ExportResult::Document(mut doc) => {
                doc.summary = Some(summary);
                ExportResult::Document(doc)
            }
            ExportResult::Structured(Value::Object(mut map)) => {
                map.insert("summary".to_string(), Value::String(summary));
                ExportResult::Structured(Value::Object(map))
            }
            ExportResult::Structured(other) => ExportResult::Structured(serde_json::json!({
                "data": other,
                "summary": summary,
            })),
        }
    }
}

/// One exported item as recorded in the run report.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRecord {
    pub id: String,
    pub title: String,
    pub data: ExportResult,
}

/// Persisted artifact of an export-only run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub total_items: usize,
    pub successful_exports: usize,
    pub exports: Vec<ExportRecord>,
}

/// Summary of one item, rendered into the digest.
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    pub title: String,
    pub create_time: String,
    pub summary: String,
}

impl SummaryEntry {
    fn instant(&self) -> Option<DateTime<FixedOffset>> {
        timestamp::parse(&self.create_time).ok()
    }
}

/// Sort newest first by parsed creation time. Unparseable times sink to the end.
pub fn sort_newest_first(entries: &mut [SummaryEntry]) {
    entries.sort_by(|a, b| b.instant().cmp(&a.instant()));
}
