use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN, REFERER};
use serde_json::Value;
use url::Url;

use crate::domain::entry::{
    ContentKind, ExportFormat, ExportResult, ExportedDocument, InboxEntry, InboxPage, SortOrder,
};
use crate::error::{ConfigError, ExportError, ListError, TagError};
use crate::remote::{ContentExporter, InboxSource};

pub const DEFAULT_BASE_URL: &str = "https://cubox.pro/c/api";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const ERROR_SNIPPET_CHARS: usize = 100;

/// Blocking client for the read-it-later service.
pub struct InboxClient {
    base: Url,
    origin: String,
    origin_header: HeaderValue,
    token: HeaderValue,
    http: Client,
}

impl InboxClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ConfigError> {
        // Url::join drops the last segment unless the base ends with '/'.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalized).map_err(|e| ConfigError::InvalidValue {
            key: "base_url".to_string(),
            message: e.to_string(),
        })?;
        let origin = base.origin().ascii_serialization();
        let origin_header = HeaderValue::from_str(&origin).map_err(|e| ConfigError::InvalidValue {
            key: "base_url".to_string(),
            message: e.to_string(),
        })?;
        let token: String = token.into();
        let mut token = HeaderValue::from_str(&token).map_err(|_| ConfigError::InvalidValue {
            key: "token".to_string(),
            message: "contains characters not allowed in an HTTP header".to_string(),
        })?;
        token.set_sensitive(true);
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "http client".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            base,
            origin,
            origin_header,
            token,
            http,
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        // Paths are static and relative, joining cannot fail.
        self.base.join(path).unwrap_or_else(|_| self.base.clone())
    }

    fn headers(&self, referer: String) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, self.token.clone());
        h.insert(ORIGIN, self.origin_header.clone());
        // Referer carries the item id; an id that cannot go in a header only loses the referer.
        if let Ok(v) = HeaderValue::from_str(&referer) {
            h.insert(REFERER, v);
        }
        h
    }

    /// Raw tag listing. Not used by the pipelines.
    pub fn list_tags(&self) -> Result<Value, TagError> {
        let resp = self
            .http
            .get(self.endpoint("v2/tag/list"))
            .headers(self.headers(format!("{}/my/inbox", self.origin)))
            .send()?;
        let status = resp.status().as_u16();
        if status != 200 {
            return Err(TagError::Status { status });
        }
        let body = resp.text()?;
        serde_json::from_str(&body).map_err(|e| TagError::Decode(e.to_string()))
    }
}

impl InboxSource for InboxClient {
    fn list_page(&self, page: u32, order: SortOrder) -> Result<Vec<InboxEntry>, ListError> {
        let page_str = page.to_string();
        let resp = self
            .http
            .get(self.endpoint("v2/search_engine/inbox"))
            .query(&[
                ("asc", if order.ascending() { "true" } else { "false" }),
                ("page", page_str.as_str()),
                ("filters", ""),
                ("archiving", "false"),
            ])
            .headers(self.headers(format!("{}/my/inbox", self.origin)))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .map_err(|source| ListError::Transport { page, source })?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(ListError::Status { page, status });
        }

        let body = resp
            .text()
            .map_err(|source| ListError::Transport { page, source })?;
        let parsed: InboxPage = serde_json::from_str(&body).map_err(|e| ListError::Decode {
            page,
            reason: e.to_string(),
        })?;
        Ok(parsed.data.unwrap_or_default())
    }
}

impl ContentExporter for InboxClient {
    fn export(&self, id: &str, format: ExportFormat) -> Result<ExportResult, ExportError> {
        log::debug!("export request: id={id} type={format}");
        let resp = self
            .http
            .post(self.endpoint("search_engines/export"))
            .headers(self.headers(format!("{}/my/card?id={id}", self.origin)))
            .header(ACCEPT, "text/html,application/json")
            .form(&[
                ("engineIds", id),
                ("type", format.as_str()),
                ("snap", "false"),
                ("compressed", "false"),
            ])
            .send()
            .map_err(|source| ExportError::Transport {
                id: id.to_string(),
                source,
            })?;

        read_export(id, format, resp)
    }
}

fn read_export(id: &str, format: ExportFormat, resp: Response) -> Result<ExportResult, ExportError> {
    let status = resp.status().as_u16();
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = resp.text().map_err(|source| ExportError::Transport {
        id: id.to_string(),
        source,
    })?;

    if status != 200 && status != 201 {
        return Err(ExportError::Status {
            id: id.to_string(),
            status,
            snippet: body.chars().take(ERROR_SNIPPET_CHARS).collect(),
        });
    }

    classify(id, format, &content_type, body)
}

/// Classify an export body by its declared content type.
pub fn classify(
    id: &str,
    format: ExportFormat,
    content_type: &str,
    body: String,
) -> Result<ExportResult, ExportError> {
    let ct = content_type.to_ascii_lowercase();
    if ct.contains("application/json") {
        let value = serde_json::from_str(&body).map_err(|source| ExportError::Decode {
            id: id.to_string(),
            source,
        })?;
        return Ok(ExportResult::Structured(value));
    }

    let kind = if ct.contains("text/html") || ct.contains("text/plain") {
        if format == ExportFormat::Html {
            ContentKind::Html
        } else {
            ContentKind::Markdown
        }
    } else {
        ContentKind::Other(content_type.to_string())
    };
    Ok(ExportResult::Document(ExportedDocument::success(kind, body)))
}
