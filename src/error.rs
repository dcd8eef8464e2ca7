//! Error types for inbox_harvest.
//!
//! Run-level failures (`Error`) and item-level failures (`ItemError`) are
//! separate types so a bad item can never be mistaken for a failed run.

use std::path::PathBuf;

/// Run-level error. Anything that converts into this aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Inbox listing failed: {0}")]
    List(#[from] ListError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Fetching a page of the inbox failed. Fatal for the whole run.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("page {page} returned HTTP {status}")]
    Status { page: u32, status: u16 },

    #[error("page {page} request failed: {source}")]
    Transport {
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("page {page} could not be decoded: {reason}")]
    Decode { page: u32, reason: String },

    #[error("oldest-first listing is not supported; the window cutoff needs newest-first pages")]
    UnsupportedOrder,
}

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("tag listing returned HTTP {status}")]
    Status { status: u16 },

    #[error("tag listing request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("tag listing could not be decoded: {0}")]
    Decode(String),
}

/// Exporting a single item failed. The item is dropped, the run continues.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export of {id} returned HTTP {status}: {snippet}")]
    Status {
        id: String,
        status: u16,
        snippet: String,
    },

    #[error("export of {id} failed: {source}")]
    Transport {
        id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("export of {id} returned invalid JSON: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A timestamp did not match `YYYY-MM-DDTHH:MM:SS:mmm+HH:00`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time format: {input:?}")]
pub struct FormatError {
    pub input: String,
}

/// The LLM call failed. Callers replace the summary with a sentinel.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat endpoint returned HTTP {status}: {snippet}")]
    Status { status: u16, snippet: String },

    #[error("malformed chat response: {0}")]
    MalformedResponse(String),
}

/// Writing an artifact to the output directory failed.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration and credential errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required credential: {name}. {hint}")]
    MissingCredential { name: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Keyring error: {0}")]
    Keyring(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of one item inside a pipeline. Never converts into [`Error`].
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

pub type Result<T> = std::result::Result<T, Error>;
