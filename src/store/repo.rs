use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::entry::RunReport;
use crate::error::PersistError;

/// Sink for the artifacts a run produces.
pub trait ArtifactStore {
    /// Write raw exported HTML for `id`; returns the written path.
    fn save_html(&self, id: &str, html: &str) -> Result<PathBuf, PersistError>;

    fn save_report(&self, report: &RunReport) -> Result<PathBuf, PersistError>;

    /// Write the Markdown digest for the run dated `date`.
    fn save_digest(&self, date: NaiveDate, markdown: &str) -> Result<PathBuf, PersistError>;
}
