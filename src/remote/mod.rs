pub mod client;

use crate::domain::entry::{ExportFormat, ExportResult, InboxEntry, SortOrder};
use crate::error::{ExportError, ListError};

/// Paged access to the inbox listing.
pub trait InboxSource {
    /// Fetch one page (1-based) of entries in `order`.
    fn list_page(&self, page: u32, order: SortOrder) -> Result<Vec<InboxEntry>, ListError>;
}

/// Full-content export of a single entry.
pub trait ContentExporter {
    fn export(&self, id: &str, format: ExportFormat) -> Result<ExportResult, ExportError>;
}
