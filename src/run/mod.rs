//! Run orchestration: window collection followed by one of the two item pipelines.
//!
//! Each item goes PENDING -> EXPORTED -> (SUMMARIZED) -> PERSISTED, or ends in
//! FAILED, which is logged and excludes the item from the output. Only listing
//! failures and failures to write the final artifact abort a run.

pub mod digest;
pub mod paginator;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use log::{error, info, warn};

use crate::domain::entry::{
    ExportFormat, ExportRecord, ExportResult, InboxEntry, RunReport, SortOrder, SummaryEntry,
};
use crate::domain::timestamp::Window;
use crate::error::{ItemError, Result};
use crate::remote::{ContentExporter, InboxSource};
use crate::store::repo::ArtifactStore;
use crate::summarize::Summarizer;

pub use digest::Digest;
pub use paginator::{collect_window, fetch_recent_entries};

/// Fixed pauses that keep the run under the remote rate limit.
#[derive(Debug, Clone, Copy)]
pub struct Delays {
    pub page: Duration,
    pub item: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            page: Duration::from_secs(2),
            item: Duration::from_secs(1),
        }
    }
}

impl Delays {
    pub fn none() -> Self {
        Self {
            page: Duration::ZERO,
            item: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub window: Window,
    pub order: SortOrder,
    pub format: ExportFormat,
    pub delays: Delays,
}

/// Sleeps between consecutive item attempts, never before the first.
struct Pacer {
    delay: Duration,
    started: bool,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            started: false,
        }
    }

    fn wait(&mut self) {
        if self.started && !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.started = true;
    }
}

/// Export-only run: collect the window, export each entry, write the JSON report.
pub fn run_export(
    source: &dyn InboxSource,
    exporter: &dyn ContentExporter,
    store: &dyn ArtifactStore,
    opts: &RunOptions,
) -> Result<(RunReport, PathBuf)> {
    info!("fetching inbox listing");
    let entries = collect_window(source, opts.order, &opts.window, opts.delays.page)?;
    let report = export_entries(&entries, exporter, store, opts.format, opts.delays.item);
    let path = store.save_report(&report)?;
    info!(
        "export finished: {} processed, {} exported, report at {}",
        report.total_items,
        report.successful_exports,
        path.display()
    );
    Ok((report, path))
}

/// Export every entry; failed or invalid entries are logged and left out of `exports`.
pub fn export_entries(
    entries: &[InboxEntry],
    exporter: &dyn ContentExporter,
    store: &dyn ArtifactStore,
    format: ExportFormat,
    item_delay: Duration,
) -> RunReport {
    let mut pacer = Pacer::new(item_delay);
    let mut exports = Vec::new();

    for entry in entries {
        let Some(id) = entry.id() else {
            warn!("skipping entry without id: {}", entry.title());
            continue;
        };
        pacer.wait();
        info!("exporting {} (id {id})", entry.title());
        match export_one(&id, entry.title(), exporter, store, format) {
            Ok(record) => exports.push(record),
            Err(e) => error!("{id}: failed: {e}"),
        }
    }

    RunReport {
        total_items: entries.len(),
        successful_exports: exports.len(),
        exports,
    }
}

fn export_one(
    id: &str,
    title: &str,
    exporter: &dyn ContentExporter,
    store: &dyn ArtifactStore,
    format: ExportFormat,
) -> std::result::Result<ExportRecord, ItemError> {
    let mut data = exporter.export(id, format)?;
    if data.is_html()
        && let ExportResult::Document(doc) = &mut data
    {
        let path = store.save_html(id, &doc.content)?;
        doc.content = format!("Saved to {}", path.display());
        info!("{id}: html persisted to {}", path.display());
    }
    Ok(ExportRecord {
        id: id.to_string(),
        title: title.to_string(),
        data,
    })
}

/// Export+summarize run: collect the window, summarize each entry, write the Markdown digest.
pub fn run_digest(
    source: &dyn InboxSource,
    exporter: &dyn ContentExporter,
    summarizer: &Summarizer,
    store: &dyn ArtifactStore,
    opts: &RunOptions,
    date: NaiveDate,
) -> Result<(Digest, PathBuf)> {
    info!("fetching inbox listing");
    let entries = collect_window(source, opts.order, &opts.window, opts.delays.page)?;
    let summaries = summarize_entries(&entries, exporter, summarizer, opts.format, opts.delays.item);
    let digest = Digest::new(date, entries.len(), summaries);
    let path = store.save_digest(date, &digest.to_markdown())?;
    info!(
        "digest finished: {} processed, {} summarized, written to {}",
        digest.total_items,
        digest.entries.len(),
        path.display()
    );
    Ok((digest, path))
}

/// Export and summarize every entry, in input order. Export failures drop the item.
pub fn summarize_entries(
    entries: &[InboxEntry],
    exporter: &dyn ContentExporter,
    summarizer: &Summarizer,
    format: ExportFormat,
    item_delay: Duration,
) -> Vec<SummaryEntry> {
    let mut pacer = Pacer::new(item_delay);
    let mut out = Vec::new();

    for entry in entries {
        let Some(id) = entry.id() else {
            warn!("skipping entry without id: {}", entry.title());
            continue;
        };
        pacer.wait();
        info!("summarizing {} (id {id})", entry.title());
        match summarizer.export_and_summarize(exporter, &id, format) {
            Ok(result) => out.push(SummaryEntry {
                title: entry.title().to_string(),
                create_time: entry.create_time().to_string(),
                summary: result.summary().unwrap_or_default().to_string(),
            }),
            Err(e) => error!("{id}: failed: {e}"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    use crate::domain::entry::{ContentKind, ExportedDocument};
    use crate::error::{ExportError, PersistError};
    use crate::summarize::{ChatMessage, ChatModel};

    /// Exporter scripted per id; unknown ids fail with HTTP 500.
    struct Scripted {
        results: HashMap<String, ExportResult>,
        calls: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(results: Vec<(&str, ExportResult)>) -> Self {
            Self {
                results: results
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ContentExporter for Scripted {
        fn export(&self, id: &str, _format: ExportFormat) -> std::result::Result<ExportResult, ExportError> {
            self.calls.borrow_mut().push(id.to_string());
            self.results.get(id).cloned().ok_or_else(|| ExportError::Status {
                id: id.to_string(),
                status: 500,
                snippet: "boom".into(),
            })
        }
    }

    #[derive(Default)]
    struct MemStore {
        html: RefCell<Vec<(String, String)>>,
    }

    impl ArtifactStore for MemStore {
        fn save_html(&self, id: &str, html: &str) -> std::result::Result<PathBuf, PersistError> {
            self.html.borrow_mut().push((id.into(), html.into()));
            Ok(PathBuf::from(format!("out/{id}.html")))
        }
        fn save_report(&self, _report: &RunReport) -> std::result::Result<PathBuf, PersistError> {
            Ok(PathBuf::from("out/export_records.json"))
        }
        fn save_digest(&self, _date: NaiveDate, _markdown: &str) -> std::result::Result<PathBuf, PersistError> {
            Ok(PathBuf::from("out/digest.md"))
        }
    }

    struct Echo;

    impl ChatModel for Echo {
        fn complete(&self, messages: &[ChatMessage]) -> std::result::Result<String, crate::error::SummaryError> {
            let body = messages[1].content.rsplit("\n\n").next().unwrap_or_default();
            Ok(format!("summary of {body}"))
        }
    }

    fn doc(kind: ContentKind, content: &str) -> ExportResult {
        ExportResult::Document(ExportedDocument::success(kind, content.into()))
    }

    #[test]
    fn html_is_flushed_and_replaced_by_reference() {
        let exporter = Scripted::new(vec![("1", doc(ContentKind::Html, "<p>x</p>"))]);
        let store = MemStore::default();
        let entries = vec![InboxEntry::new("1", "one", "2024-03-07T10:00:00:000+08:00")];

        let report = export_entries(&entries, &exporter, &store, ExportFormat::Html, Duration::ZERO);

        assert_eq!(report.successful_exports, 1);
        assert_eq!(report.exports[0].data.text(), "Saved to out/1.html");
        assert_eq!(*store.html.borrow(), vec![("1".to_string(), "<p>x</p>".to_string())]);
    }

    #[test]
    fn failures_and_invalid_ids_do_not_stop_the_batch() {
        let exporter = Scripted::new(vec![("B", doc(ContentKind::Markdown, "b body"))]);
        let store = MemStore::default();
        let mut no_id = InboxEntry::new("", "nameless", "2024-03-07T10:00:00:000+08:00");
        no_id.engine_id = None;
        let entries = vec![
            InboxEntry::new("A", "a", "2024-03-07T10:00:00:000+08:00"),
            no_id,
            InboxEntry::new("B", "b", "2024-03-07T09:00:00:000+08:00"),
        ];

        let report = export_entries(&entries, &exporter, &store, ExportFormat::Md, Duration::ZERO);

        assert_eq!(*exporter.calls.borrow(), vec!["A", "B"]);
        assert_eq!(report.total_items, 3);
        assert_eq!(report.successful_exports, 1);
        assert_eq!(report.exports[0].id, "B");
        assert!(store.html.borrow().is_empty());
    }

    #[test]
    fn summaries_keep_only_completed_items() {
        let exporter = Scripted::new(vec![
            ("1", doc(ContentKind::Markdown, "first")),
            ("3", doc(ContentKind::Markdown, "third")),
        ]);
        let summarizer = Summarizer::new(Box::new(Echo), "English", 1000);
        let entries = vec![
            InboxEntry::new("1", "one", "2024-03-07T10:00:00:000+08:00"),
            InboxEntry::new("2", "two", "2024-03-06T10:00:00:000+08:00"),
            InboxEntry::new("3", "three", "2024-03-05T10:00:00:000+08:00"),
        ];

        let got = summarize_entries(&entries, &exporter, &summarizer, ExportFormat::Md, Duration::ZERO);

        let titles: Vec<_> = got.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["one", "three"]);
        assert_eq!(got[1].summary, "summary of third");
        assert_eq!(got[1].create_time, "2024-03-05T10:00:00:000+08:00");
    }

    /// Records when each export happens.
    struct Timed {
        calls: RefCell<Vec<std::time::Instant>>,
    }

    impl ContentExporter for Timed {
        fn export(&self, _id: &str, _format: ExportFormat) -> std::result::Result<ExportResult, ExportError> {
            self.calls.borrow_mut().push(std::time::Instant::now());
            Ok(doc(ContentKind::Markdown, "body"))
        }
    }

    #[test]
    fn item_delay_only_between_attempted_items() {
        let delay = Duration::from_millis(100);
        let exporter = Timed {
            calls: RefCell::new(Vec::new()),
        };
        let store = MemStore::default();
        let mut first_no_id = InboxEntry::new("", "nameless", "2024-03-07T10:00:00:000+08:00");
        first_no_id.engine_id = None;
        let mid_no_id = first_no_id.clone();
        let entries = vec![
            first_no_id,
            InboxEntry::new("A", "a", "2024-03-07T10:00:00:000+08:00"),
            mid_no_id,
            InboxEntry::new("B", "b", "2024-03-07T09:00:00:000+08:00"),
        ];

        let start = std::time::Instant::now();
        let report = export_entries(&entries, &exporter, &store, ExportFormat::Md, delay);
        let done = std::time::Instant::now();

        assert_eq!(report.successful_exports, 2);
        let calls = exporter.calls.into_inner();
        assert_eq!(calls.len(), 2);
        assert!(calls[0] - start < delay, "no pause before the first item or for skipped ones");
        let gap = calls[1] - calls[0];
        assert!(gap >= delay);
        assert!(gap < delay * 2, "skipped entry between items must not add a pause");
        assert!(done - calls[1] < delay, "no pause after the last item");
    }

    #[test]
    fn summarize_pipeline_paces_items() {
        let delay = Duration::from_millis(100);
        let exporter = Timed {
            calls: RefCell::new(Vec::new()),
        };
        let summarizer = Summarizer::new(Box::new(Echo), "English", 1000);
        let entries = vec![
            InboxEntry::new("1", "one", "2024-03-07T10:00:00:000+08:00"),
            InboxEntry::new("2", "two", "2024-03-06T10:00:00:000+08:00"),
            InboxEntry::new("3", "three", "2024-03-05T10:00:00:000+08:00"),
        ];

        let start = std::time::Instant::now();
        let got = summarize_entries(&entries, &exporter, &summarizer, ExportFormat::Md, delay);

        assert_eq!(got.len(), 3);
        assert!(start.elapsed() >= delay * 2);
        let calls = exporter.calls.into_inner();
        assert!(calls[0] - start < delay);
    }
}
