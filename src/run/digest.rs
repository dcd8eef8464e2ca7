use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::domain::entry::{SummaryEntry, sort_newest_first};

/// Result of the export+summarize pipeline.
#[derive(Debug, Clone)]
pub struct Digest {
    pub date: NaiveDate,
    pub total_items: usize,
    pub entries: Vec<SummaryEntry>,
}

impl Digest {
    /// Build a digest; entries are ordered newest first.
    pub fn new(date: NaiveDate, total_items: usize, mut entries: Vec<SummaryEntry>) -> Self {
        sort_newest_first(&mut entries);
        Self {
            date,
            total_items,
            entries,
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Inbox digest {}", self.date.format("%Y-%m-%d"));
        let _ = writeln!(
            out,
            "\nItems in window: {}, summarized: {}\n",
            self.total_items,
            self.entries.len()
        );
        for (i, e) in self.entries.iter().enumerate() {
            let _ = writeln!(out, "## {}. {}\n", i + 1, e.title);
            let _ = writeln!(out, "{}\n", e.summary.trim());
            let _ = writeln!(out, "---\n");
        }
        out
    }
}
