use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::domain::entry::RunReport;
use crate::error::PersistError;
use crate::store::repo::ArtifactStore;

pub const REPORT_FILE: &str = "export_records.json";

/// Flat files under one output directory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open `root`, creating it if needed.
    pub fn open(root: &Path) -> Result<Self, PersistError> {
        fs::create_dir_all(root).map_err(|source| PersistError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write(&self, name: &str, contents: &str) -> Result<PathBuf, PersistError> {
        let path = self.root.join(name);
        fs::write(&path, contents).map_err(|source| PersistError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn file_stem(id: &str) -> String {
    id.replace(['/', '\\'], "_")
}

impl ArtifactStore for FsStore {
    fn save_html(&self, id: &str, html: &str) -> Result<PathBuf, PersistError> {
        self.write(&format!("{}.html", file_stem(id)), html)
    }

    fn save_report(&self, report: &RunReport) -> Result<PathBuf, PersistError> {
        let s = serde_json::to_string_pretty(report)?;
        self.write(REPORT_FILE, &s)
    }

    fn save_digest(&self, date: NaiveDate, markdown: &str) -> Result<PathBuf, PersistError> {
        self.write(&format!("{}.md", date.format("%Y-%m-%d")), markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out").join("nested");
        FsStore::open(&root).unwrap();
        let store = FsStore::open(&root).unwrap();
        assert!(store.root().is_dir());
    }

    #[test]
    fn html_file_named_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let p = store.save_html("12/34", "<p>é</p>").unwrap();
        assert_eq!(p, dir.path().join("12_34.html"));
        assert_eq!(fs::read_to_string(p).unwrap(), "<p>é</p>");
    }

    #[test]
    fn report_is_pretty_unescaped_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let report = RunReport {
            total_items: 0,
            successful_exports: 0,
            exports: vec![],
        };
        let p = store.save_report(&report).unwrap();
        let s = fs::read_to_string(&p).unwrap();
        assert!(s.contains("\n  \"total_items\": 0"));
        assert_eq!(p.file_name().unwrap(), REPORT_FILE);
    }

    #[test]
    fn digest_named_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let p = store.save_digest(date, "# x\n").unwrap();
        assert_eq!(p, dir.path().join("2024-03-08.md"));
    }
}
