//! Daily JSON-lines log files.
//!
//! One file per UTC day, `app-YYYY-MM-DD.log`, one JSON object per line,
//! append-only. The directory is created on first write.

use chrono::{DateTime, NaiveDate, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::observability::record::LogRecord;

pub struct DailyLogFile {
    dir: PathBuf,
    // Serialises appends so concurrent lines never interleave.
    write_lock: Mutex<()>,
}

impl DailyLogFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(file_name_for(date))
    }

    pub fn path_for_timestamp(&self, timestamp: &DateTime<Utc>) -> PathBuf {
        self.path_for(timestamp.date_naive())
    }

    /// Append one record to the file for the record's UTC date.
    pub fn append(&self, record: &LogRecord) -> io::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for_timestamp(&record.timestamp))?;
        file.write_all(line.as_bytes())
    }

    /// Read up to `limit` of the most recent lines of a day's file.
    ///
    /// A missing file yields no lines; lines that are not JSON are skipped.
    pub fn tail(&self, date: NaiveDate, limit: usize) -> io::Result<Vec<serde_json::Value>> {
        let content = match fs::read_to_string(self.path_for(date)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(limit);
        Ok(lines[start..]
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    /// Remove `.log` files whose modification time is older than `max_age`.
    ///
    /// Returns the removed paths. Files that cannot be inspected or removed
    /// are reported and skipped; only an unreadable directory is an error.
    pub fn remove_older_than(&self, max_age: Duration) -> io::Result<Vec<PathBuf>> {
        let now = SystemTime::now();
        let mut removed = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("log") {
                continue;
            }

            let modified = match entry.metadata().and_then(|m| {
                if m.is_file() {
                    m.modified()
                } else {
                    Err(io::Error::other("not a regular file"))
                }
            }) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::debug!(path = ?path, error = %e, "Skipping log entry");
                    continue;
                }
            };

            let age = now.duration_since(modified).unwrap_or_default();
            if age <= max_age {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => removed.push(path),
                Err(e) => tracing::error!(path = ?path, error = %e, "Failed to remove old log file"),
            }
        }

        Ok(removed)
    }
}

pub fn file_name_for(date: NaiveDate) -> String {
    format!("app-{}.log", date.format("%Y-%m-%d"))
}
