//! Debug artifacts written under `logs/` for a run.
//!
//! Three files share a timestamp prefix: an NDJSON event log, the index
//! failure report and a handful of sample documents.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::loader::ImportReport;
use product_indexer_shared::ProductDocument;

/// Sample documents kept for inspection.
pub const MAX_SAMPLE_DOCUMENTS: usize = 5;

/// Raw per-document failures kept for the error report. The histogram is
/// always complete.
pub const MAX_REPORTED_FAILURES: usize = 1000;

/// Writer for a run's debug artifacts.
pub struct DebugReporter {
    dir: PathBuf,
    prefix: String,
    log: File,
    samples: Vec<ProductDocument>,
}

impl DebugReporter {
    /// Create the output directory and open the event log.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let prefix = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ").to_string();
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(format!("{}-run.ndjson", prefix)))?;

        info!(dir = %dir.display(), prefix = %prefix, "Writing debug artifacts");

        Ok(Self {
            dir,
            prefix,
            log,
            samples: Vec::new(),
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.path("run.ndjson")
    }

    pub fn error_report_path(&self) -> PathBuf {
        self.path("index-errors.json")
    }

    pub fn samples_path(&self) -> PathBuf {
        self.path("sample-documents.json")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}-{}", self.prefix, name))
    }

    /// Append one event to the NDJSON log.
    ///
    /// `fields` is merged into the line when it is an object.
    pub fn log_event(&mut self, event: &str, fields: Value) -> io::Result<()> {
        let mut line = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event,
        });
        if let (Some(line), Value::Object(fields)) = (line.as_object_mut(), fields) {
            line.extend(fields);
        }

        serde_json::to_writer(&mut self.log, &line)?;
        self.log.write_all(b"\n")
    }

    /// Keep documents until [`MAX_SAMPLE_DOCUMENTS`] have been collected.
    pub fn add_samples(&mut self, documents: &[ProductDocument]) {
        let room = MAX_SAMPLE_DOCUMENTS.saturating_sub(self.samples.len());
        self.samples.extend(documents.iter().take(room).cloned());
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Write the failure report: `{errorAnalysis, errors, indexed, failed}`.
    pub fn write_error_report(&self, report: &ImportReport) -> io::Result<PathBuf> {
        let path = self.error_report_path();
        write_json(&path, report)?;
        Ok(path)
    }

    /// Write the collected samples, if any.
    pub fn write_samples(&self) -> io::Result<Option<PathBuf>> {
        if self.samples.is_empty() {
            return Ok(None);
        }
        let path = self.samples_path();
        write_json(&path, &self.samples)?;
        Ok(Some(path))
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body)
}
