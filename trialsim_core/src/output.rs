//! Output of the trial table and its run manifest.
//!
//! Records are streamed through a [`RecordSink`]. The CSV sink writes into
//! a temp file beside the destination and renames it into place on
//! [`CsvSink::finish`], so a failed run never leaves a half-written table.
//! While a sink is alive it holds an exclusive lock on the output
//! directory's lock file, so concurrent runs into one directory cannot
//! pair a table with another run's manifest.

use crate::{Error, ProtocolCatalog, Result, RunParams, TrialRecord};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Lock file shared by every run writing into the same directory
pub const LOCK_FILE_NAME: &str = ".trialsim.lock";

/// Record sink trait for the simulation output
pub trait RecordSink {
    fn append(&mut self, record: &TrialRecord) -> Result<()>;
}

impl RecordSink for Vec<TrialRecord> {
    fn append(&mut self, record: &TrialRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Default table file name for a run
pub fn output_file_name(params: &RunParams) -> String {
    format!("results_w{}_n{}.csv", params.weeks, params.participants)
}

/// CSV sink with atomic replace of the destination
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<NamedTempFile>,
    rows: usize,
    lock: File,
}

impl CsvSink {
    /// Create a sink that will write `path` once finished.
    ///
    /// Blocks while another sink holds the directory lock.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .open(parent.join(LOCK_FILE_NAME))?;
        lock.lock_exclusive()?;

        // Temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(&parent)?;

        let writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(temp);

        Ok(Self {
            path,
            writer,
            rows: 0,
            lock,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Move the table into place and write its manifest beside it.
    ///
    /// The directory lock is released only after both files are written.
    pub fn finish(self, params: &RunParams, catalog: &ProtocolCatalog) -> Result<RunManifest> {
        let CsvSink {
            path,
            mut writer,
            rows,
            lock,
        } = self;

        writer.flush()?;
        let temp = writer
            .into_inner()
            .map_err(|e| Error::Output(format!("failed to flush CSV writer: {}", e)))?;

        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;
        tracing::info!("Wrote {} records to {:?}", rows, path);

        let manifest = RunManifest::new(params, catalog, rows, &path);
        manifest.save(&RunManifest::path_for(&path))?;

        lock.unlock()?;
        Ok(manifest)
    }
}

impl RecordSink for CsvSink {
    fn append(&mut self, record: &TrialRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.rows += 1;
        Ok(())
    }
}

/// Provenance written next to each output table
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub params: RunParams,
    /// Protocols the run actually used, after overrides and energy matching
    pub protocols: ProtocolCatalog,
    pub rows: usize,
    pub table: PathBuf,
}

impl RunManifest {
    pub fn new(params: &RunParams, catalog: &ProtocolCatalog, rows: usize, table: &Path) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            params: params.clone(),
            protocols: catalog.for_run(params).into_owned(),
            rows,
            table: table.to_path_buf(),
        }
    }

    /// Manifest path for a table: `results_w8_n100.csv` → `results_w8_n100.json`
    pub fn path_for(table: &Path) -> PathBuf {
        table.with_extension("json")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        let contents = serde_json::to_string_pretty(self)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        tracing::debug!("Saved run manifest to {:?}", path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
