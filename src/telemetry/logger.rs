//! # Telemetry Logger
//!
//! Writes telemetry records as JSON Lines with file rotation.
//!
//! Each file holds at most `max_records_per_file` records; once full a new
//! file is opened and only the newest `max_files_to_keep` files are kept.
//! File names sort chronologically:
//! `telemetry_<YYYYmmdd_HHMMSS>_<seq>.jsonl`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::packet::TelemetryPacket;
use crate::error::Result;
use crate::protocol::types::MotorSetpoints;

const FILE_PREFIX: &str = "telemetry_";
const FILE_SUFFIX: &str = ".jsonl";

/// One logged control cycle.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub cycle: u64,
    pub packet: TelemetryPacket,
    pub setpoints: MotorSetpoints,
}

impl TelemetryRecord {
    /// Record stamped with the current time
    #[must_use]
    pub fn now(cycle: u64, packet: TelemetryPacket, setpoints: MotorSetpoints) -> Self {
        Self {
            timestamp: Utc::now(),
            cycle,
            packet,
            setpoints,
        }
    }
}

/// Rotating JSONL writer.
#[derive(Debug)]
pub struct TelemetryLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    file_seq: u32,
}

impl TelemetryLogger {
    /// Creates a logger writing into `dir` (created if missing).
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(dir: P, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!("Telemetry log directory: {}", dir.display());
        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            file_seq: 0,
        })
    }

    /// Append one record, rotating files as needed.
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be encoded or written.
    pub fn log(&mut self, record: &TelemetryRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            self.records_in_file += 1;
        }
        Ok(())
    }

    /// Directory the logger writes into
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:04}{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.file_seq,
            FILE_SUFFIX
        );
        self.file_seq = self.file_seq.wrapping_add(1);

        let path = self.dir.join(name);
        debug!("Opening telemetry log {}", path.display());
        self.writer = Some(BufWriter::new(File::create(&path)?));
        self.records_in_file = 0;

        self.prune()
    }

    fn prune(&self) -> Result<()> {
        let mut files = self.log_files()?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }
        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for old in &files[..excess] {
            if let Err(e) = fs::remove_file(old) {
                warn!("Failed to remove old telemetry log {}: {}", old.display(), e);
            }
        }
        Ok(())
    }

    fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_log = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_SUFFIX));
            if is_log {
                files.push(path);
            }
        }
        Ok(files)
    }
}
