//! Write-Ahead Log (WAL) for dose persistence.
//!
//! Doses are appended to a JSONL (JSON Lines) file with file locking to
//! ensure safe concurrent access from the CLI and any future frontends.

use crate::{DoseRecord, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Dose sink trait for persisting dose records
pub trait DoseSink {
    fn append(&mut self, dose: &DoseRecord) -> Result<()>;
}

/// JSONL-based dose sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl DoseSink for JsonlSink {
    fn append(&mut self, dose: &DoseRecord) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // Exclusive lock; released when the file handle drops
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(dose)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended dose {} to WAL", dose.id);
        Ok(())
    }
}

/// Read all dose records from a WAL file.
///
/// Corrupt lines are skipped with a warning rather than failing the whole
/// read; a partial history is more useful than none.
pub fn read_doses(path: &Path) -> Result<Vec<DoseRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut doses = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<DoseRecord>(&line) {
            Ok(dose) => doses.push(dose),
            Err(e) => {
                tracing::warn!("Failed to parse dose at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} doses from WAL", doses.len());
    Ok(doses)
}
