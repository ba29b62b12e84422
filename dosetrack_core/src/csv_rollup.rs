//! CSV rollup functionality for archiving WAL doses.
//!
//! The CSV file is both the long-term archive and the user-facing export;
//! rollup is atomic so a crash mid-way cannot lose doses.

use crate::{DoseRecord, Modality, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    compound: String,
    amount: f64,
    unit: String,
    modality: String,
    site: Option<String>,
    injected_at: String,
    notes: Option<String>,
}

impl From<&DoseRecord> for CsvRow {
    fn from(dose: &DoseRecord) -> Self {
        CsvRow {
            id: dose.id.to_string(),
            compound: dose.compound.clone(),
            amount: dose.amount,
            unit: dose.unit.clone(),
            modality: match dose.modality {
                Modality::Intramuscular => "intramuscular".into(),
                Modality::Subcutaneous => "subcutaneous".into(),
            },
            site: dose.site.clone(),
            injected_at: dose.injected_at.to_rfc3339(),
            notes: dose.notes.clone(),
        }
    }
}

/// Roll up WAL doses into CSV and archive the WAL atomically
///
/// This function:
/// 1. Reads all doses from the WAL
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the WAL to .processed
/// 5. Returns the number of doses processed
///
/// # Safety
/// - CSV is fsynced before WAL is renamed
/// - WAL is renamed (not deleted) to allow manual recovery if needed
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let doses = crate::wal::read_doses(wal_path)?;

    if doses.is_empty() {
        tracing::info!("No doses in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Only write headers when the file is brand new
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for dose in &doses {
        let row = CsvRow::from(dose);
        writer.serialize(row)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} doses to CSV", doses.len());

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(doses.len())
}

/// Clean up old processed WAL files
///
/// This removes all .wal.processed files in the given directory.
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed WAL: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::DoseSink;
    use chrono::Utc;
    use std::fs::File;
    use uuid::Uuid;

    fn create_test_dose(compound: &str) -> DoseRecord {
        DoseRecord {
            id: Uuid::new_v4(),
            compound: compound.into(),
            amount: 250.0,
            unit: "mg".into(),
            modality: Modality::Intramuscular,
            site: Some("glute_left".into()),
            injected_at: Utc::now(),
            notes: Some("test".into()),
        }
    }

    #[test]
    fn test_wal_to_csv_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("doses.wal");
        let csv_path = temp_dir.path().join("doses.csv");

        let mut sink = crate::wal::JsonlSink::new(&wal_path);
        for i in 0..3 {
            sink.append(&create_test_dose(&format!("compound_{}", i)))
                .unwrap();
        }

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 3);

        assert!(csv_path.exists());
        assert!(!wal_path.exists());
        assert!(wal_path.with_extension("wal.processed").exists());
    }

    #[test]
    fn test_wal_to_csv_appends() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("doses.wal");
        let csv_path = temp_dir.path().join("doses.csv");

        let mut sink = crate::wal::JsonlSink::new(&wal_path);
        sink.append(&create_test_dose("first")).unwrap();
        let count1 = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count1, 1);

        let mut sink = crate::wal::JsonlSink::new(&wal_path);
        sink.append(&create_test_dose("second")).unwrap();
        let count2 = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count2, 1);

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        let record_count = reader.into_records().count();
        assert_eq!(record_count, 2);
    }

    #[test]
    fn test_empty_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("empty.wal");
        let csv_path = temp_dir.path().join("doses.csv");

        File::create(&wal_path).unwrap();

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_cleanup_processed_wals() {
        let temp_dir = tempfile::tempdir().unwrap();

        File::create(temp_dir.path().join("d1.wal.processed")).unwrap();
        File::create(temp_dir.path().join("d2.wal.processed")).unwrap();
        File::create(temp_dir.path().join("keep.wal")).unwrap();

        let count = cleanup_processed_wals(temp_dir.path()).unwrap();
        assert_eq!(count, 2);

        assert!(!temp_dir.path().join("d1.wal.processed").exists());
        assert!(!temp_dir.path().join("d2.wal.processed").exists());
        assert!(temp_dir.path().join("keep.wal").exists());
    }
}
