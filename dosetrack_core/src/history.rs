//! Dose history loading and the injection-event accessor.
//!
//! The rotation engine never touches storage: this module materializes an
//! ordered, most-recent-first list of [`InjectionEvent`]s for one modality,
//! merged from the WAL and the CSV archive and capped at a lookback count.

use crate::{DoseRecord, InjectionEvent, Modality, Result};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// Lookback cap for recommendation and interval checks.
pub const RECOMMENDATION_LOOKBACK: usize = 20;

/// Lookback cap for quality scoring and usage statistics.
pub const STATISTICS_LOOKBACK: usize = 50;

/// CSV row format for reading archived doses
#[derive(Debug, Deserialize)]
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

impl TryFrom<CsvRow> for DoseRecord {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let injected_at = DateTime::parse_from_rfc3339(&row.injected_at)
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let modality = match row.modality.as_str() {
            "intramuscular" => Modality::Intramuscular,
            "subcutaneous" => Modality::Subcutaneous,
            other => {
                return Err(crate::Error::Other(format!("Unknown modality: {}", other)))
            }
        };

        Ok(DoseRecord {
            id,
            compound: row.compound,
            amount: row.amount,
            unit: row.unit,
            modality,
            site: row.site.filter(|s| !s.is_empty()),
            injected_at,
            notes: row.notes.filter(|s| !s.is_empty()),
        })
    }
}

/// Load all doses from WAL and CSV, newest first, deduplicated by id.
pub fn load_all_doses(wal_path: &Path, csv_path: &Path) -> Result<Vec<DoseRecord>> {
    let mut doses = Vec::new();
    let mut seen_ids = HashSet::new();

    if wal_path.exists() {
        for dose in crate::wal::read_doses(wal_path)? {
            seen_ids.insert(dose.id);
            doses.push(dose);
        }
        tracing::debug!("Loaded {} doses from WAL", doses.len());
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for dose in load_doses_from_csv(csv_path)? {
            if !seen_ids.contains(&dose.id) {
                seen_ids.insert(dose.id);
                doses.push(dose);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} doses from CSV", csv_count);
    }

    doses.sort_by(|a, b| b.injected_at.cmp(&a.injected_at));

    Ok(doses)
}

/// Materialize the injection-event history the rotation engine consumes.
///
/// Filters to the requested modality and to doses that actually carry a
/// site, keeps most-recent-first order, and truncates to `lookback` events.
pub fn load_recent_events(
    wal_path: &Path,
    csv_path: &Path,
    modality: Modality,
    lookback: usize,
) -> Result<Vec<InjectionEvent>> {
    let doses = load_all_doses(wal_path, csv_path)?;

    let mut events: Vec<InjectionEvent> = doses
        .into_iter()
        .filter(|d| d.modality == modality)
        .filter_map(|d| d.site.map(|site| InjectionEvent::new(site, d.injected_at)))
        .collect();

    events.truncate(lookback);

    tracing::info!(
        "Loaded {} injection events for {:?} (lookback {})",
        events.len(),
        modality,
        lookback
    );

    Ok(events)
}

/// Load all doses from a CSV file, skipping rows that fail to parse
fn load_doses_from_csv(path: &Path) -> Result<Vec<DoseRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut doses = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match DoseRecord::try_from(row) {
                Ok(dose) => doses.push(dose),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(doses)
}
