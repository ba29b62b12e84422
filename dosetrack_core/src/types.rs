//! Core domain types for the Dosetrack system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Injection modalities and anatomical sites
//! - Dose records and the injection events derived from them
//! - Interval-guard decisions
//! - Rotation-quality scoring results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Modality and Site Types
// ============================================================================

/// Injection route category. Each modality has its own site catalog and
/// minimum recovery interval.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Intramuscular,
    Subcutaneous,
}

impl Modality {
    /// Minimum hours a site must rest before it can be reused.
    pub fn minimum_recovery_hours(self) -> u32 {
        match self {
            Modality::Intramuscular => 48,
            Modality::Subcutaneous => 24,
        }
    }
}

/// Left/right/center designation of a site, used to enforce side alternation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Laterality {
    Left,
    Right,
    Center,
}

/// Anatomical grouping of sites used for balancing recommendations.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Glute,
    Delt,
    Thigh,
    Belly,
    Flank,
}

impl BodyPart {
    pub fn label(self) -> &'static str {
        match self {
            BodyPart::Glute => "Glute",
            BodyPart::Delt => "Delt",
            BodyPart::Thigh => "Thigh",
            BodyPart::Belly => "Belly",
            BodyPart::Flank => "Flank",
        }
    }
}

/// Stable string key identifying a site within a modality's catalog.
pub type SiteId = &'static str;

/// An immutable catalog entry describing one anatomical injection site.
///
/// Sites are defined at compile time and never created or destroyed at
/// runtime; a site belongs to exactly one modality's catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Site {
    pub id: SiteId,
    pub display_name: &'static str,
    pub body_part: BodyPart,
    pub laterality: Laterality,
}

// ============================================================================
// Dose Record and Injection Event Types
// ============================================================================

/// A recorded dose of a compound, as persisted by the dose log.
///
/// `site` is optional: oral or nasal doses carry no injection site and are
/// invisible to the rotation engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoseRecord {
    pub id: Uuid,
    pub compound: String,
    pub amount: f64,
    pub unit: String,
    pub modality: Modality,
    pub site: Option<String>,
    pub injected_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// A single timestamped injection at a known site.
///
/// The rotation engine only ever reads ordered, most-recent-first slices of
/// these, already filtered to one modality and capped at a lookback count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectionEvent {
    pub site: String,
    pub timestamp: DateTime<Utc>,
}

impl InjectionEvent {
    pub fn new(site: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            site: site.into(),
            timestamp,
        }
    }
}

// ============================================================================
// Interval Guard Types
// ============================================================================

/// Outcome of asking whether a site may be injected now.
///
/// Derived on demand, never stored. `allowed == false` is a normal decision
/// outcome surfaced to the user as a wait-time message, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntervalDecision {
    pub allowed: bool,
    pub site: SiteId,
    pub hours_remaining: Option<u32>,
    pub wait_text: Option<String>,
}

// ============================================================================
// Rotation Quality Types
// ============================================================================

/// Rating bucket for the composite rotation score.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QualityRating {
    Insufficient,
    Poor,
    Fair,
    Good,
    Excellent,
}

/// One of the four weighted factors behind a rotation-quality score.
#[derive(Clone, Debug)]
pub struct QualityFactor {
    pub name: &'static str,
    pub score: f64,
    pub weight: f64,
    pub feedback: &'static str,
}

/// Composite 0-100 rotation-quality result.
#[derive(Clone, Debug)]
pub struct QualityResult {
    pub score: u8,
    pub rating: QualityRating,
    pub factors: Vec<QualityFactor>,
}
