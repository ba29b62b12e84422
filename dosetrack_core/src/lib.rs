#![forbid(unsafe_code)]

//! Core domain model and business logic for the Dosetrack system.
//!
//! This crate provides:
//! - Domain types (modalities, sites, doses, injection events)
//! - Static site catalogs per modality
//! - Injection-site rotation engine (recommendation, interval guard,
//!   quality scoring)
//! - Persistence (WAL, CSV rollup) and history loading
//!
//! The rotation engine is pure and stateless: every entry point takes its
//! full input, including `now`, as arguments and holds no shared state.

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod wal;
pub mod csv_rollup;
pub mod history;
pub mod rotation;
pub mod interval;
pub mod quality;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{default_site, site_by_id, sites_for};
pub use config::Config;
pub use wal::{DoseSink, JsonlSink};
pub use history::{
    load_all_doses, load_recent_events, RECOMMENDATION_LOOKBACK, STATISTICS_LOOKBACK,
};
pub use rotation::recommend_next;
pub use interval::{available_sites, blocked_sites, check_interval};
pub use quality::{score_rotation, MIN_HISTORY_FOR_SCORING};
