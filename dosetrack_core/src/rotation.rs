//! Injection-site recommendation engine.
//!
//! Picks the next site via a staged filter-and-score pipeline:
//! 1. Empty history -> modality default site
//! 2. Restrict to the least-used body part (SubQ prefers the belly when tied)
//! 3. Exclude the side injected last, with progressively weaker fallbacks
//! 4. Time-weighted usage scoring, lowest score wins
//!
//! Every stage has a defined fallback, so the function is total: it always
//! returns a member of the modality's catalog. History entries whose site id
//! is not in the catalog are ignored at every stage.

use crate::catalog::{default_site, site_by_id, sites_for};
use crate::types::{BodyPart, InjectionEvent, Modality, Site, SiteId};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Recommend the next injection site for a modality.
///
/// `history` must be ordered most-recent-first; `now` is threaded explicitly
/// so the result is deterministic and testable.
pub fn recommend_next(
    modality: Modality,
    history: &[InjectionEvent],
    now: DateTime<Utc>,
) -> SiteId {
    let catalog = sites_for(modality);

    if history.is_empty() {
        tracing::debug!("Empty history, recommending default site for {:?}", modality);
        return default_site(modality).id;
    }

    let mut candidates: Vec<&Site> = catalog.iter().collect();

    // Stage 2: body-part balancing
    if let Some(part) = least_used_body_part(modality, history) {
        tracing::debug!("Balancing toward least-used body part {:?}", part);
        let filtered: Vec<&Site> = candidates
            .iter()
            .copied()
            .filter(|s| s.body_part == part)
            .collect();
        if !filtered.is_empty() {
            candidates = filtered;
        }
    }

    // Stage 3: laterality exclusion relative to the most recent injection
    if let Some(last) = site_by_id(modality, &history[0].site) {
        let opposite: Vec<&Site> = candidates
            .iter()
            .copied()
            .filter(|s| s.laterality != last.laterality)
            .collect();

        if !opposite.is_empty() {
            candidates = opposite;
        } else {
            // Weaker fallback: keep the body-part restriction but only
            // exclude the exact site used last
            let minus_last: Vec<&Site> = candidates
                .iter()
                .copied()
                .filter(|s| s.id != last.id)
                .collect();
            candidates = if !minus_last.is_empty() {
                minus_last
            } else {
                catalog.iter().filter(|s| s.id != last.id).collect()
            };
            tracing::debug!(
                "Laterality exclusion emptied candidates, fell back to {} sites",
                candidates.len()
            );
        }
    }

    // Stages 4-5: time-weighted scoring, lowest (score, last-used) wins.
    // A never-used site sorts before any used one.
    let mut scored: Vec<(&Site, f64, DateTime<Utc>)> = candidates
        .iter()
        .map(|&site| {
            (
                site,
                usage_score(site, history, now),
                last_used(site, history),
            )
        })
        .collect();

    scored.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.2.cmp(&b.2))
    });

    match scored.first() {
        Some((site, score, _)) => {
            tracing::debug!("Recommending {} (score {:.3})", site.id, score);
            site.id
        }
        None => default_site(modality).id,
    }
}

/// Time-weighted usage score: each history entry at the site contributes
/// `1 / (whole days ago + 1)`. Same-day use counts 1.0, yesterday 0.5, etc.
/// Lower means less recently and less frequently used.
pub fn usage_score(site: &Site, history: &[InjectionEvent], now: DateTime<Utc>) -> f64 {
    history
        .iter()
        .filter(|e| e.site == site.id)
        .map(|e| {
            let days = (now - e.timestamp).num_days().max(0);
            1.0 / (days as f64 + 1.0)
        })
        .sum()
}

/// Most recent use of a site, or the earliest representable instant when the
/// site never appears in history (so unused sites win score ties).
fn last_used(site: &Site, history: &[InjectionEvent]) -> DateTime<Utc> {
    history
        .iter()
        .filter(|e| e.site == site.id)
        .map(|e| e.timestamp)
        .max()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Body part with the fewest injections across history, or None when the
/// catalog has no body-part distinction to balance.
///
/// Ties resolve to the first minimum-count part in catalog declaration
/// order, except that the subcutaneous modality prefers the belly whenever
/// it is among the least used (the belly is the rotation anchor).
fn least_used_body_part(modality: Modality, history: &[InjectionEvent]) -> Option<BodyPart> {
    let catalog = sites_for(modality);

    let mut parts: Vec<BodyPart> = Vec::new();
    for site in catalog {
        if !parts.contains(&site.body_part) {
            parts.push(site.body_part);
        }
    }
    if parts.len() < 2 {
        return None;
    }

    let counts: Vec<(BodyPart, usize)> = parts
        .iter()
        .map(|&part| {
            let count = history
                .iter()
                .filter(|e| {
                    site_by_id(modality, &e.site).map_or(false, |s| s.body_part == part)
                })
                .count();
            (part, count)
        })
        .collect();

    let min = counts.iter().map(|&(_, c)| c).min()?;
    let least: Vec<BodyPart> = counts
        .iter()
        .filter(|&&(_, c)| c == min)
        .map(|&(p, _)| p)
        .collect();

    if modality == Modality::Subcutaneous && least.contains(&BodyPart::Belly) {
        return Some(BodyPart::Belly);
    }

    least.first().copied()
}
