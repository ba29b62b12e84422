//! Rotation-quality scoring.
//!
//! Combines four weighted factors into a 0-100 composite:
//! - Site diversity (0.30): how much of the catalog gets used
//! - Side alternation (0.25): left/right switching between injections
//! - Body-part distribution (0.25): evenness of use across body parts
//! - Recovery time (0.20): average day gap before a site is reused
//!
//! Scoring needs at least [`MIN_HISTORY_FOR_SCORING`] events; below that the
//! result is an explicit `Insufficient` rating rather than an error.

use crate::catalog::{site_by_id, sites_for};
use crate::types::{
    BodyPart, InjectionEvent, Laterality, Modality, QualityFactor, QualityRating, QualityResult,
};
use std::collections::HashMap;

/// Fewest history events that make a rotation score meaningful.
pub const MIN_HISTORY_FOR_SCORING: usize = 3;

const DIVERSITY_WEIGHT: f64 = 0.30;
const ALTERNATION_WEIGHT: f64 = 0.25;
const DISTRIBUTION_WEIGHT: f64 = 0.25;
const RECOVERY_WEIGHT: f64 = 0.20;

/// A 7-day average gap between reuses of the same site earns a full
/// recovery-time score.
const FULL_RECOVERY_GAP_DAYS: f64 = 7.0;

/// Score how well the user is rotating injection sites.
///
/// `history` must be ordered most-recent-first. Deterministic for identical
/// inputs; entries at unknown site ids are ignored.
pub fn score_rotation(modality: Modality, history: &[InjectionEvent]) -> QualityResult {
    if history.len() < MIN_HISTORY_FOR_SCORING {
        tracing::debug!(
            "Only {} events, need {} for a rotation score",
            history.len(),
            MIN_HISTORY_FOR_SCORING
        );
        return QualityResult {
            score: 0,
            rating: QualityRating::Insufficient,
            factors: Vec::new(),
        };
    }

    let factors = vec![
        factor("Site Diversity", diversity_score(modality, history), DIVERSITY_WEIGHT),
        factor(
            "Side Alternation",
            alternation_score(modality, history),
            ALTERNATION_WEIGHT,
        ),
        factor(
            "Body-Part Distribution",
            distribution_score(modality, history),
            DISTRIBUTION_WEIGHT,
        ),
        factor("Recovery Time", recovery_score(modality, history), RECOVERY_WEIGHT),
    ];

    let weighted: f64 = factors.iter().map(|f| f.score * f.weight).sum();
    let score = weighted.round().clamp(0.0, 100.0) as u8;

    QualityResult {
        score,
        rating: rating_for(score),
        factors,
    }
}

fn factor(name: &'static str, score: f64, weight: f64) -> QualityFactor {
    QualityFactor {
        name,
        score,
        weight,
        feedback: feedback_for(name, score),
    }
}

fn rating_for(score: u8) -> QualityRating {
    match score {
        85..=100 => QualityRating::Excellent,
        70..=84 => QualityRating::Good,
        50..=69 => QualityRating::Fair,
        _ => QualityRating::Poor,
    }
}

/// Fraction of the catalog used, scaled by 1.5 and capped at 100. Using two
/// thirds of all sites already maxes the factor; full coverage is not
/// required since some sites are naturally favored anatomically.
fn diversity_score(modality: Modality, history: &[InjectionEvent]) -> f64 {
    let total = sites_for(modality).len();
    if total == 0 {
        return 0.0;
    }

    let mut used: Vec<&str> = Vec::new();
    for event in history {
        if site_by_id(modality, &event.site).is_some() && !used.contains(&event.site.as_str()) {
            used.push(&event.site);
        }
    }

    let fraction = used.len() as f64 / total as f64;
    (fraction * 100.0 * 1.5).min(100.0)
}

/// Percentage of consecutive injection pairs that switched sides. Pairs
/// involving an unknown site are not usable; fewer than 2 usable pairs is
/// no evidence of poor alternation and scores 100.
fn alternation_score(modality: Modality, history: &[InjectionEvent]) -> f64 {
    let lateralities: Vec<Laterality> = history
        .iter()
        .filter_map(|e| site_by_id(modality, &e.site).map(|s| s.laterality))
        .collect();

    let pairs = lateralities.windows(2).count();
    if pairs < 2 {
        return 100.0;
    }

    let alternated = lateralities.windows(2).filter(|w| w[0] != w[1]).count();
    alternated as f64 / pairs as f64 * 100.0
}

/// Evenness of use across the body parts actually used, via the coefficient
/// of variation of their counts. Perfectly even use scores 100.
fn distribution_score(modality: Modality, history: &[InjectionEvent]) -> f64 {
    let mut counts: HashMap<BodyPart, usize> = HashMap::new();
    for event in history {
        if let Some(site) = site_by_id(modality, &event.site) {
            *counts.entry(site.body_part).or_insert(0) += 1;
        }
    }

    if counts.is_empty() {
        return 100.0;
    }

    let values: Vec<f64> = counts.values().map(|&c| c as f64).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let cv = variance.sqrt() / mean;

    (100.0 - cv * 100.0).max(0.0)
}

/// Average day gap between reuses of the same site, against a 7-day target.
/// No reuse at all is treated optimistically and scores 100.
fn recovery_score(modality: Modality, history: &[InjectionEvent]) -> f64 {
    let mut last_seen: HashMap<&str, chrono::DateTime<chrono::Utc>> = HashMap::new();
    let mut gaps: Vec<f64> = Vec::new();

    // Walk oldest-to-newest; history arrives most-recent-first
    for event in history.iter().rev() {
        if site_by_id(modality, &event.site).is_none() {
            continue;
        }
        if let Some(prev) = last_seen.get(event.site.as_str()) {
            let gap = (event.timestamp - *prev).num_days().max(0);
            gaps.push(gap as f64);
        }
        last_seen.insert(&event.site, event.timestamp);
    }

    if gaps.is_empty() {
        return 100.0;
    }

    let average = gaps.iter().sum::<f64>() / gaps.len() as f64;
    (average / FULL_RECOVERY_GAP_DAYS * 100.0).min(100.0)
}

/// Static, presentation-facing feedback per factor, keyed by score band.
fn feedback_for(name: &'static str, score: f64) -> &'static str {
    let band = if score >= 80.0 {
        Band::Positive
    } else if score >= 50.0 {
        Band::Neutral
    } else {
        Band::Corrective
    };

    match (name, band) {
        ("Site Diversity", Band::Positive) => "You're using a wide range of sites.",
        ("Site Diversity", Band::Neutral) => "Decent variety; a few sites are going unused.",
        ("Site Diversity", Band::Corrective) => {
            "Try working more of the available sites into your rotation."
        }
        ("Side Alternation", Band::Positive) => "Great left/right alternation.",
        ("Side Alternation", Band::Neutral) => "You alternate sides some of the time.",
        ("Side Alternation", Band::Corrective) => {
            "Switch sides between injections to spread the load."
        }
        ("Body-Part Distribution", Band::Positive) => "Usage is well balanced across body parts.",
        ("Body-Part Distribution", Band::Neutral) => {
            "Some body parts are seeing more use than others."
        }
        ("Body-Part Distribution", Band::Corrective) => {
            "One body part is doing most of the work; rotate to the others."
        }
        ("Recovery Time", Band::Positive) => "Sites are getting plenty of time to recover.",
        ("Recovery Time", Band::Neutral) => "Recovery gaps are acceptable but could be longer.",
        ("Recovery Time", Band::Corrective) => {
            "Sites are being reused too quickly; give them more days off."
        }
        _ => "",
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Band {
    Positive,
    Neutral,
    Corrective,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    /// Build a most-recent-first history from (site, days_ago) pairs.
    fn history(entries: &[(&str, i64)]) -> Vec<InjectionEvent> {
        entries
            .iter()
            .map(|&(site, days)| InjectionEvent::new(site, t0() - Duration::days(days)))
            .collect()
    }

    #[test]
    fn test_insufficient_history() {
        let events = history(&[("glute_left", 1), ("glute_right", 2)]);
        let result = score_rotation(Modality::Intramuscular, &events);
        assert_eq!(result.score, 0);
        assert_eq!(result.rating, QualityRating::Insufficient);
        assert!(result.factors.is_empty());
    }

    #[test]
    fn test_empty_history_is_insufficient() {
        let result = score_rotation(Modality::Subcutaneous, &[]);
        assert_eq!(result.rating, QualityRating::Insufficient);
    }

    #[test]
    fn test_perfect_alternation_scores_100() {
        // Four belly injections alternating left/right
        let events = history(&[
            ("belly_upper_left", 1),
            ("belly_upper_right", 2),
            ("belly_lower_left", 3),
            ("belly_lower_right", 4),
        ]);
        let score = alternation_score(Modality::Subcutaneous, &events);
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_repeated_site_scores_poorly() {
        // Five daily injections at the same left glute
        let events = history(&[
            ("glute_left", 0),
            ("glute_left", 1),
            ("glute_left", 2),
            ("glute_left", 3),
            ("glute_left", 4),
        ]);
        let result = score_rotation(Modality::Intramuscular, &events);

        let alternation = &result.factors[1];
        assert_eq!(alternation.name, "Side Alternation");
        assert!((alternation.score - 0.0).abs() < 1e-9);

        let diversity = &result.factors[0];
        assert!(diversity.score < 30.0);

        assert!(matches!(
            result.rating,
            QualityRating::Poor | QualityRating::Fair
        ));
    }

    #[test]
    fn test_diversity_caps_at_two_thirds_coverage() {
        // 4 of 6 IM sites used: 66.7% * 1.5 >= 100
        let events = history(&[
            ("glute_left", 1),
            ("delt_right", 2),
            ("thigh_left", 3),
            ("glute_right", 4),
        ]);
        let score = diversity_score(Modality::Intramuscular, &events);
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_diversity_in_bounds() {
        let events = history(&[("glute_left", 1), ("glute_left", 2), ("glute_left", 3)]);
        let score = diversity_score(Modality::Intramuscular, &events);
        assert!((0.0..=100.0).contains(&score));
        // One of six sites: 16.7% * 1.5 = 25
        assert!((score - 25.0).abs() < 0.1);
    }

    #[test]
    fn test_even_distribution_scores_100() {
        let events = history(&[
            ("glute_left", 1),
            ("delt_right", 2),
            ("thigh_left", 3),
            ("glute_right", 4),
            ("delt_left", 5),
            ("thigh_right", 6),
        ]);
        let score = distribution_score(Modality::Intramuscular, &events);
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_reuse_recovery_scores_100() {
        let events = history(&[("glute_left", 1), ("delt_right", 2), ("thigh_left", 3)]);
        let score = recovery_score(Modality::Intramuscular, &events);
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_recovery_gap_of_seven_days_is_full_score() {
        let events = history(&[("glute_left", 0), ("delt_right", 3), ("glute_left", 7)]);
        let score = recovery_score(Modality::Intramuscular, &events);
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_reuse_gap_scores_low() {
        // Reused after a single day: 1/7 of target
        let events = history(&[("glute_left", 0), ("glute_left", 1), ("delt_right", 2)]);
        let score = recovery_score(Modality::Intramuscular, &events);
        assert!((score - (1.0 / 7.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_sites_are_skipped() {
        let events = history(&[
            ("glute_left", 1),
            ("not_a_site", 2),
            ("delt_right", 3),
            ("also_wrong", 4),
        ]);
        let result = score_rotation(Modality::Intramuscular, &events);
        // Two known events, one usable pair: alternation defaults to 100
        assert!((result.factors[1].score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_scoring() {
        let events = history(&[
            ("belly_upper_left", 1),
            ("flank_right", 3),
            ("belly_lower_right", 5),
            ("thigh_outer_left", 7),
        ]);
        let a = score_rotation(Modality::Subcutaneous, &events);
        let b = score_rotation(Modality::Subcutaneous, &events);
        assert_eq!(a.score, b.score);
        assert_eq!(a.rating, b.rating);
        for (fa, fb) in a.factors.iter().zip(b.factors.iter()) {
            assert_eq!(fa.score, fb.score);
            assert_eq!(fa.feedback, fb.feedback);
        }
    }

    #[test]
    fn test_feedback_bands() {
        assert_eq!(
            feedback_for("Side Alternation", 95.0),
            "Great left/right alternation."
        );
        assert_eq!(
            feedback_for("Side Alternation", 60.0),
            "You alternate sides some of the time."
        );
        assert_eq!(
            feedback_for("Side Alternation", 10.0),
            "Switch sides between injections to spread the load."
        );
    }

    #[test]
    fn test_rating_buckets() {
        assert_eq!(rating_for(100), QualityRating::Excellent);
        assert_eq!(rating_for(85), QualityRating::Excellent);
        assert_eq!(rating_for(84), QualityRating::Good);
        assert_eq!(rating_for(70), QualityRating::Good);
        assert_eq!(rating_for(69), QualityRating::Fair);
        assert_eq!(rating_for(50), QualityRating::Fair);
        assert_eq!(rating_for(49), QualityRating::Poor);
        assert_eq!(rating_for(0), QualityRating::Poor);
    }
}
