//! Minimum-recovery interval guard.
//!
//! A site must rest for a per-modality minimum (48h intramuscular, 24h
//! subcutaneous) before it can be injected again. A blocked site is a normal
//! decision outcome, not an error; callers surface the wait text to the user.

use crate::catalog::sites_for;
use crate::types::{InjectionEvent, IntervalDecision, Modality, Site, SiteId};
use chrono::{DateTime, Utc};

/// Decide whether `site` may be injected now.
///
/// Scans `history` (most-recent-first, already filtered to the modality) for
/// the most recent use of the site. A site with no recorded use is always
/// allowed.
pub fn check_interval(
    site: SiteId,
    modality: Modality,
    history: &[InjectionEvent],
    now: DateTime<Utc>,
) -> IntervalDecision {
    let minimum = modality.minimum_recovery_hours();

    let last_use = history.iter().find(|e| e.site == site);

    let Some(last) = last_use else {
        return IntervalDecision {
            allowed: true,
            site,
            hours_remaining: None,
            wait_text: None,
        };
    };

    let elapsed = (now - last.timestamp).num_hours().max(0) as u32;

    if elapsed >= minimum {
        IntervalDecision {
            allowed: true,
            site,
            hours_remaining: None,
            wait_text: None,
        }
    } else {
        let remaining = minimum - elapsed;
        tracing::debug!("Site {} blocked for another {}h", site, remaining);
        IntervalDecision {
            allowed: false,
            site,
            hours_remaining: Some(remaining),
            wait_text: Some(format_wait(remaining)),
        }
    }
}

/// Catalog sites currently allowed for injection.
pub fn available_sites(
    modality: Modality,
    history: &[InjectionEvent],
    now: DateTime<Utc>,
) -> Vec<&'static Site> {
    sites_for(modality)
        .iter()
        .filter(|s| check_interval(s.id, modality, history, now).allowed)
        .collect()
}

/// Catalog sites still inside their recovery window, paired with the hours
/// left, soonest-available first.
pub fn blocked_sites(
    modality: Modality,
    history: &[InjectionEvent],
    now: DateTime<Utc>,
) -> Vec<(&'static Site, u32)> {
    let mut blocked: Vec<(&'static Site, u32)> = sites_for(modality)
        .iter()
        .filter_map(|s| {
            let decision = check_interval(s.id, modality, history, now);
            decision.hours_remaining.map(|h| (s, h))
        })
        .collect();

    blocked.sort_by_key(|&(_, hours)| hours);
    blocked
}

/// Human-readable wait duration: hours below a day, otherwise days plus
/// leftover hours, with correct singular forms.
fn format_wait(hours: u32) -> String {
    if hours < 24 {
        return format!("{} hour{}", hours, plural(hours));
    }

    let days = hours / 24;
    let leftover = hours % 24;
    if leftover == 0 {
        format!("{} day{}", days, plural(days))
    } else {
        format!(
            "{} day{} {} hour{}",
            days,
            plural(days),
            leftover,
            plural(leftover)
        )
    }
}

fn plural(n: u32) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InjectionEvent;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn event_hours_ago(site: &str, hours: i64) -> InjectionEvent {
        InjectionEvent::new(site, t0() - Duration::hours(hours))
    }

    #[test]
    fn test_unused_site_is_allowed() {
        let decision = check_interval("glute_left", Modality::Intramuscular, &[], t0());
        assert!(decision.allowed);
        assert_eq!(decision.hours_remaining, None);
        assert_eq!(decision.wait_text, None);
    }

    #[test]
    fn test_blocked_reuse_within_window() {
        // IM minimum is 48h; used 10h ago leaves 38h
        let history = vec![event_hours_ago("glute_left", 10)];
        let decision = check_interval("glute_left", Modality::Intramuscular, &history, t0());
        assert!(!decision.allowed);
        assert_eq!(decision.hours_remaining, Some(38));
        assert_eq!(decision.wait_text.as_deref(), Some("1 day 14 hours"));
    }

    #[test]
    fn test_allowed_at_exact_boundary() {
        let history = vec![event_hours_ago("belly_upper_left", 24)];
        let decision =
            check_interval("belly_upper_left", Modality::Subcutaneous, &history, t0());
        assert!(decision.allowed);

        let history = vec![event_hours_ago("belly_upper_left", 23)];
        let decision =
            check_interval("belly_upper_left", Modality::Subcutaneous, &history, t0());
        assert!(!decision.allowed);
        assert_eq!(decision.hours_remaining, Some(1));
        assert_eq!(decision.wait_text.as_deref(), Some("1 hour"));
    }

    #[test]
    fn test_uses_most_recent_event_for_site() {
        // An old allowed use followed by a fresh one: the fresh one governs
        let history = vec![
            event_hours_ago("delt_left", 2),
            event_hours_ago("delt_left", 100),
        ];
        let decision = check_interval("delt_left", Modality::Intramuscular, &history, t0());
        assert!(!decision.allowed);
        assert_eq!(decision.hours_remaining, Some(46));
    }

    #[test]
    fn test_available_and_blocked_partition_catalog() {
        let history = vec![
            event_hours_ago("glute_left", 5),
            event_hours_ago("delt_right", 40),
        ];
        let available = available_sites(Modality::Intramuscular, &history, t0());
        let blocked = blocked_sites(Modality::Intramuscular, &history, t0());

        assert_eq!(
            available.len() + blocked.len(),
            sites_for(Modality::Intramuscular).len()
        );
        assert!(available.iter().all(|s| s.id != "glute_left"));

        // Soonest-available first: delt_right (8h left) before glute_left (43h)
        assert_eq!(blocked[0].0.id, "delt_right");
        assert_eq!(blocked[0].1, 8);
        assert_eq!(blocked[1].0.id, "glute_left");
        assert_eq!(blocked[1].1, 43);
    }

    #[test]
    fn test_format_wait_pluralization() {
        assert_eq!(format_wait(1), "1 hour");
        assert_eq!(format_wait(5), "5 hours");
        assert_eq!(format_wait(24), "1 day");
        assert_eq!(format_wait(25), "1 day 1 hour");
        assert_eq!(format_wait(48), "2 days");
        assert_eq!(format_wait(50), "2 days 2 hours");
    }
}
