//! Static site catalogs for both injection modalities.
//!
//! Sites are plain data: body part and laterality are fields, not behavior.
//! Catalog declaration order is the tie-break order used by the
//! recommendation pipeline, so entries are grouped by body part.

use crate::types::{BodyPart, Laterality, Modality, Site};
use once_cell::sync::Lazy;

/// Intramuscular sites: deep muscle tissue, longer recovery.
static INTRAMUSCULAR_SITES: Lazy<Vec<Site>> = Lazy::new(|| {
    vec![
        Site {
            id: "glute_left",
            display_name: "Left Glute (ventrogluteal)",
            body_part: BodyPart::Glute,
            laterality: Laterality::Left,
        },
        Site {
            id: "glute_right",
            display_name: "Right Glute (ventrogluteal)",
            body_part: BodyPart::Glute,
            laterality: Laterality::Right,
        },
        Site {
            id: "delt_left",
            display_name: "Left Deltoid",
            body_part: BodyPart::Delt,
            laterality: Laterality::Left,
        },
        Site {
            id: "delt_right",
            display_name: "Right Deltoid",
            body_part: BodyPart::Delt,
            laterality: Laterality::Right,
        },
        Site {
            id: "thigh_left",
            display_name: "Left Thigh (vastus lateralis)",
            body_part: BodyPart::Thigh,
            laterality: Laterality::Left,
        },
        Site {
            id: "thigh_right",
            display_name: "Right Thigh (vastus lateralis)",
            body_part: BodyPart::Thigh,
            laterality: Laterality::Right,
        },
    ]
});

/// Subcutaneous sites: fatty tissue, shorter recovery. Belly quadrants come
/// first; the belly is the preferred rotation anchor for this modality.
static SUBCUTANEOUS_SITES: Lazy<Vec<Site>> = Lazy::new(|| {
    vec![
        Site {
            id: "belly_upper_left",
            display_name: "Belly, Upper Left",
            body_part: BodyPart::Belly,
            laterality: Laterality::Left,
        },
        Site {
            id: "belly_upper_right",
            display_name: "Belly, Upper Right",
            body_part: BodyPart::Belly,
            laterality: Laterality::Right,
        },
        Site {
            id: "belly_lower_left",
            display_name: "Belly, Lower Left",
            body_part: BodyPart::Belly,
            laterality: Laterality::Left,
        },
        Site {
            id: "belly_lower_right",
            display_name: "Belly, Lower Right",
            body_part: BodyPart::Belly,
            laterality: Laterality::Right,
        },
        Site {
            id: "flank_left",
            display_name: "Left Flank (love handle)",
            body_part: BodyPart::Flank,
            laterality: Laterality::Left,
        },
        Site {
            id: "flank_right",
            display_name: "Right Flank (love handle)",
            body_part: BodyPart::Flank,
            laterality: Laterality::Right,
        },
        Site {
            id: "thigh_outer_left",
            display_name: "Left Outer Thigh",
            body_part: BodyPart::Thigh,
            laterality: Laterality::Left,
        },
        Site {
            id: "thigh_outer_right",
            display_name: "Right Outer Thigh",
            body_part: BodyPart::Thigh,
            laterality: Laterality::Right,
        },
    ]
});

/// All sites for a modality, in catalog declaration order.
pub fn sites_for(modality: Modality) -> &'static [Site] {
    match modality {
        Modality::Intramuscular => &INTRAMUSCULAR_SITES,
        Modality::Subcutaneous => &SUBCUTANEOUS_SITES,
    }
}

/// The documented starting site for a modality, used when history is empty.
pub fn default_site(modality: Modality) -> &'static Site {
    match modality {
        Modality::Intramuscular => &INTRAMUSCULAR_SITES[0],
        Modality::Subcutaneous => &SUBCUTANEOUS_SITES[0],
    }
}

/// Look up a site by its stable id within a modality's catalog.
///
/// Returns None for ids the catalog doesn't know (e.g. history rows written
/// by an older catalog); callers must treat those as invisible, not errors.
pub fn site_by_id(modality: Modality, id: &str) -> Option<&'static Site> {
    sites_for(modality).iter().find(|s| s.id == id)
}

/// Validate both catalogs for consistency.
///
/// Returns a list of validation errors, or empty Vec if valid.
pub fn validate() -> Vec<String> {
    let mut errors = Vec::new();

    for modality in [Modality::Intramuscular, Modality::Subcutaneous] {
        let sites = sites_for(modality);

        if sites.is_empty() {
            errors.push(format!("{:?} catalog is empty", modality));
            continue;
        }

        for (i, site) in sites.iter().enumerate() {
            if site.id.is_empty() {
                errors.push(format!("{:?} catalog: site #{} has empty id", modality, i));
            }
            if site.display_name.is_empty() {
                errors.push(format!(
                    "{:?} catalog: site '{}' has empty display name",
                    modality, site.id
                ));
            }
            if sites.iter().filter(|s| s.id == site.id).count() > 1 {
                errors.push(format!(
                    "{:?} catalog: duplicate site id '{}'",
                    modality, site.id
                ));
            }
        }

        // Side alternation needs at least one site on each side
        let has_left = sites.iter().any(|s| s.laterality == Laterality::Left);
        let has_right = sites.iter().any(|s| s.laterality == Laterality::Right);
        if !has_left || !has_right {
            errors.push(format!(
                "{:?} catalog: needs sites on both left and right",
                modality
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogs_load() {
        assert_eq!(sites_for(Modality::Intramuscular).len(), 6);
        assert_eq!(sites_for(Modality::Subcutaneous).len(), 8);
    }

    #[test]
    fn test_default_sites() {
        assert_eq!(default_site(Modality::Intramuscular).id, "glute_left");
        assert_eq!(default_site(Modality::Subcutaneous).id, "belly_upper_left");
    }

    #[test]
    fn test_subq_default_is_left_upper_belly() {
        let site = default_site(Modality::Subcutaneous);
        assert_eq!(site.body_part, BodyPart::Belly);
        assert_eq!(site.laterality, Laterality::Left);
    }

    #[test]
    fn test_site_by_id() {
        let site = site_by_id(Modality::Intramuscular, "delt_right").unwrap();
        assert_eq!(site.body_part, BodyPart::Delt);
        assert_eq!(site.laterality, Laterality::Right);

        assert!(site_by_id(Modality::Intramuscular, "belly_upper_left").is_none());
        assert!(site_by_id(Modality::Subcutaneous, "no_such_site").is_none());
    }

    #[test]
    fn test_catalogs_are_disjoint() {
        for site in sites_for(Modality::Intramuscular) {
            assert!(
                site_by_id(Modality::Subcutaneous, site.id).is_none(),
                "Site {} appears in both catalogs",
                site.id
            );
        }
    }

    #[test]
    fn test_catalogs_validate() {
        let errors = validate();
        assert!(errors.is_empty(), "Catalog validation errors: {:?}", errors);
    }
}
