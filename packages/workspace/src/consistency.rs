use dui_common::Manifest;

/// Theme agreement between a candidate manifest and the current manifests of
/// the other surfaces. Each disagreeing surface yields one message, profile
/// taking precedence over density.
pub fn check_theme_consistency<'a, I>(surface_id: &str, candidate: &Manifest, others: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a Manifest)>,
{
    let mut errors = Vec::new();
    for (other_id, other) in others {
        if other_id == surface_id {
            continue;
        }
        if other.theme.profile != candidate.theme.profile {
            errors.push(format!(
                "cross-surface consistency violation: theme profile '{}' on {} differs from '{}' on {}",
                candidate.theme.profile, surface_id, other.theme.profile, other_id
            ));
            continue;
        }
        if other.theme.density != candidate.theme.density {
            errors.push(format!(
                "cross-surface consistency violation: theme density '{}' on {} differs from '{}' on {}",
                candidate.theme.density, surface_id, other.theme.density, other_id
            ));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{seed_manifest, DEFAULT_SURFACE_ID, LESSON_SURFACE_ID};
    use dui_parser::{Density, ThemeProfile};

    #[test]
    fn test_matching_themes_pass() {
        let dashboard = seed_manifest(DEFAULT_SURFACE_ID);
        let lesson = seed_manifest(LESSON_SURFACE_ID);
        let others = [(LESSON_SURFACE_ID, &lesson), (DEFAULT_SURFACE_ID, &dashboard)];
        assert!(check_theme_consistency(DEFAULT_SURFACE_ID, &dashboard, others).is_empty());
    }

    #[test]
    fn test_profile_mismatch_reported_before_density() {
        let lesson = seed_manifest(LESSON_SURFACE_ID);
        let mut candidate = seed_manifest(DEFAULT_SURFACE_ID);
        candidate.theme.profile = ThemeProfile::Minimal;
        candidate.theme.density = Density::Compact;

        let errors = check_theme_consistency(DEFAULT_SURFACE_ID, &candidate, [(LESSON_SURFACE_ID, &lesson)]);
        assert_eq!(
            errors,
            vec![
                "cross-surface consistency violation: theme profile 'minimal' on math_lms.dashboard differs from 'default' on math_lms.lesson"
            ]
        );
    }

    #[test]
    fn test_density_mismatch() {
        let lesson = seed_manifest(LESSON_SURFACE_ID);
        let mut candidate = seed_manifest(DEFAULT_SURFACE_ID);
        candidate.theme.density = Density::Compact;

        let errors = check_theme_consistency(DEFAULT_SURFACE_ID, &candidate, [(LESSON_SURFACE_ID, &lesson)]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("theme density 'compact'"));
    }
}
