//! Best-effort numeric version ordering.
//!
//! Versions are opaque strings. When several recorded versions of one repo
//! need ranking, they are split on `.` and compared component by component as
//! integers. This is not semver: pre-release tags and build metadata carry no
//! meaning here.

use std::cmp::Ordering;

use crate::types::SemverVersion;

/// Compares two version strings numerically, component by component.
///
/// Missing components count as 0, so `1.2` equals `1.2.0`. A component's
/// value is its leading decimal digits; a component with none counts as 0.
pub fn compare_versions(a: &SemverVersion, b: &SemverVersion) -> Ordering {
    let a_parts: Vec<u64> = a.as_str().split('.').map(component_value).collect();
    let b_parts: Vec<u64> = b.as_str().split('.').map(component_value).collect();

    let len = a_parts.len().max(b_parts.len());
    for i in 0..len {
        let a_part = a_parts.get(i).copied().unwrap_or(0);
        let b_part = b_parts.get(i).copied().unwrap_or(0);
        match a_part.cmp(&b_part) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Returns the latest version in `versions`, keeping the first on ties.
pub fn latest_version<'a, I>(versions: I) -> Option<&'a SemverVersion>
where
    I: IntoIterator<Item = &'a SemverVersion>,
{
    versions.into_iter().fold(None, |best, candidate| match best {
        Some(current) if compare_versions(candidate, current) != Ordering::Greater => Some(current),
        _ => Some(candidate),
    })
}

fn component_value(component: &str) -> u64 {
    let digits: String = component
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(s: &str) -> SemverVersion {
        SemverVersion::from(s)
    }

    #[test]
    fn numeric_not_lexicographic() {
        assert_eq!(compare_versions(&v("0.10.0"), &v("0.9.9")), Ordering::Greater);
        assert_eq!(compare_versions(&v("1.2.3"), &v("1.2.10")), Ordering::Less);
    }

    #[test]
    fn missing_components_default_to_zero() {
        assert_eq!(compare_versions(&v("1.2"), &v("1.2.0")), Ordering::Equal);
        assert_eq!(compare_versions(&v("1"), &v("1.0.1")), Ordering::Less);
    }

    #[test]
    fn non_numeric_components_count_as_zero() {
        assert_eq!(compare_versions(&v("1.x"), &v("1.0")), Ordering::Equal);
        assert_eq!(compare_versions(&v("2.0.0-beta"), &v("2.0.0")), Ordering::Equal);
        assert_eq!(compare_versions(&v("unknown"), &v("0.0.0")), Ordering::Equal);
    }

    #[test]
    fn latest_keeps_first_on_tie() {
        let versions = [v("1.0"), v("1.0.0"), v("0.9")];
        let latest = latest_version(versions.iter()).unwrap();
        assert_eq!(latest.as_str(), "1.0");
    }

    #[test]
    fn latest_of_empty_is_none() {
        assert!(latest_version(std::iter::empty()).is_none());
    }

    proptest! {
        #[test]
        fn comparison_is_antisymmetric(
            a in prop::collection::vec(0u64..1000, 1..5),
            b in prop::collection::vec(0u64..1000, 1..5),
        ) {
            let join = |parts: &[u64]| parts.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
            let va = v(&join(&a));
            let vb = v(&join(&b));
            prop_assert_eq!(compare_versions(&va, &vb), compare_versions(&vb, &va).reverse());
        }

        #[test]
        fn latest_is_not_less_than_any(
            versions in prop::collection::vec("[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}", 1..10)
        ) {
            let versions: Vec<_> = versions.into_iter().map(SemverVersion::new).collect();
            let latest = latest_version(versions.iter()).unwrap();
            for candidate in &versions {
                prop_assert_ne!(compare_versions(candidate, latest), Ordering::Greater);
            }
        }
    }
}
