/// Turns a display name into a URL-safe slug
///
/// Lowercases ASCII letters, keeps digits, and collapses every run of other
/// characters into a single dash. Leading and trailing dashes are dropped.
/// A name with no usable characters yields an empty string.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Picks the first free slug for `name`, appending `-2`, `-3`, ... on collision
///
/// ### Arguments
///
/// * `name` - The display name to derive the slug from
/// * `fallback` - Base used when the name has no ASCII letters or digits
/// * `is_taken` - Reports whether a candidate slug is already in use
pub fn unique_slug<F>(name: &str, fallback: &str, mut is_taken: F) -> anyhow::Result<String>
where
    F: FnMut(&str) -> anyhow::Result<bool>,
{
    let mut base = slugify(name);
    if base.is_empty() {
        base = fallback.to_string();
    }

    if !is_taken(&base)? {
        return Ok(base);
    }

    let mut suffix = 2;
    loop {
        let attempt = format!("{}-{}", base, suffix);
        if !is_taken(&attempt)? {
            return Ok(attempt);
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Jane Doe"), "jane-doe");
        assert_eq!(slugify("  María  O'Neil, Jr. "), "mar-a-o-neil-jr");
        assert_eq!(slugify("District 9"), "district-9");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_unique_slug_appends_suffix() {
        let taken: HashSet<&str> = ["jane-doe", "jane-doe-2"].into_iter().collect();
        let slug = unique_slug("Jane Doe", "candidate", |s| Ok(taken.contains(s))).unwrap();
        assert_eq!(slug, "jane-doe-3");
    }

    #[test]
    fn test_unique_slug_uses_fallback() {
        let slug = unique_slug("???", "vendor", |_| Ok(false)).unwrap();
        assert_eq!(slug, "vendor");
    }

    proptest! {
        #[test]
        fn prop_slug_is_url_safe(name in "\\PC{0,40}") {
            let slug = slugify(&name);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }

        #[test]
        fn prop_slugify_is_idempotent(name in "[A-Za-z0-9 ._-]{0,40}") {
            let once = slugify(&name);
            prop_assert_eq!(slugify(&once), once.clone());
        }
    }
}
