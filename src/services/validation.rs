/// Two-letter postal codes for the states, DC and the territories
pub const US_STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM",
    "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA",
    "WV", "WI", "WY", "AS", "GU", "MP", "PR", "VI",
];

/// Loose email check: one `@`, a non-empty local part and a dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Normalizes a state code to upper case if it names a known state
pub fn normalize_state(state: &str) -> Option<String> {
    let upper = state.trim().to_ascii_uppercase();
    US_STATE_CODES.contains(&upper.as_str()).then_some(upper)
}

/// Returns the trimmed value, or `None` when it is blank
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Returns the trimmed value or an error naming the missing field
pub fn require(value: Option<&str>, field: &str) -> Result<String, String> {
    non_blank(value).ok_or_else(|| format!("{} is required", field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email(" jane.doe+vote@mail.example.org "));
        assert!(!is_valid_email("jane"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane@@example.com"));
        assert!(!is_valid_email("ja ne@example.com"));
        assert!(!is_valid_email("jane@example..com"));
    }

    #[test]
    fn test_state_normalization() {
        assert_eq!(normalize_state("tx"), Some("TX".to_string()));
        assert_eq!(normalize_state(" DC "), Some("DC".to_string()));
        assert_eq!(normalize_state("Texas"), None);
        assert_eq!(normalize_state("ZZ"), None);
    }

    #[test]
    fn test_require() {
        assert_eq!(require(Some("  Jane "), "name"), Ok("Jane".to_string()));
        assert_eq!(require(Some("   "), "name"), Err("name is required".to_string()));
        assert_eq!(require(None, "zip"), Err("zip is required".to_string()));
    }
}
