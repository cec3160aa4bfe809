/// Identifier fragments treated as password-like.
const PASSWORD_MARKERS: &[&str] = &["password", "passwd", "passcode", "pwd"];

/// Substring heuristic on element identifier text. Not field-type
/// introspection: `pwd_hint_label` matches, an unlabeled `<input
/// type=password>` does not.
pub fn looks_like_password_field(identifier: &str) -> bool {
    let lower = identifier.to_lowercase();
    PASSWORD_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_common_identifiers() {
        assert!(looks_like_password_field("#password"));
        assert!(looks_like_password_field("input[name=userPasswd]"));
        assert!(looks_like_password_field("Confirm Password"));
        assert!(looks_like_password_field("pwd"));
    }

    #[test]
    fn test_ignores_other_fields() {
        assert!(!looks_like_password_field("#email"));
        assert!(!looks_like_password_field("passport-number"));
    }
}
