use url::Url;

/// Scheme+host+port identity of a URL, or `None` when it has no tuple origin
/// (unparseable, `about:blank`, `data:` and friends).
pub fn origin_of(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(origin.ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_is_elided() {
        assert_eq!(
            origin_of("https://example.com:443/path").as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_port_distinguishes_origin() {
        assert_ne!(origin_of("http://a.test:8080"), origin_of("http://a.test:9090"));
    }

    #[test]
    fn test_opaque_origins() {
        assert_eq!(origin_of("about:blank"), None);
        assert_eq!(origin_of("not a url"), None);
    }
}
