pub const NAMESPACE_SEP: char = ':';

/// Canonical `namespace:method` form, both halves lower-cased.
pub fn namespaced(namespace: &str, method: &str) -> String {
    format!(
        "{}{}{}",
        namespace.to_lowercase(),
        NAMESPACE_SEP,
        method.to_lowercase()
    )
}

pub fn parse(name: &str) -> Option<(&str, &str)> {
    name.split_once(NAMESPACE_SEP)
}

pub fn is_namespaced(name: &str) -> bool {
    name.contains(NAMESPACE_SEP)
}

pub fn namespace_of(name: &str) -> Option<&str> {
    parse(name).map(|(ns, _)| ns)
}

pub fn method_of(name: &str) -> Option<&str> {
    parse(name).map(|(_, m)| m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_lowercases() {
        assert_eq!(namespaced("Pipeline", "CI"), "pipeline:ci");
        assert_eq!(namespaced("build", "linux"), "build:linux");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse("build:linux"), Some(("build", "linux")));
        assert_eq!(parse("deploy"), None);
        assert_eq!(parse("a:b:c"), Some(("a", "b:c")));
    }

    #[test]
    fn test_is_namespaced() {
        assert!(is_namespaced("test:unit"));
        assert!(!is_namespaced("deploy"));
    }

    #[test]
    fn test_parts() {
        assert_eq!(namespace_of("lint:fix"), Some("lint"));
        assert_eq!(method_of("lint:fix"), Some("fix"));
        assert_eq!(namespace_of("plain"), None);
    }
}
