use serde::{Deserialize, Serialize};

/// Where a command definition came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Shipped with the tool and registered at startup.
    #[default]
    Builtin,
    /// Discovered from the project's own taskfiles.
    Extension,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin => write!(f, "builtin"),
            Self::Extension => write!(f, "extension"),
        }
    }
}

impl SourceType {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("extension") | Some("user") => Self::Extension,
            _ => Self::Builtin,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        assert_eq!(SourceType::default(), SourceType::Builtin);
    }

    #[test]
    fn test_display() {
        assert_eq!(SourceType::Builtin.to_string(), "builtin");
        assert_eq!(SourceType::Extension.to_string(), "extension");
    }

    #[test]
    fn test_from_str_opt() {
        assert_eq!(
            SourceType::from_str_opt(Some("extension")),
            SourceType::Extension
        );
        assert_eq!(SourceType::from_str_opt(Some("user")), SourceType::Extension);
        assert_eq!(SourceType::from_str_opt(Some("builtin")), SourceType::Builtin);
        assert_eq!(SourceType::from_str_opt(None), SourceType::Builtin);
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&SourceType::Extension).unwrap();
        assert_eq!(json, "\"extension\"");

        let parsed: SourceType = serde_json::from_str("\"builtin\"").unwrap();
        assert_eq!(parsed, SourceType::Builtin);
    }
}
