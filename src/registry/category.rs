//! Display metadata for command categories.

use serde::{Deserialize, Serialize};

/// Sort position for categories without standard metadata.
pub const DEFAULT_CATEGORY_ORDER: u32 = 99;

/// Bucket used for commands that declare no category.
pub const UNCATEGORIZED: &str = "other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub name: String,
    pub order: u32,
}

const STANDARD_CATEGORIES: &[(&str, &str, u32)] = &[
    ("core", "Essential Operations", 1),
    ("build", "Build & Compilation", 2),
    ("test", "Testing & Quality", 3),
    ("quality", "Code Quality & Linting", 4),
    ("deps", "Dependency Management", 5),
    ("tools", "Development Tools", 6),
    ("docs", "Documentation", 8),
    ("git", "Git Operations", 9),
    ("version", "Version Management", 10),
    ("metrics", "Code Analysis & Metrics", 11),
    ("config", "Configuration Management", 13),
    ("generate", "Code Generation", 14),
    ("init", "Project Initialization", 15),
    ("update", "Update Management", 17),
    ("help", "Help System", 18),
    ("custom", "Project Commands", 50),
];

/// Standard metadata for `category`, or a title-cased fallback.
pub fn category_info(category: &str) -> CategoryInfo {
    STANDARD_CATEGORIES
        .iter()
        .find(|(key, _, _)| *key == category)
        .map(|(_, name, order)| CategoryInfo {
            name: (*name).to_string(),
            order: *order,
        })
        .unwrap_or_else(|| CategoryInfo {
            name: title_case(category),
            order: DEFAULT_CATEGORY_ORDER,
        })
}

fn title_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
