//! Filtering discovered names against the built-in catalog.

use crate::registry::Registry;

/// Namespaces whose flattened wrappers (`BuildLinux`, `TestDefault`) are
/// recognized as generated naming artifacts.
pub const BUILTIN_NAMESPACES: [&str; 18] = [
    "build", "test", "lint", "format", "deps", "git", "release", "docs", "tools", "generate",
    "mod", "help", "version", "install", "configure", "init", "bench", "vet",
];

/// Whether the flat function `name` merely wraps an existing built-in
/// namespace command, e.g. `BuildDefault` when `build:default` exists.
/// Extension commands under the same names never count.
///
/// A bare namespace name (`build`) is never a wrapper; an exact match against
/// a built-in is an intentional override, not an artifact.
pub fn is_namespace_wrapper(name: &str, registry: &Registry) -> bool {
    let name = name.to_lowercase();
    BUILTIN_NAMESPACES.iter().any(|namespace| {
        let Some(suffix) = name.strip_prefix(namespace) else {
            return false;
        };
        if suffix.is_empty() {
            return false;
        }
        let is_builtin = |name: &str| registry.get(name).is_some_and(|c| c.is_builtin());
        is_builtin(&format!("{}:{}", namespace, suffix))
            || (suffix == "default" && is_builtin(namespace))
    })
}
