use std::path::{Path, PathBuf};

pub fn is_rust_source(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "rs")
}

/// `tests.rs`, `*_test.rs`, `*_tests.rs` and `test_*.rs` never contribute commands.
pub fn is_test_file(path: &Path) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    stem == "tests"
        || stem.ends_with("_test")
        || stem.ends_with("_tests")
        || stem.starts_with("test_")
}

/// Lists the Rust sources directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into and test files are skipped.
pub fn list_source_files(dir: &Path) -> crate::Result<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = Path::new(&escaped).join("*.rs");
    let pattern = pattern.to_string_lossy();
    let entries = glob::glob(&pattern).map_err(|e| {
        crate::Error::Config(format!("Invalid source pattern {}: {}", pattern, e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            crate::Error::Config(format!("Failed to read directory entry: {}", e))
        })?;
        if path.is_file() && is_rust_source(&path) && !is_test_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_rust_source() {
        assert!(is_rust_source(Path::new("deploy.rs")));
        assert!(is_rust_source(Path::new("/path/to/ci.rs")));
        assert!(!is_rust_source(Path::new("notes.md")));
        assert!(!is_rust_source(Path::new("rs")));
    }

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file(Path::new("tests.rs")));
        assert!(is_test_file(Path::new("deploy_test.rs")));
        assert!(is_test_file(Path::new("deploy_tests.rs")));
        assert!(is_test_file(Path::new("test_deploy.rs")));
        assert!(!is_test_file(Path::new("deploy.rs")));
        assert!(!is_test_file(Path::new("contest.rs")));
    }

    #[test]
    fn test_list_source_files_one_level() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("b.rs"), "").unwrap();
        std::fs::write(temp.path().join("a.rs"), "").unwrap();
        std::fs::write(temp.path().join("a_test.rs"), "").unwrap();
        std::fs::write(temp.path().join("README.md"), "").unwrap();
        std::fs::create_dir(temp.path().join("nested")).unwrap();
        std::fs::write(temp.path().join("nested").join("c.rs"), "").unwrap();

        let files = list_source_files(temp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.rs", "b.rs"]);
    }

    #[test]
    fn test_list_source_files_missing_dir() {
        let files = list_source_files(Path::new("/nonexistent/taskfiles")).unwrap();
        assert!(files.is_empty());
    }
}
