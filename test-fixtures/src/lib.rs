//! Fixture loader for the IODEF sample documents and marking definitions.
//!
//! Fixtures live in the workspace-level `test-fixtures/` directory and are
//! shared by the integration tests of every crate.

use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Root directory of the test-fixtures folder.
fn fixtures_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);

    while !path.join("test-fixtures").exists() {
        if !path.pop() {
            panic!(
                "Could not find test-fixtures directory from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("test-fixtures")
}

/// Get the absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// Read a fixture file as text.
///
/// # Panics
/// Panics if the file doesn't exist.
pub fn load_fixture_str(relative_path: &str) -> String {
    let path = fixture_path(relative_path);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

/// Load and deserialize a JSON fixture file.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixture_path(relative_path);
    serde_json::from_str(&load_fixture_str(relative_path))
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// All files with extension `ext` in a fixture subdirectory, sorted.
pub fn list_fixtures(subdir: &str, ext: &str) -> Vec<PathBuf> {
    let dir = fixture_path(subdir);
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e))
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            path.extension().is_some_and(|e| e == ext).then_some(path)
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iodef_fixtures_are_present() {
        let docs = list_fixtures("iodef", "xml");
        assert!(docs.iter().any(|p| p.ends_with("minimal_botnet.xml")));
        assert!(load_fixture_str("iodef/minimal_botnet.xml").contains("IODEF-Document"));
    }

    #[test]
    fn marking_fixtures_are_json() {
        for path in list_fixtures("markings", "json") {
            let name = path.strip_prefix(fixtures_root()).unwrap().to_string_lossy().into_owned();
            let value: serde_json::Value = load_fixture(&name);
            assert!(value.get("identifier").is_some(), "{name} has no identifier");
        }
    }
}
