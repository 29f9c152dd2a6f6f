pub mod scaffold;
pub mod templates;

use std::path::{Path, PathBuf};

/// Source directories, in the order they are scaffolded, synced and aggregated.
pub const WATCHED_DIRS: [&str; 3] = ["bin", "lib", "tests"];

pub const MANIFEST_FILE: &str = "CMakeLists.txt";
pub const STARTER_SOURCE: &str = "main.cpp";
pub const README_FILE: &str = "README.md";

const LIST_VAR_PREFIX: &str = "SOURCES_";

/// `bin` -> `SOURCES_BIN`
pub fn list_variable_name(dir: &str) -> String {
    format!("{LIST_VAR_PREFIX}{}", dir.to_ascii_uppercase())
}

pub fn root_manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

pub fn dir_manifest_path(root: &Path, dir: &str) -> PathBuf {
    root.join(dir).join(MANIFEST_FILE)
}

/// Decides which directory entries count as source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilter {
    extensions: Vec<String>,
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self::new(["cpp"])
    }
}

impl SourceFilter {
    pub fn new<I>(extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Hidden files and names that cannot sit inside a quoted CMake argument are rejected.
    pub fn matches(&self, file_name: &str) -> bool {
        if file_name.starts_with('.') || file_name.contains(['"', '\\', '$', ';', ')']) {
            return false;
        }
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known == ext))
    }

    /// Matching names from a raw listing, sorted so every pass renders the same text.
    pub fn select(&self, names: Vec<String>) -> Vec<String> {
        let mut selected: Vec<String> = names.into_iter().filter(|n| self.matches(n)).collect();
        selected.sort();
        selected
    }
}
