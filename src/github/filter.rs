use super::client::{FileStatus, PullRequestFile};

/// Which changed files are candidates for test generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub allowed_extensions: Vec<String>,
    /// Substrings that mark a path as an existing test file
    pub exclude_patterns: Vec<String>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            allowed_extensions: [".ts", ".tsx", ".js", ".jsx"]
                .into_iter()
                .map(String::from)
                .collect(),
            exclude_patterns: [".test.", ".spec."].into_iter().map(String::from).collect(),
        }
    }
}

impl FileFilter {
    /// Case-insensitive extension and exclusion check.
    pub fn matches(&self, path: &str) -> bool {
        let lower = path.to_lowercase();
        let allowed = self
            .allowed_extensions
            .iter()
            .any(|ext| lower.ends_with(&ext.to_lowercase()));

        allowed
            && !self
                .exclude_patterns
                .iter()
                .any(|pattern| lower.contains(&pattern.to_lowercase()))
    }

    /// Paths of the files worth generating tests for, in API order.
    pub fn apply(&self, files: &[PullRequestFile]) -> Vec<String> {
        files
            .iter()
            .filter(|f| f.status != FileStatus::Removed)
            .filter(|f| self.matches(&f.filename))
            .map(|f| f.filename.clone())
            .collect()
    }
}
