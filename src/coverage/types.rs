//! Coverage report data model.
//!
//! A [`CoverageReport`] maps file paths to per-file coverage, keeping the
//! order in which the provider produced them. Keys are stored exactly as the
//! provider wrote them; lookups that need to tolerate leading-slash or case
//! differences live in [`crate::analysis::reconcile`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Key under which providers store the repository-wide aggregate.
pub const ROOT_KEY: &str = "/";

/// Coverage for a single testable unit (function or method).
///
/// `percentage` is `None` when the unit was never measured, which is not the
/// same as `Some(0.0)` (measured and found uncovered).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestableCoverage {
    pub name: String,
    pub percentage: Option<f64>,
}

impl TestableCoverage {
    pub fn new(name: impl Into<String>, percentage: Option<f64>) -> Self {
        Self {
            name: name.into(),
            percentage,
        }
    }
}

/// Coverage for one file: aggregate percentage plus its testables in
/// provider order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileCoverageEntry {
    pub percentage: Option<f64>,
    #[serde(default)]
    pub testables: Vec<TestableCoverage>,
}

/// Per-file coverage keyed by path, in provider insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverageReport {
    files: IndexMap<String, FileCoverageEntry>,
}

impl CoverageReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `path`. Replacing keeps the original
    /// position.
    pub fn insert(&mut self, path: impl Into<String>, entry: FileCoverageEntry) {
        self.files.insert(path.into(), entry);
    }

    pub fn get(&self, path: &str) -> Option<&FileCoverageEntry> {
        self.files.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileCoverageEntry)> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Repository-wide coverage, read from the [`ROOT_KEY`] entry.
    pub fn overall_percentage(&self) -> Option<f64> {
        self.files.get(ROOT_KEY).and_then(|entry| entry.percentage)
    }

    /// Number of testables across all files (the root entry has none).
    pub fn testable_count(&self) -> usize {
        self.files.values().map(|entry| entry.testables.len()).sum()
    }
}

impl FromIterator<(String, FileCoverageEntry)> for CoverageReport {
    fn from_iter<I: IntoIterator<Item = (String, FileCoverageEntry)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overall_percentage_reads_root_entry() {
        let mut report = CoverageReport::new();
        report.insert(
            ROOT_KEY,
            FileCoverageEntry {
                percentage: Some(42.5),
                testables: vec![],
            },
        );
        report.insert("/src/a.ts", FileCoverageEntry::default());

        assert_eq!(report.overall_percentage(), Some(42.5));
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_overall_percentage_missing_root() {
        let report = CoverageReport::new();
        assert_eq!(report.overall_percentage(), None);
        assert!(report.is_empty());
    }

    #[test]
    fn test_json_preserves_key_order_and_null() {
        let json = indoc! {r#"
            {
              "/src/b.ts": { "percentage": 10, "testables": [] },
              "/src/a.ts": {
                "percentage": null,
                "testables": [
                  { "name": "foo", "percentage": null },
                  { "name": "bar", "percentage": 0 }
                ]
              }
            }
        "#};

        let report = serde_json::from_str::<CoverageReport>(json).unwrap();
        let keys: Vec<&String> = report.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["/src/b.ts", "/src/a.ts"]);

        let entry = report.get("/src/a.ts").unwrap();
        assert_eq!(entry.percentage, None);
        assert_eq!(entry.testables[0], TestableCoverage::new("foo", None));
        assert_eq!(entry.testables[1], TestableCoverage::new("bar", Some(0.0)));
        assert_eq!(report.testable_count(), 2);
    }

    #[test]
    fn test_missing_testables_defaults_to_empty() {
        let report =
            serde_json::from_str::<CoverageReport>(r#"{"/x.ts": {"percentage": 5}}"#).unwrap();
        assert!(report.get("/x.ts").unwrap().testables.is_empty());
    }
}
