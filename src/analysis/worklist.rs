//! Worklist construction: join filtered testables with full descriptors.
//!
//! Reconciliation only knows names and percentages. The generator needs the
//! provider's full descriptor, so each unique file is fetched once and its
//! descriptors are kept when their name was selected for that file.

use super::reconcile::with_leading_slash;
use super::types::{DescriptorGroup, FilteredTestable, FilteredTestablesResult, WorklistEntry};
use crate::agent::TestableSource;
use crate::errors::Result;
use futures::future::join_all;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// Value of `max-testables` meaning "no cap".
pub const UNLIMITED_SENTINEL: i64 = -1;

/// Cap on the number of worklist entries handed to the generator.
///
/// Serialized as an integer where `-1` means [`TestableLimit::Unlimited`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TestableLimit {
    Unlimited,
    AtMost(usize),
}

impl Default for TestableLimit {
    fn default() -> Self {
        TestableLimit::AtMost(30)
    }
}

impl TestableLimit {
    /// Keep the first `n` entries in their current order.
    pub fn apply(self, mut entries: Vec<WorklistEntry>) -> Vec<WorklistEntry> {
        if let TestableLimit::AtMost(n) = self {
            entries.truncate(n);
        }
        entries
    }

    pub fn exceeded_by(self, len: usize) -> bool {
        matches!(self, TestableLimit::AtMost(n) if len > n)
    }
}

impl TryFrom<i64> for TestableLimit {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            UNLIMITED_SENTINEL => Ok(TestableLimit::Unlimited),
            n if n >= 0 => usize::try_from(n)
                .map(TestableLimit::AtMost)
                .map_err(|e| e.to_string()),
            n => Err(format!(
                "max testables must be -1 (unlimited) or non-negative, got {}",
                n
            )),
        }
    }
}

impl From<TestableLimit> for i64 {
    fn from(limit: TestableLimit) -> Self {
        match limit {
            TestableLimit::Unlimited => UNLIMITED_SENTINEL,
            TestableLimit::AtMost(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for TestableLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestableLimit::Unlimited => write!(f, "unlimited"),
            TestableLimit::AtMost(n) => write!(f, "{}", n),
        }
    }
}

/// Distinct file paths of the filtered testables, in first-seen order.
pub fn unique_file_paths(result: &FilteredTestablesResult) -> Vec<String> {
    result
        .testables
        .iter()
        .map(|t| t.file_path.clone())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Selected names per file, keyed by the leading-slash form of the path.
pub fn filtered_name_index(testables: &[FilteredTestable]) -> HashMap<String, HashSet<String>> {
    let mut index: HashMap<String, HashSet<String>> = HashMap::new();
    for testable in testables {
        index
            .entry(with_leading_slash(&testable.file_path))
            .or_default()
            .insert(testable.name.clone());
    }
    index
}

/// Emit one entry per descriptor whose name was selected for its file.
///
/// Groups are visited in the given order and descriptors in provider order.
/// Unnamed or unselected descriptors are dropped.
pub fn join_worklist(
    groups: &[DescriptorGroup],
    index: &HashMap<String, HashSet<String>>,
) -> Vec<WorklistEntry> {
    let mut worklist = Vec::new();

    for (file_path, descriptors) in groups {
        let Some(names) = index.get(file_path) else {
            debug!(file = %file_path, "No filtered testables for descriptor group");
            continue;
        };

        for descriptor in descriptors {
            match descriptor.name.as_deref() {
                Some(name) if names.contains(name) => worklist.push(WorklistEntry {
                    file_path: file_path.clone(),
                    testable: descriptor.clone(),
                }),
                name => debug!(
                    file = %file_path,
                    testable = name.unwrap_or("<unnamed>"),
                    "Dropping descriptor not selected by coverage analysis"
                ),
            }
        }
    }

    worklist
}

/// Build the generation worklist for a reconciliation result.
///
/// Descriptors for every unique file are fetched concurrently; only the
/// first group each provider call returns is used. The join runs in
/// unique-file order, so the result does not depend on fetch completion
/// order. The provider receives the leading-slash form of each path.
///
/// # Errors
///
/// Fails if any descriptor fetch fails.
pub async fn build_worklist<S>(
    result: &FilteredTestablesResult,
    source: &S,
    limit: TestableLimit,
) -> Result<Vec<WorklistEntry>>
where
    S: TestableSource + ?Sized,
{
    let files = unique_file_paths(result);

    let fetches = files.iter().map(|file| async move {
        let key = with_leading_slash(file);
        debug!(file = %key, "Getting testables for file");
        source.testables(&key).await
    });

    let mut groups = Vec::with_capacity(files.len());
    for fetched in join_all(fetches).await {
        if let Some(first) = fetched?.into_iter().next() {
            groups.push(first);
        }
    }

    let index = filtered_name_index(&result.testables);
    let worklist = join_worklist(&groups, &index);

    if limit.exceeded_by(worklist.len()) {
        info!(
            "Limiting testables to {} (from {} total)",
            limit,
            worklist.len()
        );
    }

    Ok(limit.apply(worklist))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{FilterReason, TestableDescriptor};
    use crate::errors::Error;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn filtered(file: &str, name: &str) -> FilteredTestable {
        FilteredTestable {
            name: name.to_string(),
            percentage: None,
            file_path: file.to_string(),
            reason: FilterReason::NoCoverage,
        }
    }

    fn result_of(testables: Vec<FilteredTestable>) -> FilteredTestablesResult {
        FilteredTestablesResult {
            filtered_count: testables.len(),
            testables,
            ..Default::default()
        }
    }

    fn entry(file: &str, name: &str) -> WorklistEntry {
        WorklistEntry {
            file_path: file.to_string(),
            testable: TestableDescriptor::named(name),
        }
    }

    /// Serves canned groups per path and records every call.
    #[derive(Default)]
    struct FakeSource {
        groups: HashMap<String, Vec<DescriptorGroup>>,
        calls: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl FakeSource {
        fn with(mut self, path: &str, groups: Vec<Vec<&str>>) -> Self {
            let groups = groups
                .into_iter()
                .map(|names| {
                    (
                        path.to_string(),
                        names.into_iter().map(TestableDescriptor::named).collect(),
                    )
                })
                .collect();
            self.groups.insert(path.to_string(), groups);
            self
        }
    }

    #[async_trait]
    impl TestableSource for FakeSource {
        async fn testables(&self, file_path: &str) -> Result<Vec<DescriptorGroup>> {
            self.calls.lock().unwrap().push(file_path.to_string());
            if self.fail_on.as_deref() == Some(file_path) {
                return Err(Error::generation("descriptor lookup failed"));
            }
            Ok(self.groups.get(file_path).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn test_limit_conversions() {
        assert_eq!(TestableLimit::try_from(-1), Ok(TestableLimit::Unlimited));
        assert_eq!(TestableLimit::try_from(0), Ok(TestableLimit::AtMost(0)));
        assert!(TestableLimit::try_from(-2).is_err());
        assert_eq!(i64::from(TestableLimit::Unlimited), -1);
        assert_eq!(TestableLimit::default(), TestableLimit::AtMost(30));
    }

    #[test]
    fn test_limit_truncates_positionally() {
        let entries: Vec<WorklistEntry> = (0..45)
            .map(|i| entry("/src/a.ts", &format!("fn{}", i)))
            .collect();

        let limited = TestableLimit::AtMost(30).apply(entries.clone());
        assert_eq!(limited.len(), 30);
        assert_eq!(limited, entries[..30].to_vec());

        let unlimited = TestableLimit::Unlimited.apply(entries.clone());
        assert_eq!(unlimited, entries);
    }

    #[test]
    fn test_unique_file_paths_first_seen_order() {
        let result = result_of(vec![
            filtered("src/b.ts", "x"),
            filtered("src/a.ts", "y"),
            filtered("src/b.ts", "z"),
        ]);
        assert_eq!(unique_file_paths(&result), vec!["src/b.ts", "src/a.ts"]);
    }

    #[test]
    fn test_name_index_normalizes_to_leading_slash() {
        let index = filtered_name_index(&[filtered("src/a.ts", "foo"), filtered("/src/a.ts", "bar")]);
        assert_eq!(index.len(), 1);
        assert!(index["/src/a.ts"].contains("foo"));
        assert!(index["/src/a.ts"].contains("bar"));
    }

    #[test]
    fn test_join_drops_unselected_and_unnamed() {
        let index = filtered_name_index(&[filtered("src/a.ts", "keep")]);
        let groups = vec![(
            "/src/a.ts".to_string(),
            vec![
                TestableDescriptor::named("drop"),
                TestableDescriptor::default(),
                TestableDescriptor::named("keep"),
            ],
        )];

        assert_eq!(join_worklist(&groups, &index), vec![entry("/src/a.ts", "keep")]);
    }

    #[tokio::test]
    async fn test_build_worklist_uses_first_group_and_unique_order() {
        let source = FakeSource::default()
            .with("/src/b.ts", vec![vec!["b1", "b2"], vec!["ignored"]])
            .with("/src/a.ts", vec![vec!["a1"]]);
        let result = result_of(vec![
            filtered("src/b.ts", "b2"),
            filtered("src/a.ts", "a1"),
            filtered("src/b.ts", "b1"),
            filtered("src/b.ts", "ignored"),
        ]);

        let worklist = build_worklist(&result, &source, TestableLimit::Unlimited)
            .await
            .unwrap();

        assert_eq!(
            worklist,
            vec![
                entry("/src/b.ts", "b1"),
                entry("/src/b.ts", "b2"),
                entry("/src/a.ts", "a1"),
            ]
        );
        let mut calls = source.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["/src/a.ts", "/src/b.ts"]);
    }

    #[tokio::test]
    async fn test_build_worklist_skips_files_without_groups() {
        let source = FakeSource::default().with("/src/a.ts", vec![vec!["a1"]]);
        let result = result_of(vec![filtered("src/gone.ts", "g"), filtered("src/a.ts", "a1")]);

        let worklist = build_worklist(&result, &source, TestableLimit::AtMost(30))
            .await
            .unwrap();
        assert_eq!(worklist, vec![entry("/src/a.ts", "a1")]);
    }

    #[tokio::test]
    async fn test_build_worklist_applies_limit() {
        let names: Vec<String> = (0..45).map(|i| format!("fn{}", i)).collect();
        let source = FakeSource::default().with(
            "/src/a.ts",
            vec![names.iter().map(String::as_str).collect()],
        );
        let result = result_of(names.iter().map(|n| filtered("src/a.ts", n)).collect());

        let worklist = build_worklist(&result, &source, TestableLimit::AtMost(30))
            .await
            .unwrap();

        assert_eq!(worklist.len(), 30);
        assert_eq!(worklist[29], entry("/src/a.ts", "fn29"));
    }

    #[tokio::test]
    async fn test_build_worklist_propagates_provider_error() {
        let source = FakeSource {
            fail_on: Some("/src/a.ts".to_string()),
            ..Default::default()
        };
        let result = result_of(vec![filtered("src/a.ts", "a1")]);

        assert!(build_worklist(&result, &source, TestableLimit::Unlimited)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_empty_result_makes_no_calls() {
        let source = FakeSource::default();
        let worklist = build_worklist(&FilteredTestablesResult::default(), &source, TestableLimit::Unlimited)
            .await
            .unwrap();
        assert!(worklist.is_empty());
        assert!(source.calls.lock().unwrap().is_empty());
    }
}
