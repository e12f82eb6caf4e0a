//! Reconciliation of changed files against a coverage report.
//!
//! [`analyze_changed_files`] is pure: no I/O, no logging, no hidden state.
//! Callers log the outcome.

use super::types::{FilterReason, FilteredTestable, FilteredTestablesResult, TestableFilterConfig};
use crate::coverage::{CoverageReport, FileCoverageEntry};

/// Strip at most one leading `/`.
pub fn strip_leading_slash(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Ensure exactly the form `/<path>` for a path without a leading slash,
/// leaving already-slashed paths alone.
pub fn with_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Locate the coverage entry for a normalized (slash-stripped) path.
///
/// Tries, in order: exact key, key with a leading slash, then a
/// case-insensitive scan in report order. The scan accepts either slash form
/// so that `src/A.ts` finds `/src/a.ts`.
pub fn find_file_coverage<'a>(
    report: &'a CoverageReport,
    normalized: &str,
) -> Option<&'a FileCoverageEntry> {
    if let Some(entry) = report.get(normalized) {
        return Some(entry);
    }

    let slashed = with_leading_slash(normalized);
    if let Some(entry) = report.get(&slashed) {
        return Some(entry);
    }

    let lower = normalized.to_lowercase();
    let lower_slashed = slashed.to_lowercase();
    report.iter().find_map(|(key, entry)| {
        let key = key.to_lowercase();
        (key == lower || key == lower_slashed).then_some(entry)
    })
}

/// Decide whether a testable with `percentage` is selected, and why.
pub fn classify(percentage: Option<f64>, threshold: f64) -> Option<FilterReason> {
    match percentage {
        None => Some(FilterReason::NoCoverage),
        Some(p) if p == 0.0 => Some(FilterReason::ZeroCoverage),
        Some(p) if p < threshold => Some(FilterReason::BelowThreshold),
        Some(_) => None,
    }
}

fn filter_file<'a>(
    entry: &'a FileCoverageEntry,
    original_path: &'a str,
    threshold: f64,
) -> impl Iterator<Item = FilteredTestable> + 'a {
    entry.testables.iter().filter_map(move |testable| {
        classify(testable.percentage, threshold).map(|reason| FilteredTestable {
            name: testable.name.clone(),
            percentage: testable.percentage,
            file_path: original_path.to_string(),
            reason,
        })
    })
}

/// Select the under-covered testables of every changed file.
///
/// Each entry of `changed_files` is processed on its own, duplicates
/// included. Output keeps changed-file order first and the report's
/// testable order second; `file_path` is the caller's path verbatim.
pub fn analyze_changed_files(
    report: &CoverageReport,
    changed_files: &[String],
    config: &TestableFilterConfig,
) -> FilteredTestablesResult {
    let mut result = FilteredTestablesResult::default();

    for path in changed_files {
        let Some(entry) = find_file_coverage(report, strip_leading_slash(path)) else {
            result.files_without_coverage += 1;
            continue;
        };

        result.files_with_coverage += 1;
        result.total_analyzed += entry.testables.len();
        result
            .testables
            .extend(filter_file(entry, path, config.coverage_threshold));
    }

    result.filtered_count = result.testables.len();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::TestableCoverage;
    use pretty_assertions::assert_eq;

    fn entry(testables: &[(&str, Option<f64>)]) -> FileCoverageEntry {
        FileCoverageEntry {
            percentage: Some(50.0),
            testables: testables
                .iter()
                .map(|(name, pct)| TestableCoverage::new(*name, *pct))
                .collect(),
        }
    }

    fn threshold(value: f64) -> TestableFilterConfig {
        TestableFilterConfig {
            coverage_threshold: value,
        }
    }

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_strip_leading_slash_only_once() {
        assert_eq!(strip_leading_slash("/src/a.ts"), "src/a.ts");
        assert_eq!(strip_leading_slash("//src/a.ts"), "/src/a.ts");
        assert_eq!(strip_leading_slash("src/a.ts"), "src/a.ts");
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(classify(None, 50.0), Some(FilterReason::NoCoverage));
        assert_eq!(classify(Some(0.0), 50.0), Some(FilterReason::ZeroCoverage));
        assert_eq!(classify(Some(0.0), 0.0), Some(FilterReason::ZeroCoverage));
        assert_eq!(classify(Some(49.9), 50.0), Some(FilterReason::BelowThreshold));
        assert_eq!(classify(Some(50.0), 50.0), None);
        assert_eq!(classify(Some(80.0), 0.0), None);
    }

    #[test]
    fn test_single_file_example() {
        let mut report = CoverageReport::new();
        report.insert("/src/a.ts", entry(&[("foo", None), ("bar", Some(80.0))]));

        let result = analyze_changed_files(&report, &paths(&["src/a.ts"]), &threshold(60.0));

        assert_eq!(
            result,
            FilteredTestablesResult {
                testables: vec![FilteredTestable {
                    name: "foo".to_string(),
                    percentage: None,
                    file_path: "src/a.ts".to_string(),
                    reason: FilterReason::NoCoverage,
                }],
                total_analyzed: 2,
                filtered_count: 1,
                files_with_coverage: 1,
                files_without_coverage: 0,
            }
        );
    }

    #[test]
    fn test_missing_file_counts_without_coverage() {
        let report = CoverageReport::new();
        let result = analyze_changed_files(&report, &paths(&["src/missing.ts"]), &threshold(0.0));

        assert_eq!(result.files_without_coverage, 1);
        assert_eq!(result.files_with_coverage, 0);
        assert_eq!(result.total_analyzed, 0);
        assert!(result.testables.is_empty());
    }

    #[test]
    fn test_zero_coverage_included_at_zero_threshold() {
        let mut report = CoverageReport::new();
        report.insert("src/z.ts", entry(&[("zero", Some(0.0)), ("some", Some(10.0))]));

        let result = analyze_changed_files(&report, &paths(&["src/z.ts"]), &threshold(0.0));

        assert_eq!(result.filtered_count, 1);
        assert_eq!(result.testables[0].reason, FilterReason::ZeroCoverage);
    }

    #[test]
    fn test_duplicate_changed_files_are_not_deduplicated() {
        let mut report = CoverageReport::new();
        report.insert("/src/a.ts", entry(&[("foo", None), ("bar", Some(80.0))]));

        let result = analyze_changed_files(
            &report,
            &paths(&["src/a.ts", "src/a.ts"]),
            &threshold(60.0),
        );

        assert_eq!(result.files_with_coverage, 2);
        assert_eq!(result.total_analyzed, 4);
        assert_eq!(result.filtered_count, 2);
        assert_eq!(result.testables[0], result.testables[1]);
    }

    #[test]
    fn test_lookup_tolerates_slash_and_case() {
        let mut report = CoverageReport::new();
        report.insert("/src/Upper.ts", entry(&[("u", None)]));
        report.insert("lib/plain.ts", entry(&[("p", None)]));

        let result = analyze_changed_files(
            &report,
            &paths(&["/lib/plain.ts", "src/upper.ts", "/SRC/UPPER.TS"]),
            &threshold(0.0),
        );

        assert_eq!(result.files_with_coverage, 3);
        let files: Vec<&str> = result.testables.iter().map(|t| t.file_path.as_str()).collect();
        assert_eq!(files, vec!["/lib/plain.ts", "src/upper.ts", "/SRC/UPPER.TS"]);
    }

    #[test]
    fn test_exact_match_wins_over_case_insensitive() {
        let mut report = CoverageReport::new();
        report.insert("/SRC/a.ts", entry(&[("first", None)]));
        report.insert("/src/a.ts", entry(&[("exact", None)]));

        let result = analyze_changed_files(&report, &paths(&["src/a.ts"]), &threshold(0.0));
        assert_eq!(result.testables[0].name, "exact");
    }

    #[test]
    fn test_case_insensitive_scan_uses_report_order() {
        let mut report = CoverageReport::new();
        report.insert("/SRC/A.ts", entry(&[("first", None)]));
        report.insert("/Src/A.TS", entry(&[("second", None)]));

        let result = analyze_changed_files(&report, &paths(&["src/a.ts"]), &threshold(0.0));
        assert_eq!(result.testables[0].name, "first");
    }

    #[test]
    fn test_empty_inputs() {
        let result = analyze_changed_files(&CoverageReport::new(), &[], &threshold(50.0));
        assert_eq!(result, FilteredTestablesResult::default());
    }
}
