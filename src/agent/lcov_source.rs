//! Testable descriptors derived from an LCOV tracefile.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::path::Path;
use tracing::debug;

use super::TestableSource;
use crate::analysis::reconcile::{strip_leading_slash, with_leading_slash};
use crate::analysis::{DescriptorGroup, TestableDescriptor};
use crate::coverage::lcov::{build_report, functions_by_key, parse_lcov_file, FunctionCoverage, LcovData};
use crate::coverage::CoverageReport;
use crate::errors::Result;

/// A parsed tracefile: the coverage report plus function records per file.
#[derive(Debug, Clone)]
pub struct LcovTestables {
    report: CoverageReport,
    functions: IndexMap<String, Vec<FunctionCoverage>>,
}

impl LcovTestables {
    pub fn from_data(data: &LcovData, root: &Path) -> Self {
        Self {
            report: build_report(data, root),
            functions: functions_by_key(data, root),
        }
    }

    pub fn from_file(lcov_file: &Path, root: &Path) -> Result<Self> {
        let data = parse_lcov_file(lcov_file)?;
        Ok(Self::from_data(&data, root))
    }

    pub fn report(&self) -> &CoverageReport {
        &self.report
    }

    /// One group for `file_path`, or none when the tracefile has no function
    /// records for it.
    ///
    /// The file is located the way reconciliation locates it (exact, then
    /// slashed, then case-insensitive), but the group is always keyed by the
    /// requested path in its leading-slash form.
    pub fn groups_for(&self, file_path: &str) -> Vec<DescriptorGroup> {
        let key = with_leading_slash(file_path);
        let Some(functions) = self.find_functions(file_path) else {
            debug!(file = %key, "No function records for file");
            return Vec::new();
        };

        let descriptors = functions.iter().map(|f| descriptor(f, &key)).collect();
        vec![(key, descriptors)]
    }

    fn find_functions(&self, file_path: &str) -> Option<&Vec<FunctionCoverage>> {
        let normalized = strip_leading_slash(file_path);
        let slashed = with_leading_slash(normalized);
        if let Some(functions) = self
            .functions
            .get(normalized)
            .or_else(|| self.functions.get(&slashed))
        {
            return Some(functions);
        }

        let lower = normalized.to_lowercase();
        let lower_slashed = slashed.to_lowercase();
        self.functions.iter().find_map(|(key, functions)| {
            let key = key.to_lowercase();
            (key == lower || key == lower_slashed).then_some(functions)
        })
    }
}

#[async_trait]
impl TestableSource for LcovTestables {
    async fn testables(&self, file_path: &str) -> Result<Vec<DescriptorGroup>> {
        Ok(self.groups_for(file_path))
    }
}

fn descriptor(function: &FunctionCoverage, file_path: &str) -> TestableDescriptor {
    let percentage = function
        .coverage_percentage
        .map_or(Value::Null, |p| json!(p));
    TestableDescriptor::named(function.name.clone())
        .with_field("startLine", function.start_line)
        .with_field("uncoveredLines", function.uncovered_lines.clone())
        .with_field("coveragePercentage", percentage)
        .with_field("filePath", file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::lcov::parse_lcov_reader;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unmeasured_function_has_null_percentage() {
        let input = indoc! {"
            SF:src/app.ts
            FN:1,declared
            end_of_record
        "};
        let data = parse_lcov_reader(input.as_bytes()).unwrap();
        let source = LcovTestables::from_data(&data, Path::new("/repo"));

        let groups = source.groups_for("/src/app.ts");
        assert_eq!(
            groups,
            vec![(
                "/src/app.ts".to_string(),
                vec![TestableDescriptor::named("declared")
                    .with_field("startLine", 1)
                    .with_field("uncoveredLines", Vec::<u32>::new())
                    .with_field("coveragePercentage", Value::Null)
                    .with_field("filePath", "/src/app.ts")]
            )]
        );
    }

    #[test]
    fn test_unknown_file_has_no_groups() {
        let data = parse_lcov_reader("".as_bytes()).unwrap();
        let source = LcovTestables::from_data(&data, Path::new("/repo"));
        assert!(source.groups_for("src/missing.ts").is_empty());
    }

    #[test]
    fn test_case_mismatch_keeps_requested_key() {
        let input = indoc! {"
            SF:src/app.ts
            FN:3,boot
            FNDA:0,boot
            DA:3,0
            end_of_record
        "};
        let data = parse_lcov_reader(input.as_bytes()).unwrap();
        let source = LcovTestables::from_data(&data, Path::new("/repo"));

        let groups = source.groups_for("src/App.ts");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, "/src/App.ts");
        assert_eq!(groups[0].1[0].name.as_deref(), Some("boot"));
        assert_eq!(groups[0].1[0].extra["filePath"], json!("/src/App.ts"));
    }
}
