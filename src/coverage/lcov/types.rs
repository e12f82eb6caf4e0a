//! Parsed LCOV data, before it is turned into a [`CoverageReport`].
//!
//! [`CoverageReport`]: crate::coverage::CoverageReport

use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Coverage for a single function record (`FN`/`FNDA` plus its `DA` lines).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCoverage {
    pub name: String,
    pub start_line: u32,
    /// `None` when the tracefile carried no `FNDA` record for the function
    pub execution_count: Option<u64>,
    /// `None` when nothing measured the function
    pub coverage_percentage: Option<f64>,
    pub uncovered_lines: Vec<u32>,
}

impl FunctionCoverage {
    pub fn new(name: impl Into<String>, start_line: u32) -> Self {
        Self {
            name: name.into(),
            start_line,
            execution_count: None,
            coverage_percentage: None,
            uncovered_lines: Vec::new(),
        }
    }
}

/// One source file, merged across every `SF` block that named it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LcovFile {
    /// Functions in the order the tracefile declared them
    pub functions: Vec<FunctionCoverage>,
    /// `DA` execution counts by line
    pub lines: BTreeMap<u32, u64>,
    pub lines_found: u32,
    pub lines_hit: u32,
}

impl LcovFile {
    pub fn percentage(&self) -> Option<f64> {
        (self.lines_found > 0).then(|| self.lines_hit as f64 / self.lines_found as f64 * 100.0)
    }
}

/// Parsed LCOV coverage data, keyed by the `SF` path as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LcovData {
    pub files: IndexMap<PathBuf, LcovFile>,
    pub total_lines: u64,
    pub lines_hit: u64,
}

impl LcovData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Line coverage across every file, `None` if the tracefile had no lines.
    pub fn overall_percentage(&self) -> Option<f64> {
        (self.total_lines > 0).then(|| self.lines_hit as f64 / self.total_lines as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcov_data_default() {
        let data = LcovData::default();
        assert_eq!(data.total_lines, 0);
        assert!(data.files.is_empty());
        assert_eq!(data.overall_percentage(), None);
    }

    #[test]
    fn test_file_percentage() {
        let file = LcovFile {
            lines_found: 4,
            lines_hit: 1,
            ..Default::default()
        };
        assert_eq!(file.percentage(), Some(25.0));
        assert_eq!(LcovFile::default().percentage(), None);
    }
}
