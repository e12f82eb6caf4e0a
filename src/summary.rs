//! Human-readable run summary for the job summary page.

use serde::{Deserialize, Serialize};

/// Counts describing the changed files of the pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFilesStats {
    pub changed_files_count: usize,
    pub candidate_files_count: usize,
    pub function_count: usize,
    pub testables_to_generate_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageDelta {
    pub before: Option<f64>,
    pub after: Option<f64>,
}

/// Data collected over a run, rendered at the end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub warnings: Vec<String>,
    pub changed_files: Option<ChangedFilesStats>,
    pub coverage: Option<CoverageDelta>,
    pub generated: Option<usize>,
    pub auto_committed: bool,
}

/// Format a coverage percentage for humans: at most two decimals, no
/// trailing zeros, `n/a` when unmeasured.
pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        None => "n/a".to_string(),
        Some(v) => {
            let rounded = format!("{:.2}", v);
            rounded
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        }
    }
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn set_changed_files(&mut self, stats: ChangedFilesStats) {
        self.changed_files = Some(stats);
    }

    pub fn set_coverage(&mut self, before: Option<f64>, after: Option<f64>) {
        self.coverage = Some(CoverageDelta { before, after });
    }

    pub fn set_generated(&mut self, generated: usize) {
        self.generated = Some(generated);
    }

    pub fn set_auto_committed(&mut self, enabled: bool) {
        self.auto_committed = enabled;
    }

    /// Render as markdown: warnings first, then the report body.
    pub fn to_markdown(&self) -> String {
        let mut lines: Vec<String> = self
            .warnings
            .iter()
            .map(|w| format!("⚠️ {}", w))
            .collect();

        lines.push(String::new());
        lines.push("🧪 **Early Catch Test Generation Report**".to_string());
        lines.push(String::new());

        if let Some(stats) = &self.changed_files {
            lines.push(format!("- Changed files: {}", stats.changed_files_count));
            lines.push(format!(
                "- Files with testable code: {}",
                stats.candidate_files_count
            ));
            lines.push(format!("- Total methods: {}", stats.function_count));
            lines.push(format!(
                "- Methods below threshold: {}",
                stats.testables_to_generate_count
            ));
        }

        if let Some(delta) = &self.coverage {
            lines.push(format!(
                "- Coverage: {}% → {}%",
                format_percentage(delta.before),
                format_percentage(delta.after)
            ));
        }

        if let Some(generated) = self.generated {
            lines.push(String::new());
            lines.push(format!(
                "✅ Generated unit tests for {} functions below threshold.",
                generated
            ));
        }

        if self.auto_committed {
            lines.push("ℹ️ Auto-committed test files to this branch.".to_string());
        }

        lines.join("\n")
    }
}
