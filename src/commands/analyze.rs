//! Offline reconciliation: tracefile plus changed files in, worklist out.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use crate::agent::LcovTestables;
use crate::analysis::{
    analyze_changed_files, build_worklist, FilteredTestablesResult, TestableFilterConfig,
    TestableLimit, WorklistEntry,
};
use crate::cli::{setup, AnalyzeArgs, OutputFormat};
use crate::config::validation::{into_result, validate_coverage_threshold};
use crate::summary::format_percentage;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeOutput {
    pub threshold: f64,
    pub analysis: FilteredTestablesResult,
    pub worklist: Vec<WorklistEntry>,
}

pub async fn analyze(args: AnalyzeArgs) -> Result<()> {
    let root = match args.root {
        Some(root) => root,
        None => setup::working_directory().context("Failed to determine working directory")?,
    };
    let output = analyze_tracefile(
        &args.lcov,
        &root,
        &args.changed,
        args.threshold,
        args.max_testables,
    )
    .await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Markdown => println!("{}", render_markdown(&output)),
    }
    Ok(())
}

pub async fn analyze_tracefile(
    lcov: &Path,
    root: &Path,
    changed: &[String],
    threshold: f64,
    max_testables: i64,
) -> Result<AnalyzeOutput> {
    let threshold = into_result(validate_coverage_threshold(threshold))?;
    let limit = TestableLimit::try_from(max_testables).map_err(anyhow::Error::msg)?;
    let source = LcovTestables::from_file(lcov, root)
        .with_context(|| format!("Failed to read tracefile {}", lcov.display()))?;

    let filter = TestableFilterConfig {
        coverage_threshold: threshold,
    };
    let analysis = analyze_changed_files(source.report(), changed, &filter);
    let worklist = build_worklist(&analysis, &source, limit).await?;

    Ok(AnalyzeOutput {
        threshold,
        analysis,
        worklist,
    })
}

pub fn render_markdown(output: &AnalyzeOutput) -> String {
    let analysis = &output.analysis;
    let mut md = String::from("## Coverage gaps\n\n");

    let _ = writeln!(
        md,
        "{}/{} testables below {}% across {} files ({} without coverage data)\n",
        analysis.filtered_count,
        analysis.total_analyzed,
        format_percentage(Some(output.threshold)),
        analysis.files_with_coverage + analysis.files_without_coverage,
        analysis.files_without_coverage
    );

    if !analysis.testables.is_empty() {
        md.push_str("| File | Testable | Coverage | Reason |\n");
        md.push_str("|------|----------|----------|--------|\n");
        for testable in &analysis.testables {
            let _ = writeln!(
                md,
                "| `{}` | `{}` | {} | {} |",
                testable.file_path,
                testable.name,
                format_percentage(testable.percentage),
                testable.reason
            );
        }
        md.push('\n');
    }

    let _ = writeln!(md, "Worklist: {} testables", output.worklist.len());
    md
}
