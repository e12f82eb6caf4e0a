//! The pull request flow: coverage, reconciliation, generation, commit.
//!
//! Authentication and audit logging are best effort. Coverage, changed
//! files and generation failures end the run; the end of the operation is
//! still logged when a workflow run was opened.

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};

use crate::actions::{OUTPUT_POST_COVERAGE, OUTPUT_PRE_COVERAGE};
use crate::agent::GenerationOutcome;
use crate::analysis::{analyze_changed_files, build_worklist, FilteredTestablesResult};
use crate::api::{CloseWorkflowRequest, OpenWorkflowRequest};
use crate::app::App;
use crate::coverage::CoverageReport;
use crate::errors::{Error, Result};
use crate::git::CommitResult;
use crate::github::ChangedFiles;
use crate::summary::{ChangedFilesStats, RunSummary};

/// Backend handle for an opened workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    pub id: String,
}

/// Coverage measured before any test was generated.
#[derive(Debug, Clone)]
pub struct InitialCoverage {
    pub report: CoverageReport,
    pub percentage: Option<f64>,
}

/// What a completed run did.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub workflow_run_id: Option<String>,
    pub initial_coverage: Option<f64>,
    pub final_coverage: Option<f64>,
    pub changed_files: Option<ChangedFiles>,
    pub analysis: Option<FilteredTestablesResult>,
    pub worklist_len: usize,
    pub generation: Option<GenerationOutcome>,
    pub commit: Option<CommitResult>,
    #[serde(skip)]
    pub summary: RunSummary,
}

/// Run the whole flow for the current pull request.
pub async fn run_pr_context_flow(app: &App) -> Result<RunReport> {
    let workflow = login_and_log_start(app)
        .instrument(info_span!("log_start"))
        .await;

    let mut report = RunReport {
        workflow_run_id: workflow.as_ref().map(|w| w.id.clone()),
        ..Default::default()
    };

    let outcome = run_stages(app, &mut report).await;
    if let Err(e) = &outcome {
        error!("Agent flow failed: {}", e);
        report.summary.add_warning(format!("Run failed: {}", e));
    }

    if let Some(run) = &workflow {
        log_end_operation(app, run).await;
    }
    write_summary(app, &report.summary);

    outcome.map(|()| report)
}

async fn run_stages(app: &App, report: &mut RunReport) -> Result<()> {
    let initial = generate_initial_coverage(app)
        .instrument(info_span!("initial_coverage"))
        .await?;
    report.initial_coverage = initial.percentage;
    report
        .summary
        .set_coverage(initial.percentage, initial.percentage);

    let changed = app.changed_files.changed_files().await?;

    let analysis = analyze_changed_files(
        &initial.report,
        &changed.files,
        &app.config.filter_config(),
    );
    log_analysis(&analysis, &mut report.summary);

    let worklist = build_worklist(&analysis, app.agent.as_ref(), app.config.max_testables)
        .instrument(info_span!("worklist"))
        .await?;

    report.summary.set_changed_files(ChangedFilesStats {
        changed_files_count: changed.total_processed,
        candidate_files_count: changed.files.len(),
        function_count: analysis.total_analyzed,
        testables_to_generate_count: worklist.len(),
    });
    report.worklist_len = worklist.len();
    report.changed_files = Some(changed);
    report.analysis = Some(analysis);

    if worklist.is_empty() {
        warn!("No filtered testables result");
        report.summary.add_warning("No testables below the coverage threshold");
        return Ok(());
    }
    info!("Filtered testables result count: {}", worklist.len());

    let generation = app
        .agent
        .bulk_generate_tests(&worklist)
        .instrument(info_span!("generate", testables = worklist.len()))
        .await?;
    report.summary.set_generated(worklist.len());
    report.generation = Some(generation);

    if app.config.auto_commit {
        let commit = app.committer.commit_generated(app.context.branch()).await;
        report.summary.set_auto_committed(commit.is_success());
        if let Some(e) = &commit.error {
            report
                .summary
                .add_warning(format!("Failed to commit generated tests: {}", e));
        }
        report.commit = Some(commit);
    } else {
        info!("Auto-commit is disabled - skipping commit step");
    }

    let final_coverage = generate_final_coverage(app, initial.percentage)
        .instrument(info_span!("final_coverage"))
        .await?;
    report.final_coverage = final_coverage;
    report
        .summary
        .set_coverage(initial.percentage, final_coverage);

    Ok(())
}

async fn login_and_log_start(app: &App) -> Option<WorkflowRun> {
    if let Err(e) = app.backend.login().await {
        warn!("Failed to authenticate: {}", e);
        return None;
    }
    info!("Successfully authenticated with the API");

    let request = OpenWorkflowRequest::new(
        &app.git_info,
        &app.config,
        app.context.pull_request_url(),
        Utc::now(),
    );
    match app.backend.log_start_operation(&request).await {
        Ok(id) => Some(WorkflowRun { id }),
        Err(e) => {
            warn!("Failed to log workflow start: {}", e);
            None
        }
    }
}

async fn log_end_operation(app: &App, run: &WorkflowRun) {
    let request = CloseWorkflowRequest::new(run.id.clone(), Utc::now());
    match app.backend.log_end_operation(&request).await {
        Ok(()) => info!("Successfully logged workflow end"),
        Err(e) => warn!("Failed to log workflow end: {}", e),
    }
}

async fn current_report(app: &App, stage: &str) -> Result<CoverageReport> {
    app.agent.generate_coverage().await?;
    app.agent
        .coverage_report()
        .await?
        .ok_or_else(|| Error::coverage(format!("Failed to generate {} coverage tree", stage)))
}

async fn generate_initial_coverage(app: &App) -> Result<InitialCoverage> {
    info!("Generating initial coverage...");
    let report = current_report(app, "initial").await?;
    let percentage = report.overall_percentage();

    set_output(app, OUTPUT_PRE_COVERAGE, percentage);
    set_output(app, OUTPUT_POST_COVERAGE, percentage);
    info!("Initial coverage: {}%", display_percentage(percentage));

    Ok(InitialCoverage { report, percentage })
}

async fn generate_final_coverage(app: &App, initial: Option<f64>) -> Result<Option<f64>> {
    info!("Generating final coverage...");
    let report = current_report(app, "final").await?;
    let percentage = report.overall_percentage();

    set_output(app, OUTPUT_POST_COVERAGE, percentage);
    info!(
        "Coverage comparison: {}% → {}%",
        display_percentage(initial),
        display_percentage(percentage)
    );
    Ok(percentage)
}

fn log_analysis(analysis: &FilteredTestablesResult, summary: &mut RunSummary) {
    let files = analysis.files_with_coverage + analysis.files_without_coverage;
    info!(
        "Coverage analysis complete: {}/{} testables below threshold across {} files",
        analysis.filtered_count, analysis.total_analyzed, files
    );

    if analysis.files_without_coverage > 0 {
        let message = format!(
            "{} changed files have no coverage data",
            analysis.files_without_coverage
        );
        warn!("{}", message);
        summary.add_warning(message);
    }
}

fn display_percentage(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "unknown".to_string())
}

/// Step outputs are best effort; an unwritable output file only warns.
fn set_output(app: &App, name: &str, value: Option<f64>) {
    let value = value.map(|v| v.to_string()).unwrap_or_default();
    if let Err(e) = app.actions.set_output(name, &value) {
        warn!("Failed to set output {}: {}", name, e);
    }
}

fn write_summary(app: &App, summary: &RunSummary) {
    if let Err(e) = app.actions.append_summary(&summary.to_markdown()) {
        tracing::debug!("Job summary not written: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_percentage() {
        assert_eq!(display_percentage(Some(42.5)), "42.5");
        assert_eq!(display_percentage(None), "unknown");
    }

    #[test]
    fn test_log_analysis_warns_about_uncovered_files() {
        let mut summary = RunSummary::new();
        let analysis = FilteredTestablesResult {
            files_with_coverage: 1,
            files_without_coverage: 2,
            ..Default::default()
        };
        log_analysis(&analysis, &mut summary);
        assert_eq!(
            summary.warnings,
            vec!["2 changed files have no coverage data".to_string()]
        );
    }
}
