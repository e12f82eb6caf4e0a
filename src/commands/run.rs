use anyhow::{Context, Result};
use tracing::info;

use crate::app::App;
use crate::cli::{setup, RunArgs};
use crate::config::resolve_run_config;
use crate::orchestrator::run_pr_context_flow;
use crate::summary::format_percentage;

/// Resolve configuration, build the services and run the pull request flow.
pub async fn run(args: RunArgs) -> Result<()> {
    let working_dir = setup::working_directory().context("Failed to determine working directory")?;

    let mut overrides = args.to_overrides();
    if overrides.github_token.as_deref().map_or(true, str::is_empty) {
        overrides.github_token = setup::github_token_from_env();
    }

    let config = resolve_run_config(args.config.as_deref(), overrides, working_dir)
        .context("Invalid configuration")?;
    info!(
        root = %config.root_path.display(),
        threshold = config.coverage_threshold,
        max_testables = %config.max_testables,
        "Starting covgap run"
    );

    let app = App::build(config).context("Failed to initialise services")?;
    let report = run_pr_context_flow(&app).await?;

    info!(
        "Run complete: {} testables queued, coverage {}% → {}%",
        report.worklist_len,
        format_percentage(report.initial_coverage),
        format_percentage(report.final_coverage.or(report.initial_coverage))
    );
    Ok(())
}
