//! Agent backed by shell commands: a coverage command that writes an LCOV
//! tracefile and a generator command fed with the worklist on stdin.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::RwLock;
use tracing::{debug, info, info_span, Instrument};

use super::lcov_source::LcovTestables;
use super::{GenerationOutcome, TestAgent, TestableSource};
use crate::analysis::{DescriptorGroup, WorklistEntry};
use crate::config::{CoverageMode, RunConfig, TestConventions};
use crate::coverage::CoverageReport;
use crate::errors::{Error, Result};

/// Environment variables describing the test conventions to the generator.
pub const ENV_TEST_FRAMEWORK: &str = "COVGAP_TEST_FRAMEWORK";
pub const ENV_TEST_STRUCTURE: &str = "COVGAP_TEST_STRUCTURE";
pub const ENV_TEST_SUFFIX: &str = "COVGAP_TEST_SUFFIX";
pub const ENV_TEST_FILE_NAME: &str = "COVGAP_TEST_FILE_NAME";
pub const ENV_ROOT_PATH: &str = "COVGAP_ROOT_PATH";

const STDERR_TAIL: usize = 2000;

pub struct ExternalAgent {
    root: PathBuf,
    coverage_mode: CoverageMode,
    coverage_command: String,
    lcov_file: PathBuf,
    generator_command: Option<String>,
    conventions: TestConventions,
    concurrency: usize,
    snapshot: RwLock<Option<LcovTestables>>,
}

impl ExternalAgent {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            root: config.root_path.clone(),
            coverage_mode: config.calculate_coverage,
            coverage_command: config.coverage_command.clone(),
            lcov_file: config.lcov_file(),
            generator_command: config.generator_command.clone(),
            conventions: config.conventions,
            concurrency: config.concurrency.max(1),
            snapshot: RwLock::new(None),
        }
    }

    fn shell(&self, command: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).current_dir(&self.root);
        cmd
    }

    async fn run_coverage_command(&self) -> Result<()> {
        info!("Running coverage command: {}", self.coverage_command);
        let output = self
            .shell(&self.coverage_command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::coverage(format!("Failed to start coverage command: {}", e)))?;

        if !output.status.success() {
            return Err(Error::coverage(format!(
                "Coverage command exited with {}: {}",
                output.status,
                tail(&String::from_utf8_lossy(&output.stderr))
            )));
        }
        Ok(())
    }

    async fn run_batch(&self, command: &str, index: usize, batch: &[WorklistEntry]) -> Result<Vec<String>> {
        let payload = serde_json::to_vec(batch)?;
        debug!(batch = index, entries = batch.len(), "Starting generator");

        let mut child = self
            .shell(command)
            .env(ENV_TEST_FRAMEWORK, self.conventions.framework.as_str())
            .env(ENV_TEST_STRUCTURE, self.conventions.structure.as_str())
            .env(ENV_TEST_SUFFIX, self.conventions.suffix.as_str())
            .env(ENV_TEST_FILE_NAME, self.conventions.file_name.as_str())
            .env(ENV_ROOT_PATH, &self.root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::generation(format!("Failed to start generator: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A generator that exits without reading its input is judged by
            // its exit status alone.
            if let Err(e) = stdin.write_all(&payload).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(Error::generation(format!(
                "generator batch {} exited with {}: {}",
                index,
                output.status,
                tail(&String::from_utf8_lossy(&output.stderr))
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}

#[async_trait]
impl TestableSource for ExternalAgent {
    async fn testables(&self, file_path: &str) -> Result<Vec<DescriptorGroup>> {
        match self.snapshot.read().await.as_ref() {
            Some(snapshot) => Ok(snapshot.groups_for(file_path)),
            None => Err(Error::coverage("Coverage has not been generated yet")),
        }
    }
}

#[async_trait]
impl TestAgent for ExternalAgent {
    async fn generate_coverage(&self) -> Result<()> {
        if self.coverage_mode == CoverageMode::On {
            self.run_coverage_command().await?;
        } else {
            debug!("Coverage calculation disabled, reading existing tracefile");
        }

        if !self.lcov_file.exists() {
            return Err(Error::coverage_with_path(
                format!("LCOV file not found: {}", self.lcov_file.display()),
                &self.lcov_file,
            ));
        }

        let snapshot = LcovTestables::from_file(&self.lcov_file, &self.root)?;
        *self.snapshot.write().await = Some(snapshot);
        Ok(())
    }

    async fn coverage_report(&self) -> Result<Option<CoverageReport>> {
        Ok(self
            .snapshot
            .read()
            .await
            .as_ref()
            .map(|s| s.report().clone()))
    }

    async fn bulk_generate_tests(&self, entries: &[WorklistEntry]) -> Result<GenerationOutcome> {
        if entries.is_empty() {
            return Ok(GenerationOutcome::default());
        }

        let command = self
            .generator_command
            .as_deref()
            .ok_or_else(|| Error::config("generator-command is required to generate tests"))?;

        let batch_size = entries.len().div_ceil(self.concurrency);
        let batches: Vec<&[WorklistEntry]> = entries.chunks(batch_size).collect();
        let batch_count = batches.len();
        info!(
            "Generating tests for {} testables in {} batches",
            entries.len(),
            batch_count
        );

        let results: Vec<Vec<String>> = stream::iter(batches.into_iter().enumerate())
            .map(|(index, batch)| {
                self.run_batch(command, index, batch)
                    .instrument(info_span!("generate_batch", batch = index))
            })
            .boxed()
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(GenerationOutcome {
            requested: entries.len(),
            generated_files: results.into_iter().flatten().collect(),
            batches: batch_count,
        })
    }
}

fn tail(text: &str) -> &str {
    let text = text.trim();
    if text.len() <= STDERR_TAIL {
        return text;
    }
    let mut start = text.len() - STDERR_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TestableDescriptor;
    use crate::config::{resolve_run_config, ConfigOverrides};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const TRACEFILE: &str = indoc! {"
        SF:src/app.ts
        FN:1,start
        FN:5,stop
        FNDA:2,start
        FNDA:0,stop
        DA:1,2
        DA:2,2
        DA:5,0
        DA:6,0
        end_of_record
    "};

    fn agent(dir: &TempDir, generator: Option<&str>, concurrency: i64) -> ExternalAgent {
        std::fs::write(dir.path().join("lcov.info"), TRACEFILE).unwrap();
        let config = resolve_run_config(
            None,
            ConfigOverrides {
                github_token: Some("token".to_string()),
                calculate_coverage: Some(CoverageMode::Off),
                lcov_path: Some(PathBuf::from("lcov.info")),
                generator_command: generator.map(String::from),
                concurrency: Some(concurrency),
                ..Default::default()
            },
            dir.path().to_path_buf(),
        )
        .unwrap();
        ExternalAgent::from_config(&config)
    }

    fn entry(name: &str) -> WorklistEntry {
        WorklistEntry {
            file_path: "/src/app.ts".to_string(),
            testable: TestableDescriptor::named(name),
        }
    }

    #[tokio::test]
    async fn test_testables_before_coverage_is_an_error() {
        let dir = TempDir::new().unwrap();
        let agent = agent(&dir, None, 5);
        assert!(agent.testables("/src/app.ts").await.is_err());
        assert_eq!(agent.coverage_report().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_descriptors_from_tracefile() {
        let dir = TempDir::new().unwrap();
        let agent = agent(&dir, None, 5);
        agent.generate_coverage().await.unwrap();

        let report = agent.coverage_report().await.unwrap().unwrap();
        assert!(report.get("/src/app.ts").is_some());

        let groups = agent.testables("src/app.ts").await.unwrap();
        assert_eq!(groups.len(), 1);
        let (key, descriptors) = &groups[0];
        assert_eq!(key, "/src/app.ts");
        assert_eq!(
            descriptors[1],
            TestableDescriptor::named("stop")
                .with_field("startLine", 5)
                .with_field("uncoveredLines", vec![5u32, 6])
                .with_field("coveragePercentage", 0.0)
                .with_field("filePath", "/src/app.ts")
        );

        assert!(agent.testables("/src/other.ts").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_tracefile() {
        let dir = TempDir::new().unwrap();
        let agent = agent(&dir, None, 5);
        std::fs::remove_file(dir.path().join("lcov.info")).unwrap();

        let err = agent.generate_coverage().await.unwrap_err();
        assert!(err.to_string().contains("LCOV file not found"));
    }

    #[tokio::test]
    async fn test_bulk_generation_runs_batches() {
        let dir = TempDir::new().unwrap();
        let agent = agent(
            &dir,
            Some("cat > /dev/null; echo \"tests/$COVGAP_TEST_FRAMEWORK.early.spec.ts\""),
            2,
        );

        let outcome = agent
            .bulk_generate_tests(&[entry("a"), entry("b"), entry("c")])
            .await
            .unwrap();

        assert_eq!(outcome.requested, 3);
        assert_eq!(outcome.batches, 2);
        assert_eq!(
            outcome.generated_files,
            vec!["tests/jest.early.spec.ts", "tests/jest.early.spec.ts"]
        );
    }

    #[tokio::test]
    async fn test_generator_receives_worklist_json() {
        let dir = TempDir::new().unwrap();
        let agent = agent(&dir, Some("cat > worklist.json"), 1);

        agent.bulk_generate_tests(&[entry("a")]).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("worklist.json")).unwrap();
        let parsed: Vec<WorklistEntry> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, vec![entry("a")]);
    }

    #[tokio::test]
    async fn test_generator_failure() {
        let dir = TempDir::new().unwrap();
        let agent = agent(&dir, Some("echo boom >&2; exit 3"), 1);

        let err = agent.bulk_generate_tests(&[entry("a")]).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_generation_requires_command() {
        let dir = TempDir::new().unwrap();
        let agent = agent(&dir, None, 1);
        let err = agent.bulk_generate_tests(&[entry("a")]).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_tail_keeps_end() {
        let long = "x".repeat(STDERR_TAIL + 10) + "END";
        assert!(tail(&long).ends_with("END"));
        assert_eq!(tail(&long).len(), STDERR_TAIL);
    }
}
