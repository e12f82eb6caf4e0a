//! GitHub Actions runner I/O: step outputs, job summary, runner flags.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{Error, Result};

pub const OUTPUT_PRE_COVERAGE: &str = "pre-coverage";
pub const OUTPUT_POST_COVERAGE: &str = "post-coverage";

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "true").unwrap_or(false)
}

/// Whether we are running under the Actions runner.
pub fn is_github_actions() -> bool {
    env_flag("GITHUB_ACTIONS")
}

/// Whether step debug logging is enabled for the workflow.
pub fn is_debug() -> bool {
    env_flag("ACTIONS_STEP_DEBUG")
}

/// Handle to the runner's output and summary files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionsIo {
    output_file: Option<PathBuf>,
    summary_file: Option<PathBuf>,
}

impl ActionsIo {
    pub fn new(output_file: Option<PathBuf>, summary_file: Option<PathBuf>) -> Self {
        Self {
            output_file,
            summary_file,
        }
    }

    /// Read `GITHUB_OUTPUT` and `GITHUB_STEP_SUMMARY`.
    pub fn from_env() -> Self {
        let path = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self::new(path("GITHUB_OUTPUT"), path("GITHUB_STEP_SUMMARY"))
    }

    /// Set a step output. Multi-line values use the delimiter form.
    pub fn set_output(&self, name: &str, value: &str) -> Result<()> {
        let Some(file) = &self.output_file else {
            println!("::set-output name={}::{}", name, value);
            return Ok(());
        };

        let entry = if value.contains('\n') {
            let delimiter = format!("covgap_{}_EOF", name.replace('-', "_"));
            format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter)
        } else {
            format!("{}={}\n", name, value)
        };
        append(file, &entry)
    }

    /// Append markdown to the job summary.
    pub fn append_summary(&self, markdown: &str) -> Result<()> {
        match &self.summary_file {
            Some(file) => append(file, &format!("{}\n", markdown)),
            None => Err(Error::config(
                "GITHUB_STEP_SUMMARY is not set; cannot write job summary",
            )),
        }
    }
}

fn append(path: &Path, contents: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_set_output_appends_lines() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("output");
        let io = ActionsIo::new(Some(output.clone()), None);

        io.set_output(OUTPUT_PRE_COVERAGE, "41.5").unwrap();
        io.set_output(OUTPUT_POST_COVERAGE, "").unwrap();
        io.set_output("report", "line one\nline two").unwrap();

        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            indoc! {"
                pre-coverage=41.5
                post-coverage=
                report<<covgap_report_EOF
                line one
                line two
                covgap_report_EOF
            "}
        );
    }

    #[test]
    fn test_append_summary_without_file_fails() {
        assert!(ActionsIo::default().append_summary("# hi").is_err());
    }

    #[test]
    fn test_append_summary_writes_markdown() {
        let temp = TempDir::new().unwrap();
        let summary = temp.path().join("summary.md");
        let io = ActionsIo::new(None, Some(summary.clone()));

        io.append_summary("first").unwrap();
        io.append_summary("second").unwrap();
        assert_eq!(std::fs::read_to_string(summary).unwrap(), "first\nsecond\n");
    }
}
