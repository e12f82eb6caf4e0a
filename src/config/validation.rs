//! Validation with error accumulation for run configuration.
//!
//! Every field is checked and all failures are reported together, so a
//! workflow with three bad inputs fails once with three messages instead of
//! three times with one.

use stillwater::{NonEmptyVec, Validation};

use super::core::{RawConfig, RunConfig};
use crate::analysis::TestableLimit;
use crate::errors::Error;

pub const MIN_CONCURRENCY: i64 = 1;
pub const MAX_CONCURRENCY: i64 = 50;
pub const MAX_TESTABLES_CAP: i64 = 30;

pub type ConfigValidation<T> = Validation<T, NonEmptyVec<String>>;

fn success<T>(value: T) -> ConfigValidation<T> {
    Validation::Success(value)
}

fn failure<T>(message: impl Into<String>) -> ConfigValidation<T> {
    Validation::Failure(NonEmptyVec::new(message.into(), Vec::new()))
}

fn collect_errors<T>(validation: ConfigValidation<T>, errors: &mut Vec<String>) -> Option<T> {
    match validation {
        Validation::Success(value) => Some(value),
        Validation::Failure(failures) => {
            errors.extend(failures);
            None
        }
    }
}

pub fn validate_coverage_threshold(value: f64) -> ConfigValidation<f64> {
    if (0.0..=100.0).contains(&value) {
        success(value)
    } else {
        failure(format!(
            "coverage-threshold must be between 0 and 100, got {}",
            value
        ))
    }
}

pub fn validate_concurrency(value: i64) -> ConfigValidation<usize> {
    if (MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&value) {
        success(value as usize)
    } else {
        failure(format!(
            "concurrency must be between {} and {}, got {}",
            MIN_CONCURRENCY, MAX_CONCURRENCY, value
        ))
    }
}

pub fn validate_max_testables(value: i64) -> ConfigValidation<TestableLimit> {
    if value > MAX_TESTABLES_CAP {
        return failure(format!(
            "max-testables must be -1 (unlimited) or between 0 and {}, got {}",
            MAX_TESTABLES_CAP, value
        ));
    }
    match TestableLimit::try_from(value) {
        Ok(limit) => success(limit),
        Err(_) => failure(format!(
            "max-testables must be -1 (unlimited) or between 0 and {}, got {}",
            MAX_TESTABLES_CAP, value
        )),
    }
}

pub fn validate_github_token(token: Option<&str>) -> ConfigValidation<String> {
    match token {
        Some(token) => success(token.to_string()),
        None => failure("token is required (set the `token` input or GITHUB_TOKEN)"),
    }
}

pub fn validate_backend_url(url: &str) -> ConfigValidation<String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        success(url.trim_end_matches('/').to_string())
    } else {
        failure(format!("backend-url must be an http(s) URL, got '{}'", url))
    }
}

/// Check every field of `raw`, accumulating all errors.
pub fn validate_run_config(raw: RawConfig) -> ConfigValidation<RunConfig> {
    let mut errors = Vec::new();

    let coverage_threshold =
        collect_errors(validate_coverage_threshold(raw.coverage_threshold), &mut errors);
    let concurrency = collect_errors(validate_concurrency(raw.concurrency), &mut errors);
    let max_testables = collect_errors(validate_max_testables(raw.max_testables), &mut errors);
    let github_token = collect_errors(
        validate_github_token(raw.github_token.as_deref()),
        &mut errors,
    );
    let backend_url = collect_errors(validate_backend_url(&raw.backend_url), &mut errors);

    match (
        coverage_threshold,
        concurrency,
        max_testables,
        github_token,
        backend_url,
    ) {
        (
            Some(coverage_threshold),
            Some(concurrency),
            Some(max_testables),
            Some(github_token),
            Some(backend_url),
        ) => success(RunConfig {
            root_path: raw.root_path,
            conventions: raw.conventions,
            calculate_coverage: raw.calculate_coverage,
            coverage_threshold,
            concurrency,
            max_testables,
            auto_commit: raw.auto_commit,
            github_token,
            secret_token: raw.secret_token,
            backend_url,
            coverage_command: raw.coverage_command,
            lcov_path: raw.lcov_path,
            generator_command: raw.generator_command,
            generated_marker: raw.generated_marker,
            retry: raw.retry,
        }),
        _ => match NonEmptyVec::from_vec(errors) {
            Some(errors) => Validation::Failure(errors),
            None => failure("configuration validation failed"),
        },
    }
}

/// Convert a validation into a `Result`, joining all messages.
pub fn into_result<T>(validation: ConfigValidation<T>) -> crate::errors::Result<T> {
    match validation {
        Validation::Success(value) => Ok(value),
        Validation::Failure(errors) => {
            let messages = errors.into_iter().collect::<Vec<_>>();
            Err(Error::config(if messages.len() == 1 {
                messages.join("")
            } else {
                format!(
                    "{} problems:\n  - {}",
                    messages.len(),
                    messages.join("\n  - ")
                )
            }))
        }
    }
}
