//! Logging setup.
//!
//! Human-readable logs go to stderr through `tracing-subscriber`'s fmt layer,
//! filtered by `COVGAP_LOG` (falling back to the `-v` count). Under the
//! Actions runner, warnings and errors are also emitted as workflow commands
//! on stdout.

pub mod annotations;

pub use annotations::{escape_data, AnnotationLayer};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

pub const LOG_ENV_VAR: &str = "COVGAP_LOG";

/// Default filter directive for a `-v` count.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(verbosity: u8, github_annotations: bool) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    let formatting_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let annotations = github_annotations.then(|| AnnotationLayer::new(std::io::stdout));

    let _ = Registry::default()
        .with(env_filter)
        .with(formatting_layer)
        .with(annotations)
        .try_init();
}
