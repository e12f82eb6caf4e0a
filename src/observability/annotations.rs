//! A `tracing` layer that turns WARN and ERROR events into GitHub Actions
//! workflow commands, so they show up as annotations on the run.

use std::fmt::Write as _;
use std::io::Write;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};

/// Escape a message per the workflow command data rules.
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Emits `::warning::` / `::error::` lines for matching events.
pub struct AnnotationLayer<W> {
    make_writer: W,
}

impl<W> AnnotationLayer<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    pub fn new(make_writer: W) -> Self {
        Self { make_writer }
    }
}

impl<S, W> Layer<S> for AnnotationLayer<W>
where
    S: Subscriber,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let command = match *event.metadata().level() {
            Level::ERROR => "error",
            Level::WARN => "warning",
            _ => return,
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let text = format!("{}{}", visitor.message, visitor.fields);
        let mut writer = self.make_writer.make_writer();
        let _ = writeln!(writer, "::{}::{}", command, escape_data(&text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("50% done\nnext"), "50%25 done%0Anext");
    }

    #[test]
    fn test_warn_and_error_become_commands() {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber =
            Registry::default().with(AnnotationLayer::new(move || writer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("not annotated");
            tracing::warn!("3 changed files have no coverage data");
            tracing::error!(stage = "coverage", "Agent flow failed");
        });

        assert_eq!(
            buffer.contents(),
            "::warning::3 changed files have no coverage data\n\
             ::error::Agent flow failed stage=coverage\n"
        );
    }
}
