// SPDX-License-Identifier: MIT

//! Bridges `tracing` events to the host's structured line protocol: every
//! line is prefixed `\x01<level_char>\x02` where `<level_char> ∈
//! {t, d, i, w, e, p}` (trace/debug/info/warn/error/progress).

use std::io::Write;
use std::sync::Mutex;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

fn level_char(level: &Level) -> char {
    match *level {
        Level::TRACE => 't',
        Level::DEBUG => 'd',
        Level::INFO => 'i',
        Level::WARN => 'w',
        Level::ERROR => 'e',
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name().to_string(), format!("{value:?}")));
        }
    }
}

/// A `tracing_subscriber::Layer` that writes every event as one line on a
/// `Write` sink (normally stderr), prefixed with the host's severity
/// marker. Field key=value pairs are appended after the message.
pub struct HostLogLayer {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl HostLogLayer {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self { writer: Mutex::new(Box::new(writer)) }
    }

    pub fn to_stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<S: Subscriber> Layer<S> for HostLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut line = format!("\x01{}\x02{}", level_char(event.metadata().level()), visitor.message);
        for (key, value) in &visitor.fields {
            line.push_str(&format!(" {key}={value}"));
        }

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{line}");
        }
    }
}

/// Emit a progress line outside the normal tracing levels: `\x01p\x02<pct>
/// <message>`. Progress lines carry a numeric percentage.
pub fn emit_progress(percent: u8, message: &str) {
    eprintln!("\x01p\x02{} {message}", percent.min(100));
}

#[cfg(test)]
#[path = "host_log_tests.rs"]
mod tests;
