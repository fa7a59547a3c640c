#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use tracing::span;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer as _;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

/// Captures tracing events and span fields during a test.
///
/// Installed as the thread default, so it sees everything logged from a
/// `#[tokio::test]` (current-thread runtime) including spawned tasks.
pub struct TestLogCapture {
    logs: Arc<Mutex<Vec<CapturedLog>>>,
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

#[derive(Debug, Clone)]
pub struct CapturedLog {
    pub level: tracing::Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct CapturedSpan {
    pub name: String,
    pub fields: Vec<(String, String)>,
}

impl TestLogCapture {
    /// Start capturing everything. Capture stops when the returned value drops.
    pub fn start() -> Self {
        Self::start_filtered("trace")
    }

    /// Start capturing only what `directive` (an `EnvFilter` string such as
    /// `keycheck=trace`) enables.
    pub fn start_filtered(directive: &str) -> Self {
        let logs = Arc::new(Mutex::new(Vec::new()));
        let spans = Arc::new(Mutex::new(Vec::new()));
        let layer = CaptureLayer {
            logs: logs.clone(),
            spans: spans.clone(),
        };

        let subscriber =
            tracing_subscriber::registry().with(layer.with_filter(EnvFilter::new(directive)));
        let guard = tracing::subscriber::set_default(subscriber);

        Self {
            logs,
            spans,
            _guard: guard,
        }
    }

    /// Assert a message was logged containing the given substring.
    pub fn assert_logged(&self, needle: &str) {
        let logs = self.logs.lock().unwrap();
        let found = logs.iter().any(|l| l.message.contains(needle));
        assert!(
            found,
            "Expected log containing '{}'. Logged: {:#?}",
            needle,
            logs.iter().map(|l| &l.message).collect::<Vec<_>>()
        );
    }

    /// Assert a message was logged at the given level.
    pub fn assert_logged_at_level(&self, level: tracing::Level, needle: &str) {
        let logs = self.logs.lock().unwrap();
        let found = logs
            .iter()
            .any(|l| l.level == level && l.message.contains(needle));
        assert!(
            found,
            "Expected {} log containing '{}'. Logged: {:#?}",
            level,
            needle,
            logs.iter()
                .filter(|l| l.level == level)
                .map(|l| &l.message)
                .collect::<Vec<_>>()
        );
    }

    /// Assert no errors were logged.
    pub fn assert_no_errors(&self) {
        let logs = self.logs.lock().unwrap();
        let errors: Vec<_> = logs
            .iter()
            .filter(|l| l.level == tracing::Level::ERROR)
            .collect();
        assert!(errors.is_empty(), "Unexpected errors: {:#?}", errors);
    }

    /// Assert a structured field was logged on an event or a span.
    pub fn assert_field_logged(&self, field_name: &str, field_value: &str) {
        let matches = |fields: &[(String, String)]| {
            fields
                .iter()
                .any(|(k, v)| k == field_name && v.contains(field_value))
        };
        let in_events = self.logs.lock().unwrap().iter().any(|l| matches(&l.fields));
        let in_spans = self.spans.lock().unwrap().iter().any(|s| matches(&s.fields));
        assert!(
            in_events || in_spans,
            "Expected field {}={}. Logged: {:#?} Spans: {:#?}",
            field_name,
            field_value,
            self.logs(),
            self.spans()
        );
    }

    /// Assert `needle` appears nowhere: not in messages, event fields,
    /// targets, or span fields.
    pub fn assert_never_logged(&self, needle: &str) {
        let text = self.all_text();
        assert!(
            !text.contains(needle),
            "Secret material leaked into logs:\n{text}"
        );
    }

    /// Everything captured, flattened into one string.
    pub fn all_text(&self) -> String {
        let mut out = String::new();
        for log in self.logs.lock().unwrap().iter() {
            out.push_str(&format!("{} {} {}", log.level, log.target, log.message));
            for (k, v) in &log.fields {
                out.push_str(&format!(" {k}={v}"));
            }
            out.push('\n');
        }
        for span in self.spans.lock().unwrap().iter() {
            out.push_str(&format!("span {}", span.name));
            for (k, v) in &span.fields {
                out.push_str(&format!(" {k}={v}"));
            }
            out.push('\n');
        }
        out
    }

    /// Get all captured events.
    pub fn logs(&self) -> Vec<CapturedLog> {
        self.logs.lock().unwrap().clone()
    }

    /// Get all captured spans with their recorded fields.
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }
}

struct CaptureLayer {
    logs: Arc<Mutex<Vec<CapturedLog>>>,
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
}

/// Index into `spans`, stored in the span's extensions.
struct SpanSlot(usize);

impl<S> tracing_subscriber::Layer<S> for CaptureLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &span::Attributes<'_>,
        id: &span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);

        let mut spans = self.spans.lock().unwrap();
        spans.push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.fields,
        });
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanSlot(spans.len() - 1));
        }
    }

    fn on_record(
        &self,
        id: &span::Id,
        values: &span::Record<'_>,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor::default();
        values.record(&mut visitor);

        let Some(span) = ctx.span(id) else { return };
        let extensions = span.extensions();
        if let Some(SpanSlot(index)) = extensions.get::<SpanSlot>()
            && let Some(captured) = self.spans.lock().unwrap().get_mut(*index)
        {
            captured.fields.extend(visitor.fields);
        }
    }

    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let log = CapturedLog {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        };

        self.logs.lock().unwrap().push(log);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let name = field.name();
        if name == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push((name.to_string(), format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        let name = field.name();
        if name == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((name.to_string(), value.to_string()));
        }
    }
}
