//! Structured log output of the navigator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use folio_core::testing::FakeDom;
use folio_core::{FolioConfig, ModalOptions, Navigator, PortfolioShell, SectionRegistry};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    target: String,
    message: String,
    fields: HashMap<String, String>,
}

#[derive(Default, Clone)]
struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl Capture {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn messages(&self, target: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.target == target)
            .map(|e| e.message)
            .collect()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        self.events.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            message: fields.remove("message").unwrap_or_default(),
            fields,
        });
    }
}

fn with_captured_tracing<F: FnOnce()>(f: F) -> Capture {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture
}

fn navigator() -> Navigator<FakeDom> {
    Navigator::new(
        FakeDom::portfolio(),
        SectionRegistry::portfolio(),
        FolioConfig::default(),
    )
}

#[test]
fn navigation_opens_transition_span() {
    let capture = with_captured_tracing(|| {
        let mut nav = navigator();
        nav.navigate_to_section("projects");
    });
    let spans = capture.spans();
    let span = spans
        .iter()
        .find(|s| s.name == "nav.transition")
        .expect("nav.transition span");
    assert_eq!(span.fields.get("section").map(String::as_str), Some("projects"));
    assert_eq!(span.fields.get("generation").map(String::as_str), Some("1"));
}

#[test]
fn release_cause_is_logged() {
    let capture = with_captured_tracing(|| {
        let mut nav = navigator();
        nav.navigate_to_section("contact");
        nav.host_mut().advance(Duration::from_millis(800));
        nav.poll_timers();
    });
    let released: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.target == "folio.nav" && e.message == "transition released")
        .collect();
    assert_eq!(released.len(), 1);
    assert_eq!(
        released[0].fields.get("cause").map(String::as_str),
        Some("settle-timer")
    );
}

#[test]
fn ignored_inputs_carry_a_reason() {
    let capture = with_captured_tracing(|| {
        let mut nav = navigator();
        nav.navigate_to_section("blog");
    });
    let event = capture
        .events()
        .into_iter()
        .find(|e| e.message == "navigation ignored")
        .expect("ignored event");
    assert_eq!(event.target, "folio.nav");
    assert_eq!(
        event.fields.get("reason").map(String::as_str),
        Some("invalid section id")
    );
}

#[test]
fn modal_events_use_modal_target() {
    let capture = with_captured_tracing(|| {
        let mut shell: PortfolioShell<FakeDom, &str> = PortfolioShell::new(
            FakeDom::portfolio(),
            SectionRegistry::portfolio(),
            FolioConfig::default(),
        );
        shell.open_modal("about", ModalOptions::new());
        shell.close_modal();
    });
    assert_eq!(capture.messages("folio.modal"), ["modal opened", "modal closed"]);
}

#[test]
fn observer_start_is_logged_under_watch_target() {
    let capture = with_captured_tracing(|| {
        let mut nav = navigator();
        nav.setup_intersection_observer();
    });
    assert!(
        capture
            .messages("folio.watch")
            .iter()
            .any(|m| m == "observer started")
    );
}
