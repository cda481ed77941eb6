//! End-to-end command flow tests without a Telegram connection.
//!
//! Exercises the full chooser → callback pipeline: parse, authorize, two-phase
//! selection, callback resolution and the session-store serialization
//! guarantee, against a recording service-control mock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::types::InlineKeyboardButtonKind;

use servicebot::{
    handle_command, resolve_callback, AppContext, Config, ServiceControl,
};

/// Recording service-control mock with a configurable delay so overlapping
/// invocations would be observable.
struct RecordingControl {
    calls: Mutex<Vec<String>>,
    in_flight: Mutex<usize>,
    overlapped: Mutex<bool>,
    delay: Duration,
}

impl RecordingControl {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            in_flight: Mutex::new(0),
            overlapped: Mutex::new(false),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn saw_overlap(&self) -> bool {
        *self.overlapped.lock().unwrap()
    }

    async fn record(&self, call: String) {
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            *in_flight += 1;
            if *in_flight > 1 {
                *self.overlapped.lock().unwrap() = true;
            }
        }
        self.calls.lock().unwrap().push(call);
        tokio::time::sleep(self.delay).await;
        *self.in_flight.lock().unwrap() -= 1;
    }
}

#[async_trait]
impl ServiceControl for RecordingControl {
    async fn status(&self, services: &[String]) -> Result<Vec<(String, String)>> {
        self.record("status".to_string()).await;
        Ok(services
            .iter()
            .map(|s| (s.clone(), "active".to_string()))
            .collect())
    }

    async fn start(&self, service: &str) -> (String, bool) {
        self.record(format!("start {service}")).await;
        (String::new(), true)
    }

    async fn stop(&self, service: &str) -> (String, bool) {
        self.record(format!("stop {service}")).await;
        (String::new(), true)
    }
}

fn test_context(control: Arc<RecordingControl>) -> AppContext {
    let config = Config {
        api_token: "test-token".to_string(),
        available_ids: vec!["alice".to_string(), "bob".to_string()],
        controllable_services: vec!["A".to_string(), "B".to_string()],
        monitor_interval: 0,
        is_verbose: false,
    };
    AppContext::new(&config, control)
}

fn payload_of(keyboard: &teloxide::types::InlineKeyboardMarkup, row: usize) -> String {
    match &keyboard.inline_keyboard[row][0].kind {
        InlineKeyboardButtonKind::CallbackData(data) => data.clone(),
        other => panic!("expected callback button, got {other:?}"),
    }
}

// ============ Two-phase flow ============

#[tokio::test]
async fn test_chooser_then_tap_starts_service() {
    let control = Arc::new(RecordingControl::new());
    let ctx = test_context(Arc::clone(&control));

    // Phase 1: no selection, chooser offered, facade untouched.
    let reply = handle_command(&ctx, "/servicestart").await;
    assert_eq!(reply.text, "Select service to start:");
    let keyboard = reply.keyboard.expect("chooser expected");
    assert!(control.calls().is_empty());

    // Phase 2: the tapped button's payload round-trips into the action.
    let payload = payload_of(&keyboard, 0);
    assert_eq!(payload, "/servicestart A");

    let outcome = resolve_callback(&ctx, &payload)
        .await
        .expect("payload should resolve");
    assert_eq!(outcome.edit_text, "Started service: A");
    assert_eq!(outcome.toast.as_deref(), Some("Started service: A"));
    assert_eq!(control.calls(), vec!["start A"]);
}

#[tokio::test]
async fn test_cancel_button_resolves_without_side_effects() {
    let control = Arc::new(RecordingControl::new());
    let ctx = test_context(Arc::clone(&control));

    let reply = handle_command(&ctx, "/servicestop").await;
    let keyboard = reply.keyboard.expect("chooser expected");

    // Last row is the Cancel button.
    let cancel_payload = payload_of(&keyboard, keyboard.inline_keyboard.len() - 1);
    assert_eq!(cancel_payload, "/cancel");

    let outcome = resolve_callback(&ctx, &cancel_payload).await.unwrap();
    assert_eq!(outcome.edit_text, "Canceled.");
    assert!(outcome.toast.is_none());
    assert!(control.calls().is_empty());
}

#[tokio::test]
async fn test_forged_payload_is_dropped() {
    let control = Arc::new(RecordingControl::new());
    let ctx = test_context(Arc::clone(&control));

    // The transport echoed back something the bot never issued.
    for forged in ["/servicestart rm-rf", "/servicestop ../../etc", "restart A"] {
        assert!(resolve_callback(&ctx, forged).await.is_none());
    }
    assert!(control.calls().is_empty());
}

// ============ Authorization ============

#[tokio::test]
async fn test_only_whitelisted_identities_have_sessions() {
    let ctx = test_context(Arc::new(RecordingControl::new()));

    assert!(ctx.is_authorized("alice"));
    assert!(ctx.is_authorized("bob"));
    assert!(!ctx.is_authorized("mallory"));

    let sessions = ctx.sessions.lock().await;
    assert_eq!(sessions.len(), 2);
    assert!(sessions.contains_key("alice"));
    assert!(!sessions.contains_key("mallory"));
}

// ============ Status ============

#[tokio::test]
async fn test_service_status_reports_each_service_once() {
    let control = Arc::new(RecordingControl::new());
    let ctx = test_context(Arc::clone(&control));

    let reply = handle_command(&ctx, "/servicestatus").await;
    assert!(reply.text.contains("A: *active*"));
    assert!(reply.text.contains("B: *active*"));
    // One facade query for the whole set, never one per service.
    assert_eq!(control.calls(), vec!["status"]);
}

#[tokio::test]
async fn test_bot_status_report_shape() {
    let ctx = test_context(Arc::new(RecordingControl::new()));

    let reply = handle_command(&ctx, "/status").await;
    assert!(reply.text.starts_with("Uptime: *0* day(s) *0* hour(s)"));
    assert!(reply.text.contains("Memory Usage: Sys: *"));
    assert!(reply.text.contains("MB*, Heap: *"));
}

// ============ Serialization ============

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_never_interleave_side_effects() {
    let control = Arc::new(RecordingControl::new().with_delay(Duration::from_millis(25)));
    let ctx = Arc::new(test_context(Arc::clone(&control)));

    // Two users issue service actions at the same time; the session-store
    // lock must serialize them, exactly as the transport endpoints do.
    let mut handles = Vec::new();
    for (user, text) in [("alice", "/servicestart A"), ("bob", "/servicestop B")] {
        let ctx = Arc::clone(&ctx);
        handles.push(tokio::spawn(async move {
            let sessions = ctx.sessions.lock().await;
            assert!(sessions.contains_key(user));
            handle_command(&ctx, text).await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(!control.saw_overlap(), "service-control calls overlapped");
    let mut calls = control.calls();
    calls.sort();
    assert_eq!(calls, vec!["start A", "stop B"]);
}
