#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chatmux::client::{ChatClient, SessionController, SessionView};
use chatmux::{Message, Session};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PLACEHOLDER_TITLE: &str = "new session";

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Sessions(Vec<String>, Option<String>),
    Reset(Vec<Message>),
    Append(Message),
    Loading(bool),
    Error(String),
    ClearInput,
    Confirm(String),
}

/// Records every call the controller makes into the view.
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
    confirm: AtomicBool,
}

impl RecordingView {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingView {
            events: Mutex::new(Vec::new()),
            confirm: AtomicBool::new(true),
        })
    }

    pub fn declining() -> Arc<Self> {
        let view = Self::new();
        view.confirm.store(false, Ordering::SeqCst);
        view
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Error(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// What the transcript shows after replaying resets and appends, with
    /// `None` standing for the welcome placeholder.
    pub fn transcript(&self) -> Option<Vec<Message>> {
        let mut shown: Option<Vec<Message>> = Some(Vec::new());
        for event in self.events() {
            match event {
                ViewEvent::Reset(messages) if messages.is_empty() => shown = None,
                ViewEvent::Reset(messages) => shown = Some(messages),
                ViewEvent::Append(message) => shown.get_or_insert_with(Vec::new).push(message),
                _ => {}
            }
        }
        shown
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn record(&self, event: ViewEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl SessionView for RecordingView {
    fn render_sessions(&self, sessions: &[Session], active: Option<&str>) {
        self.record(ViewEvent::Sessions(
            sessions.iter().map(|s| s.id.clone()).collect(),
            active.map(str::to_string),
        ));
    }

    fn reset_transcript(&self, messages: &[Message]) {
        self.record(ViewEvent::Reset(messages.to_vec()));
    }

    fn append_message(&self, message: &Message) {
        self.record(ViewEvent::Append(message.clone()));
    }

    fn set_loading(&self, loading: bool) {
        self.record(ViewEvent::Loading(loading));
    }

    fn show_error(&self, text: &str) {
        self.record(ViewEvent::Error(text.to_string()));
    }

    fn clear_input(&self) {
        self.record(ViewEvent::ClearInput);
    }

    fn confirm_delete(&self, session: &Session) -> bool {
        self.record(ViewEvent::Confirm(session.id.clone()));
        self.confirm.load(Ordering::SeqCst)
    }
}

pub type TestController = SessionController<Arc<RecordingView>>;

pub fn controller(server: &MockServer, view: &Arc<RecordingView>) -> TestController {
    let client = ChatClient::new(&server.uri(), None).unwrap();
    SessionController::new(client, Arc::clone(view), PLACEHOLDER_TITLE)
}

pub fn session_json(id: &str, title: &str) -> Value {
    json!({"id": id, "title": title, "time": "2025-01-01 10:00"})
}

pub fn ok(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

pub async fn mount(server: &MockServer, endpoint: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn mount_list(server: &MockServer, sessions: Vec<Value>, current: Option<&str>) {
    mount(
        server,
        "/sessions/list",
        ok(json!({"sessions": sessions, "current_session_id": current})),
    )
    .await;
}

pub async fn mount_set_current(server: &MockServer) {
    mount(
        server,
        "/sessions/set_current",
        ok(json!({"status": "success", "message": "current session set"})),
    )
    .await;
}

pub async fn mount_create(server: &MockServer, session_id: &str) {
    mount(
        server,
        "/sessions/create",
        ok(json!({"status": "success", "session_id": session_id})),
    )
    .await;
}

/// Number of requests the mock backend received on `endpoint`.
pub async fn hits(server: &MockServer, endpoint: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == endpoint)
        .count()
}
