use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::client::http::ChatClient;
use crate::client::view::SessionView;
use crate::core::{title_from, Config, FailureReason, Message, Role, Session};

const LIST_FAILED: &str = "Failed to load sessions, please refresh and try again";
const LOAD_FAILED: &str = "Failed to load session, please try again";
const CREATE_FAILED: &str = "Failed to create session, please try again";
const DELETE_FAILED: &str = "Failed to delete session, please try again";
const SEND_FAILED: &str = "Failed to send message, please try again";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerState {
    pub active_session_id: Option<String>,
    pub sessions: Vec<Session>,
    /// Messages of the active session only
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Empty input, or another send was still in flight. Nothing happened.
    Ignored,
    Replied(Message),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    Deleted,
}

/// Owns the active session id, the session list and the active session's
/// messages. State sits behind a mutex that is never held across an `.await`,
/// so operations take `&self`; only `send_message` is serialized.
pub struct SessionController<V> {
    client: ChatClient,
    view: V,
    placeholder_title: String,
    state: Mutex<ControllerState>,
    processing: AtomicBool,
}

/// Holds `is_processing` for the duration of one send, including when the
/// send future is dropped half way.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl<'a> ProcessingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ProcessingGuard(flag))
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<V: SessionView> SessionController<V> {
    pub fn new(client: ChatClient, view: V, placeholder_title: impl Into<String>) -> Self {
        Self {
            client,
            view,
            placeholder_title: placeholder_title.into(),
            state: Mutex::new(ControllerState::default()),
            processing: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &Config, view: V) -> anyhow::Result<Self> {
        let client = ChatClient::from_config(config)?;
        Ok(Self::new(client, view, config.ui.placeholder_title.clone()))
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn active_session_id(&self) -> Option<String> {
        self.state().active_session_id.clone()
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.state().sessions.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    pub fn snapshot(&self) -> ControllerState {
        self.state().clone()
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn render_sessions_list(&self) {
        let (sessions, active) = {
            let state = self.state();
            (state.sessions.clone(), state.active_session_id.clone())
        };
        self.view.render_sessions(&sessions, active.as_deref());
    }

    /// Fetch the session list and pick the session to show: the server's
    /// current session, else the first listed, else a brand new one. If the
    /// list itself cannot be fetched a new session is created so the client
    /// is never left without one.
    pub async fn list_sessions(&self) -> Result<(), FailureReason> {
        let list = match self.client.list_sessions().await {
            Ok(list) => list,
            Err(reason) => {
                tracing::error!("Failed to list sessions: {}", reason);
                self.view.show_error(LIST_FAILED);
                if let Err(e) = self.create_session().await {
                    tracing::warn!("Fallback session creation failed: {}", e);
                }
                return Err(reason);
            }
        };

        let chosen = list
            .current()
            .map(str::to_string)
            .or_else(|| list.sessions.first().map(|s| s.id.clone()));
        tracing::info!(
            "Backend reports {} sessions, current: {:?}",
            list.sessions.len(),
            list.current()
        );
        self.state().sessions = list.sessions;

        match chosen {
            Some(session_id) => {
                self.state().active_session_id = Some(session_id.clone());
                if let Err(e) = self.load_session(&session_id).await {
                    tracing::debug!("Initial load of {} failed: {}", session_id, e);
                }
            }
            None => {
                if let Err(e) = self.create_session().await {
                    tracing::debug!("Creating first session failed: {}", e);
                }
            }
        }

        self.render_sessions_list();
        Ok(())
    }

    /// Replace the transcript with the server's record for `session_id` and
    /// make it the active session. Nothing changes if the fetch fails.
    pub async fn load_session(&self, session_id: &str) -> Result<(), FailureReason> {
        let messages = match self.client.get_session(session_id).await {
            Ok(messages) => messages,
            Err(reason) => {
                tracing::error!("Failed to load session {}: {}", session_id, reason);
                self.view.show_error(LOAD_FAILED);
                return Err(reason);
            }
        };

        tracing::info!("Loaded session {} ({} messages)", session_id, messages.len());
        {
            let mut state = self.state();
            state.active_session_id = Some(session_id.to_string());
            state.messages = messages.clone();
        }

        // Separate call; the load above already succeeded whatever this returns.
        self.set_current_session(session_id).await;

        self.view.reset_transcript(&messages);
        self.render_sessions_list();
        Ok(())
    }

    /// Tell the backend which session is active. Returns whether it agreed.
    pub async fn set_current_session(&self, session_id: &str) -> bool {
        match self.client.set_current_session(session_id).await {
            Ok(()) => {
                self.state().active_session_id = Some(session_id.to_string());
                true
            }
            Err(reason) => {
                tracing::error!("Failed to set current session {}: {}", session_id, reason);
                false
            }
        }
    }

    /// Ask the backend for a new session and switch to it.
    pub async fn create_session(&self) -> Result<String, FailureReason> {
        let session_id = match self.client.create_session().await {
            Ok(session_id) => session_id,
            Err(reason) => {
                tracing::error!("Failed to create session: {}", reason);
                self.view.show_error(CREATE_FAILED);
                return Err(reason);
            }
        };

        tracing::info!("Created session {}", session_id);
        {
            let mut state = self.state();
            state.active_session_id = Some(session_id.clone());
            state.messages.clear();
            let session = Session::new_local(session_id.clone(), &self.placeholder_title);
            state.sessions.insert(0, session);
        }

        self.view.reset_transcript(&[]);
        self.render_sessions_list();
        Ok(session_id)
    }

    /// Delete a session after the view confirms it. The local list only
    /// changes once the backend has agreed.
    pub async fn delete_session(&self, session_id: &str) -> Result<DeleteOutcome, FailureReason> {
        let known = self
            .state()
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned();
        let session = known.unwrap_or_else(|| Session {
            id: session_id.to_string(),
            title: String::new(),
            time: String::new(),
        });

        if !self.view.confirm_delete(&session) {
            tracing::info!("Deletion of session {} cancelled", session_id);
            return Ok(DeleteOutcome::Cancelled);
        }

        if let Err(reason) = self.client.delete_session(session_id).await {
            tracing::error!("Failed to delete session {}: {}", session_id, reason);
            self.view.show_error(DELETE_FAILED);
            return Err(reason);
        }

        tracing::info!("Deleted session {}", session_id);
        let (was_active, next) = {
            let mut state = self.state();
            state.sessions.retain(|s| s.id != session_id);
            (
                state.active_session_id.as_deref() == Some(session_id),
                state.sessions.first().map(|s| s.id.clone()),
            )
        };

        if !was_active {
            self.render_sessions_list();
            return Ok(DeleteOutcome::Deleted);
        }

        match next {
            Some(next) => {
                if let Err(e) = self.load_session(&next).await {
                    tracing::debug!("Switching to session {} failed: {}", next, e);
                }
            }
            None => {
                if let Err(e) = self.create_session().await {
                    tracing::debug!("Replacing deleted session failed: {}", e);
                }
            }
        }
        Ok(DeleteOutcome::Deleted)
    }

    /// Send `text` in the active session.
    ///
    /// The user message is shown and kept locally before the backend answers
    /// and stays there if the request fails. The whole history goes out with
    /// every request. Blank input, or a call while another send is in
    /// flight, returns [`SendOutcome::Ignored`] without touching anything.
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome, FailureReason> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Ignored);
        }
        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            tracing::debug!("Send ignored, another message is in flight");
            return Ok(SendOutcome::Ignored);
        };

        self.view.clear_input();

        let user_message = Message::user(text);
        let (history, session_id) = {
            let mut state = self.state();
            state.messages.push(user_message.clone());
            (state.messages.clone(), state.active_session_id.clone())
        };
        self.view.append_message(&user_message);
        self.view.set_loading(true);

        tracing::debug!(
            "Sending {} messages for session {:?}",
            history.len(),
            session_id
        );
        let reply = match self.client.chat(&history, session_id.as_deref()).await {
            Ok(reply) => reply,
            Err(reason) => {
                self.view.set_loading(false);
                tracing::error!("Failed to send message: {}", reason);
                self.view.show_error(SEND_FAILED);
                return Err(reason);
            }
        };
        self.view.set_loading(false);

        let assistant_message = Message::assistant(reply.response);
        let retitled = {
            let mut state = self.state();
            state.messages.push(assistant_message.clone());

            if let Some(server_id) = reply.session_id.filter(|id| !id.is_empty()) {
                if state.active_session_id.as_deref() != Some(server_id.as_str()) {
                    tracing::info!("Backend moved conversation to session {}", server_id);
                }
                state.active_session_id = Some(server_id);
            }

            let user_turns = state
                .messages
                .iter()
                .filter(|m| m.role == Role::User)
                .count();
            if user_turns == 1 {
                let active = state.active_session_id.clone();
                if let Some(session) = state
                    .sessions
                    .iter_mut()
                    .find(|s| Some(&s.id) == active.as_ref())
                {
                    session.title = title_from(text);
                }
                true
            } else {
                false
            }
        };

        self.view.append_message(&assistant_message);
        if retitled {
            self.render_sessions_list();
        }
        Ok(SendOutcome::Replied(assistant_message))
    }
}
