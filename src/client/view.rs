use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tokio::runtime::{Handle, RuntimeFlavor};

use crate::core::{Message, Role, Session};

/// Receives every state change from the controller, which never draws anything itself.
pub trait SessionView: Send + Sync {
    /// Redraw the session list, marking `active`.
    fn render_sessions(&self, sessions: &[Session], active: Option<&str>);

    /// Clear the transcript and draw `messages`, or the welcome placeholder
    /// when there are none.
    fn reset_transcript(&self, messages: &[Message]);

    /// Draw one more message below the transcript, dropping the welcome
    /// placeholder if it is still shown.
    fn append_message(&self, message: &Message);

    fn set_loading(&self, loading: bool);

    /// Transient inline error banner.
    fn show_error(&self, text: &str);

    fn clear_input(&self) {}

    /// Ask the user before `session` is deleted.
    fn confirm_delete(&self, session: &Session) -> bool;
}

impl<V: SessionView + ?Sized> SessionView for Arc<V> {
    fn render_sessions(&self, sessions: &[Session], active: Option<&str>) {
        (**self).render_sessions(sessions, active)
    }

    fn reset_transcript(&self, messages: &[Message]) {
        (**self).reset_transcript(messages)
    }

    fn append_message(&self, message: &Message) {
        (**self).append_message(message)
    }

    fn set_loading(&self, loading: bool) {
        (**self).set_loading(loading)
    }

    fn show_error(&self, text: &str) {
        (**self).show_error(text)
    }

    fn clear_input(&self) {
        (**self).clear_input()
    }

    fn confirm_delete(&self, session: &Session) -> bool {
        (**self).confirm_delete(session)
    }
}

/// Discards everything and confirms every deletion.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl SessionView for NullView {
    fn render_sessions(&self, _sessions: &[Session], _active: Option<&str>) {}
    fn reset_transcript(&self, _messages: &[Message]) {}
    fn append_message(&self, _message: &Message) {}
    fn set_loading(&self, _loading: bool) {}
    fn show_error(&self, _text: &str) {}

    fn confirm_delete(&self, _session: &Session) -> bool {
        true
    }
}

/// Plain stdout rendering for one-shot commands.
#[derive(Debug, Clone, Default)]
pub struct ConsoleView {
    print_history: bool,
    print_user: bool,
    assume_yes: bool,
    welcome: Option<String>,
}

impl ConsoleView {
    /// Prints whole transcripts as they are loaded.
    pub fn transcript(welcome: impl Into<String>) -> Self {
        ConsoleView {
            print_history: true,
            print_user: true,
            welcome: Some(welcome.into()),
            ..Default::default()
        }
    }

    /// Prints only assistant replies.
    pub fn replies() -> Self {
        ConsoleView::default()
    }

    /// Prints nothing but banners; `assume_yes` skips the delete prompt.
    pub fn quiet(assume_yes: bool) -> Self {
        ConsoleView {
            assume_yes,
            ..Default::default()
        }
    }

    fn print_message(&self, message: &Message) {
        match message.role {
            Role::User if !self.print_user => {}
            Role::User => println!("you> {}", message.content),
            Role::Assistant => println!("{}", message.content),
            Role::Other(ref role) => println!("[{}] {}", role, message.content),
        }
    }
}

impl SessionView for ConsoleView {
    fn render_sessions(&self, _sessions: &[Session], _active: Option<&str>) {}

    fn reset_transcript(&self, messages: &[Message]) {
        if !self.print_history {
            return;
        }
        if messages.is_empty() {
            if let Some(welcome) = &self.welcome {
                println!("{}", welcome);
            }
        }
        for message in messages {
            self.print_message(message);
        }
    }

    fn append_message(&self, message: &Message) {
        self.print_message(message);
    }

    fn set_loading(&self, _loading: bool) {}

    fn show_error(&self, text: &str) {
        eprintln!("error: {}", text);
    }

    fn confirm_delete(&self, session: &Session) -> bool {
        if self.assume_yes {
            return true;
        }
        let label = session.display_title(&session.id);
        // Reading stdin blocks, so move the worker's other tasks elsewhere first
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| prompt_delete(label))
            }
            _ => prompt_delete(label),
        }
    }
}

fn prompt_delete(label: &str) -> bool {
    print!("Delete session \"{}\"? This cannot be undone. [y/N] ", label);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(e) => {
            tracing::warn!("Failed to read confirmation: {}", e);
            false
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y" | "yes")
}
