// chatmux library
// Terminal client for session-based chat backends

pub mod cli;
pub mod client;
pub mod core;
pub mod utils;

// Re-export commonly used types
pub use client::{ChatClient, SessionController, SessionView};
pub use crate::core::{Config, FailureReason, Message, Role, Session};

// Error handling
pub use anyhow::{Error, Result};
