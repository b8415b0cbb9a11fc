pub mod api;
pub mod config;
pub mod error;
pub mod session;

pub use config::Config;
pub use error::{ApiResult, FailureReason};
pub use session::{title_from, Message, Role, Session};
