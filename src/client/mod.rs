pub mod controller;
pub mod http;
pub mod tui;
pub mod view;

pub use controller::{ControllerState, DeleteOutcome, SendOutcome, SessionController};
pub use http::ChatClient;
pub use tui::{ChatScreen, ChatTui};
pub use view::{ConsoleView, NullView, SessionView};
