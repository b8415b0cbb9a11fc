use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chatmux")]
#[command(about = "Terminal client for session-based chat backends", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "CHATMUX_URL")]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open the interactive chat interface (default)
    Tui,
    /// List all sessions
    List,
    /// Print the transcript of a session and make it current
    Show {
        /// Session ID to load
        session_id: String,
    },
    /// Create a new session
    New,
    /// Delete a session
    Delete {
        /// Session ID to delete
        session_id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Send one message and print the reply
    Send {
        /// Session to send in (defaults to the backend's current session)
        #[arg(long)]
        session: Option<String>,
        /// Message text
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Ask the backend to start over in a fresh session
    Clear,
    /// Check whether the backend is reachable
    Status,
    /// List the tools the backend exposes
    Tools,
    /// Configuration file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Tui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_tui() {
        let cli = Cli::try_parse_from(["chatmux"]).unwrap();
        assert!(matches!(cli.command(), Commands::Tui));
    }

    #[test]
    fn test_send_collects_words() {
        let cli = Cli::try_parse_from([
            "chatmux",
            "--url",
            "http://example:9000",
            "send",
            "--session",
            "s1",
            "how",
            "are",
            "you",
        ])
        .unwrap();

        assert_eq!(cli.url.as_deref(), Some("http://example:9000"));
        match cli.command() {
            Commands::Send { session, text } => {
                assert_eq!(session.as_deref(), Some("s1"));
                assert_eq!(text.join(" "), "how are you");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_send_requires_text() {
        assert!(Cli::try_parse_from(["chatmux", "send"]).is_err());
    }

    #[test]
    fn test_delete_yes_flag() {
        let cli = Cli::try_parse_from(["chatmux", "delete", "abc", "-y"]).unwrap();
        assert!(matches!(
            cli.command(),
            Commands::Delete { ref session_id, yes: true } if session_id == "abc"
        ));
    }
}
