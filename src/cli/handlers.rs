// Command handlers for the one-shot commands and the interactive TUI

use crate::client::controller::{DeleteOutcome, SendOutcome, SessionController};
use crate::client::{ChatClient, ChatTui, ConsoleView};
use crate::cli::ConfigCommands;
use crate::utils::tui_writer::LogEntry;
use crate::{Config, Result};
use tokio::sync::mpsc::UnboundedReceiver;

pub async fn run_tui(config: Config, log_rx: UnboundedReceiver<LogEntry>) -> Result<()> {
    tracing::info!("Starting TUI against {}", config.backend.base_url);
    let mut tui = ChatTui::new(&config)?;
    tui.run(log_rx).await
}

pub async fn list_sessions(config: Config) -> Result<()> {
    let client = ChatClient::from_config(&config)?;
    let list = client.list_sessions().await?;

    if list.sessions.is_empty() {
        println!("No sessions yet");
        println!("💡 Start one with: chatmux new");
        return Ok(());
    }

    println!("📋 Sessions:");
    let current = list.current();
    for session in &list.sessions {
        let marker = if current == Some(session.id.as_str()) { "*" } else { " " };
        println!(
            " {} {}  {:<32}  {}",
            marker,
            session.id,
            session.display_title(&config.ui.placeholder_title),
            session.time
        );
    }
    Ok(())
}

pub async fn show_session(config: Config, session_id: String) -> Result<()> {
    let welcome = format!("{}\n{}", config.ui.welcome_title, config.ui.welcome_text);
    let controller = SessionController::from_config(&config, ConsoleView::transcript(welcome))?;
    controller.load_session(&session_id).await?;
    Ok(())
}

pub async fn new_session(config: Config) -> Result<()> {
    let controller = SessionController::from_config(&config, ConsoleView::quiet(false))?;
    let session_id = controller.create_session().await?;
    println!("{}", session_id);
    Ok(())
}

pub async fn delete_session(config: Config, session_id: String, yes: bool) -> Result<()> {
    let controller = SessionController::from_config(&config, ConsoleView::quiet(yes))?;
    match controller.delete_session(&session_id).await? {
        DeleteOutcome::Deleted => println!("🗑  Deleted session {}", session_id),
        DeleteOutcome::Cancelled => println!("Kept session {}", session_id),
    }
    Ok(())
}

pub async fn send_message(config: Config, session: Option<String>, text: Vec<String>) -> Result<()> {
    let text = text.join(" ");
    if text.trim().is_empty() {
        anyhow::bail!("Nothing to send: message is empty");
    }

    let controller = SessionController::from_config(&config, ConsoleView::replies())?;
    match session {
        Some(session_id) => controller.load_session(&session_id).await?,
        None => controller.list_sessions().await?,
    }

    match controller.send_message(&text).await? {
        SendOutcome::Replied(_) => {
            if let Some(session_id) = controller.active_session_id() {
                tracing::info!("Reply received in session {}", session_id);
            }
        }
        SendOutcome::Ignored => tracing::warn!("Message was not sent"),
    }
    Ok(())
}

pub async fn clear_history(config: Config) -> Result<()> {
    let client = ChatClient::from_config(&config)?;
    let session_id = client.clear_history().await?;
    println!("✨ Started fresh session {}", session_id);
    Ok(())
}

pub async fn server_status(config: Config) -> Result<()> {
    let client = ChatClient::from_config(&config)?;
    if client.is_server_running().await {
        println!("✅ Backend is reachable at {}", client.base_url());
        Ok(())
    } else {
        anyhow::bail!("Backend is not reachable at {}", client.base_url())
    }
}

pub async fn list_tools(config: Config) -> Result<()> {
    let client = ChatClient::from_config(&config)?;
    let tools = client.list_tools().await?;

    if tools.is_empty() {
        println!("The backend exposes no tools");
        return Ok(());
    }
    println!("🔧 Tools:");
    for tool in &tools {
        match tool.get("name").and_then(|name| name.as_str()) {
            Some(name) => {
                let description = tool
                    .get("description")
                    .and_then(|d| d.as_str())
                    .unwrap_or_default();
                println!("   {}  {}", name, description);
            }
            None => println!("   {}", tool),
        }
    }
    Ok(())
}

pub fn handle_config_command(config: Config, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Init { force } => {
            if let Some(path) = Config::config_file() {
                if path.exists() && !force {
                    anyhow::bail!(
                        "Config file already exists at {} (use --force to overwrite)",
                        path.display()
                    );
                }
            }
            let path = config.save()?;
            println!("📝 Wrote {}", path.display());
        }
    }
    Ok(())
}
