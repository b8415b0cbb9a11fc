use clap::Parser;
use tracing_subscriber::EnvFilter;

use chatmux::cli::handlers;
use chatmux::cli::{Cli, Commands};
use chatmux::utils::tui_writer::TuiWriter;
use chatmux::{Config, Result};

fn env_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::from_default_env().add_directive("chatmux=info".parse()?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command();

    // The TUI owns the screen, so its logs go to the in-app log pane instead
    let (tui_writer, log_rx) = TuiWriter::new();
    if matches!(command, Commands::Tui) {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter()?)
            .with_ansi(false)
            .with_writer(tui_writer)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter()?)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = Config::load()?.with_base_url(cli.url.clone());

    match command {
        Commands::Tui => handlers::run_tui(config, log_rx).await,
        Commands::List => handlers::list_sessions(config).await,
        Commands::Show { session_id } => handlers::show_session(config, session_id).await,
        Commands::New => handlers::new_session(config).await,
        Commands::Delete { session_id, yes } => {
            handlers::delete_session(config, session_id, yes).await
        }
        Commands::Send { session, text } => handlers::send_message(config, session, text).await,
        Commands::Clear => handlers::clear_history(config).await,
        Commands::Status => handlers::server_status(config).await,
        Commands::Tools => handlers::list_tools(config).await,
        Commands::Config { command } => handlers::handle_config_command(config, command),
    }
}
