use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod connection;
mod handler;
mod markdown;
mod protocol;
mod transcript;
mod tui;
mod ui;

use app::{App, ConnStatus};
use config::Config;
use connection::ChatConnection;
use protocol::Author;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Terminal chat client for a streaming chat backend")]
struct Cli {
    /// Backend host (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Backend port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Connect with wss:// instead of ws://
    #[arg(long)]
    secure: bool,

    /// Resume an existing conversation instead of starting a new one
    #[arg(short, long)]
    conversation: Option<i64>,

    /// Log file path (defaults to the config directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.clone())?;

    // Config file provides defaults, CLI flags win
    let mut config = Config::load().unwrap_or_else(|_| Config::new());
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.secure {
        config.secure = true;
    }

    let conversation_id = cli
        .conversation
        .unwrap_or_else(connection::conversation_id_now);
    info!(conversation_id, "starting session");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(conversation_id);

    // A failed handshake is readable in the transcript; the UI still runs
    match ChatConnection::open(&config.socket_url(conversation_id), events.sender()).await {
        Ok(connection) => app.connection = Some(connection),
        Err(e) => {
            error!(error = %format!("{:#}", e), "connection failed");
            app.status = ConnStatus::Closed;
            app.transcript
                .append_message(Author::Assistant, format!("Connection failed: {:#}", e));
        }
    }

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    app: &mut App,
    events: &mut tui::EventHandler,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

/// Structured logs go to a file: the terminal itself belongs to the TUI.
fn init_logging(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => dirs::config_dir()
            .context("Could not determine config directory")?
            .join("parley")
            .join("parley.log"),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
