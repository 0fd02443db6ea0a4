use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;

mod app;
mod backend;
mod config;
mod handler;
mod logging;
mod state;
mod tui;
mod ui;

use app::App;
use backend::BackendClient;
use config::Config;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "shopping-chat", version)]
#[command(about = "Terminal chat client for the Shopping Assistant backend")]
struct Cli {
    /// Chat endpoint accepting POST {"message": ...}
    #[arg(short, long, env = "SHOPPING_CHAT_ENDPOINT")]
    endpoint: Option<String>,

    /// Config file (defaults to <config dir>/shopping-chat/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file (defaults to <data dir>/shopping-chat/shopping-chat.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Everything that can fail on bad input happens before the terminal is taken over
    let config = Config::load(cli.config.as_deref())?;
    let log_path = match cli.log_file {
        Some(path) => path,
        None => logging::default_log_path()?,
    };
    let directive = logging::filter_directive(
        std::env::var("RUST_LOG").ok(),
        cli.verbose,
        config.log_level.as_deref(),
    );
    logging::init(&log_path, &directive)?;

    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref());
    tracing::info!(%endpoint, "starting shopping-chat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, BackendClient::new(&endpoint)).await;

    tui::restore()?;
    tracing::info!("shutting down");
    result
}

async fn run(terminal: &mut tui::Tui, backend: BackendClient) -> Result<()> {
    let mut events = EventHandler::new();
    let mut app = App::new(backend, events.sender());

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }
    }

    Ok(())
}
