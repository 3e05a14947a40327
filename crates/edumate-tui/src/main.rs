use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use anyhow::anyhow;
use edumate_core::{logging, Config, Dispatcher, FallbackPolicy, HttpBackend};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser, Debug)]
#[command(name = "edumate", version)]
#[command(about = "Chat with the EduMate backend: explanations, Manim code, and narration")]
struct Cli {
    /// Base URL of the generate backend (overrides the config file)
    #[arg(long)]
    backend_url: Option<String>,
    /// Seconds to wait for a response before giving up
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// How missing code/narration is shown: "placeholders" or "verbatim"
    #[arg(long)]
    fallbacks: Option<String>,
    /// Path to a config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where to write the log file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|_| Config::new()),
    };
    if let Some(url) = &cli.backend_url {
        config.backend_url = url.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = secs;
    }
    if let Some(name) = &cli.fallbacks {
        config.fallbacks = FallbackPolicy::from_str(name)
            .ok_or_else(|| anyhow!("unknown fallback policy: {}", name))?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let log_path = match &cli.log_file {
        Some(path) => path.clone(),
        None => logging::default_log_path()?,
    };
    logging::init(&config.log_level, &log_path)?;

    let dispatcher = Dispatcher::new(Arc::new(HttpBackend::new(&config.backend_url)))
        .with_timeout(config.timeout())
        .with_policy(config.output_policy());
    tracing::info!(
        backend = %config.backend_url,
        timeout_secs = dispatcher.timeout().as_secs(),
        fallbacks = dispatcher.policy().fallbacks.as_str(),
        "starting edumate"
    );
    let mut app = App::new(dispatcher);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    app.cancel_pending();
    tui::restore()?;
    tracing::info!("edumate exited");
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        // Pane sizes come from the previous frame
        app.sync_log_scroll();
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
