mod app;
mod cli;
mod event;
mod terminal;
mod ui;

use app::{App, AppActions};
use clap::Parser;
use cli::CliArgs;
use color_eyre::Result;
use craft_pulse::config::{init_logging, AppConfig};
use craft_pulse::ApiClient;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    args.apply_env_overrides();

    let config = AppConfig::from_env()?;
    init_logging(&config)?;

    let client = ApiClient::new(config.api_base.clone(), config.request_timeout)?;

    if args.headless || !is_terminal() {
        return event::run_headless(&client, &config, args.json, args.sync).await;
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App::new(&config, AppActions::new(client, tx));
    app.start();

    let mut terminal = terminal::setup_terminal()?;
    let result = event::run(&mut terminal, &mut app, &mut rx).await;
    terminal::cleanup_terminal_state(true, true);

    if let Err(e) = &result {
        tracing::error!(error = %e, "dashboard exited with an error");
    }
    result
}

// Check if we're running in a terminal
fn is_terminal() -> bool {
    atty::is(atty::Stream::Stdout)
}
