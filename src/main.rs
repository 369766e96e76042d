mod app;
mod channel;
mod config;
mod event;
mod logging;
mod prefs;
mod telemetry;
mod tui;
mod ui;
mod view_model;

use std::path::PathBuf;

use clap::Parser;
use config::Config;
use tracing::info;

#[derive(Parser)]
#[command(name = "statusdash", about = "Live server status dashboard for the terminal")]
struct Cli {
    /// Status server base URL (overrides the config file)
    #[arg(short, long)]
    url: Option<String>,
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Print the default config and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", Config::example_toml());
        return Ok(());
    }

    let log_path = cli.log_file.unwrap_or_else(logging::default_log_path);
    logging::init_tracing(&log_path)?;

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let mut config = Config::load(&config_path);
    if let Some(url) = cli.url {
        config.connection.url = url;
    }
    // Fail before touching the terminal
    channel::endpoint_url(&config.connection.url)?;

    let store = prefs::PreferenceStore::open_default();
    info!(
        url = %config.connection.url,
        config = %config_path.display(),
        prefs = %store.path().display(),
        "starting statusdash"
    );

    tui::install_panic_hook();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config, store))
}
