use anyhow::{Context, Result};
use clap::Parser;
use haiyvee::api::{build_http_client, FeedClient};
use haiyvee::app::{App, AppEvent};
use haiyvee::config::Config;
use haiyvee::util::validate_endpoint;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Get the config directory path (~/.config/haiyvee/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("haiyvee"))
}

#[derive(Parser, Debug)]
#[command(name = "haiyvee", about = "Terminal social feed with infinite scroll")]
struct Args {
    /// Config file (default: ~/.config/haiyvee/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Posts endpoint, overrides the config file
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Posts per page, overrides the config file
    #[arg(long, value_name = "N")]
    page_size: Option<usize>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file.as_ref())?;

    let config_path = match args.config {
        Some(path) => path,
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }

    let endpoint = validate_endpoint(&config.endpoint)
        .with_context(|| format!("Invalid endpoint: {}", config.endpoint))?;
    tracing::info!(endpoint = %endpoint, page_size = config.page_size, "Starting feed");

    let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
    let http = build_http_client(timeout).context("Failed to build HTTP client")?;
    let client = FeedClient::new(http, endpoint, config.pagination, timeout);

    let mut app = App::new(&config, client);
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // First page goes out before the terminal is up; rows that land early
    // wait in the list host until the renderer is ready
    if let Some(request) = app.controller.initial_load() {
        app.list.set_refreshing(true);
        haiyvee::ui::spawn_fetch(&mut app, request, &event_tx);
    }

    haiyvee::ui::run(&mut app, event_tx, event_rx).await?;
    Ok(())
}
