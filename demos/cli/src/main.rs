use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use phases_client::HttpPhaseSource;
use phases_core::TimelineConfig;
use phases_ui::{MemorySurface, TimelineController};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "phases-cli",
    about = "Load a listening-phase timeline from a backend and render it as HTML."
)]
struct Args {
    /// Backend origin, e.g. http://localhost:5000.
    #[arg(short, long)]
    base_url: String,

    /// Name used in the greeting lines.
    #[arg(short, long, default_value = "friend")]
    display_name: String,

    /// Raw `Cookie` header forwarded with every request (the backend keys phases on its session).
    #[arg(long)]
    cookie: Option<String>,

    /// Write the rendered page here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = TimelineConfig {
        base_url: args.base_url,
        display_name: args.display_name,
        ..TimelineConfig::default()
    };

    let mut headers = HeaderMap::new();
    if let Some(cookie) = &args.cookie {
        headers.insert(
            COOKIE,
            HeaderValue::from_str(cookie).context("Cookie is not a valid header value")?,
        );
    }
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .context("Could not build HTTP client")?;

    let source = HttpPhaseSource::with_client(client, &config);
    let mut controller = TimelineController::new(config, source, MemorySurface::new());
    let result = controller.load_timeline().await;

    for card in controller.cards() {
        eprintln!(
            "{:<24} {:>5} songs  {}",
            card.summary.phase_period,
            card.summary.track_count,
            card.state.name()
        );
    }

    let html = controller.surface().to_html();
    match &args.output {
        Some(path) => {
            std::fs::write(path, &html)
                .with_context(|| format!("Could not write {}", path.display()))?;
            info!(path = %path.display(), "Timeline written");
        }
        None => print!("{html}"),
    }

    let outcome = result.context("Timeline failed to load")?;
    info!(?outcome, "Done");
    Ok(())
}
