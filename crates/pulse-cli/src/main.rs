//! pulse - GearPulse feed CLI
//!
//! Tails the marketplace activity feed from a terminal: realtime over
//! WebSocket when available, degrading to snapshot polling when not.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pulse_client::{ActivityFeed, EventKind, FeedConfig, FeedEvent, RealtimeTransport};
use pulse_proto::FeedSnapshot;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "GearPulse marketplace activity feed client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tail the live activity feed
    Tail {
        /// Path to config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Feed API base URL (overrides config)
        #[arg(long)]
        api_base: Option<String>,

        /// Activity channel to subscribe to (repeatable)
        #[arg(long = "channel")]
        channels: Vec<String>,
    },

    /// Fetch a one-shot feed snapshot and exit
    Snapshot {
        /// Path to config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Feed API base URL (overrides config)
        #[arg(long)]
        api_base: Option<String>,
    },

    /// Generate a sample config file
    InitConfig {
        /// Path to write config
        #[arg(short, long, default_value = "pulse.json")]
        output: PathBuf,

        /// Feed API base URL
        #[arg(long, default_value = "https://localhost:8443/api")]
        api_base: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("pulse_cli=info".parse()?)
                .add_directive("pulse_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tail {
            config,
            api_base,
            channels,
        } => {
            tail(load_config(config, api_base, channels)?).await?;
        }

        Commands::Snapshot { config, api_base } => {
            snapshot(&load_config(config, api_base, Vec::new())?).await?;
        }

        Commands::InitConfig { output, api_base } => {
            init_config(&output, api_base)?;
        }
    }

    Ok(())
}

fn load_config(
    path: Option<PathBuf>,
    api_base: Option<String>,
    channels: Vec<String>,
) -> anyhow::Result<FeedConfig> {
    let mut config = match path {
        Some(p) => FeedConfig::from_file(&p)?,
        None => FeedConfig::default(),
    };

    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }
    if !channels.is_empty() {
        config = config.with_channels(channels);
    }

    config.validate()?;
    Ok(config)
}

async fn tail(config: FeedConfig) -> anyhow::Result<()> {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!(session = %session_id, api_base = %config.api_base, "starting feed tail");

    let transport = Arc::new(RealtimeTransport::from_config(&config)?);

    transport.on(EventKind::Message, |event| {
        if let FeedEvent::Message(envelope) = event {
            println!(
                "{} {} {}",
                envelope.timestamp.to_rfc3339(),
                envelope.kind,
                envelope.body
            );
        }
    });
    transport.on(EventKind::Connected, |_| info!("realtime connected"));
    transport.on(EventKind::Disconnected, |event| {
        if let FeedEvent::Disconnected { code, reason } = event {
            warn!(code, reason = %reason, "realtime disconnected");
        }
    });
    transport.on(EventKind::ReconnectFailed, |_| {
        warn!("realtime unavailable; feed is delayed");
    });

    let feed = ActivityFeed::new(Arc::clone(&transport), &config, session_id)?;
    feed.start();

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    feed.stop();

    Ok(())
}

async fn snapshot(config: &FeedConfig) -> anyhow::Result<()> {
    let url = config.feed_url()?;
    let snapshot: FeedSnapshot = reqwest::get(url).await?.json().await?;

    info!(items = snapshot.activities.len(), "fetched feed snapshot");
    for envelope in snapshot.activities {
        println!(
            "{} {} {}",
            envelope.timestamp.to_rfc3339(),
            envelope.kind,
            envelope.body
        );
    }

    Ok(())
}

fn init_config(output: &PathBuf, api_base: String) -> anyhow::Result<()> {
    let config = FeedConfig::default().with_api_base(api_base);
    std::fs::write(output, serde_json::to_string_pretty(&config)?)?;
    info!(path = %output.display(), "wrote sample config");
    Ok(())
}
