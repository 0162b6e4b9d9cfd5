//! Serene Activity Player (serene-player) - Main entry point
//!
//! Headless host for the playback engine: browse a JSON activity catalog or
//! play one activity in real time, logging session events as they happen.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serene_common::config::ConfigResolver;
use serene_common::events::SessionEvent;
use serene_common::time::format_countdown;
use serene_common::ActivityKind;
use serene_player::content::{ActivityFilter, JsonCatalog};
use serene_player::playback::TracingCarousel;
use serene_player::{SessionContext, UserIdentity};
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for serene-player
#[derive(Parser, Debug)]
#[command(name = "serene-player")]
#[command(about = "Guided activity player for Serene")]
#[command(version)]
struct Args {
    /// Config file (overrides SERENE_CONFIG and the platform default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON activity catalog
    #[arg(long, env = "SERENE_CATALOG")]
    catalog: Option<PathBuf>,

    /// User id recorded on session logs
    #[arg(short, long, env = "SERENE_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List activities, most popular first
    List {
        /// Match name, description, or tags
        #[arg(short, long)]
        query: Option<String>,

        /// Emotion category id
        #[arg(short, long)]
        emotion: Option<String>,

        /// exercise, reading, or music
        #[arg(short, long)]
        kind: Option<ActivityKind>,

        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Play an activity until it completes or the process is interrupted
    ///
    /// Step durations are read with their unit words, so "4 seconds" lasts
    /// 4 s and a bare "4" lasts 4 minutes. Set `duration_unit = "minutes"` in
    /// the config file for the legacy reading, where every number is minutes
    /// ("4 seconds" lasts 240 s). Unreadable durations fall back to
    /// `default_step_seconds` (120).
    Play {
        activity_id: String,

        /// Clock period in milliseconds (overrides config)
        #[arg(long)]
        tick_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Config first so its log level can seed the filter
    let config = ConfigResolver::new()
        .load(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("serene_player={0},serene_common={0}", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Serene Activity Player");

    let catalog_path = args
        .catalog
        .clone()
        .or_else(|| config.catalog_path.clone())
        .context("No activity catalog given (use --catalog, SERENE_CATALOG, or catalog_path)")?;
    info!("Catalog: {}", catalog_path.display());

    let catalog = Arc::new(
        JsonCatalog::load(&catalog_path)
            .await
            .context("Failed to load activity catalog")?,
    );

    let user = args
        .user
        .clone()
        .map(UserIdentity::new)
        .unwrap_or_else(UserIdentity::anonymous);

    match args.command {
        Commands::List {
            query,
            emotion,
            kind,
            tag,
        } => {
            let ctx = SessionContext::new(config, catalog.clone(), catalog);
            let filter = ActivityFilter {
                query,
                kind,
                emotion,
                tag,
            };
            list(&ctx, &filter).await
        }
        Commands::Play {
            activity_id,
            tick_ms,
        } => {
            let mut config = config;
            if let Some(tick_ms) = tick_ms {
                config.tick_interval_ms = tick_ms;
            }
            let ctx = SessionContext::new(config, catalog.clone(), catalog.clone())
                .with_user(user)
                .with_carousel(Arc::new(TracingCarousel));
            play(&ctx, &activity_id).await?;

            if let Some(popularity) = catalog.popularity(&activity_id).await {
                info!("Popularity of {} is now {}", activity_id, popularity);
            }
            Ok(())
        }
    }
}

async fn list(ctx: &SessionContext, filter: &ActivityFilter) -> Result<()> {
    let activities = ctx
        .browse(filter)
        .await
        .context("Failed to list activities")?;

    if activities.is_empty() {
        println!("No matching activities");
        return Ok(());
    }

    for activity in activities {
        println!(
            "{:<24} {:<9} {:>3} steps  {:>5} plays  {}",
            activity.id,
            activity.kind,
            activity.step_count(),
            activity.popularity,
            activity.name
        );
    }
    Ok(())
}

async fn play(ctx: &SessionContext, activity_id: &str) -> Result<()> {
    let printer = tokio::spawn(print_events(ctx.events().subscribe()));

    let mut handle = ctx
        .begin_activity(activity_id)
        .await
        .with_context(|| format!("Failed to load activity {activity_id}"))?;
    let snapshot = handle.start().await.context("Failed to start session")?;
    if snapshot.step_count == 0 {
        // The session task has already ended; join returns at once
        warn!("Activity {} has no steps, nothing to play", activity_id);
    }

    let summary = tokio::select! {
        summary = handle.join() => summary,
        _ = shutdown_signal() => handle.teardown().await,
    }
    .context("Session ended abnormally")?;

    info!(
        "Session {} finished: completed={}, step {}, {} ticks",
        summary.session_id,
        summary.completed,
        summary.final_step_index + 1,
        summary.ticks_observed
    );

    printer.abort();
    Ok(())
}

/// Log session events until the bus closes
async fn print_events(mut rx: broadcast::Receiver<SessionEvent>) {
    loop {
        match rx.recv().await {
            Ok(SessionEvent::StepChanged {
                step_number,
                time_left_seconds,
                gallery_position,
                ..
            }) => info!(
                "Step {} ({} left, gallery slot {:?})",
                step_number,
                format_countdown(time_left_seconds),
                gallery_position
            ),
            Ok(SessionEvent::TimerTick {
                time_left_seconds, ..
            }) => debug!("{} left", format_countdown(time_left_seconds)),
            Ok(event) => info!("Event: {}", event.event_type()),
            Err(RecvError::Lagged(skipped)) => warn!("Event log lagged, {} skipped", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, tearing down session");
        },
        _ = terminate => {
            info!("Received terminate signal, tearing down session");
        },
    }
}
