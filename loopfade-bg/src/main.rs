//! Background crossfader (loopfade-bg) - Main entry point
//!
//! Connects to OBS, puts the first playlist clip on layer 0 and then
//! crossfades to the next clip every period until interrupted. The `scenes`
//! subcommand runs the time-of-day program scene schedule instead.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loopfade_bg::config::{Config, ConfigOverrides, LoggingConfig};
use loopfade_bg::control::{ControlChannel, DryRunChannel, ObsClient};
use loopfade_bg::playback::{CrossfadeEngine, LayerState, Scheduler};
use loopfade_bg::scenes::SceneSwitcher;
use loopfade_common::human_time::format_duration;

/// Command-line arguments for loopfade-bg
#[derive(Parser, Debug)]
#[command(name = "loopfade-bg")]
#[command(about = "Crossfading video background controller for OBS Studio")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// OBS WebSocket host
    #[arg(long, global = true, env = "OBS_HOST")]
    host: Option<String>,

    /// OBS WebSocket port
    #[arg(long, global = true, env = "OBS_PORT")]
    port: Option<u16>,

    /// OBS WebSocket password
    #[arg(long, global = true, env = "OBS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Daytime clip, used when the config has no playlist
    #[arg(long, global = true, env = "DAYTIME_VIDEO_PATH")]
    daytime_video: Option<String>,

    /// Evening clip, used when the config has no playlist
    #[arg(long, global = true, env = "EVENING_VIDEO_PATH")]
    evening_video: Option<String>,

    /// Nighttime clip, used when the config has no playlist
    #[arg(long, global = true, env = "NIGHTTIME_VIDEO_PATH")]
    nighttime_video: Option<String>,

    /// Log commands instead of sending them to OBS
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Crossfade the background playlist (default)
    Run,
    /// Switch program scenes by time of day
    Scenes,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone(),
            daytime_video: self.daytime_video.clone(),
            evening_video: self.evening_video.clone(),
            nighttime_video: self.nighttime_video.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    let args = Args::parse();

    let (toml_config, resolved) =
        Config::read_toml(args.config.as_deref()).context("Failed to read configuration")?;
    init_tracing(&toml_config.logging)?;

    match &resolved {
        Some(file) => info!("Configuration: {} ({:?})", file.path.display(), file.source),
        None => warn!("No config file found; using built-in defaults"),
    }

    let config = Config::from_toml(toml_config, args.overrides())
        .context("Invalid configuration")?;

    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            if args.dry_run {
                info!("Dry run: commands are logged, not sent");
                let channel = run_background(DryRunChannel::new(), &config).await?;
                info!("Dry run issued {} commands", channel.commands_issued());
            } else {
                let client = connect(&config).await?;
                run_background(client, &config).await?.close().await;
            }
        }
        Command::Scenes => {
            let Some(schedule) = config.scenes.clone() else {
                bail!("No [scenes] schedule configured");
            };
            if args.dry_run {
                let mut switcher = SceneSwitcher::new(DryRunChannel::new(), schedule);
                switcher.run(shutdown_signal()).await;
            } else {
                let client = connect(&config).await?;
                let mut switcher = SceneSwitcher::new(client, schedule);
                switcher.run(shutdown_signal()).await;
                switcher.into_channel().close().await;
            }
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing from `RUST_LOG`, falling back to the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "loopfade_bg={level},loopfade_common={level}",
            level = logging.level
        )
        .into()
    });

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = if logging.file.is_none() {
        Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

/// Open the OBS session; failure is fatal
async fn connect(config: &Config) -> Result<ObsClient> {
    ObsClient::connect(&config.obs, &config.filter_name)
        .await
        .with_context(|| format!("Failed to connect to OBS at {}", config.obs.url()))
}

/// Startup sequence followed by the crossfade schedule. Returns the channel
/// once shutdown has been requested.
async fn run_background<C: ControlChannel>(channel: C, config: &Config) -> Result<C> {
    let scheduler = Scheduler::new(config.period).context("Invalid crossfade period")?;
    let layers = LayerState::new(config.sources.clone(), config.media_options);
    let mut engine = CrossfadeEngine::new(
        channel,
        config.playlist.clone(),
        layers,
        config.ramp,
    );

    info!(
        "Playlist: {} clip(s), crossfade {} in {} steps, every {}",
        config.playlist.len(),
        format_duration(config.ramp.duration()),
        config.ramp.steps(),
        format_duration(config.period)
    );

    engine.initialize().await;

    let report = scheduler.run(&mut engine, shutdown_signal()).await;
    info!(
        "Scheduler finished: {} crossfade(s), {} skipped, {} failed command(s)",
        report.cycles_completed, report.ticks_skipped, report.failed_commands
    );

    Ok(engine.into_channel())
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
            Ok(mut stream) => {
                stream.recv().await;
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
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
