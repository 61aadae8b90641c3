//! Configuration for loopfade-bg
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--host`, `--port`, `--password`)
//! 2. Environment variables (`OBS_HOST`, `OBS_PORT`, `OBS_PASSWORD`; read by clap)
//! 3. TOML configuration file (see [`loopfade_common::config`] for discovery)
//! 4. Built-in defaults
//!
//! When the TOML file has no `playlist`, it is built from the
//! `DAYTIME_VIDEO_PATH`, `EVENING_VIDEO_PATH` and `NIGHTTIME_VIDEO_PATH`
//! overrides as `[day, evening, night, evening]`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use loopfade_common::config::{load_toml, ConfigFileResolver, ResolvedConfigFile};
use loopfade_common::human_time::format_millis;

use crate::control::{MediaOptions, ObsSettings};
use crate::error::{Error, Result};
use crate::playback::{MediaReference, Playlist, RampSettings};
use crate::scenes::{parse_start_time, SceneEntry, SceneSchedule};

/// Application name used for config file discovery
pub const APP_NAME: &str = "loopfade";

/// Contents of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub obs: ObsSection,
    pub layers: LayersSection,
    pub playlist: Vec<String>,
    pub crossfade: CrossfadeSection,
    pub logging: LoggingConfig,
    pub scenes: Option<ScenesSection>,
}

/// `[obs]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObsSection {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ObsSection {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4455,
            password: None,
            connect_timeout_ms: 5000,
            request_timeout_ms: 5000,
        }
    }
}

/// `[layers]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayersSection {
    /// Media source names for layer 0 and layer 1
    pub sources: [String; 2],
    /// Filter on each source whose `opacity` setting is driven
    pub filter_name: String,
    pub looping: bool,
    pub speed: f64,
}

impl Default for LayersSection {
    fn default() -> Self {
        Self {
            sources: [
                "PalaceBackground1".to_string(),
                "PalaceBackground2".to_string(),
            ],
            filter_name: "Color Correction".to_string(),
            looping: true,
            speed: 1.0,
        }
    }
}

/// `[crossfade]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrossfadeSection {
    pub duration_ms: u64,
    pub steps: u32,
    pub period_ms: u64,
}

impl Default for CrossfadeSection {
    fn default() -> Self {
        Self {
            duration_ms: 10_000,
            steps: 1000,
            period_ms: 60_000,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log file path (logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// `[scenes]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScenesSection {
    pub transition: String,
    pub check_interval_ms: u64,
    pub schedule: Vec<SceneEntrySection>,
}

impl Default for ScenesSection {
    fn default() -> Self {
        Self {
            transition: crate::scenes::DEFAULT_TRANSITION.to_string(),
            check_interval_ms: crate::scenes::DEFAULT_CHECK_INTERVAL.as_millis() as u64,
            schedule: Vec::new(),
        }
    }
}

/// `[[scenes.schedule]]`
#[derive(Debug, Clone, Deserialize)]
pub struct SceneEntrySection {
    pub name: String,
    /// `HH:MM`, 24-hour clock
    pub start: String,
}

/// Command-line and environment overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    pub daytime_video: Option<String>,
    pub evening_video: Option<String>,
    pub nighttime_video: Option<String>,
}

impl ConfigOverrides {
    /// `[day, evening, night, evening]`, skipping unset paths
    pub fn daypart_playlist(&self) -> Vec<String> {
        [
            &self.daytime_video,
            &self.evening_video,
            &self.nighttime_video,
            &self.evening_video,
        ]
        .into_iter()
        .flatten()
        .filter(|path| !path.is_empty())
        .cloned()
        .collect()
    }
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub obs: ObsSettings,
    pub sources: [String; 2],
    pub filter_name: String,
    pub media_options: MediaOptions,
    pub playlist: Playlist,
    pub ramp: RampSettings,
    pub period: Duration,
    pub logging: LoggingConfig,
    pub scenes: Option<SceneSchedule>,
}

impl Config {
    /// Locate, read and validate the configuration.
    ///
    /// A missing config file is not fatal: defaults plus overrides are used.
    pub fn load(cli_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let (toml_config, _) = Self::read_toml(cli_path)?;
        Self::from_toml(toml_config, overrides)
    }

    /// Locate and parse the TOML file without validating it.
    ///
    /// Returns built-in defaults when no file is found. Split from [`Config::load`]
    /// so logging can be set up from `[logging]` before validation warnings.
    pub fn read_toml(cli_path: Option<&Path>) -> Result<(TomlConfig, Option<ResolvedConfigFile>)> {
        match ConfigFileResolver::new(APP_NAME).resolve(cli_path) {
            Some(resolved) => {
                let config: TomlConfig = load_toml(&resolved.path)?;
                info!("Loaded configuration from {:?} ({:?})", resolved.path, resolved.source);
                Ok((config, Some(resolved)))
            }
            None => {
                warn!("No config file found; using built-in defaults");
                Ok((TomlConfig::default(), None))
            }
        }
    }

    /// Apply overrides to parsed TOML and validate
    pub fn from_toml(toml_config: TomlConfig, overrides: ConfigOverrides) -> Result<Self> {
        let TomlConfig {
            obs,
            layers,
            playlist,
            crossfade,
            logging,
            scenes,
        } = toml_config;

        let obs = ObsSettings {
            host: overrides.host.clone().unwrap_or(obs.host),
            port: overrides.port.unwrap_or(obs.port),
            password: overrides
                .password
                .clone()
                .or(obs.password)
                .filter(|p| !p.is_empty()),
            connect_timeout: Duration::from_millis(obs.connect_timeout_ms),
            request_timeout: Duration::from_millis(obs.request_timeout_ms),
        };

        let sources = validate_sources(layers.sources)?;
        if layers.filter_name.trim().is_empty() {
            return Err(Error::Config("layers.filter_name must not be empty".to_string()));
        }
        if !(layers.speed.is_finite() && layers.speed > 0.0) {
            return Err(Error::Config(format!(
                "layers.speed must be positive, got {}",
                layers.speed
            )));
        }

        let playlist_paths = if playlist.is_empty() {
            overrides.daypart_playlist()
        } else {
            playlist
        };
        let playlist = Playlist::new(playlist_paths.into_iter().map(MediaReference::from).collect())?;

        let ramp = RampSettings::new(Duration::from_millis(crossfade.duration_ms), crossfade.steps)?;
        if crossfade.period_ms == 0 {
            return Err(Error::Config("crossfade.period_ms must be non-zero".to_string()));
        }
        if crossfade.period_ms <= crossfade.duration_ms {
            warn!(
                "Crossfade period {} does not exceed duration {}; cycles will be skipped",
                format_millis(crossfade.period_ms),
                format_millis(crossfade.duration_ms)
            );
        }

        let scenes = scenes.map(build_scene_schedule).transpose()?;

        Ok(Self {
            obs,
            sources,
            filter_name: layers.filter_name,
            media_options: MediaOptions {
                looping: layers.looping,
                speed: layers.speed,
            },
            playlist,
            ramp,
            period: Duration::from_millis(crossfade.period_ms),
            logging,
            scenes,
        })
    }
}

fn validate_sources(sources: [String; 2]) -> Result<[String; 2]> {
    if sources.iter().any(|s| s.trim().is_empty()) {
        return Err(Error::Config("layers.sources must not be empty".to_string()));
    }
    if sources[0] == sources[1] {
        return Err(Error::Config(format!(
            "layers.sources must name two different sources, got '{}' twice",
            sources[0]
        )));
    }
    Ok(sources)
}

fn build_scene_schedule(section: ScenesSection) -> Result<SceneSchedule> {
    let entries = section
        .schedule
        .into_iter()
        .map(|entry| {
            Ok(SceneEntry {
                start: parse_start_time(&entry.start)?,
                name: entry.name,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    SceneSchedule::new(
        entries,
        section.transition,
        Duration::from_millis(section.check_interval_ms),
    )
}
