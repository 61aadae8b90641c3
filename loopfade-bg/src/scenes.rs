//! Time-of-day program scene schedule
//!
//! Alternative to the crossfade background: the compositor holds one scene per
//! part of the day (e.g. daytime, evening, nighttime) and the program output is
//! switched with a transition whenever the clock crosses a start time.

use std::future::Future;
use std::time::Duration;

use chrono::{Local, NaiveTime};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::control::SceneControl;
use crate::error::{Error, Result};

/// Default transition used for scene switches
pub const DEFAULT_TRANSITION: &str = "Fade";

/// Default clock check interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(60_000);

/// Parse an `HH:MM` start time
pub fn parse_start_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| Error::Config(format!("invalid scene start time '{}': {}", value, e)))
}

/// One scene and the time of day it becomes current
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneEntry {
    pub name: String,
    pub start: NaiveTime,
}

/// Scenes ordered by start time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSchedule {
    entries: Vec<SceneEntry>,
    transition: String,
    check_interval: Duration,
}

impl SceneSchedule {
    /// Entries may be given in any order; start times must be distinct
    pub fn new(mut entries: Vec<SceneEntry>, transition: String, check_interval: Duration) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::Config("scene schedule has no entries".to_string()));
        }
        if check_interval.is_zero() {
            return Err(Error::Config("scene check interval must be non-zero".to_string()));
        }
        entries.sort_by_key(|entry| entry.start);
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].start == pair[1].start) {
            return Err(Error::Config(format!(
                "scenes '{}' and '{}' share start time {}",
                pair[0].name,
                pair[1].name,
                pair[0].start.format("%H:%M")
            )));
        }

        Ok(Self {
            entries,
            transition,
            check_interval,
        })
    }

    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    pub fn transition(&self) -> &str {
        &self.transition
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Scene current at `time`: the latest start not after `time`, wrapping
    /// to the last scene of the day before the earliest start
    pub fn scene_for(&self, time: NaiveTime) -> &SceneEntry {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.start <= time)
            .or_else(|| self.entries.last())
            .unwrap_or(&self.entries[0])
    }
}

/// Applies a [`SceneSchedule`] through a scene-capable channel
pub struct SceneSwitcher<C> {
    channel: C,
    schedule: SceneSchedule,
    current: Option<String>,
}

impl<C: SceneControl> SceneSwitcher<C> {
    pub fn new(channel: C, schedule: SceneSchedule) -> Self {
        Self {
            channel,
            schedule,
            current: None,
        }
    }

    /// Scene last switched to successfully
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Switch if the scene for `time` differs from the current one.
    ///
    /// Returns the new scene name when a switch happened. A failed switch is
    /// logged and retried on the next check.
    pub async fn check(&mut self, time: NaiveTime) -> Option<String> {
        let scene = self.schedule.scene_for(time).name.clone();
        if self.current.as_deref() == Some(scene.as_str()) {
            debug!("Scene {} still current at {}", scene, time.format("%H:%M"));
            return None;
        }

        if let Err(e) = self.channel.set_scene_transition(&self.schedule.transition).await {
            warn!("Failed to select transition {}: {}", self.schedule.transition, e);
        }
        match self.channel.set_program_scene(&scene).await {
            Ok(()) => {
                info!("Switched to scene: {}", scene);
                self.current = Some(scene.clone());
                Some(scene)
            }
            Err(e) => {
                warn!("Failed to switch to scene {}: {}", scene, e);
                None
            }
        }
    }

    /// Check the local clock every check interval until `shutdown` resolves
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = std::pin::pin!(shutdown);
        let mut timer = interval(self.schedule.check_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Scene schedule started ({} scenes, transition {})",
            self.schedule.entries.len(),
            self.schedule.transition
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Scene schedule stopping");
                    break;
                }
                _ = timer.tick() => {
                    self.check(Local::now().time()).await;
                }
            }
        }
    }

    pub fn into_channel(self) -> C {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(value: &str) -> NaiveTime {
        parse_start_time(value).unwrap()
    }

    fn day_schedule() -> SceneSchedule {
        SceneSchedule::new(
            vec![
                SceneEntry {
                    name: "Nighttime Scene".to_string(),
                    start: time("22:00"),
                },
                SceneEntry {
                    name: "Daytime Scene".to_string(),
                    start: time("06:00"),
                },
                SceneEntry {
                    name: "Evening Scene".to_string(),
                    start: time("18:00"),
                },
            ],
            DEFAULT_TRANSITION.to_string(),
            DEFAULT_CHECK_INTERVAL,
        )
        .unwrap()
    }

    #[test]
    fn test_scene_for_time_of_day() {
        let schedule = day_schedule();
        assert_eq!(schedule.scene_for(time("06:00")).name, "Daytime Scene");
        assert_eq!(schedule.scene_for(time("12:30")).name, "Daytime Scene");
        assert_eq!(schedule.scene_for(time("17:59")).name, "Daytime Scene");
        assert_eq!(schedule.scene_for(time("18:00")).name, "Evening Scene");
        assert_eq!(schedule.scene_for(time("21:59")).name, "Evening Scene");
        assert_eq!(schedule.scene_for(time("22:00")).name, "Nighttime Scene");
    }

    #[test]
    fn test_scene_for_wraps_past_midnight() {
        let schedule = day_schedule();
        assert_eq!(schedule.scene_for(time("00:00")).name, "Nighttime Scene");
        assert_eq!(schedule.scene_for(time("05:59")).name, "Nighttime Scene");
    }

    #[test]
    fn test_entries_sorted_by_start() {
        let schedule = day_schedule();
        let names: Vec<&str> = schedule
            .entries()
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["Daytime Scene", "Evening Scene", "Nighttime Scene"]);
    }

    #[test]
    fn test_invalid_schedules_rejected() {
        assert!(SceneSchedule::new(Vec::new(), "Fade".to_string(), DEFAULT_CHECK_INTERVAL).is_err());

        let duplicate = vec![
            SceneEntry {
                name: "A".to_string(),
                start: time("06:00"),
            },
            SceneEntry {
                name: "B".to_string(),
                start: time("06:00"),
            },
        ];
        assert!(SceneSchedule::new(duplicate, "Fade".to_string(), DEFAULT_CHECK_INTERVAL).is_err());
    }

    #[test]
    fn test_parse_start_time() {
        assert_eq!(time(" 18:00 "), NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert!(parse_start_time("25:00").is_err());
        assert!(parse_start_time("6pm").is_err());
    }
}
