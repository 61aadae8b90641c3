//! In-memory control channel
//!
//! Clones share one log, so a test can keep a handle while the engine owns the
//! channel. Every call is recorded with the (tokio) time it was issued, whether
//! or not it was made to fail.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use loopfade_bg::control::{ControlChannel, MediaOptions, SceneControl};
use loopfade_bg::playback::MediaReference;
use loopfade_bg::CommandError;

/// One command as the compositor would have seen it
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Media { source: String, media: String },
    Opacity { source: String, opacity: f64 },
    Transition(String),
    Scene(String),
}

#[derive(Default)]
struct Inner {
    log: Vec<(Instant, Recorded)>,
    fail_calls: HashSet<usize>,
    fail_all: bool,
}

#[derive(Clone, Default)]
pub struct RecordingChannel {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `index`-th call (0-based, counting every command)
    pub fn fail_call(&self, index: usize) {
        self.inner.lock().unwrap().fail_calls.insert(index);
    }

    /// Fail every call from now on (or stop failing)
    pub fn set_fail_all(&self, fail: bool) {
        self.inner.lock().unwrap().fail_all = fail;
    }

    pub fn commands(&self) -> Vec<Recorded> {
        self.inner
            .lock()
            .unwrap()
            .log
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn timed_commands(&self) -> Vec<(Instant, Recorded)> {
        self.inner.lock().unwrap().log.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().log.len()
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().log.clear();
    }

    /// Opacities sent to `source`, in order
    pub fn opacities(&self, source: &str) -> Vec<f64> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                Recorded::Opacity { source: s, opacity } if s == source => Some(opacity),
                _ => None,
            })
            .collect()
    }

    /// Media loads as `(source, media)` pairs
    pub fn loads(&self) -> Vec<(String, String)> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                Recorded::Media { source, media } => Some((source, media)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, command: Recorded) -> Result<(), CommandError> {
        let mut inner = self.inner.lock().unwrap();
        let index = inner.log.len();
        inner.log.push((Instant::now(), command));
        if inner.fail_all || inner.fail_calls.contains(&index) {
            Err(CommandError::Transport(format!("injected failure at call {}", index)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ControlChannel for RecordingChannel {
    async fn set_source_media(
        &mut self,
        source: &str,
        media: &MediaReference,
        _options: MediaOptions,
    ) -> Result<(), CommandError> {
        self.record(Recorded::Media {
            source: source.to_string(),
            media: media.as_str().to_string(),
        })
    }

    async fn set_source_opacity(&mut self, source: &str, opacity: f64) -> Result<(), CommandError> {
        self.record(Recorded::Opacity {
            source: source.to_string(),
            opacity,
        })
    }
}

#[async_trait]
impl SceneControl for RecordingChannel {
    async fn set_scene_transition(&mut self, transition: &str) -> Result<(), CommandError> {
        self.record(Recorded::Transition(transition.to_string()))
    }

    async fn set_program_scene(&mut self, scene: &str) -> Result<(), CommandError> {
        self.record(Recorded::Scene(scene.to_string()))
    }
}
