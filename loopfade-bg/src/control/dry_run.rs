//! Control channel that only logs
//!
//! Selected with `--dry-run`: the full engine and scheduler run against it, so a
//! configuration can be checked without a compositor.

use async_trait::async_trait;
use tracing::debug;

use super::{ControlChannel, MediaOptions, SceneControl};
use crate::error::CommandError;
use crate::playback::MediaReference;

/// Accepts every command and logs it at debug level
#[derive(Debug, Default)]
pub struct DryRunChannel {
    commands_issued: u64,
}

impl DryRunChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commands accepted so far
    pub fn commands_issued(&self) -> u64 {
        self.commands_issued
    }
}

#[async_trait]
impl ControlChannel for DryRunChannel {
    async fn set_source_media(
        &mut self,
        source: &str,
        media: &MediaReference,
        options: MediaOptions,
    ) -> Result<(), CommandError> {
        self.commands_issued += 1;
        debug!(
            "[dry-run] {} <- {} (looping: {}, speed: {})",
            source, media, options.looping, options.speed
        );
        Ok(())
    }

    async fn set_source_opacity(&mut self, source: &str, opacity: f64) -> Result<(), CommandError> {
        self.commands_issued += 1;
        debug!("[dry-run] {} opacity {:.3}", source, opacity);
        Ok(())
    }
}

#[async_trait]
impl SceneControl for DryRunChannel {
    async fn set_scene_transition(&mut self, transition: &str) -> Result<(), CommandError> {
        self.commands_issued += 1;
        debug!("[dry-run] transition {}", transition);
        Ok(())
    }

    async fn set_program_scene(&mut self, scene: &str) -> Result<(), CommandError> {
        self.commands_issued += 1;
        debug!("[dry-run] program scene {}", scene);
        Ok(())
    }
}
