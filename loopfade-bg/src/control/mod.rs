//! Control channel to the remote compositor
//!
//! The crossfade core needs exactly two capabilities from the compositor:
//! load a media file into a named source, and set a named source's opacity.
//! [`ControlChannel`] is that seam. [`SceneControl`] covers the program-scene
//! switching used by the time-of-day schedule.
//!
//! Implementations:
//! - [`obs::ObsClient`]: OBS Studio over obs-websocket v5
//! - [`dry_run::DryRunChannel`]: logs every command, never fails

pub mod dry_run;
pub mod obs;
pub mod protocol;

use async_trait::async_trait;

use crate::error::CommandError;
use crate::playback::MediaReference;

pub use dry_run::DryRunChannel;
pub use obs::{ObsClient, ObsSettings};

/// Playback options sent with every media load
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaOptions {
    /// Restart the clip when it reaches the end
    pub looping: bool,
    /// Playback speed multiplier (1.0 = normal)
    pub speed: f64,
}

impl Default for MediaOptions {
    fn default() -> Self {
        Self {
            looping: true,
            speed: 1.0,
        }
    }
}

/// Source-level commands required by the crossfade engine
///
/// Every call is a suspension point (one network round-trip). Callers issue
/// commands strictly one at a time; implementations need no internal locking.
#[async_trait]
pub trait ControlChannel: Send {
    /// Load `media` into the source named `source`
    async fn set_source_media(
        &mut self,
        source: &str,
        media: &MediaReference,
        options: MediaOptions,
    ) -> Result<(), CommandError>;

    /// Set the opacity of the source named `source` (0.0 to 1.0)
    async fn set_source_opacity(&mut self, source: &str, opacity: f64) -> Result<(), CommandError>;
}

/// Program-scene switching
#[async_trait]
pub trait SceneControl: Send {
    /// Select the transition used for the next scene change
    async fn set_scene_transition(&mut self, transition: &str) -> Result<(), CommandError>;

    /// Switch the program output to `scene`
    async fn set_program_scene(&mut self, scene: &str) -> Result<(), CommandError>;
}
