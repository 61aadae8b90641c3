//! # Loopfade Background Crossfader (loopfade-bg)
//!
//! Drives a looping video background in OBS Studio by alternating between two
//! media sources and crossfading their opacities on a fixed schedule, so the
//! stream shows smooth transitions through a playlist of clips instead of hard
//! cuts.
//!
//! **Architecture:** a single cooperative task. The [`playback::Scheduler`]
//! fires one [`playback::CrossfadeEngine`] cycle per period; each cycle is
//! planned as an ordered [`playback::CommandPlan`] and replayed through a
//! [`control::ControlChannel`].

pub mod config;
pub mod control;
pub mod error;
pub mod playback;
pub mod scenes;

pub use error::{CommandError, ConnectionError, Error, Result};
