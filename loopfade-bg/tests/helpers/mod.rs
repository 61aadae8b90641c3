//! Test helpers for loopfade-bg integration tests
//!
//! - RecordingChannel: in-memory control channel with failure injection
//! - FakeObs: minimal obs-websocket v5 server on a local port

#![allow(dead_code)]

pub mod fake_obs;
pub mod recording_channel;

pub use fake_obs::{FakeObs, FakeObsConfig};
pub use recording_channel::{Recorded, RecordingChannel};

use loopfade_bg::control::MediaOptions;
use loopfade_bg::playback::{CrossfadeEngine, LayerState, MediaReference, Playlist, RampSettings};
use std::time::Duration;

/// Source names used by every engine test
pub const SOURCES: [&str; 2] = ["PalaceBackground1", "PalaceBackground2"];

pub fn playlist(items: &[&str]) -> Playlist {
    Playlist::new(items.iter().map(|s| MediaReference::from(*s)).collect())
        .expect("non-empty playlist")
}

pub fn layers() -> LayerState {
    LayerState::new(
        [SOURCES[0].to_string(), SOURCES[1].to_string()],
        MediaOptions::default(),
    )
}

/// Engine over a fresh recording channel; returns a handle sharing its log
pub fn engine(
    items: &[&str],
    duration: Duration,
    steps: u32,
) -> (CrossfadeEngine<RecordingChannel>, RecordingChannel) {
    let channel = RecordingChannel::new();
    let handle = channel.clone();
    let ramp = RampSettings::new(duration, steps).expect("valid ramp");
    (
        CrossfadeEngine::new(channel, playlist(items), layers(), ramp),
        handle,
    )
}
