//! The two persistent visual layers
//!
//! Each layer maps to one named media source in the compositor. Mutations go
//! through the control channel first and are recorded afterwards
//! (load-then-mark). A failed command is not rolled back: the record keeps the
//! commanded value, so it may drift from the remote state until the next
//! successful command on that layer.

use std::fmt;

use tracing::debug;

use super::playlist::MediaReference;
use crate::control::{ControlChannel, MediaOptions};
use crate::error::CommandError;

/// Stable slot id of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerId {
    Zero,
    One,
}

impl LayerId {
    /// The other layer
    pub fn other(self) -> Self {
        match self {
            LayerId::Zero => LayerId::One,
            LayerId::One => LayerId::Zero,
        }
    }

    pub fn index(self) -> usize {
        match self {
            LayerId::Zero => 0,
            LayerId::One => 1,
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer{}", self.index())
    }
}

/// Clamp an opacity into `[0.0, 1.0]`.
///
/// Values below zero are floor-clamped as well; the ramp never produces them.
/// NaN maps to 0.0 so a bad value can only hide a layer.
pub fn clamp_opacity(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Record of one layer
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Compositor source name
    pub source: String,
    /// Media last loaded (None before the first load)
    pub media: Option<MediaReference>,
    /// Opacity last set
    pub opacity: f64,
}

impl Layer {
    fn new(source: String) -> Self {
        Self {
            source,
            media: None,
            opacity: 0.0,
        }
    }
}

/// Both layers plus the media options used for every load
#[derive(Debug, Clone)]
pub struct LayerState {
    layers: [Layer; 2],
    media_options: MediaOptions,
}

impl LayerState {
    pub fn new(sources: [String; 2], media_options: MediaOptions) -> Self {
        let [first, second] = sources;
        Self {
            layers: [Layer::new(first), Layer::new(second)],
            media_options,
        }
    }

    pub fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[id.index()]
    }

    pub fn media_options(&self) -> MediaOptions {
        self.media_options
    }

    /// Load `media` onto `id` through the channel, then record it
    pub async fn set_media<C>(
        &mut self,
        channel: &mut C,
        id: LayerId,
        media: &MediaReference,
    ) -> Result<(), CommandError>
    where
        C: ControlChannel + ?Sized,
    {
        let layer = &mut self.layers[id.index()];
        let result = channel
            .set_source_media(&layer.source, media, self.media_options)
            .await;
        layer.media = Some(media.clone());
        debug!("{} ({}) loaded {}", id, layer.source, media);
        result
    }

    /// Clamp `value`, apply it through the channel, then record it
    pub async fn set_opacity<C>(
        &mut self,
        channel: &mut C,
        id: LayerId,
        value: f64,
    ) -> Result<(), CommandError>
    where
        C: ControlChannel + ?Sized,
    {
        let opacity = clamp_opacity(value);
        let layer = &mut self.layers[id.index()];
        let result = channel.set_source_opacity(&layer.source, opacity).await;
        layer.opacity = opacity;
        result
    }

    /// True when `active` is fully opaque and the other layer fully transparent
    pub fn is_at_rest(&self, active: LayerId) -> bool {
        self.layer(active).opacity == 1.0 && self.layer(active.other()).opacity == 0.0
    }
}
