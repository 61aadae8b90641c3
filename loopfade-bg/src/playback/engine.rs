//! Crossfade engine
//!
//! Two states: `Idle` between cycles and `Transitioning` while a cycle's plan
//! is replayed. A cycle is split into a pure planning step ([`plan_cycle`]) and
//! the replay of the resulting [`CommandPlan`].
//!
//! # Cycle
//!
//! With active layer A and hidden layer H:
//! 1. `(next, media) = playlist.next(cursor)`
//! 2. Load `media` onto H, then force H's opacity to 0.0
//! 3. For each ramp point `i` in `0..=N`: set H to `i/N`, then A to `1 - i/N`,
//!    pausing `D/N` between points. Hidden before active at every point.
//! 4. Swap roles (H becomes active) and set `cursor = next`
//!
//! The role swap happens even when commands failed during the replay.
//!
//! `Transitioning` is only observable from outside after a cycle was abandoned:
//! if the [`CrossfadeEngine::run_cycle`] future is dropped mid-replay (e.g. on
//! shutdown), the engine stays `Transitioning` with its rest-point state
//! unchanged. The next `run_cycle` re-plans from that state.

use tracing::{debug, info, warn};

use loopfade_common::human_time::format_duration;

use super::commands::{CommandExecutor, CommandPlan, ExecutionReport};
use super::layers::{LayerId, LayerState};
use super::playlist::{MediaReference, Playlist};
use super::ramp::RampSettings;
use crate::control::ControlChannel;

/// Rest-point state carried between cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossfadeState {
    /// Layer fully visible at rest
    pub active_layer: LayerId,
    /// Playlist index of the media on the active layer
    pub cursor: usize,
}

impl CrossfadeState {
    /// Layer 0 active, cursor 0
    pub fn initial() -> Self {
        Self {
            active_layer: LayerId::Zero,
            cursor: 0,
        }
    }

    pub fn hidden_layer(&self) -> LayerId {
        self.active_layer.other()
    }
}

impl Default for CrossfadeState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Engine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// Between cycles; rest-point invariants hold
    Idle,
    /// A cycle's plan is being replayed, or was abandoned mid-replay
    Transitioning,
}

/// Everything one cycle will do, computed without side effects
#[derive(Debug, Clone, PartialEq)]
pub struct CyclePlan {
    pub plan: CommandPlan,
    /// Media loaded onto the hidden layer
    pub media: MediaReference,
    /// State after the cycle completes
    pub next_state: CrossfadeState,
}

/// Plan one crossfade cycle from `state`
pub fn plan_cycle(state: &CrossfadeState, playlist: &Playlist, ramp: &RampSettings) -> CyclePlan {
    let active = state.active_layer;
    let hidden = state.hidden_layer();
    let (next_index, media) = playlist.next(state.cursor);

    let steps = ramp.steps() as usize;
    let mut plan = CommandPlan::with_capacity(2 + 3 * (steps + 1));

    plan.load_media(hidden, media.clone());
    plan.set_opacity(hidden, 0.0);

    let interval = ramp.step_interval();
    for point in ramp.points() {
        if point.step > 0 {
            plan.pause(interval);
        }
        plan.set_opacity(hidden, point.hidden);
        plan.set_opacity(active, point.active);
    }

    CyclePlan {
        plan,
        media: media.clone(),
        next_state: CrossfadeState {
            active_layer: hidden,
            cursor: next_index,
        },
    }
}

/// Plan the startup sequence: `playlist[0]` on layer 0 fully visible, layer 1
/// fully transparent with no media
pub fn plan_startup(playlist: &Playlist) -> CommandPlan {
    let initial = CrossfadeState::initial();
    let mut plan = CommandPlan::with_capacity(3);
    plan.load_media(initial.active_layer, playlist.get(initial.cursor).clone());
    plan.set_opacity(initial.active_layer, 1.0);
    plan.set_opacity(initial.hidden_layer(), 0.0);
    plan
}

/// Result of one completed cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub previous: CrossfadeState,
    pub current: CrossfadeState,
    pub media: MediaReference,
    pub report: ExecutionReport,
}

/// Owns the channel, the layers and the crossfade state
pub struct CrossfadeEngine<C> {
    channel: C,
    playlist: Playlist,
    layers: LayerState,
    ramp: RampSettings,
    state: CrossfadeState,
    phase: EnginePhase,
    cycles_completed: u64,
}

impl<C: ControlChannel> CrossfadeEngine<C> {
    pub fn new(channel: C, playlist: Playlist, layers: LayerState, ramp: RampSettings) -> Self {
        Self {
            channel,
            playlist,
            layers,
            ramp,
            state: CrossfadeState::initial(),
            phase: EnginePhase::Idle,
            cycles_completed: 0,
        }
    }

    /// Establish the first rest point. Command failures are logged, not fatal.
    pub async fn initialize(&mut self) -> ExecutionReport {
        info!(
            "Initializing layers: {} <- {}, {} hidden",
            self.layers.layer(LayerId::Zero).source,
            self.playlist.get(0),
            self.layers.layer(LayerId::One).source
        );

        self.state = CrossfadeState::initial();
        let plan = plan_startup(&self.playlist);
        let report = CommandExecutor::replay(&plan, &mut self.layers, &mut self.channel).await;

        if !report.succeeded() {
            warn!(
                "{} of {} startup commands failed",
                report.failures.len(),
                report.commands_issued
            );
        }
        report
    }

    /// Run one full crossfade cycle to completion
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let previous = self.state;
        let cycle = plan_cycle(&previous, &self.playlist, &self.ramp);

        info!(
            "Crossfade {}: {} -> {} loading {} (index {}) over {}",
            self.cycles_completed + 1,
            self.layers.layer(previous.active_layer).source,
            self.layers.layer(previous.hidden_layer()).source,
            cycle.media,
            cycle.next_state.cursor,
            format_duration(self.ramp.duration())
        );

        self.phase = EnginePhase::Transitioning;
        let report = CommandExecutor::replay(&cycle.plan, &mut self.layers, &mut self.channel).await;

        self.state = cycle.next_state;
        self.phase = EnginePhase::Idle;
        self.cycles_completed += 1;

        if report.succeeded() {
            info!(
                "Crossfade {} complete in {}",
                self.cycles_completed,
                format_duration(report.elapsed)
            );
        } else {
            warn!(
                "Crossfade {} complete in {} with {} failed command(s)",
                self.cycles_completed,
                format_duration(report.elapsed),
                report.failures.len()
            );
        }
        if !self.layers.is_at_rest(self.state.active_layer) {
            debug!("Layer records not at rest after crossfade {}", self.cycles_completed);
        }

        CycleOutcome {
            previous,
            current: self.state,
            media: cycle.media,
            report,
        }
    }

    pub fn state(&self) -> CrossfadeState {
        self.state
    }

    /// `Transitioning` here means the last cycle was abandoned before it finished
    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn layers(&self) -> &LayerState {
        &self.layers
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn ramp(&self) -> &RampSettings {
        &self.ramp
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Consume the engine, returning the channel (e.g. to close it)
    pub fn into_channel(self) -> C {
        self.channel
    }
}
