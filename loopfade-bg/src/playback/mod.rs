//! Crossfade playback core
//!
//! Two persistent layers, one visible at rest. Each cycle loads the next
//! playlist item into the hidden layer, ramps both opacities in lockstep and
//! swaps roles.
//!
//! Components, leaf-first:
//! - [`playlist`]: cyclic playlist of media references
//! - [`layers`]: the two layer records, mirrored to the control channel
//! - [`ramp`]: linear opacity interpolation
//! - [`commands`]: ordered command plans and their executor
//! - [`engine`]: the per-cycle state machine
//! - [`scheduler`]: fixed-period, non-overlapping cycle timer

pub mod commands;
pub mod engine;
pub mod layers;
pub mod playlist;
pub mod ramp;
pub mod scheduler;

pub use commands::{CommandExecutor, CommandPlan, ExecutionReport, PlanStep};
pub use engine::{plan_cycle, CrossfadeEngine, CrossfadeState, CycleOutcome, CyclePlan, EnginePhase};
pub use layers::{Layer, LayerId, LayerState};
pub use playlist::{MediaReference, Playlist};
pub use ramp::{RampPoint, RampSettings};
pub use scheduler::{Scheduler, SchedulerReport};
