//! Ordered command plans and their executor
//!
//! A plan is the exact sequence of media loads, opacity updates and pauses that
//! one startup or crossfade cycle issues. The executor replays it strictly in
//! order, one command at a time. A failed command is logged and recorded in the
//! report; replay continues with the next step.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{trace, warn};

use super::layers::{LayerId, LayerState};
use super::playlist::MediaReference;
use crate::control::ControlChannel;
use crate::error::CommandError;

/// One step of a plan
#[derive(Debug, Clone, PartialEq)]
pub enum PlanStep {
    /// Load media onto a layer
    LoadMedia { layer: LayerId, media: MediaReference },
    /// Set a layer's opacity
    SetOpacity { layer: LayerId, opacity: f64 },
    /// Suspend before the next step
    Pause(Duration),
}

impl PlanStep {
    /// True for steps that issue a control command
    pub fn is_command(&self) -> bool {
        !matches!(self, PlanStep::Pause(_))
    }
}

/// Ordered list of steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandPlan {
    steps: Vec<PlanStep>,
}

impl CommandPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            steps: Vec::with_capacity(capacity),
        }
    }

    pub fn load_media(&mut self, layer: LayerId, media: MediaReference) {
        self.steps.push(PlanStep::LoadMedia { layer, media });
    }

    pub fn set_opacity(&mut self, layer: LayerId, opacity: f64) {
        self.steps.push(PlanStep::SetOpacity { layer, opacity });
    }

    pub fn pause(&mut self, duration: Duration) {
        self.steps.push(PlanStep::Pause(duration));
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps that issue a control command
    pub fn command_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_command()).count()
    }

    /// Opacity values planned for `layer`, in order
    pub fn opacities_for(&self, layer: LayerId) -> Vec<f64> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                PlanStep::SetOpacity { layer: l, opacity } if *l == layer => Some(*opacity),
                _ => None,
            })
            .collect()
    }

    /// Sum of all pauses
    pub fn total_pause(&self) -> Duration {
        self.steps
            .iter()
            .filter_map(|step| match step {
                PlanStep::Pause(d) => Some(*d),
                _ => None,
            })
            .sum()
    }
}

/// A command that failed during replay
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailure {
    /// Index of the step in the plan
    pub position: usize,
    pub step: PlanStep,
    pub error: CommandError,
}

/// Outcome of replaying a plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    /// Commands issued (successful or not); pauses excluded
    pub commands_issued: usize,
    pub failures: Vec<CommandFailure>,
    /// Wall-clock time spent in the replay
    pub elapsed: Duration,
}

impl ExecutionReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Replays plans against a channel, mirroring each command into [`LayerState`]
pub struct CommandExecutor;

impl CommandExecutor {
    /// Replay every step of `plan` in order.
    ///
    /// Never aborts early: a [`CommandError`] is logged and collected, and the
    /// next step runs as planned.
    pub async fn replay<C>(plan: &CommandPlan, layers: &mut LayerState, channel: &mut C) -> ExecutionReport
    where
        C: ControlChannel + ?Sized,
    {
        let started = Instant::now();
        let mut report = ExecutionReport::default();

        for (position, step) in plan.steps().iter().enumerate() {
            let result = match step {
                PlanStep::LoadMedia { layer, media } => {
                    report.commands_issued += 1;
                    layers.set_media(channel, *layer, media).await
                }
                PlanStep::SetOpacity { layer, opacity } => {
                    report.commands_issued += 1;
                    layers.set_opacity(channel, *layer, *opacity).await
                }
                PlanStep::Pause(duration) => {
                    sleep(*duration).await;
                    Ok(())
                }
            };

            if let Err(error) = result {
                warn!("Command {} failed ({:?}): {}", position, step, error);
                report.failures.push(CommandFailure {
                    position,
                    step: step.clone(),
                    error,
                });
            }
        }

        report.elapsed = started.elapsed();
        trace!(
            "Replayed {} steps ({} commands, {} failed) in {:?}",
            plan.len(),
            report.commands_issued,
            report.failures.len(),
            report.elapsed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::MediaOptions;
    use async_trait::async_trait;

    /// Records commands, failing the `fail_at`-th one (0-based)
    #[derive(Default)]
    struct ScriptedChannel {
        log: Vec<String>,
        fail_at: Option<usize>,
    }

    impl ScriptedChannel {
        fn outcome(&self) -> Result<(), CommandError> {
            if self.fail_at == Some(self.log.len() - 1) {
                Err(CommandError::Transport("injected".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ControlChannel for ScriptedChannel {
        async fn set_source_media(
            &mut self,
            source: &str,
            media: &MediaReference,
            _options: MediaOptions,
        ) -> Result<(), CommandError> {
            self.log.push(format!("media {} {}", source, media));
            self.outcome()
        }

        async fn set_source_opacity(&mut self, source: &str, opacity: f64) -> Result<(), CommandError> {
            self.log.push(format!("opacity {} {}", source, opacity));
            self.outcome()
        }
    }

    fn layers() -> LayerState {
        LayerState::new(["A".to_string(), "B".to_string()], MediaOptions::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_preserves_order() {
        let mut plan = CommandPlan::new();
        plan.load_media(LayerId::One, MediaReference::from("next.mp4"));
        plan.set_opacity(LayerId::One, 0.0);
        plan.pause(Duration::from_millis(10));
        plan.set_opacity(LayerId::One, 1.0);
        plan.set_opacity(LayerId::Zero, 0.0);

        let mut channel = ScriptedChannel::default();
        let mut state = layers();
        let report = CommandExecutor::replay(&plan, &mut state, &mut channel).await;

        assert_eq!(
            channel.log,
            vec![
                "media B next.mp4",
                "opacity B 0",
                "opacity B 1",
                "opacity A 0",
            ]
        );
        assert_eq!(report.commands_issued, 4);
        assert!(report.succeeded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_continues_after_failure() {
        let mut plan = CommandPlan::new();
        for i in 0..5 {
            plan.set_opacity(LayerId::Zero, i as f64 / 4.0);
        }

        let mut channel = ScriptedChannel {
            fail_at: Some(2),
            ..Default::default()
        };
        let mut state = layers();
        let report = CommandExecutor::replay(&plan, &mut state, &mut channel).await;

        assert_eq!(channel.log.len(), 5);
        assert_eq!(report.commands_issued, 5);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].position, 2);
        assert_eq!(state.layer(LayerId::Zero).opacity, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_waits_for_pauses() {
        let mut plan = CommandPlan::new();
        plan.pause(Duration::from_millis(250));
        plan.pause(Duration::from_millis(750));

        let started = tokio::time::Instant::now();
        let mut channel = ScriptedChannel::default();
        let report = CommandExecutor::replay(&plan, &mut layers(), &mut channel).await;

        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(report.commands_issued, 0);
        assert_eq!(plan.total_pause(), Duration::from_secs(1));
    }

    #[test]
    fn test_plan_helpers() {
        let mut plan = CommandPlan::with_capacity(4);
        plan.set_opacity(LayerId::Zero, 1.0);
        plan.set_opacity(LayerId::One, 0.0);
        plan.pause(Duration::from_millis(5));
        plan.set_opacity(LayerId::Zero, 0.5);

        assert_eq!(plan.len(), 4);
        assert_eq!(plan.command_count(), 3);
        assert_eq!(plan.opacities_for(LayerId::Zero), vec![1.0, 0.5]);
        assert_eq!(plan.opacities_for(LayerId::One), vec![0.0]);
    }
}
