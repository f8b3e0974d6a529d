#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler responsible for emitting mob spawn bursts stage by stage.
//!
//! Every stage lasts the same fixed duration regardless of how many batches it
//! defines. When a stage's duration elapses all of its batches are emitted
//! together and the scheduler moves to the next stage; once the last stage has
//! been emitted the scheduler is complete and never loops.

use std::time::Duration;

use code_defence_core::{Event, MobSpawnEvent, Stage};
use tracing::{debug, info};

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    stage_duration: Duration,
}

impl Config {
    /// Creates a new configuration using the shared stage duration.
    #[must_use]
    pub const fn new(stage_duration: Duration) -> Self {
        Self { stage_duration }
    }
}

/// Progression state of the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WavePhase {
    /// Waiting for the first start.
    Idle,
    /// Advancing through the stage table.
    Running {
        /// Zero-based index of the stage in progress.
        stage: usize,
        /// Time accumulated inside the stage.
        elapsed: Duration,
    },
    /// Frozen by a stop; a later start resumes from the stored progress.
    Paused {
        /// Zero-based index of the stage in progress.
        stage: usize,
        /// Time accumulated inside the stage.
        elapsed: Duration,
    },
    /// Every stage was emitted.
    Complete,
}

/// Pure system that turns elapsed time into mob spawn events.
#[derive(Debug)]
pub struct WaveScheduler {
    stage_duration: Duration,
    stages: Vec<Stage>,
    phase: WavePhase,
}

impl WaveScheduler {
    /// Creates an idle scheduler over the provided stage table.
    #[must_use]
    pub fn new(config: Config, stages: Vec<Stage>) -> Self {
        Self {
            stage_duration: config.stage_duration,
            stages,
            phase: WavePhase::Idle,
        }
    }

    /// Starts the first stage, or resumes a paused scheduler.
    pub fn start(&mut self) {
        match self.phase {
            WavePhase::Idle if self.stages.is_empty() => {
                self.phase = WavePhase::Complete;
                info!("no stages configured; waves complete");
            }
            WavePhase::Idle => {
                self.phase = WavePhase::Running {
                    stage: 0,
                    elapsed: Duration::ZERO,
                };
                info!(stages = self.stages.len(), "waves started");
            }
            WavePhase::Paused { stage, elapsed } => {
                self.phase = WavePhase::Running { stage, elapsed };
                debug!(stage, ?elapsed, "waves resumed");
            }
            WavePhase::Running { .. } | WavePhase::Complete => {}
        }
    }

    /// Freezes the scheduler at its current progress.
    pub fn stop(&mut self) {
        if let WavePhase::Running { stage, elapsed } = self.phase {
            self.phase = WavePhase::Paused { stage, elapsed };
            debug!(stage, ?elapsed, "waves paused");
        }
    }

    /// Current progression state.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Consumes world events and emits the bursts of every elapsed stage.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<MobSpawnEvent>) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        if accumulated.is_zero() {
            return;
        }

        self.advance(accumulated, out);
    }

    /// Advances the stage clock by `dt`.
    ///
    /// Each crossed stage boundary emits its batches exactly once, in stage
    /// order, even when `dt` spans several stages.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<MobSpawnEvent>) {
        let WavePhase::Running { mut stage, elapsed } = self.phase else {
            return;
        };

        if self.stage_duration.is_zero() {
            return;
        }

        let mut elapsed = elapsed.saturating_add(dt);
        while elapsed >= self.stage_duration {
            elapsed -= self.stage_duration;
            self.emit_stage(stage, out);
            stage += 1;

            if stage >= self.stages.len() {
                self.phase = WavePhase::Complete;
                info!("all stages emitted; waves complete");
                return;
            }
        }

        self.phase = WavePhase::Running { stage, elapsed };
    }

    fn emit_stage(&self, stage: usize, out: &mut Vec<MobSpawnEvent>) {
        let Some(definition) = self.stages.get(stage) else {
            return;
        };

        let boundary = u32::try_from(stage.saturating_add(1)).unwrap_or(u32::MAX);
        let emitted_at = self.stage_duration.saturating_mul(boundary);
        for batch in &definition.batches {
            out.push(MobSpawnEvent {
                stage,
                mob: batch.mob.clone(),
                count: batch.count,
                emitted_at,
            });
        }
        info!(stage, batches = definition.batches.len(), "stage elapsed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stage_table_completes_on_start() {
        let mut scheduler = WaveScheduler::new(Config::new(Duration::from_secs(10)), Vec::new());
        scheduler.start();
        assert_eq!(scheduler.phase(), WavePhase::Complete);
    }

    #[test]
    fn zero_duration_never_advances() {
        let mut scheduler =
            WaveScheduler::new(Config::new(Duration::ZERO), vec![Stage::default()]);
        scheduler.start();
        let mut spawned = Vec::new();
        scheduler.advance(Duration::from_secs(1), &mut spawned);
        assert_eq!(
            scheduler.phase(),
            WavePhase::Running {
                stage: 0,
                elapsed: Duration::ZERO
            }
        );
    }
}
