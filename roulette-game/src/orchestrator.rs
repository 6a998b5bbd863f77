//! Serialized "roll all": characters, then rule, then win condition.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::constants::{STAGE_DELAY_CHARACTERS_MS, STAGE_DELAY_RULE_MS, STAGE_DELAY_WIN_MS};
use crate::timeline::{Domain, RollEventKind, Timeline, Timer, TimerHandle};

/// Pause before each stage starts, measured from the moment the previous
/// stage stopped spinning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDelays {
    #[serde(default = "default_characters_delay")]
    pub characters_ms: u64,
    #[serde(default = "default_rule_delay")]
    pub rule_ms: u64,
    #[serde(default = "default_win_delay")]
    pub win_condition_ms: u64,
}

const fn default_characters_delay() -> u64 {
    STAGE_DELAY_CHARACTERS_MS
}
const fn default_rule_delay() -> u64 {
    STAGE_DELAY_RULE_MS
}
const fn default_win_delay() -> u64 {
    STAGE_DELAY_WIN_MS
}

impl Default for StageDelays {
    fn default() -> Self {
        Self {
            characters_ms: STAGE_DELAY_CHARACTERS_MS,
            rule_ms: STAGE_DELAY_RULE_MS,
            win_condition_ms: STAGE_DELAY_WIN_MS,
        }
    }
}

impl StageDelays {
    #[must_use]
    pub const fn for_stage(&self, stage: Domain) -> u64 {
        match stage {
            Domain::Characters => self.characters_ms,
            Domain::Rule => self.rule_ms,
            Domain::WinCondition => self.win_condition_ms,
        }
    }
}

/// Queue driving one roll-all at a time.
///
/// A stage's start timer is armed only after the previous stage reports that
/// it finished, so a slow stage gates everything behind it.
#[derive(Debug, Clone, Default)]
pub struct RollOrchestrator {
    delays: StageDelays,
    queue: VecDeque<Domain>,
    scheduled: Option<Domain>,
    active: Option<Domain>,
    generation: u64,
    pending: Option<TimerHandle>,
}

impl RollOrchestrator {
    #[must_use]
    pub fn new(delays: StageDelays) -> Self {
        Self {
            delays,
            ..Self::default()
        }
    }

    /// True from `begin` until the queue completes, aborts or is cancelled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.scheduled.is_some() || self.active.is_some() || !self.queue.is_empty()
    }

    /// Stage currently rolling under the queue's control.
    #[must_use]
    pub const fn active_stage(&self) -> Option<Domain> {
        self.active
    }

    /// Stages not yet started, including one whose start timer is armed.
    #[must_use]
    pub fn remaining(&self) -> Vec<Domain> {
        self.scheduled.into_iter().chain(self.queue.iter().copied()).collect()
    }

    #[must_use]
    pub const fn delays(&self) -> &StageDelays {
        &self.delays
    }

    /// Enqueue every stage and arm the first one.
    pub fn begin(&mut self, timeline: &mut Timeline) {
        self.cancel(timeline);
        self.queue = Domain::ALL.into_iter().collect();
        log::debug!("roll-all queued {:?}", self.queue);
        self.arm_next(timeline);
    }

    /// Discard the queue and any armed stage start. Returns whether a queue
    /// was pending.
    pub fn cancel(&mut self, timeline: &mut Timeline) -> bool {
        let was_active = self.is_active();
        if let Some(handle) = self.pending.take() {
            timeline.cancel(handle);
        }
        self.generation = self.generation.wrapping_add(1);
        self.queue.clear();
        self.scheduled = None;
        self.active = None;
        if was_active {
            log::debug!("roll-all queue cancelled");
        }
        was_active
    }

    /// A stage start timer fired. Returns the stage to roll, or `None` if the
    /// timer belongs to a cancelled queue.
    pub fn on_timer(&mut self, generation: u64, timeline: &mut Timeline) -> Option<Domain> {
        if generation != self.generation {
            log::trace!("roll-all dropped stale stage timer (generation {generation})");
            return None;
        }
        self.pending = None;
        let stage = self.scheduled.take()?;
        self.active = Some(stage);
        timeline.emit(RollEventKind::StageStarted { stage });
        Some(stage)
    }

    /// The engine for `stage` stopped spinning; arm the next stage or finish.
    pub fn on_stage_finished(&mut self, stage: Domain, timeline: &mut Timeline) {
        if self.active != Some(stage) {
            return;
        }
        self.active = None;
        if self.queue.is_empty() {
            log::debug!("roll-all completed");
            timeline.emit(RollEventKind::QueueCompleted);
        } else {
            self.arm_next(timeline);
        }
    }

    /// The stage could not start (its pool emptied or its engine was busy).
    pub fn abort(&mut self, stage: Domain, timeline: &mut Timeline) {
        log::warn!("roll-all aborted at {} stage", stage.as_str());
        self.cancel(timeline);
        timeline.emit(RollEventKind::QueueAborted { stage });
    }

    fn arm_next(&mut self, timeline: &mut Timeline) {
        let Some(stage) = self.queue.pop_front() else {
            return;
        };
        let delay_ms = self.delays.for_stage(stage);
        self.scheduled = Some(stage);
        self.pending = Some(timeline.schedule(
            delay_ms,
            Timer::Stage {
                generation: self.generation,
            },
        ));
        timeline.emit(RollEventKind::StageScheduled { stage, delay_ms });
    }
}
