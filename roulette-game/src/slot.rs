//! Single-value slot engine: idle, spinning with a timed flicker, settled.
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::catalog::{Candidate, GameMap, MapScoped};
use crate::constants::{
    RULE_FLICKER_BASE_MS, RULE_FLICKER_GROWTH_MS, RULE_FLICKER_STEPS, WIN_FLICKER_BASE_MS,
    WIN_FLICKER_GROWTH_MS, WIN_FLICKER_STEPS,
};
use crate::rng::CountingRng;
use crate::timeline::{Domain, RollEventKind, Timeline, Timer, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotStatus {
    Idle,
    Spinning,
    Settled,
}

/// Result of asking an engine to roll. Never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RollOutcome {
    Started,
    /// The engine (or the queue) was already busy.
    Ignored,
    /// The eligible pool is empty.
    Unavailable,
}

impl RollOutcome {
    #[must_use]
    pub const fn is_started(self) -> bool {
        matches!(self, Self::Started)
    }
}

/// What a dispatched timer did to its engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Issued by a superseded roll; nothing changed.
    Stale,
    Advanced,
    Settled,
}

/// Flicker pacing for one domain.
///
/// Step 0 is shown as soon as the roll starts; step `i` follows step `i - 1`
/// after `base_ms + growth_ms * i`, and the settle follows the last step
/// after `base_ms + growth_ms * steps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlickerProfile {
    pub steps: u32,
    pub base_ms: u64,
    pub growth_ms: u64,
}

impl FlickerProfile {
    pub const RULE: Self = Self {
        steps: RULE_FLICKER_STEPS,
        base_ms: RULE_FLICKER_BASE_MS,
        growth_ms: RULE_FLICKER_GROWTH_MS,
    };

    pub const WIN_CONDITION: Self = Self {
        steps: WIN_FLICKER_STEPS,
        base_ms: WIN_FLICKER_BASE_MS,
        growth_ms: WIN_FLICKER_GROWTH_MS,
    };

    /// Delay preceding step `step`; `step == steps` is the settle.
    #[must_use]
    pub const fn delay_before(&self, step: u32) -> u64 {
        self.base_ms
            .saturating_add(self.growth_ms.saturating_mul(step as u64))
    }

    /// Time from roll start to settle.
    #[must_use]
    pub fn spin_duration_ms(&self) -> u64 {
        (1..=self.steps).map(|step| self.delay_before(step)).sum()
    }
}

/// One rollable slot (rule or win condition).
///
/// At most one timer is outstanding per engine. Each roll bumps the
/// generation; a timer carrying an older generation is a no-op when it fires.
#[derive(Debug, Clone)]
pub struct SlotEngine<T: Candidate> {
    domain: Domain,
    profile: FlickerProfile,
    status: SlotStatus,
    current: Option<T>,
    generation: u64,
    pending: Option<TimerHandle>,
    spin_pool: Vec<T>,
    flickers_shown: u32,
    rng: CountingRng<SmallRng>,
}

impl<T: Candidate> SlotEngine<T> {
    #[must_use]
    pub const fn new(domain: Domain, profile: FlickerProfile, rng: CountingRng<SmallRng>) -> Self {
        Self {
            domain,
            profile,
            status: SlotStatus::Idle,
            current: None,
            generation: 0,
            pending: None,
            spin_pool: Vec::new(),
            flickers_shown: 0,
            rng,
        }
    }

    #[must_use]
    pub const fn domain(&self) -> Domain {
        self.domain
    }

    #[must_use]
    pub const fn status(&self) -> SlotStatus {
        self.status
    }

    #[must_use]
    pub const fn is_spinning(&self) -> bool {
        matches!(self.status, SlotStatus::Spinning)
    }

    /// Provisional value while spinning, committed value once settled.
    #[must_use]
    pub const fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn profile(&self) -> &FlickerProfile {
        &self.profile
    }

    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rng.draws()
    }

    /// Start a spin over `pool`. The pool is captured; later filter changes
    /// do not affect a spin already in progress.
    pub fn roll(&mut self, pool: &[T], timeline: &mut Timeline) -> RollOutcome {
        if self.is_spinning() {
            log::trace!("{} roll ignored: already spinning", self.domain.as_str());
            return RollOutcome::Ignored;
        }
        if pool.is_empty() {
            log::debug!("{} roll unavailable: empty pool", self.domain.as_str());
            return RollOutcome::Unavailable;
        }

        self.invalidate(timeline);
        self.status = SlotStatus::Spinning;
        self.spin_pool = pool.to_vec();
        self.flickers_shown = 0;
        timeline.emit(RollEventKind::Started {
            domain: self.domain,
            pool_size: pool.len(),
        });
        log::debug!(
            "{} spin started over {} candidates (generation {})",
            self.domain.as_str(),
            pool.len(),
            self.generation
        );

        if self.profile.steps > 0 {
            self.show_flicker(timeline);
        }
        self.schedule_next(timeline);
        RollOutcome::Started
    }

    /// Abandon any spin in progress and start a new one.
    pub fn restart(&mut self, pool: &[T], timeline: &mut Timeline) -> RollOutcome {
        if pool.is_empty() {
            return RollOutcome::Unavailable;
        }
        self.cancel(timeline);
        self.roll(pool, timeline)
    }

    /// Stop a spin in progress, leaving the engine idle. Returns whether
    /// anything was cancelled.
    pub fn cancel(&mut self, timeline: &mut Timeline) -> bool {
        if !self.is_spinning() {
            return false;
        }
        self.invalidate(timeline);
        self.status = SlotStatus::Idle;
        self.spin_pool.clear();
        timeline.emit(RollEventKind::Cancelled {
            domain: self.domain,
        });
        true
    }

    /// Drop the current value and any spin in progress.
    pub fn clear(&mut self, timeline: &mut Timeline) {
        let had_state = self.current.is_some() || self.status != SlotStatus::Idle;
        self.invalidate(timeline);
        self.status = SlotStatus::Idle;
        self.current = None;
        self.spin_pool.clear();
        if had_state {
            timeline.emit(RollEventKind::Cleared {
                domain: self.domain,
            });
        }
    }

    /// Apply a timer issued for this engine.
    pub fn on_timer(&mut self, generation: u64, timeline: &mut Timeline) -> Step {
        if generation != self.generation || !self.is_spinning() {
            log::trace!(
                "{} dropped stale timer (generation {generation}, current {})",
                self.domain.as_str(),
                self.generation
            );
            return Step::Stale;
        }
        self.pending = None;

        if self.flickers_shown < self.profile.steps {
            self.show_flicker(timeline);
            self.schedule_next(timeline);
            return Step::Advanced;
        }

        self.settle(timeline);
        Step::Settled
    }

    fn show_flicker(&mut self, timeline: &mut Timeline) {
        if let Some(idx) = self.rng.pick_index(self.spin_pool.len()) {
            let pick = self.spin_pool[idx].clone();
            timeline.emit(RollEventKind::Flicker {
                domain: self.domain,
                id: pick.id().to_string(),
            });
            self.current = Some(pick);
        }
        self.flickers_shown += 1;
    }

    fn schedule_next(&mut self, timeline: &mut Timeline) {
        let delay = self.profile.delay_before(self.flickers_shown);
        self.pending = Some(timeline.schedule(
            delay,
            Timer::Slot {
                domain: self.domain,
                generation: self.generation,
            },
        ));
    }

    fn settle(&mut self, timeline: &mut Timeline) {
        // Independent of every flicker value shown above.
        let pick = self
            .rng
            .pick_index(self.spin_pool.len())
            .map(|idx| self.spin_pool[idx].clone());
        timeline.emit(RollEventKind::Settled {
            domain: self.domain,
            id: pick.as_ref().map(|p| p.id().to_string()),
        });
        log::debug!(
            "{} settled on {:?}",
            self.domain.as_str(),
            pick.as_ref().map(Candidate::id)
        );
        self.current = pick;
        self.status = SlotStatus::Settled;
        self.spin_pool.clear();
    }

    fn invalidate(&mut self, timeline: &mut Timeline) {
        if let Some(handle) = self.pending.take() {
            timeline.cancel(handle);
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

impl<T: Candidate + MapScoped> SlotEngine<T> {
    /// Clear a settled value that cannot be played on `map`. Spins in
    /// progress finish against the pool they captured. Returns whether the
    /// value was cleared.
    pub fn clear_if_inapplicable(&mut self, map: GameMap, timeline: &mut Timeline) -> bool {
        let inapplicable = self.status == SlotStatus::Settled
            && self
                .current
                .as_ref()
                .is_some_and(|value| !value.applies_to(Some(map)));
        if inapplicable {
            log::debug!("{} cleared: not playable on {map}", self.domain.as_str());
            self.clear(timeline);
        }
        inapplicable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Rule};

    fn engine(seed: u64) -> SlotEngine<Rule> {
        SlotEngine::new(
            Domain::Rule,
            FlickerProfile::RULE,
            CountingRng::for_domain(seed, Domain::Rule),
        )
    }

    fn drive(engine: &mut SlotEngine<Rule>, timeline: &mut Timeline) -> Vec<Step> {
        let mut steps = Vec::new();
        while let Some(due) = timeline.next_due() {
            if let Some(Timer::Slot { generation, .. }) = timeline.pop_due(due) {
                steps.push(engine.on_timer(generation, timeline));
            }
        }
        steps
    }

    #[test]
    fn flicker_delays_grow_linearly() {
        let profile = FlickerProfile::RULE;
        assert_eq!(profile.delay_before(1), 90);
        assert_eq!(profile.delay_before(2), 120);
        assert_eq!(profile.delay_before(12), 420);
        assert_eq!(profile.spin_duration_ms(), (1..=12).map(|i| 60 + 30 * i).sum::<u64>());
    }

    #[test]
    fn roll_spins_then_settles_within_pool() {
        let pool = Catalog::builtin().rules().to_vec();
        let mut timeline = Timeline::new();
        let mut slot = engine(3);

        assert_eq!(slot.roll(&pool, &mut timeline), RollOutcome::Started);
        assert_eq!(slot.status(), SlotStatus::Spinning);
        assert!(slot.current().is_some());

        let steps = drive(&mut slot, &mut timeline);
        assert_eq!(steps.len(), 12);
        assert_eq!(steps.last(), Some(&Step::Settled));
        assert_eq!(slot.status(), SlotStatus::Settled);
        assert_eq!(timeline.now_ms(), FlickerProfile::RULE.spin_duration_ms());

        let settled = slot.current().unwrap();
        assert!(pool.iter().any(|r| r.id == settled.id));
        let flickers = timeline
            .events()
            .iter()
            .filter(|e| matches!(e.kind, RollEventKind::Flicker { .. }))
            .count();
        assert_eq!(flickers, 12);
        // twelve flicker draws plus one independent final draw
        assert!(slot.rng_draws() >= 13);
    }

    #[test]
    fn roll_while_spinning_is_ignored() {
        let pool = Catalog::builtin().rules().to_vec();
        let mut timeline = Timeline::new();
        let mut slot = engine(5);
        slot.roll(&pool, &mut timeline);
        let generation = slot.generation();
        assert_eq!(slot.roll(&pool, &mut timeline), RollOutcome::Ignored);
        assert_eq!(slot.generation(), generation);
        assert_eq!(timeline.pending(), 1);
    }

    #[test]
    fn empty_pool_leaves_engine_untouched() {
        let mut timeline = Timeline::new();
        let mut slot = engine(1);
        assert_eq!(slot.roll(&[], &mut timeline), RollOutcome::Unavailable);
        assert_eq!(slot.status(), SlotStatus::Idle);
        assert!(slot.current().is_none());
        assert!(timeline.events().is_empty());
        assert_eq!(timeline.pending(), 0);
    }

    #[test]
    fn restart_settles_exactly_once_from_newest_roll() {
        let pool = Catalog::builtin().rules().to_vec();
        let mut timeline = Timeline::new();
        let mut slot = engine(9);
        slot.roll(&pool, &mut timeline);
        let first_generation = slot.generation();
        assert_eq!(slot.restart(&pool, &mut timeline), RollOutcome::Started);
        assert_ne!(slot.generation(), first_generation);

        let steps = drive(&mut slot, &mut timeline);
        assert_eq!(steps.iter().filter(|s| **s == Step::Settled).count(), 1);
        let settles = timeline
            .events()
            .iter()
            .filter(|e| matches!(e.kind, RollEventKind::Settled { .. }))
            .count();
        assert_eq!(settles, 1);
    }

    #[test]
    fn stale_generation_is_a_no_op() {
        let pool = Catalog::builtin().rules().to_vec();
        let mut timeline = Timeline::new();
        let mut slot = engine(2);
        slot.roll(&pool, &mut timeline);
        let stale = slot.generation();
        slot.clear(&mut timeline);
        assert_eq!(slot.on_timer(stale, &mut timeline), Step::Stale);
        assert!(slot.current().is_none());
        assert_eq!(timeline.pending(), 0);
    }

    #[test]
    fn map_reconciliation_only_touches_settled_inapplicable_values() {
        let catalog = Catalog::builtin();
        let rift_only = catalog.rule("ss-5").unwrap().clone();
        let mut timeline = Timeline::new();
        let mut slot = engine(4);
        slot.roll(std::slice::from_ref(&rift_only), &mut timeline);
        assert!(!slot.clear_if_inapplicable(GameMap::Aram, &mut timeline));
        drive(&mut slot, &mut timeline);
        assert!(!slot.clear_if_inapplicable(GameMap::Rift, &mut timeline));
        assert!(slot.clear_if_inapplicable(GameMap::Aram, &mut timeline));
        assert_eq!(slot.status(), SlotStatus::Idle);
        assert!(slot.current().is_none());
    }
}
