//! Session facade: filters, engines, roll-all queue and the shared clock.
use serde::Serialize;
use std::sync::Arc;

use crate::catalog::{Catalog, GameMap, Rule, WinCondition};
use crate::config::SessionConfig;
use crate::constants::{MAX_TIMER_DISPATCH, POOL_SIZE_MAX, POOL_SIZE_MIN};
use crate::deck::DeckEngine;
use crate::filters::FilterState;
use crate::orchestrator::RollOrchestrator;
use crate::pools::{PoolStats, SelectionPools, eligible_characters};
use crate::rng::RngBundle;
use crate::roster::{Character, Role};
use crate::slot::{RollOutcome, SlotEngine, SlotStatus, Step};
use crate::timeline::{Domain, RollEvent, Timeline, Timer};

/// Per-engine view exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSnapshot<T> {
    pub status: SlotStatus,
    pub current: Option<T>,
    pub pool_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckSnapshot {
    pub status: SlotStatus,
    pub deck: Vec<Character>,
    pub spotlight: Option<Character>,
    pub pool_size: usize,
    /// Number of cards the current or next deck holds.
    pub target: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub now_ms: u64,
    pub characters: DeckSnapshot,
    pub rule: SlotSnapshot<Rule>,
    pub win_condition: SlotSnapshot<WinCondition>,
    pub filters: FilterState,
    pub pool_size: u8,
    pub roll_all_active: bool,
    pub roster_size: usize,
    pub stats: PoolStats,
}

/// One user's randomizer session.
///
/// Every operation is synchronous; timed steps are queued on the session's
/// [`Timeline`] and applied when the host calls [`Self::advance`] or
/// [`Self::run_until_idle`].
///
/// Every state change is also appended to the event journal, which grows
/// until the host takes it with [`Self::drain_events`]. Long-lived hosts
/// should drain it after each render.
#[derive(Debug, Clone)]
pub struct RouletteSession {
    roster: Arc<[Character]>,
    catalog: Arc<Catalog>,
    config: SessionConfig,
    seed: u64,
    filters: FilterState,
    pool_size: u8,
    deck: DeckEngine,
    rule: SlotEngine<Rule>,
    win_condition: SlotEngine<WinCondition>,
    orchestrator: RollOrchestrator,
    timeline: Timeline,
}

impl RouletteSession {
    /// Session over the built-in catalog with reference tuning.
    #[must_use]
    pub fn new(roster: impl Into<Arc<[Character]>>, seed: u64) -> Self {
        Self::with_config(
            roster,
            Arc::new(Catalog::builtin().clone()),
            SessionConfig::default(),
            seed,
        )
    }

    #[must_use]
    pub fn with_config(
        roster: impl Into<Arc<[Character]>>,
        catalog: Arc<Catalog>,
        config: SessionConfig,
        seed: u64,
    ) -> Self {
        let (characters_rng, rules_rng, wins_rng) = RngBundle::from_user_seed(seed).into_streams();
        let filters = FilterState::from_catalog(&catalog);
        Self {
            roster: roster.into(),
            filters,
            pool_size: config.default_pool_size.clamp(POOL_SIZE_MIN, POOL_SIZE_MAX),
            deck: DeckEngine::new(config.deck, characters_rng),
            rule: SlotEngine::new(Domain::Rule, config.rule_flicker, rules_rng),
            win_condition: SlotEngine::new(
                Domain::WinCondition,
                config.win_condition_flicker,
                wins_rng,
            ),
            orchestrator: RollOrchestrator::new(config.stage_delays),
            timeline: Timeline::new(),
            catalog,
            config,
            seed,
        }
    }

    // Accessors ---------------------------------------------------------------

    #[must_use]
    pub fn roster(&self) -> &[Character] {
        &self.roster
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    #[must_use]
    pub const fn pool_size(&self) -> u8 {
        self.pool_size
    }

    #[must_use]
    pub const fn deck(&self) -> &DeckEngine {
        &self.deck
    }

    #[must_use]
    pub const fn rule(&self) -> &SlotEngine<Rule> {
        &self.rule
    }

    #[must_use]
    pub const fn win_condition(&self) -> &SlotEngine<WinCondition> {
        &self.win_condition
    }

    #[must_use]
    pub const fn orchestrator(&self) -> &RollOrchestrator {
        &self.orchestrator
    }

    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.timeline.now_ms()
    }

    /// True while any engine is mid-spin.
    #[must_use]
    pub const fn is_spinning(&self) -> bool {
        self.deck.is_spinning() || self.rule.is_spinning() || self.win_condition.is_spinning()
    }

    /// True while anything is spinning or a roll-all is queued.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.is_spinning() || self.orchestrator.is_active()
    }

    // Filters -----------------------------------------------------------------

    pub fn toggle_role(&mut self, role: Role) -> bool {
        self.filters.toggle_role(role)
    }

    pub fn select_all_roles(&mut self) {
        self.filters.select_all_roles();
    }

    pub fn reset_roles_to_single_default(&mut self) {
        self.filters.reset_roles_to_single_default();
    }

    pub fn toggle_category(&mut self, id: &str) {
        self.filters.toggle_category(&self.catalog, id);
    }

    pub fn enable_all_categories(&mut self) {
        self.filters.enable_all_categories(&self.catalog);
    }

    pub fn disable_all_categories(&mut self) {
        self.filters.disable_all_categories();
    }

    /// Select a map and drop settled results that cannot be played on it.
    /// Clearing the map never clears results.
    pub fn set_map(&mut self, map: Option<GameMap>) {
        self.filters.set_map(map);
        if let Some(map) = map {
            self.rule.clear_if_inapplicable(map, &mut self.timeline);
            self.win_condition
                .clear_if_inapplicable(map, &mut self.timeline);
        }
    }

    /// Set the requested deck size, clamped to the selectable range. A
    /// finished deck larger than the new size is truncated.
    pub fn set_pool_size(&mut self, size: u8) -> u8 {
        self.pool_size = size.clamp(POOL_SIZE_MIN, POOL_SIZE_MAX);
        self.deck.truncate(usize::from(self.pool_size));
        self.pool_size
    }

    // Derived state -----------------------------------------------------------

    #[must_use]
    pub fn pools(&self) -> SelectionPools {
        SelectionPools::derive(&self.roster, &self.catalog, &self.filters)
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats::collect(&self.pools(), &self.filters, &self.catalog)
    }

    /// Cards the running deck roll will reveal, or the size the next roll
    /// would reach without shrinking an existing deck.
    #[must_use]
    pub fn deck_target(&self) -> usize {
        if let Some(planned) = self.deck.planned() {
            return planned;
        }
        let eligible = eligible_characters(&self.roster, &self.filters).len();
        if eligible == 0 {
            return 0;
        }
        let desired = usize::from(self.pool_size).min(eligible);
        self.deck.deck().len().max(desired)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let pools = self.pools();
        SessionSnapshot {
            now_ms: self.now_ms(),
            characters: DeckSnapshot {
                status: self.deck.status(),
                deck: self.deck.deck().to_vec(),
                spotlight: self.deck.spotlight().cloned(),
                pool_size: pools.characters.len(),
                target: self.deck_target(),
            },
            rule: SlotSnapshot {
                status: self.rule.status(),
                current: self.rule.current().cloned(),
                pool_size: pools.rules.len(),
            },
            win_condition: SlotSnapshot {
                status: self.win_condition.status(),
                current: self.win_condition.current().cloned(),
                pool_size: pools.win_conditions.len(),
            },
            stats: PoolStats::collect(&pools, &self.filters, &self.catalog),
            filters: self.filters.clone(),
            pool_size: self.pool_size,
            roll_all_active: self.orchestrator.is_active(),
            roster_size: self.roster.len(),
        }
    }

    // Rolls -------------------------------------------------------------------

    /// Roll a fresh deck. A roll that starts discards a pending roll-all queue.
    pub fn roll_characters(&mut self) -> RollOutcome {
        self.start_direct(Domain::Characters)
    }

    /// Roll the rule slot. A roll that starts discards a pending roll-all queue.
    pub fn roll_rule(&mut self) -> RollOutcome {
        self.start_direct(Domain::Rule)
    }

    /// Roll the win-condition slot. A roll that starts discards a pending roll-all queue.
    pub fn roll_win_condition(&mut self) -> RollOutcome {
        self.start_direct(Domain::WinCondition)
    }

    /// Abandon any spin in `domain` and roll it again from the current pool.
    pub fn reroll(&mut self, domain: Domain) -> RollOutcome {
        let pools = self.pools();
        let outcome = match domain {
            Domain::Characters => {
                if pools.characters.is_empty() {
                    return RollOutcome::Unavailable;
                }
                self.deck.clear(&mut self.timeline);
                self.deck.roll(
                    usize::from(self.pool_size),
                    &pools.characters,
                    &mut self.timeline,
                )
            }
            Domain::Rule => self.rule.restart(&pools.rules, &mut self.timeline),
            Domain::WinCondition => self
                .win_condition
                .restart(&pools.win_conditions, &mut self.timeline),
        };
        if outcome.is_started() {
            self.orchestrator.cancel(&mut self.timeline);
        }
        outcome
    }

    /// Roll characters, then rule, then win condition, one after another.
    ///
    /// Refused while anything spins or a queue is pending, and unavailable
    /// unless all three pools are non-empty.
    pub fn roll_all(&mut self) -> RollOutcome {
        if self.is_busy() {
            log::trace!("roll-all ignored: session busy");
            return RollOutcome::Ignored;
        }
        if !self.pools().all_available() {
            log::debug!("roll-all unavailable: a pool is empty");
            return RollOutcome::Unavailable;
        }
        self.rule.clear(&mut self.timeline);
        self.win_condition.clear(&mut self.timeline);
        self.orchestrator.begin(&mut self.timeline);
        RollOutcome::Started
    }

    /// Clear every result and the selected map; filters are kept.
    pub fn reset(&mut self) {
        self.orchestrator.cancel(&mut self.timeline);
        self.deck.clear(&mut self.timeline);
        self.rule.clear(&mut self.timeline);
        self.win_condition.clear(&mut self.timeline);
        self.filters.set_map(None);
    }

    // Clock -------------------------------------------------------------------

    /// Move the clock forward by `ms`, applying every timer that falls due.
    /// Returns the number of timers dispatched.
    pub fn advance(&mut self, ms: u64) -> usize {
        let until = self.now_ms().saturating_add(ms);
        let mut dispatched = 0;
        while dispatched < MAX_TIMER_DISPATCH {
            let Some(timer) = self.timeline.pop_due(until) else {
                break;
            };
            self.dispatch(timer);
            dispatched += 1;
        }
        self.timeline.advance_clock_to(until);
        dispatched
    }

    /// Apply timers until nothing is pending.
    pub fn run_until_idle(&mut self) -> usize {
        let mut dispatched = 0;
        while let Some(due) = self.timeline.next_due() {
            if dispatched >= MAX_TIMER_DISPATCH {
                log::warn!("run_until_idle stopped after {dispatched} timers");
                break;
            }
            if let Some(timer) = self.timeline.pop_due(due) {
                self.dispatch(timer);
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Instant the next timer is due; a browser host maps this to one `setTimeout`.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.timeline.next_due()
    }

    #[must_use]
    pub fn events(&self) -> &[RollEvent] {
        self.timeline.events()
    }

    pub fn drain_events(&mut self) -> Vec<RollEvent> {
        self.timeline.drain_events()
    }

    /// Ignored and unavailable rolls leave a pending roll-all untouched.
    fn start_direct(&mut self, domain: Domain) -> RollOutcome {
        let outcome = self.start_stage(domain);
        if outcome.is_started() {
            self.orchestrator.cancel(&mut self.timeline);
        }
        outcome
    }

    fn start_stage(&mut self, domain: Domain) -> RollOutcome {
        let pools = self.pools();
        match domain {
            Domain::Characters => self.deck.roll(
                usize::from(self.pool_size),
                &pools.characters,
                &mut self.timeline,
            ),
            Domain::Rule => self.rule.roll(&pools.rules, &mut self.timeline),
            Domain::WinCondition => self
                .win_condition
                .roll(&pools.win_conditions, &mut self.timeline),
        }
    }

    fn dispatch(&mut self, timer: Timer) {
        let finished = match timer {
            Timer::Deck { generation } => (self.deck.on_timer(generation, &mut self.timeline)
                == Step::Settled)
                .then_some(Domain::Characters),
            Timer::Slot {
                domain: Domain::Rule,
                generation,
            } => (self.rule.on_timer(generation, &mut self.timeline) == Step::Settled)
                .then_some(Domain::Rule),
            Timer::Slot {
                domain: Domain::WinCondition,
                generation,
            } => (self.win_condition.on_timer(generation, &mut self.timeline) == Step::Settled)
                .then_some(Domain::WinCondition),
            Timer::Slot {
                domain: Domain::Characters,
                ..
            } => None,
            Timer::Stage { generation } => {
                if let Some(stage) = self.orchestrator.on_timer(generation, &mut self.timeline) {
                    let outcome = self.start_stage(stage);
                    if !outcome.is_started() {
                        self.orchestrator.abort(stage, &mut self.timeline);
                    }
                }
                None
            }
        };
        if let Some(domain) = finished {
            self.orchestrator
                .on_stage_finished(domain, &mut self.timeline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{FIXTURE_ROSTER_DATA, parse_ddragon_roster};
    use crate::timeline::RollEventKind;

    fn session(seed: u64) -> RouletteSession {
        RouletteSession::new(parse_ddragon_roster(FIXTURE_ROSTER_DATA).unwrap(), seed)
    }

    #[test]
    fn fresh_session_uses_defaults() {
        let s = session(1);
        let snap = s.snapshot();
        assert_eq!(snap.pool_size, 3);
        assert_eq!(snap.roster_size, 18);
        assert_eq!(snap.characters.target, 3);
        assert_eq!(snap.rule.status, SlotStatus::Idle);
        assert!(!snap.roll_all_active);
        assert_eq!(snap.stats.eligible_rules, 44);
    }

    #[test]
    fn advance_applies_only_due_timers() {
        let mut s = session(2);
        assert!(s.roll_rule().is_started());
        assert_eq!(s.advance(89), 0);
        assert_eq!(s.now_ms(), 89);
        assert_eq!(s.advance(1), 1);
        s.run_until_idle();
        assert_eq!(s.rule().status(), SlotStatus::Settled);
    }

    #[test]
    fn direct_roll_discards_roll_all_queue() {
        let mut s = session(3);
        assert!(s.roll_all().is_started());
        assert!(s.orchestrator().is_active());
        s.roll_win_condition();
        assert!(!s.orchestrator().is_active());
        s.run_until_idle();
        assert!(s.deck().deck().is_empty());
        assert!(s.rule().current().is_none());
        assert_eq!(s.win_condition().status(), SlotStatus::Settled);
    }

    #[test]
    fn drain_events_empties_the_journal() {
        let mut s = session(6);
        s.roll_rule();
        s.run_until_idle();
        let drained = s.drain_events();
        assert!(drained.iter().any(|e| matches!(
            e.kind,
            RollEventKind::Settled {
                domain: Domain::Rule,
                ..
            }
        )));
        assert!(s.events().is_empty());
        assert_eq!(s.rule().status(), SlotStatus::Settled);
    }

    #[test]
    fn roll_all_refused_while_busy() {
        let mut s = session(4);
        s.roll_rule();
        assert_eq!(s.roll_all(), RollOutcome::Ignored);
        s.run_until_idle();
        assert!(s.roll_all().is_started());
        assert_eq!(s.roll_all(), RollOutcome::Ignored);
    }

    #[test]
    fn pool_size_is_clamped_and_truncates() {
        let mut s = session(5);
        assert_eq!(s.set_pool_size(9), 5);
        s.roll_characters();
        s.run_until_idle();
        assert_eq!(s.deck().deck().len(), 5);
        assert_eq!(s.set_pool_size(0), 1);
        assert_eq!(s.deck().deck().len(), 1);
        s.set_pool_size(4);
        assert_eq!(s.deck().deck().len(), 1);
        assert_eq!(s.deck_target(), 4);
    }

    #[test]
    fn reroll_replaces_spin_in_progress() {
        let mut s = session(6);
        s.roll_rule();
        assert!(s.reroll(Domain::Rule).is_started());
        s.run_until_idle();
        let settles = s
            .events()
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    crate::timeline::RollEventKind::Settled {
                        domain: Domain::Rule,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(settles, 1);
    }
}
