//! Character deck: distinct picks drawn up front, then revealed one at a time.
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::Candidate;
use crate::constants::{
    CHARACTER_REVEAL_GAP_MS, CHARACTER_SHUFFLE_CAP, CHARACTER_SHUFFLE_DELAY_MS,
    CHARACTER_SHUFFLE_FLOOR, CHARACTER_SPOTLIGHT_HOLD_MS, POOL_SIZE_MAX,
};
use crate::rng::CountingRng;
use crate::roster::Character;
use crate::slot::{RollOutcome, SlotStatus, Step};
use crate::timeline::{Domain, RollEventKind, Timeline, Timer, TimerHandle};

/// Inline capacity covers every selectable pool size.
pub type Deck = SmallVec<[Character; POOL_SIZE_MAX as usize]>;

/// Reveal pacing for each pick of a deck roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckProfile {
    #[serde(default = "default_shuffle_cap")]
    pub shuffle_cap: u32,
    #[serde(default = "default_shuffle_floor")]
    pub shuffle_floor: u32,
    #[serde(default = "default_shuffle_delay")]
    pub shuffle_delay_ms: u64,
    #[serde(default = "default_spotlight_hold")]
    pub spotlight_hold_ms: u64,
    #[serde(default = "default_reveal_gap")]
    pub reveal_gap_ms: u64,
}

const fn default_shuffle_cap() -> u32 {
    CHARACTER_SHUFFLE_CAP
}
const fn default_shuffle_floor() -> u32 {
    CHARACTER_SHUFFLE_FLOOR
}
const fn default_shuffle_delay() -> u64 {
    CHARACTER_SHUFFLE_DELAY_MS
}
const fn default_spotlight_hold() -> u64 {
    CHARACTER_SPOTLIGHT_HOLD_MS
}
const fn default_reveal_gap() -> u64 {
    CHARACTER_REVEAL_GAP_MS
}

impl Default for DeckProfile {
    fn default() -> Self {
        Self {
            shuffle_cap: CHARACTER_SHUFFLE_CAP,
            shuffle_floor: CHARACTER_SHUFFLE_FLOOR,
            shuffle_delay_ms: CHARACTER_SHUFFLE_DELAY_MS,
            spotlight_hold_ms: CHARACTER_SPOTLIGHT_HOLD_MS,
            reveal_gap_ms: CHARACTER_REVEAL_GAP_MS,
        }
    }
}

impl DeckProfile {
    /// Cosmetic shuffles shown before each pick lands.
    #[must_use]
    pub fn shuffle_steps(&self, pool_len: usize) -> u32 {
        let len = u32::try_from(pool_len).unwrap_or(u32::MAX);
        len.max(self.shuffle_floor).min(self.shuffle_cap)
    }

    /// Time for one pick: shuffles, spotlight hold, then the gap.
    #[must_use]
    pub fn pick_duration_ms(&self, pool_len: usize) -> u64 {
        u64::from(self.shuffle_steps(pool_len)) * self.shuffle_delay_ms
            + self.spotlight_hold_ms
            + self.reveal_gap_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Shuffle { shown: u32 },
    Hold,
    Gap,
}

#[derive(Debug, Clone)]
struct RevealPlan {
    pool: Vec<Character>,
    picks: Vec<Character>,
    next: usize,
    phase: Phase,
}

/// Character-domain engine filling an ordered deck without replacement.
#[derive(Debug, Clone)]
pub struct DeckEngine {
    profile: DeckProfile,
    deck: Deck,
    spotlight: Option<Character>,
    status: SlotStatus,
    generation: u64,
    pending: Option<TimerHandle>,
    plan: Option<RevealPlan>,
    rng: CountingRng<SmallRng>,
}

impl DeckEngine {
    #[must_use]
    pub fn new(profile: DeckProfile, rng: CountingRng<SmallRng>) -> Self {
        Self {
            profile,
            deck: Deck::new(),
            spotlight: None,
            status: SlotStatus::Idle,
            generation: 0,
            pending: None,
            plan: None,
            rng,
        }
    }

    #[must_use]
    pub fn deck(&self) -> &[Character] {
        &self.deck
    }

    /// Character currently under the spotlight while revealing.
    #[must_use]
    pub const fn spotlight(&self) -> Option<&Character> {
        self.spotlight.as_ref()
    }

    #[must_use]
    pub const fn status(&self) -> SlotStatus {
        self.status
    }

    #[must_use]
    pub const fn is_spinning(&self) -> bool {
        matches!(self.status, SlotStatus::Spinning)
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn profile(&self) -> &DeckProfile {
        &self.profile
    }

    /// Number of picks the running roll will reveal, if one is running.
    #[must_use]
    pub fn planned(&self) -> Option<usize> {
        self.plan.as_ref().map(|plan| plan.picks.len())
    }

    /// Draw `min(size, |pool|)` distinct characters and start revealing them.
    pub fn roll(&mut self, size: usize, pool: &[Character], timeline: &mut Timeline) -> RollOutcome {
        if self.is_spinning() {
            log::trace!("deck roll ignored: already revealing");
            return RollOutcome::Ignored;
        }
        if pool.is_empty() || size == 0 {
            log::debug!("deck roll unavailable: empty pool");
            return RollOutcome::Unavailable;
        }

        self.invalidate(timeline);
        self.deck.clear();
        self.spotlight = None;

        let picks = draw_without_replacement(&mut self.rng, pool, size);
        log::debug!(
            "deck roll drew {:?} from {} candidates",
            picks.iter().map(Candidate::id).collect::<Vec<_>>(),
            pool.len()
        );
        timeline.emit(RollEventKind::Started {
            domain: Domain::Characters,
            pool_size: pool.len(),
        });
        self.status = SlotStatus::Spinning;
        self.plan = Some(RevealPlan {
            pool: pool.to_vec(),
            picks,
            next: 0,
            phase: Phase::Shuffle { shown: 0 },
        });
        self.shuffle(timeline);
        RollOutcome::Started
    }

    /// Shrink a finished deck to `size`. A deck being revealed is left alone,
    /// and a deck is never extended here.
    pub fn truncate(&mut self, size: usize) -> bool {
        if self.is_spinning() || self.deck.len() <= size {
            return false;
        }
        self.deck.truncate(size);
        true
    }

    /// Drop the deck, the spotlight and any reveal in progress.
    pub fn clear(&mut self, timeline: &mut Timeline) {
        let had_state =
            !self.deck.is_empty() || self.spotlight.is_some() || self.status != SlotStatus::Idle;
        self.invalidate(timeline);
        self.deck.clear();
        self.spotlight = None;
        self.plan = None;
        self.status = SlotStatus::Idle;
        if had_state {
            timeline.emit(RollEventKind::Cleared {
                domain: Domain::Characters,
            });
        }
    }

    /// Apply a timer issued for this engine.
    pub fn on_timer(&mut self, generation: u64, timeline: &mut Timeline) -> Step {
        if generation != self.generation || !self.is_spinning() {
            log::trace!("deck dropped stale timer (generation {generation})");
            return Step::Stale;
        }
        self.pending = None;
        let Some(phase) = self.plan.as_ref().map(|plan| plan.phase) else {
            return Step::Stale;
        };

        match phase {
            Phase::Shuffle { .. } => self.shuffle(timeline),
            Phase::Hold => self.reveal(timeline),
            Phase::Gap => {
                let more = self
                    .plan
                    .as_ref()
                    .is_some_and(|plan| plan.next < plan.picks.len());
                if more {
                    if let Some(plan) = self.plan.as_mut() {
                        plan.phase = Phase::Shuffle { shown: 0 };
                    }
                    self.shuffle(timeline);
                } else {
                    self.finish(timeline);
                    return Step::Settled;
                }
            }
        }
        Step::Advanced
    }

    fn shuffle(&mut self, timeline: &mut Timeline) {
        let Some(plan) = self.plan.as_mut() else {
            return;
        };
        let Phase::Shuffle { shown } = plan.phase else {
            return;
        };

        if shown < self.profile.shuffle_steps(plan.pool.len()) {
            // Cosmetic: drawn with replacement from the full pool.
            if let Some(idx) = self.rng.pick_index(plan.pool.len()) {
                let face = plan.pool[idx].clone();
                timeline.emit(RollEventKind::Flicker {
                    domain: Domain::Characters,
                    id: face.id.clone(),
                });
                self.spotlight = Some(face);
            }
            plan.phase = Phase::Shuffle { shown: shown + 1 };
            let delay = self.profile.shuffle_delay_ms;
            self.arm(delay, timeline);
            return;
        }

        let pick = plan.picks[plan.next].clone();
        timeline.emit(RollEventKind::Spotlight {
            id: pick.id.clone(),
        });
        self.spotlight = Some(pick);
        plan.phase = Phase::Hold;
        let delay = self.profile.spotlight_hold_ms;
        self.arm(delay, timeline);
    }

    fn reveal(&mut self, timeline: &mut Timeline) {
        let Some(plan) = self.plan.as_mut() else {
            return;
        };
        let pick = plan.picks[plan.next].clone();
        timeline.emit(RollEventKind::Revealed {
            index: plan.next,
            id: pick.id.clone(),
        });
        self.deck.push(pick);
        plan.next += 1;
        plan.phase = Phase::Gap;
        let delay = self.profile.reveal_gap_ms;
        self.arm(delay, timeline);
    }

    fn finish(&mut self, timeline: &mut Timeline) {
        self.plan = None;
        self.spotlight = None;
        self.status = SlotStatus::Settled;
        timeline.emit(RollEventKind::Settled {
            domain: Domain::Characters,
            id: None,
        });
        log::debug!("deck settled with {} characters", self.deck.len());
    }

    fn arm(&mut self, delay_ms: u64, timeline: &mut Timeline) {
        self.pending = Some(timeline.schedule(
            delay_ms,
            Timer::Deck {
                generation: self.generation,
            },
        ));
    }

    fn invalidate(&mut self, timeline: &mut Timeline) {
        if let Some(handle) = self.pending.take() {
            timeline.cancel(handle);
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Uniform draw of `count` distinct entries; fewer when the pool is smaller.
fn draw_without_replacement(
    rng: &mut CountingRng<SmallRng>,
    pool: &[Character],
    count: usize,
) -> Vec<Character> {
    let mut remaining = pool.to_vec();
    let mut picks = Vec::with_capacity(count.min(pool.len()));
    while picks.len() < count {
        let Some(idx) = rng.pick_index(remaining.len()) else {
            break;
        };
        picks.push(remaining.swap_remove(idx));
    }
    picks
}
