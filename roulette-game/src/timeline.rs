//! Virtual clock, timer queue, and roll event journal.
//!
//! All engines are single-threaded and timer-driven: a roll never blocks, it
//! schedules its next step. The host advances the clock (a browser maps
//! [`Timeline::next_due`] onto one `setTimeout`, tests jump straight to it),
//! and due timers are handed back to the session for dispatch.

use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

/// One independently rollable domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    Characters,
    Rule,
    WinCondition,
}

impl Domain {
    pub const ALL: [Self; 3] = [Self::Characters, Self::Rule, Self::WinCondition];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Characters => "characters",
            Self::Rule => "rule",
            Self::WinCondition => "win-condition",
        }
    }

    pub(crate) const fn tag(self) -> &'static [u8] {
        match self {
            Self::Characters => b"characters",
            Self::Rule => b"rule",
            Self::WinCondition => b"win-condition",
        }
    }
}

/// Identity of a scheduled timer, used to cancel it before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    due_ms: u64,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

/// Min-heap of delayed tasks on a virtual millisecond clock.
///
/// Tasks due at the same instant fire in scheduling order. A cancelled
/// handle is skipped when its slot comes up.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Entry<T>>>,
    cancelled: HashSet<u64>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
            cancelled: HashSet::new(),
        }
    }
}

impl<T> Scheduler<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `task` to fire `delay_ms` after the current instant.
    pub fn schedule(&mut self, delay_ms: u64, task: T) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.queue.push(Reverse(Entry {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq,
            task,
        }));
        TimerHandle(seq)
    }

    /// Prevent a scheduled task from firing. Unknown or spent handles are ignored.
    pub fn cancel(&mut self, handle: TimerHandle) {
        if self.queue.iter().any(|Reverse(e)| e.seq == handle.0) {
            self.cancelled.insert(handle.0);
        }
    }

    /// Instant at which the next live task is due.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.queue
            .iter()
            .filter(|Reverse(e)| !self.cancelled.contains(&e.seq))
            .map(|Reverse(e)| e.due_ms)
            .min()
    }

    /// Number of live (not cancelled) tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue
            .iter()
            .filter(|Reverse(e)| !self.cancelled.contains(&e.seq))
            .count()
    }

    /// Pop the earliest live task due at or before `until_ms`, moving the
    /// clock to its due time.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<T> {
        loop {
            let due = self.queue.peek().map(|Reverse(e)| e.due_ms)?;
            if due > until_ms {
                return None;
            }
            let Reverse(entry) = self.queue.pop()?;
            if self.cancelled.remove(&entry.seq) {
                continue;
            }
            self.now_ms = self.now_ms.max(entry.due_ms);
            return Some(entry.task);
        }
    }

    /// Move the clock forward without dispatching anything.
    pub fn advance_clock_to(&mut self, at_ms: u64) {
        self.now_ms = self.now_ms.max(at_ms);
    }
}

/// Payload of a scheduled engine step. The generation pins the step to the
/// roll that issued it; a newer roll or a reset makes it stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Slot { domain: Domain, generation: u64 },
    Deck { generation: u64 },
    Stage { generation: u64 },
}

/// Observable state change, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollEvent {
    pub at_ms: u64,
    pub kind: RollEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RollEventKind {
    Started { domain: Domain, pool_size: usize },
    Flicker { domain: Domain, id: String },
    Spotlight { id: String },
    Revealed { index: usize, id: String },
    Settled { domain: Domain, id: Option<String> },
    Cancelled { domain: Domain },
    Cleared { domain: Domain },
    StageScheduled { stage: Domain, delay_ms: u64 },
    StageStarted { stage: Domain },
    QueueCompleted,
    QueueAborted { stage: Domain },
}

impl RollEventKind {
    /// Domain the event belongs to, if any.
    #[must_use]
    pub const fn domain(&self) -> Option<Domain> {
        match self {
            Self::Started { domain, .. }
            | Self::Flicker { domain, .. }
            | Self::Settled { domain, .. }
            | Self::Cancelled { domain }
            | Self::Cleared { domain } => Some(*domain),
            Self::Spotlight { .. } | Self::Revealed { .. } => Some(Domain::Characters),
            Self::StageScheduled { stage, .. }
            | Self::StageStarted { stage }
            | Self::QueueAborted { stage } => Some(*stage),
            Self::QueueCompleted => None,
        }
    }
}

/// Scheduler plus event journal shared by every engine in a session.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    scheduler: Scheduler<Timer>,
    events: Vec<RollEvent>,
}

impl Timeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn schedule(&mut self, delay_ms: u64, timer: Timer) -> TimerHandle {
        self.scheduler.schedule(delay_ms, timer)
    }

    pub fn cancel(&mut self, handle: TimerHandle) {
        self.scheduler.cancel(handle);
    }

    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }

    pub(crate) fn pop_due(&mut self, until_ms: u64) -> Option<Timer> {
        self.scheduler.pop_due(until_ms)
    }

    pub(crate) fn advance_clock_to(&mut self, at_ms: u64) {
        self.scheduler.advance_clock_to(at_ms);
    }

    pub fn emit(&mut self, kind: RollEventKind) {
        log::trace!("t={}ms {kind:?}", self.now_ms());
        self.events.push(RollEvent {
            at_ms: self.now_ms(),
            kind,
        });
    }

    /// Events recorded since the last drain.
    #[must_use]
    pub fn events(&self) -> &[RollEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<RollEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_orders_by_due_then_fifo() {
        let mut s = Scheduler::new();
        s.schedule(50, "late");
        s.schedule(10, "first");
        s.schedule(10, "second");
        assert_eq!(s.next_due(), Some(10));
        assert_eq!(s.pop_due(100), Some("first"));
        assert_eq!(s.pop_due(100), Some("second"));
        assert_eq!(s.now_ms(), 10);
        assert_eq!(s.pop_due(40), None);
        assert_eq!(s.pop_due(100), Some("late"));
        assert_eq!(s.now_ms(), 50);
    }

    #[test]
    fn cancelled_handles_never_fire() {
        let mut s = Scheduler::new();
        let stale = s.schedule(5, 1);
        s.schedule(5, 2);
        s.cancel(stale);
        assert_eq!(s.pending(), 1);
        assert_eq!(s.pop_due(5), Some(2));
        assert_eq!(s.pop_due(5), None);
        assert_eq!(s.next_due(), None);
    }

    #[test]
    fn delays_are_relative_to_the_current_instant() {
        let mut s = Scheduler::new();
        s.advance_clock_to(100);
        s.schedule(20, ());
        assert_eq!(s.next_due(), Some(120));
    }

    #[test]
    fn timeline_stamps_events_with_clock() {
        let mut timeline = Timeline::new();
        timeline.schedule(30, Timer::Deck { generation: 1 });
        assert_eq!(timeline.pop_due(30), Some(Timer::Deck { generation: 1 }));
        timeline.emit(RollEventKind::QueueCompleted);
        let events = timeline.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].at_ms, 30);
        assert!(timeline.events().is_empty());
    }
}
