//! Champion Roulette Engine
//!
//! Platform-agnostic core for a 1v1 randomizer: filter state, selection pools,
//! timed slot and deck engines, the serialized roll-all queue, and the
//! roster cache. Time is virtual; hosts drive it through [`RouletteSession`].
//! This crate has no UI or platform-specific dependencies.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod deck;
pub mod filters;
pub mod i18n;
pub mod orchestrator;
pub mod pools;
pub mod prompts;
pub mod rng;
pub mod roster;
pub mod session;
pub mod slot;
pub mod timeline;

// Re-export commonly used types
pub use catalog::{
    Candidate, Catalog, CatalogError, GameMap, MapScoped, Rule, RuleCategory, WinCondition,
    WinIcon,
};
pub use config::{ConfigError, SessionConfig};
pub use deck::{Deck, DeckEngine, DeckProfile};
pub use filters::FilterState;
pub use i18n::{Locale, LocalizedContent, LocalizedText, Translator, Vars};
pub use orchestrator::{RollOrchestrator, StageDelays};
pub use pools::{PoolStats, SelectionPools};
pub use prompts::{Prompt, deck_progress, rule_availability, spotlight_prompt, win_availability};
pub use rng::{CountingRng, RngBundle};
pub use roster::{
    Character, FIXTURE_ROSTER_DATA, Role, RosterError, RosterStatus, parse_ddragon_roster,
};
#[cfg(feature = "async")]
pub use roster::{RosterCache, RosterProvider, StaticRoster};
pub use session::{DeckSnapshot, RouletteSession, SessionSnapshot, SlotSnapshot};
pub use slot::{FlickerProfile, RollOutcome, SlotEngine, SlotStatus, Step};
pub use timeline::{Domain, RollEvent, RollEventKind, Scheduler, Timeline, Timer, TimerHandle};
