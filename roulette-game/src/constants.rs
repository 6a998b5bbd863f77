//! Centralized timing and tuning constants for the roll engines.
//!
//! These values drive the reveal pacing of every slot. Keeping them together
//! means the feel of a spin can only be adjusted through reviewed code
//! changes; `SessionConfig` starts from these defaults.

// Character reveal ---------------------------------------------------------
pub const CHARACTER_SHUFFLE_CAP: u32 = 6;
pub const CHARACTER_SHUFFLE_FLOOR: u32 = 3;
pub const CHARACTER_SHUFFLE_DELAY_MS: u64 = 110;
pub const CHARACTER_SPOTLIGHT_HOLD_MS: u64 = 600;
pub const CHARACTER_REVEAL_GAP_MS: u64 = 350;

// Rule flicker -------------------------------------------------------------
pub const RULE_FLICKER_STEPS: u32 = 12;
pub const RULE_FLICKER_BASE_MS: u64 = 60;
pub const RULE_FLICKER_GROWTH_MS: u64 = 30;

// Win-condition flicker ----------------------------------------------------
pub const WIN_FLICKER_STEPS: u32 = 10;
pub const WIN_FLICKER_BASE_MS: u64 = 60;
pub const WIN_FLICKER_GROWTH_MS: u64 = 35;

// Roll-all stage delays ----------------------------------------------------
pub const STAGE_DELAY_CHARACTERS_MS: u64 = 0;
pub const STAGE_DELAY_RULE_MS: u64 = 350;
pub const STAGE_DELAY_WIN_MS: u64 = 350;

// Deck sizing --------------------------------------------------------------
pub const POOL_SIZE_MIN: u8 = 1;
pub const POOL_SIZE_MAX: u8 = 5;
pub const POOL_SIZE_DEFAULT: u8 = 3;

// Data Dragon --------------------------------------------------------------
pub const DDRAGON_VERSION: &str = "16.3.1";
pub const DDRAGON_CDN: &str = "https://ddragon.leagueoflegends.com/cdn";

// Run-until-idle guard; a full roll-all settles well under this many timers.
pub(crate) const MAX_TIMER_DISPATCH: usize = 10_000;
