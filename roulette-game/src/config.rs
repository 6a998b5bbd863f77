//! Session tuning loaded from JSON, falling back to the reference constants.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{POOL_SIZE_DEFAULT, POOL_SIZE_MAX, POOL_SIZE_MIN};
use crate::deck::DeckProfile;
use crate::orchestrator::StageDelays;
use crate::slot::FlickerProfile;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config JSON is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("{domain} flicker needs at least one step")]
    NoFlickerSteps { domain: &'static str },
    #[error("character shuffle floor {floor} exceeds cap {cap}")]
    ShuffleBounds { floor: u32, cap: u32 },
    #[error("default pool size {0} is outside 1..=5")]
    PoolSize(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default = "default_rule_flicker")]
    pub rule_flicker: FlickerProfile,
    #[serde(default = "default_win_flicker")]
    pub win_condition_flicker: FlickerProfile,
    #[serde(default)]
    pub deck: DeckProfile,
    #[serde(default)]
    pub stage_delays: StageDelays,
    #[serde(default = "default_pool_size")]
    pub default_pool_size: u8,
}

const fn default_rule_flicker() -> FlickerProfile {
    FlickerProfile::RULE
}

const fn default_win_flicker() -> FlickerProfile {
    FlickerProfile::WIN_CONDITION
}

const fn default_pool_size() -> u8 {
    POOL_SIZE_DEFAULT
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rule_flicker: FlickerProfile::RULE,
            win_condition_flicker: FlickerProfile::WIN_CONDITION,
            deck: DeckProfile::default(),
            stage_delays: StageDelays::default(),
            default_pool_size: POOL_SIZE_DEFAULT,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a config document. Absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails [`Self::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the tuning values for combinations the engines cannot run.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rule_flicker.steps == 0 {
            return Err(ConfigError::NoFlickerSteps { domain: "rule" });
        }
        if self.win_condition_flicker.steps == 0 {
            return Err(ConfigError::NoFlickerSteps {
                domain: "win condition",
            });
        }
        if self.deck.shuffle_floor > self.deck.shuffle_cap {
            return Err(ConfigError::ShuffleBounds {
                floor: self.deck.shuffle_floor,
                cap: self.deck.shuffle_cap,
            });
        }
        if self.default_pool_size < POOL_SIZE_MIN || self.default_pool_size > POOL_SIZE_MAX {
            return Err(ConfigError::PoolSize(self.default_pool_size));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_reference_tuning() {
        let config = SessionConfig::from_json("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.rule_flicker.steps, 12);
        assert_eq!(config.win_condition_flicker.growth_ms, 35);
        assert_eq!(config.deck.spotlight_hold_ms, 600);
        assert_eq!(config.stage_delays.rule_ms, 350);
        assert_eq!(config.default_pool_size, 3);
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let config = SessionConfig::from_json(
            r#"{"deck":{"revealGapMs":100},"stageDelays":{"ruleMs":0},"defaultPoolSize":5}"#,
        )
        .unwrap();
        assert_eq!(config.deck.reveal_gap_ms, 100);
        assert_eq!(config.deck.shuffle_delay_ms, 110);
        assert_eq!(config.stage_delays.rule_ms, 0);
        assert_eq!(config.stage_delays.win_condition_ms, 350);
        assert_eq!(config.default_pool_size, 5);
    }

    #[test]
    fn invalid_tuning_is_rejected() {
        let err = SessionConfig::from_json(
            r#"{"ruleFlicker":{"steps":0,"baseMs":60,"growthMs":30}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoFlickerSteps { domain: "rule" }));

        let err = SessionConfig::from_json(r#"{"deck":{"shuffleFloor":9}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ShuffleBounds { floor: 9, cap: 6 }));

        let err = SessionConfig::from_json(r#"{"defaultPoolSize":0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::PoolSize(0)));

        assert!(matches!(
            SessionConfig::from_json("[").unwrap_err(),
            ConfigError::Malformed(_)
        ));
    }
}
