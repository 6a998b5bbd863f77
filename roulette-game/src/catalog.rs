//! Static rule and win-condition tables.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_RULES_DATA: &str = include_str!("../assets/data/rules.json");
const DEFAULT_WIN_CONDITIONS_DATA: &str = include_str!("../assets/data/win_conditions.json");

/// Map a match is played on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMap {
    Rift,
    Aram,
}

impl GameMap {
    pub const ALL: [Self; 2] = [Self::Rift, Self::Aram];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rift => "rift",
            Self::Aram => "aram",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rift" => Some(Self::Rift),
            "aram" => Some(Self::Aram),
            _ => None,
        }
    }
}

impl fmt::Display for GameMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can be restricted to a subset of maps.
pub trait MapScoped {
    fn maps(&self) -> &[GameMap];

    /// `None` means "no map selected", which admits everything.
    fn applies_to(&self, map: Option<GameMap>) -> bool {
        map.is_none_or(|m| self.maps().contains(&m))
    }
}

/// Stable identity of a rollable entry.
pub trait Candidate: Clone {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCategory {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    #[serde(default = "default_enabled")]
    pub enabled_by_default: bool,
}

const fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub maps: Vec<GameMap>,
}

impl MapScoped for Rule {
    fn maps(&self) -> &[GameMap] {
        &self.maps
    }
}

impl Candidate for Rule {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WinIcon {
    Kill,
    Tower,
    Cs,
    Gold,
    Time,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinCondition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: WinIcon,
    pub maps: Vec<GameMap>,
}

impl MapScoped for WinCondition {
    fn maps(&self) -> &[GameMap] {
        &self.maps
    }
}

impl Candidate for WinCondition {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog JSON is malformed: {0}")]
    Malformed(String),
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },
    #[error("rule '{rule}' references unknown category '{category}'")]
    UnknownCategory { rule: String, category: String },
    #[error("{kind} '{id}' is not playable on any map")]
    NoMaps { kind: &'static str, id: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RulesDocument {
    categories: Vec<RuleCategory>,
    rules: Vec<Rule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WinConditionsDocument {
    win_conditions: Vec<WinCondition>,
}

/// Immutable lookup tables consumed by the selection pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    categories: Vec<RuleCategory>,
    rules: Vec<Rule>,
    win_conditions: Vec<WinCondition>,
}

static BUILTIN: OnceLock<Catalog> = OnceLock::new();

impl Catalog {
    /// Build and validate a catalog from already-parsed parts.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate ids, dangling category references, or
    /// entries with an empty map list.
    pub fn new(
        categories: Vec<RuleCategory>,
        rules: Vec<Rule>,
        win_conditions: Vec<WinCondition>,
    ) -> Result<Self, CatalogError> {
        ensure_unique("category", categories.iter().map(|c| c.id.as_str()))?;
        ensure_unique("rule", rules.iter().map(|r| r.id.as_str()))?;
        ensure_unique("win condition", win_conditions.iter().map(|w| w.id.as_str()))?;

        for rule in &rules {
            if !categories.iter().any(|c| c.id == rule.category_id) {
                return Err(CatalogError::UnknownCategory {
                    rule: rule.id.clone(),
                    category: rule.category_id.clone(),
                });
            }
            if rule.maps.is_empty() {
                return Err(CatalogError::NoMaps {
                    kind: "rule",
                    id: rule.id.clone(),
                });
            }
        }
        if let Some(wc) = win_conditions.iter().find(|w| w.maps.is_empty()) {
            return Err(CatalogError::NoMaps {
                kind: "win condition",
                id: wc.id.clone(),
            });
        }

        Ok(Self {
            categories,
            rules,
            win_conditions,
        })
    }

    /// Load a catalog from the rules and win-condition JSON documents.
    ///
    /// # Errors
    ///
    /// Returns an error if either document fails to parse or validate.
    pub fn from_json(rules_json: &str, win_conditions_json: &str) -> Result<Self, CatalogError> {
        let rules: RulesDocument = serde_json::from_str(rules_json)
            .map_err(|e| CatalogError::Malformed(e.to_string()))?;
        let wins: WinConditionsDocument = serde_json::from_str(win_conditions_json)
            .map_err(|e| CatalogError::Malformed(e.to_string()))?;
        Self::new(rules.categories, rules.rules, wins.win_conditions)
    }

    /// The tables shipped with the crate, parsed once per process.
    ///
    /// # Panics
    ///
    /// Panics if the embedded assets are invalid, which the test suite rules out.
    #[must_use]
    pub fn builtin() -> &'static Self {
        BUILTIN.get_or_init(|| {
            Self::from_json(DEFAULT_RULES_DATA, DEFAULT_WIN_CONDITIONS_DATA)
                .expect("embedded catalog assets are valid")
        })
    }

    #[must_use]
    pub fn categories(&self) -> &[RuleCategory] {
        &self.categories
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn win_conditions(&self) -> &[WinCondition] {
        &self.win_conditions
    }

    #[must_use]
    pub fn category(&self, id: &str) -> Option<&RuleCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn win_condition(&self, id: &str) -> Option<&WinCondition> {
        self.win_conditions.iter().find(|w| w.id == id)
    }

    #[must_use]
    pub fn rule_count_by_category(&self, category_id: &str) -> usize {
        self.rules
            .iter()
            .filter(|r| r.category_id == category_id)
            .count()
    }

    /// Category ids enabled when a session starts.
    pub fn default_enabled_categories(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .filter(|c| c.enabled_by_default)
            .map(|c| c.id.as_str())
    }
}

fn ensure_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
