//! Eligible candidate sets derived from the roster, catalog and filters.
use serde::Serialize;

use crate::catalog::{Catalog, MapScoped, Rule, WinCondition};
use crate::filters::FilterState;
use crate::roster::Character;

/// Snapshot of the three selection pools for one filter state.
///
/// Empty pools are valid; callers check `is_empty` rather than handling errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPools {
    pub characters: Vec<Character>,
    pub rules: Vec<Rule>,
    pub win_conditions: Vec<WinCondition>,
}

impl SelectionPools {
    #[must_use]
    pub fn derive(roster: &[Character], catalog: &Catalog, filters: &FilterState) -> Self {
        Self {
            characters: eligible_characters(roster, filters),
            rules: eligible_rules(catalog, filters),
            win_conditions: eligible_win_conditions(catalog, filters),
        }
    }

    /// True when every domain can be rolled.
    #[must_use]
    pub fn all_available(&self) -> bool {
        !self.characters.is_empty() && !self.rules.is_empty() && !self.win_conditions.is_empty()
    }
}

#[must_use]
pub fn eligible_characters(roster: &[Character], filters: &FilterState) -> Vec<Character> {
    roster
        .iter()
        .filter(|c| filters.role_enabled(c.role))
        .cloned()
        .collect()
}

#[must_use]
pub fn eligible_rules(catalog: &Catalog, filters: &FilterState) -> Vec<Rule> {
    catalog
        .rules()
        .iter()
        .filter(|r| filters.category_enabled(&r.category_id) && r.applies_to(filters.selected_map()))
        .cloned()
        .collect()
}

#[must_use]
pub fn eligible_win_conditions(catalog: &Catalog, filters: &FilterState) -> Vec<WinCondition> {
    catalog
        .win_conditions()
        .iter()
        .filter(|w| w.applies_to(filters.selected_map()))
        .cloned()
        .collect()
}

/// Aggregate counts shown in the stats bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub eligible_characters: usize,
    pub enabled_roles: usize,
    pub enabled_categories: usize,
    pub eligible_rules: usize,
    pub eligible_win_conditions: usize,
    pub total_win_conditions: usize,
}

impl PoolStats {
    #[must_use]
    pub fn collect(pools: &SelectionPools, filters: &FilterState, catalog: &Catalog) -> Self {
        Self {
            eligible_characters: pools.characters.len(),
            enabled_roles: filters.enabled_roles().len(),
            enabled_categories: filters.enabled_categories().len(),
            eligible_rules: pools.rules.len(),
            eligible_win_conditions: pools.win_conditions.len(),
            total_win_conditions: catalog.win_conditions().len(),
        }
    }
}
