//! User-controlled filters: enabled roles, enabled rule categories and map.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::{Catalog, GameMap};
use crate::roster::Role;

/// Filter preferences for one session.
///
/// The enabled role set is never empty: every mutation that would empty it
/// is rejected and leaves the state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    enabled_roles: BTreeSet<Role>,
    enabled_categories: BTreeSet<String>,
    selected_map: Option<GameMap>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::from_catalog(Catalog::builtin())
    }
}

impl FilterState {
    /// All roles, the catalog's default categories, no map.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            enabled_roles: Role::ALL.into_iter().collect(),
            enabled_categories: catalog
                .default_enabled_categories()
                .map(str::to_string)
                .collect(),
            selected_map: None,
        }
    }

    #[must_use]
    pub const fn enabled_roles(&self) -> &BTreeSet<Role> {
        &self.enabled_roles
    }

    #[must_use]
    pub fn role_enabled(&self, role: Role) -> bool {
        self.enabled_roles.contains(&role)
    }

    #[must_use]
    pub const fn enabled_categories(&self) -> &BTreeSet<String> {
        &self.enabled_categories
    }

    #[must_use]
    pub fn category_enabled(&self, id: &str) -> bool {
        self.enabled_categories.contains(id)
    }

    #[must_use]
    pub const fn selected_map(&self) -> Option<GameMap> {
        self.selected_map
    }

    /// Flip a role. Returns `false` when the toggle was rejected because it
    /// would leave no role enabled.
    pub fn toggle_role(&mut self, role: Role) -> bool {
        if self.enabled_roles.contains(&role) {
            if self.enabled_roles.len() == 1 {
                log::debug!("refusing to disable last enabled role {role}");
                return false;
            }
            self.enabled_roles.remove(&role);
        } else {
            self.enabled_roles.insert(role);
        }
        true
    }

    pub fn select_all_roles(&mut self) {
        self.enabled_roles = Role::ALL.into_iter().collect();
    }

    /// Collapse the role set to the default single role.
    pub fn reset_roles_to_single_default(&mut self) {
        self.enabled_roles = BTreeSet::from([Role::ALL[0]]);
    }

    /// Flip a category. Unknown ids are ignored; zero enabled categories is valid.
    pub fn toggle_category(&mut self, catalog: &Catalog, id: &str) {
        if catalog.category(id).is_none() {
            log::debug!("ignoring toggle of unknown category '{id}'");
            return;
        }
        if !self.enabled_categories.remove(id) {
            self.enabled_categories.insert(id.to_string());
        }
    }

    pub fn enable_all_categories(&mut self, catalog: &Catalog) {
        self.enabled_categories = catalog
            .categories()
            .iter()
            .map(|c| c.id.clone())
            .collect();
    }

    pub fn disable_all_categories(&mut self) {
        self.enabled_categories.clear();
    }

    /// Replace the selected map, returning the previous one.
    pub const fn set_map(&mut self, map: Option<GameMap>) -> Option<GameMap> {
        let previous = self.selected_map;
        self.selected_map = map;
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything_without_a_map() {
        let filters = FilterState::default();
        assert_eq!(filters.enabled_roles().len(), 6);
        assert_eq!(filters.enabled_categories().len(), 5);
        assert_eq!(filters.selected_map(), None);
    }

    #[test]
    fn last_role_cannot_be_disabled() {
        let mut filters = FilterState::default();
        filters.reset_roles_to_single_default();
        assert_eq!(
            filters.enabled_roles().iter().copied().collect::<Vec<_>>(),
            vec![Role::Fighter]
        );
        assert!(!filters.toggle_role(Role::Fighter));
        assert!(filters.role_enabled(Role::Fighter));

        assert!(filters.toggle_role(Role::Tank));
        assert!(filters.toggle_role(Role::Fighter));
        assert_eq!(
            filters.enabled_roles().iter().copied().collect::<Vec<_>>(),
            vec![Role::Tank]
        );
    }

    #[test]
    fn role_set_survives_every_toggle_sequence() {
        let mut filters = FilterState::default();
        for round in 0..48_usize {
            let role = Role::ALL[(round * 5 + round / 3) % Role::ALL.len()];
            filters.toggle_role(role);
            assert!(!filters.enabled_roles().is_empty());
        }
        filters.select_all_roles();
        assert_eq!(filters.enabled_roles().len(), Role::ALL.len());
    }

    #[test]
    fn categories_may_all_be_disabled() {
        let catalog = Catalog::builtin();
        let mut filters = FilterState::from_catalog(catalog);
        filters.toggle_category(catalog, "items");
        assert!(!filters.category_enabled("items"));
        filters.toggle_category(catalog, "items");
        assert!(filters.category_enabled("items"));
        filters.toggle_category(catalog, "runes");
        assert!(!filters.category_enabled("runes"));

        filters.disable_all_categories();
        assert!(filters.enabled_categories().is_empty());
        filters.enable_all_categories(catalog);
        assert_eq!(filters.enabled_categories().len(), 5);
    }

    #[test]
    fn set_map_returns_previous_selection() {
        let mut filters = FilterState::default();
        assert_eq!(filters.set_map(Some(GameMap::Aram)), None);
        assert_eq!(filters.set_map(None), Some(GameMap::Aram));
    }
}
