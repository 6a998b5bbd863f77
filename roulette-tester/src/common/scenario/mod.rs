use anyhow::Result;

use crate::logic::TesterAssets;

mod checks;

/// One seeded session walk and the expectations it asserts.
pub type ScenarioCheck = fn(&TesterAssets, u64) -> Result<()>;

#[derive(Debug, Clone, Copy)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub check: ScenarioCheck,
}

impl TestScenario {
    const fn new(key: &'static str, name: &'static str, check: ScenarioCheck) -> Self {
        Self { key, name, check }
    }

    /// # Errors
    ///
    /// Returns the first failed expectation.
    pub fn run(&self, assets: &TesterAssets, seed: u64) -> Result<()> {
        (self.check)(assets, seed)
    }
}

const SCENARIOS: &[TestScenario] = &[
    TestScenario::new(
        "deck-uniqueness",
        "Deck Draws Without Replacement",
        checks::deck_uniqueness,
    ),
    TestScenario::new("deck-clamp", "Deck Clamps To Pool", checks::deck_clamp),
    TestScenario::new(
        "cancellation",
        "Reroll Supersedes Pending Spin",
        checks::cancellation,
    ),
    TestScenario::new(
        "map-reconcile",
        "Map Switch Reconciliation",
        checks::map_reconcile,
    ),
    TestScenario::new(
        "roll-all-order",
        "Roll All Stage Ordering",
        checks::roll_all_order,
    ),
    TestScenario::new(
        "reset-idempotent",
        "Reset Is Idempotent",
        checks::reset_idempotent,
    ),
    TestScenario::new("empty-pools", "Empty Pool Handling", checks::empty_pools),
    TestScenario::new(
        "role-invariant",
        "At Least One Role Enabled",
        checks::role_invariant,
    ),
    TestScenario::new("end-to-end", "Default Session Walkthrough", checks::end_to_end),
];

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = name.to_lowercase();
    let key = match key.as_str() {
        "smoke" | "e2e" => "end-to-end",
        "deck" => "deck-uniqueness",
        "clamp" => "deck-clamp",
        "cancel" | "reroll" => "cancellation",
        "map" => "map-reconcile",
        "roll-all" | "queue" => "roll-all-order",
        "reset" => "reset-idempotent",
        "empty" => "empty-pools",
        "roles" => "role-invariant",
        other => other,
    };
    SCENARIOS.iter().find(|s| s.key == key).copied()
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS.iter().map(|s| (s.key, s.name)).collect()
}

pub fn all_scenario_keys() -> impl Iterator<Item = &'static str> {
    SCENARIOS.iter().map(|s| s.key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, name) in list_scenarios() {
            let scenario = get_scenario(key).unwrap();
            assert_eq!(scenario.name, name);
        }
        assert_eq!(list_scenarios().len(), 9);
    }

    #[test]
    fn aliases_and_case_are_accepted() {
        assert_eq!(get_scenario("SMOKE").map(|s| s.key), Some("end-to-end"));
        assert_eq!(get_scenario("reroll").map(|s| s.key), Some("cancellation"));
        assert!(get_scenario("nope").is_none());
    }
}
