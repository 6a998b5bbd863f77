//! Maps session state onto translation keys for the presentation layer.
use crate::i18n::{Translator, Vars};
use crate::session::SessionSnapshot;
use crate::slot::SlotStatus;

/// A translation key plus the variables it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub key: &'static str,
    pub vars: Vars<'static>,
}

impl Prompt {
    const fn bare(key: &'static str) -> Self {
        Self {
            key,
            vars: Vars::new(),
        }
    }

    fn with(key: &'static str, vars: impl IntoIterator<Item = (&'static str, String)>) -> Self {
        Self {
            key,
            vars: vars.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn render(&self, translator: &Translator) -> String {
        if self.vars.is_empty() {
            translator.t(self.key)
        } else {
            translator.tr(self.key, Some(&self.vars))
        }
    }
}

/// Line shown under the character spotlight.
#[must_use]
pub fn spotlight_prompt(snapshot: &SessionSnapshot) -> Prompt {
    let deck = &snapshot.characters;
    if deck.pool_size == 0 {
        return Prompt::bare("rollingStudio.champion.spotlight.noneAvailable");
    }
    if deck.status == SlotStatus::Spinning {
        let current = (deck.deck.len() + 1).min(deck.target);
        return Prompt::with(
            "rollingStudio.champion.spotlight.generating",
            [
                ("current", current.to_string()),
                ("total", deck.target.to_string()),
            ],
        );
    }
    if deck.target > 0 && deck.deck.len() == deck.target {
        return Prompt::bare("rollingStudio.champion.spotlight.deckReady");
    }
    Prompt::bare("rollingStudio.champion.spotlight.prompt")
}

/// Revealed cards over the deck target, e.g. `2/3`.
#[must_use]
pub fn deck_progress(snapshot: &SessionSnapshot) -> String {
    format!(
        "{}/{}",
        snapshot.characters.deck.len(),
        snapshot.characters.target
    )
}

/// Why the rule roll is unavailable, or `None` when it can roll.
#[must_use]
pub fn rule_availability(snapshot: &SessionSnapshot) -> Option<Prompt> {
    if snapshot.rule.pool_size > 0 {
        return None;
    }
    let key = if snapshot.filters.enabled_categories().is_empty() {
        "rollingStudio.rule.availability.noCategory"
    } else if snapshot.filters.selected_map().is_some() {
        "rollingStudio.rule.availability.noMap"
    } else {
        "rollingStudio.rule.availability.noCategory"
    };
    Some(Prompt::bare(key))
}

/// Why the win-condition roll is unavailable, or `None` when it can roll.
#[must_use]
pub fn win_availability(snapshot: &SessionSnapshot) -> Option<Prompt> {
    if snapshot.win_condition.pool_size > 0 {
        return None;
    }
    let key = if snapshot.filters.selected_map().is_some() {
        "rollingStudio.win.availability.noMap"
    } else {
        "rollingStudio.win.availability.empty"
    };
    Some(Prompt::bare(key))
}
