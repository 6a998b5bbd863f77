use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::Locale;
use crate::catalog::{Rule, WinCondition};

const DEFAULT_LOCALIZED_CONTENT: &str = include_str!("../../assets/data/localized_content.json");

/// Optional per-locale overrides for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Fully resolved display copy; every field is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalizedText<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocaleTables {
    #[serde(default)]
    rules: HashMap<String, LocalizedFields>,
    #[serde(default)]
    win_conditions: HashMap<String, LocalizedFields>,
}

/// Entity id to localized copy, per locale. The catalog's own English text
/// is the base of every fallback chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LocalizedContent {
    locales: HashMap<Locale, LocaleTables>,
}

static BUILTIN: OnceLock<LocalizedContent> = OnceLock::new();

impl LocalizedContent {
    /// # Errors
    ///
    /// Returns an error if the document is not valid content JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Shipped translations; an unreadable asset degrades to English only.
    #[must_use]
    pub fn builtin() -> &'static Self {
        BUILTIN.get_or_init(|| {
            Self::from_json(DEFAULT_LOCALIZED_CONTENT).unwrap_or_else(|err| {
                log::warn!("localized content failed to parse: {err}");
                Self::default()
            })
        })
    }

    #[must_use]
    pub fn rule_fields(&self, locale: Locale, id: &str) -> Option<&LocalizedFields> {
        self.locales.get(&locale)?.rules.get(id)
    }

    #[must_use]
    pub fn win_condition_fields(&self, locale: Locale, id: &str) -> Option<&LocalizedFields> {
        self.locales.get(&locale)?.win_conditions.get(id)
    }

    #[must_use]
    pub fn rule<'a>(&'a self, rule: &'a Rule, locale: Locale) -> LocalizedText<'a> {
        resolve(
            self.rule_fields(locale, &rule.id),
            self.rule_fields(Locale::En, &rule.id),
            &rule.name,
            &rule.description,
        )
    }

    #[must_use]
    pub fn win_condition<'a>(&'a self, win: &'a WinCondition, locale: Locale) -> LocalizedText<'a> {
        resolve(
            self.win_condition_fields(locale, &win.id),
            self.win_condition_fields(Locale::En, &win.id),
            &win.name,
            &win.description,
        )
    }
}

fn resolve<'a>(
    localized: Option<&'a LocalizedFields>,
    english: Option<&'a LocalizedFields>,
    base_name: &'a str,
    base_description: &'a str,
) -> LocalizedText<'a> {
    let pick = |field: fn(&LocalizedFields) -> Option<&String>, base: &'a str| -> &'a str {
        localized
            .and_then(field)
            .or_else(|| english.and_then(field))
            .map_or(base, String::as_str)
    };
    LocalizedText {
        name: pick(|f| f.name.as_ref(), base_name),
        description: pick(|f| f.description.as_ref(), base_description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn shipped_chinese_covers_every_entity() {
        let content = LocalizedContent::builtin();
        let catalog = Catalog::builtin();
        for rule in catalog.rules() {
            assert!(content.rule_fields(Locale::Zh, &rule.id).is_some(), "{}", rule.id);
        }
        for win in catalog.win_conditions() {
            assert!(
                content.win_condition_fields(Locale::Zh, &win.id).is_some(),
                "{}",
                win.id
            );
        }
    }

    #[test]
    fn english_uses_catalog_text() {
        let catalog = Catalog::builtin();
        let rule = catalog.rule("ss-1").unwrap();
        let text = LocalizedContent::builtin().rule(rule, Locale::En);
        assert_eq!(text.name, rule.name);
        assert_eq!(text.description, rule.description);
    }

    #[test]
    fn missing_fields_fall_back_to_base_text() {
        let content = LocalizedContent::from_json(
            r#"{"zh":{"winConditions":{"wc-first-blood":{"name":"一血"}}}}"#,
        )
        .unwrap();
        let win = Catalog::builtin().win_condition("wc-first-blood").unwrap();
        let text = content.win_condition(win, Locale::Zh);
        assert_eq!(text.name, "一血");
        assert_eq!(text.description, win.description);

        let other = Catalog::builtin().win_condition("wc-inhibitor").unwrap();
        assert_eq!(content.win_condition(other, Locale::Zh).name, other.name);
    }
}
