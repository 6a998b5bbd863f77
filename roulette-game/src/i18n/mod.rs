//! Localization boundary: dotted-key lookups over JSON bundles with an
//! English fallback, plus localized rule and win-condition copy.
mod content;
mod render;

pub use content::{LocalizedContent, LocalizedFields, LocalizedText};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Variables substituted into `{name}` / `{{name}}` placeholders.
pub type Vars<'a> = BTreeMap<&'a str, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    pub const ALL: [Self; 2] = [Self::En, Self::Zh];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }

    /// Name of the language in that language.
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Zh => "中文",
        }
    }

    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        Self::ALL.into_iter().find(|l| l.code() == primary)
    }

    const fn bundle_source(self) -> &'static str {
        match self {
            Self::En => include_str!("../../i18n/en.json"),
            Self::Zh => include_str!("../../i18n/zh.json"),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn load_translations(locale: Locale) -> Value {
    serde_json::from_str(locale.bundle_source()).unwrap_or_else(|err| {
        log::warn!("translation bundle '{locale}' failed to parse: {err}");
        Value::Object(serde_json::Map::new())
    })
}

/// Translation lookups for one locale.
#[derive(Debug, Clone)]
pub struct Translator {
    locale: Locale,
    translations: Value,
    fallback: Value,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(Locale::En)
    }
}

impl Translator {
    #[must_use]
    pub fn new(locale: Locale) -> Self {
        let fallback = load_translations(Locale::En);
        let translations = if locale == Locale::En {
            fallback.clone()
        } else {
            load_translations(locale)
        };
        Self {
            locale,
            translations,
            fallback,
        }
    }

    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Translate a key without substitution.
    #[must_use]
    pub fn t(&self, key: &str) -> String {
        self.tr(key, None)
    }

    /// Translate a key, substituting `vars`. Resolution runs through the
    /// active locale, then English, then the key itself.
    #[must_use]
    pub fn tr(&self, key: &str, vars: Option<&Vars<'_>>) -> String {
        self.resolve(key, vars).unwrap_or_else(|| {
            log::trace!("missing translation for '{key}'");
            key.to_string()
        })
    }

    /// True if the key exists in the active locale or the fallback.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        render::get_nested_value(&self.translations, key).is_some()
            || render::get_nested_value(&self.fallback, key).is_some()
    }

    fn resolve(&self, key: &str, vars: Option<&Vars<'_>>) -> Option<String> {
        render::get_nested_value(&self.translations, key)
            .and_then(|v| render::render_value(v, self.locale, vars))
            .or_else(|| {
                render::get_nested_value(&self.fallback, key)
                    .and_then(|v| render::render_value(v, Locale::En, vars))
            })
    }
}
