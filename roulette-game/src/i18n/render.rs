use serde_json::Value;

use super::{Locale, Vars};

pub(super) fn get_nested_value<'a>(obj: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(obj, |current, k| current.get(k))
}

fn plural_category(locale: Locale, count: f64) -> &'static str {
    match locale {
        // Chinese has no grammatical plural.
        Locale::Zh => "other",
        Locale::En => {
            if (count - 1.0).abs() < f64::EPSILON {
                "one"
            } else if count.abs() < f64::EPSILON {
                "zero"
            } else {
                "other"
            }
        }
    }
}

pub(super) fn render_value(value: &Value, locale: Locale, vars: Option<&Vars<'_>>) -> Option<String> {
    let mut text = match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            let count = vars
                .and_then(|m| m.get("count"))
                .and_then(|c| c.parse::<f64>().ok());
            let chosen = count
                .and_then(|count| map.get(plural_category(locale, count)))
                .or_else(|| map.get("other").filter(|_| count.is_some()))
                .or_else(|| map.get("_"))
                .and_then(Value::as_str)?;
            chosen.to_string()
        }
        _ => return None,
    };

    if let Some(vars) = vars {
        for (k, v) in vars {
            let double = format!("{{{{{k}}}}}");
            let single = format!("{{{k}}}");
            text = text.replace(&double, v);
            text = text.replace(&single, v);
        }
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plural_selection_defaults() {
        let value = json!({"one": "one cat", "other": "{count} cats", "_": "cats"});
        let mut vars = Vars::new();
        vars.insert("count", "1".into());
        assert_eq!(
            render_value(&value, Locale::En, Some(&vars)).unwrap(),
            "one cat"
        );
        vars.insert("count", "3".into());
        assert_eq!(
            render_value(&value, Locale::En, Some(&vars)).unwrap(),
            "3 cats"
        );
        // "zero" is absent, so other wins
        vars.insert("count", "0".into());
        assert_eq!(
            render_value(&value, Locale::En, Some(&vars)).unwrap(),
            "0 cats"
        );
        assert_eq!(render_value(&value, Locale::En, None).unwrap(), "cats");
    }

    #[test]
    fn interpolation_handles_braced_forms_and_keeps_unknowns() {
        let value = Value::String("Hello, {name}! {{name}}! {other}".into());
        let mut vars = Vars::new();
        vars.insert("name", "Tester".into());
        assert_eq!(
            render_value(&value, Locale::En, Some(&vars)).unwrap(),
            "Hello, Tester! Tester! {other}"
        );
    }

    #[test]
    fn nested_lookup_walks_dotted_keys() {
        let value = json!({"a": {"b": {"c": "deep"}}});
        assert_eq!(
            get_nested_value(&value, "a.b.c").and_then(Value::as_str),
            Some("deep")
        );
        assert!(get_nested_value(&value, "a.x").is_none());
    }
}
