//! Locale-resolved text dictionary.
//!
//! `dictionary.json` maps a lowercase locale to a nested key/text tree,
//! with an optional `default` locale. Lookups are soft-fail by contract:
//! UI text resolution returns an empty result rather than erroring, so a
//! missing translation never breaks a page render.

use serde_json::{Map, Value};

pub const DEFAULT_LOCALE: &str = "default";

#[derive(Debug, Clone, Default)]
pub struct LocalizedDictionary {
    data: Value,
}

impl LocalizedDictionary {
    /// Non-object values degrade to an empty dictionary.
    pub fn new(data: Value) -> Self {
        let data = if data.is_object() {
            data
        } else {
            Value::Object(Map::new())
        };
        LocalizedDictionary { data }
    }

    /// The sub-dictionary for `locale` (lowercased), falling back to the
    /// `default` locale, then to an empty object.
    pub fn resolve(&self, locale: &str) -> Map<String, Value> {
        let locale = locale.to_lowercase();
        let section = self
            .data
            .get(&locale)
            .or_else(|| self.data.get(DEFAULT_LOCALE));
        match section {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }

    /// Walk `key` (split on `.`) through the resolved sub-dictionary.
    /// Returns `""` the instant any segment is missing.
    pub fn text(&self, locale: &str, key: &str) -> String {
        let locale = locale.to_lowercase();
        let mut current = match self
            .data
            .get(&locale)
            .or_else(|| self.data.get(DEFAULT_LOCALE))
        {
            Some(section) => section,
            None => return String::new(),
        };

        for segment in key.split('.') {
            current = match current.get(segment) {
                Some(value) => value,
                None => return String::new(),
            };
        }

        match current {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dictionary() -> LocalizedDictionary {
        LocalizedDictionary::new(json!({
            "en": { "nav": { "home": "Home", "about": "About" } },
            "ko": { "nav": { "home": "홈" } },
            "default": { "nav": { "home": "Start" } }
        }))
    }

    #[test]
    fn exact_locale_wins() {
        let dic = dictionary();
        assert_eq!(dic.text("ko", "nav.home"), "홈");
        assert_eq!(dic.text("EN", "nav.home"), "Home");
    }

    #[test]
    fn unknown_locale_falls_back_to_default() {
        let dic = dictionary();
        assert_eq!(dic.text("fr", "nav.home"), "Start");
        assert!(dic.resolve("fr").contains_key("nav"));
    }

    #[test]
    fn no_locale_no_default_is_empty() {
        let dic = LocalizedDictionary::new(json!({ "en": {} }));
        assert!(dic.resolve("fr").is_empty());
        assert_eq!(dic.text("fr", "anything.at.all"), "");
    }

    #[test]
    fn missing_segment_is_empty_string() {
        let dic = dictionary();
        assert_eq!(dic.text("en", "nav.missing"), "");
        assert_eq!(dic.text("en", "nav.home.deeper"), "");
    }

    #[test]
    fn non_object_data_degrades_to_empty() {
        let dic = LocalizedDictionary::new(json!("oops"));
        assert!(dic.resolve("en").is_empty());
        assert_eq!(dic.text("en", "k"), "");
    }
}
