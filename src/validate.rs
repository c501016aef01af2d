//! Update-payload validation.
//!
//! Runs before anything is written: shape checks first, then the id format,
//! then timestamp stamping. The first violation wins and is returned as a
//! [`WizError::Validation`] naming the offending field.

use chrono::Local;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WizError};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sentinel in `properties.html` selecting the indentation-based template
/// grammar. Any other explicit value means the view is already markup.
pub const INDENTED_SENTINEL: &str = "template";

lazy_static! {
    static ref ID_RE: Regex = Regex::new(r"^[a-z0-9.]+$").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAYLOAD TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageMeta {
    pub id: String,
    pub title: String,
    pub category: String,
    pub theme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    pub properties: serde_json::Map<String, Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl PackageMeta {
    /// Whether the view source uses the indentation-based grammar.
    /// Defaults to true when `properties.html` is absent.
    pub fn uses_indented_syntax(&self) -> bool {
        match self.properties.get("html").and_then(Value::as_str) {
            Some(value) => value == INDENTED_SENTINEL,
            None => true,
        }
    }
}

/// Inbound update payload. Every field arrives as an optional so the
/// validator can name whichever one is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePayload {
    pub package: Option<PackageMeta>,
    pub view: Option<String>,
    pub script: Option<String>,
    pub style: Option<String>,
    pub dictionary: Option<Value>,
    pub api: Option<String>,
    pub socketio: Option<String>,
}

/// A payload that passed validation, with timestamps stamped and the
/// conditional fields defaulted for non-page categories.
#[derive(Debug, Clone)]
pub struct ValidPayload {
    pub package: PackageMeta,
    pub view: String,
    pub script: String,
    pub style: String,
    pub dictionary: Value,
    pub api: String,
    pub socketio: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

fn missing(field: &str) -> WizError {
    WizError::Validation(format!("`{}` not defined", field))
}

pub fn validate(payload: UpdatePayload) -> Result<ValidPayload> {
    let mut package = payload.package.ok_or_else(|| missing("package"))?;
    let view = payload.view.ok_or_else(|| missing("view"))?;
    let script = payload.script.ok_or_else(|| missing("script"))?;
    let style = payload.style.ok_or_else(|| missing("style"))?;

    // Pages ship their dictionary and server-side companions with every
    // update; for other categories they are optional.
    let (dictionary, api, socketio) = if package.category == "page" {
        (
            payload.dictionary.ok_or_else(|| missing("dictionary"))?,
            payload.api.ok_or_else(|| missing("api"))?,
            payload.socketio.ok_or_else(|| missing("socketio"))?,
        )
    } else {
        (
            payload
                .dictionary
                .unwrap_or_else(|| Value::Object(Default::default())),
            payload.api.unwrap_or_default(),
            payload.socketio.unwrap_or_default(),
        )
    };

    if package.id.is_empty() {
        return Err(missing("package.id"));
    }
    if package.id.len() < 3 {
        return Err(WizError::Validation("id length at least 3".to_string()));
    }
    if !ID_RE.is_match(&package.id) {
        return Err(WizError::Validation(
            "only lowercase letters, digits and . allowed in package id".to_string(),
        ));
    }

    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    if package.created.is_none() {
        package.created = Some(timestamp.clone());
    }
    package.updated = Some(timestamp);

    Ok(ValidPayload {
        package,
        view,
        script,
        style,
        dictionary,
        api,
        socketio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(category: &str) -> UpdatePayload {
        UpdatePayload {
            package: Some(PackageMeta {
                id: "demo.page".to_string(),
                title: "Demo".to_string(),
                category: category.to_string(),
                theme: "base/main".to_string(),
                ..Default::default()
            }),
            view: Some("div hello".to_string()),
            script: Some("return WizComponent;".to_string()),
            style: Some(String::new()),
            dictionary: None,
            api: None,
            socketio: None,
        }
    }

    fn err_message(payload: UpdatePayload) -> String {
        match validate(payload) {
            Err(WizError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn missing_required_field_is_named() {
        let mut p = payload("component");
        p.view = None;
        assert_eq!(err_message(p), "`view` not defined");
    }

    #[test]
    fn page_requires_dictionary_api_socketio() {
        let p = payload("page");
        assert_eq!(err_message(p), "`dictionary` not defined");

        let mut p = payload("page");
        p.dictionary = Some(json!({}));
        p.api = Some(String::new());
        assert_eq!(err_message(p), "`socketio` not defined");
    }

    #[test]
    fn component_category_does_not_require_page_fields() {
        let valid = validate(payload("component")).unwrap();
        assert_eq!(valid.api, "");
        assert!(valid.dictionary.is_object());
    }

    #[test]
    fn id_format_rules() {
        let mut p = payload("component");
        p.package.as_mut().unwrap().id = "ab".to_string();
        assert_eq!(err_message(p), "id length at least 3");

        let mut p = payload("component");
        p.package.as_mut().unwrap().id = "Demo.Page".to_string();
        assert!(err_message(p).contains("only lowercase"));

        let mut p = payload("component");
        p.package.as_mut().unwrap().id = "a.b9".to_string();
        assert!(validate(p).is_ok());
    }

    #[test]
    fn timestamps_are_stamped() {
        let valid = validate(payload("component")).unwrap();
        assert!(valid.package.created.is_some());
        assert!(valid.package.updated.is_some());

        // created survives, updated is restamped
        let mut again = payload("component");
        again.package.as_mut().unwrap().created = Some("2001-01-01 00:00:00".to_string());
        let valid = validate(again).unwrap();
        assert_eq!(valid.package.created.as_deref(), Some("2001-01-01 00:00:00"));
        assert_ne!(valid.package.updated.as_deref(), Some("2001-01-01 00:00:00"));
    }

    #[test]
    fn indented_syntax_sentinel() {
        let mut meta = PackageMeta::default();
        assert!(meta.uses_indented_syntax());
        meta.properties.insert("html".to_string(), json!("markup"));
        assert!(!meta.uses_indented_syntax());
        meta.properties
            .insert("html".to_string(), json!(INDENTED_SENTINEL));
        assert!(meta.uses_indented_syntax());
    }
}
