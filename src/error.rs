use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// WARNING CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const WARN_RENDER_MARKER_MISSING: &str = "render-marker-missing";
pub const WARN_LAYOUT_MARKER_MISSING: &str = "layout-marker-missing";
pub const WARN_THEME_REF_MALFORMED: &str = "theme-ref-malformed";

/// A non-fatal problem observed while compiling or building a package.
///
/// Soft failures never abort an author's save; they are collected and
/// returned alongside the result so callers can surface them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub code: String,
    pub message: String,
}

impl Warning {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Warning {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR TAXONOMY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum WizError {
    /// Update payload shape or id-format violation. Raised before any write.
    #[error("{0}")]
    Validation(String),

    /// The package (or one of its required files) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The external bundler exited abnormally or timed out.
    #[error("build failed ({status}): {output}")]
    Build { status: String, output: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WizError>;
