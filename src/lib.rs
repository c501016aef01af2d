//! # wiz-compiler
//!
//! Package compiler and build orchestrator for the wiz low-code platform.
//! A *package* is one authored page/component: metadata, an
//! indentation-based view template, a component script, a stylesheet and a
//! localized text dictionary, stored as files under the package's
//! directory.
//!
//! ## Update pipeline invariants
//!
//! 1. **Validate before writing**: payload shape and id format are checked
//!    first; a [`WizError::Validation`] aborts the update before any file
//!    is touched.
//! 2. **Derived entry module**: the generated component module is a pure
//!    function of `(title, template, script, style, id, properties.html)`
//!    and is regenerated on every update, never read back.
//! 3. **Timestamps**: `created` is stamped exactly once; `updated` on
//!    every successful update.
//! 4. **Isolated builds**: each update stages its entry and bundle in a
//!    per-package directory and publishes with atomic renames under a
//!    global lock, so concurrent updates never serve a mixed bundle.
//! 5. **Never crash the author's save**: dictionary lookups, a missing
//!    render marker and a missing layout body marker degrade softly;
//!    the latter two surface as structured [`Warning`]s instead of
//!    silence. A failed bundler run is a hard [`WizError::Build`] and
//!    leaves the previously published bundle in place.

mod build;
mod cache;
mod codegen;
mod config;
mod dictionary;
mod error;
mod registry;
mod store;
mod template;
mod validate;

pub use build::{
    patch_layout, BuildOrchestrator, BuildReport, LiveRebind, NoRebind, ThemeProvider, BODY_MARKER,
};
pub use cache::BuildCache;
pub use codegen::{generate, GeneratedModule, COMPONENT_PLACEHOLDER};
pub use config::WorkspaceConfig;
pub use dictionary::{LocalizedDictionary, DEFAULT_LOCALE};
pub use error::{
    Result, Warning, WizError, WARN_LAYOUT_MARKER_MISSING, WARN_RENDER_MARKER_MISSING,
    WARN_THEME_REF_MALFORMED,
};
pub use registry::{Package, PackageData, PackageRegistry, UpdateReport};
pub use store::{files, FsStore, PackageStore};
pub use template::compile as compile_template;
pub use validate::{validate, PackageMeta, UpdatePayload, ValidPayload, INDENTED_SENTINEL};
