//! Read/write-by-name access to one package's files.
//!
//! Every attribute of a package lives under its directory with a fixed
//! filename. The registry and build pipeline only ever go through the
//! [`PackageStore`] contract, so tests and alternative backends can swap
//! the filesystem out.

use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, WizError};

/// Fixed per-package filenames.
pub mod files {
    pub const METADATA: &str = "metadata.json";
    pub const VIEW: &str = "view.template";
    pub const SCRIPT: &str = "component.script";
    pub const STYLE: &str = "view.style";
    pub const DICTIONARY: &str = "dictionary.json";
    pub const API: &str = "api.script";
    pub const EVENT: &str = "event.script";
    /// Generated component module. Derived artifact, never a source of truth.
    pub const ENTRY: &str = "entry.module";
}

pub trait PackageStore {
    fn read(&self, name: &str) -> Result<String>;
    fn read_json(&self, name: &str) -> Result<Value>;
    fn write(&self, name: &str, content: &str) -> Result<()>;
    fn write_json(&self, name: &str, value: &Value) -> Result<()>;
    fn exists(&self, name: &str) -> bool;
    /// Remove the whole package directory.
    fn delete_all(&self) -> Result<()>;
}

/// Filesystem-backed store scoped to a single package directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl PackageStore for FsStore {
    fn read(&self, name: &str) -> Result<String> {
        let path = self.path(name);
        fs::read_to_string(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                WizError::NotFound(path.display().to_string())
            } else {
                WizError::Io(e)
            }
        })
    }

    fn read_json(&self, name: &str) -> Result<Value> {
        let raw = self.read(name)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write(&self, name: &str, content: &str) -> Result<()> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn write_json(&self, name: &str, value: &Value) -> Result<()> {
        self.write(name, &serde_json::to_string_pretty(value)?)
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    fn delete_all(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path().join("pkg"));
        match store.read(files::METADATA) {
            Err(WizError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path().join("pkg"));
        store
            .write_json(files::METADATA, &json!({"id": "demo.page"}))
            .unwrap();
        let value = store.read_json(files::METADATA).unwrap();
        assert_eq!(value["id"], "demo.page");
        assert!(store.exists(files::METADATA));
    }

    #[test]
    fn delete_all_removes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path().join("pkg"));
        store.write(files::VIEW, "div hello").unwrap();
        store.delete_all().unwrap();
        assert!(!store.exists(files::VIEW));
        // idempotent
        store.delete_all().unwrap();
    }
}
