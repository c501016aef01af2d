//! Package registry.
//!
//! Enumerates the packages under the workspace's base path, hands out
//! per-package handles, and owns the process-wide full-data cache. The
//! update pipeline lives here: validate, compile the template, generate
//! the component module, persist the package files, orchestrate the build,
//! then refresh the cache entry.

use log::warn;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use walkdir::WalkDir;

use crate::build::{BuildOrchestrator, LiveRebind, ThemeProvider};
use crate::codegen;
use crate::config::WorkspaceConfig;
use crate::dictionary::LocalizedDictionary;
use crate::error::{Result, Warning, WizError};
use crate::store::{files, FsStore, PackageStore};
use crate::template;
use crate::validate::{self, PackageMeta, UpdatePayload};

/// Full data of one package. `view`/`script`/`style` and the companions
/// are empty strings for metadata-only reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageData {
    pub package: PackageMeta,
    pub view: String,
    pub script: String,
    pub style: String,
    pub api: String,
    pub socketio: String,
    pub dictionary: Value,
}

/// Outcome of a successful update: bundler output plus every soft failure
/// observed along the way.
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    pub stdout: String,
    pub skipped: bool,
    pub warnings: Vec<Warning>,
}

pub struct PackageRegistry {
    config: WorkspaceConfig,
    orchestrator: BuildOrchestrator,
    cache: RwLock<HashMap<String, Arc<PackageData>>>,
}

impl PackageRegistry {
    pub fn new(
        config: WorkspaceConfig,
        theme: Box<dyn ThemeProvider>,
        rebind: Box<dyn LiveRebind>,
    ) -> Self {
        let orchestrator = BuildOrchestrator::new(config.clone(), theme, rebind);
        PackageRegistry {
            config,
            orchestrator,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Metadata-only data for every package directory holding a metadata
    /// file, sorted ascending by id. Unreadable packages are logged and
    /// skipped.
    pub fn list(&self) -> Vec<PackageData> {
        let mut out = Vec::new();
        for entry in WalkDir::new(&self.config.packages_dir)
            .min_depth(1)
            .max_depth(1)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("package enumeration: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            let package = Package {
                registry: self,
                store: FsStore::new(entry.path()),
                id,
            };
            if !package.store.exists(files::METADATA) {
                continue;
            }
            match package.read_data(false) {
                Ok(data) => out.push(data),
                Err(e) => warn!("skipping package `{}`: {}", package.id, e),
            }
        }
        out.sort_by(|a, b| a.package.id.cmp(&b.package.id));
        out
    }

    /// A handle for `id`, or `None` for a `None` id. Never fails for an
    /// unknown id: the handle's reads fail at the point of use.
    pub fn load(&self, id: Option<&str>) -> Option<Package<'_>> {
        let id = id?;
        Some(Package {
            registry: self,
            store: FsStore::new(self.config.package_dir(id)),
            id: id.to_string(),
        })
    }

    /// Drop every in-memory full-data entry.
    pub fn invalidate(&self) {
        self.cache.write().clear();
    }

    /// Delete the served build artifacts and the build-skip cache, then
    /// drop the in-memory cache. Destructive and non-recoverable.
    pub fn clean(&self) -> Result<()> {
        self.orchestrator.clean()?;
        self.invalidate();
        Ok(())
    }

    #[cfg(test)]
    fn cached_ids(&self) -> Vec<String> {
        self.cache.read().keys().cloned().collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PACKAGE HANDLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Handle to one package. Owns only the file scope for its own id; never
/// mutates another package.
pub struct Package<'a> {
    registry: &'a PackageRegistry,
    store: FsStore,
    id: String,
}

impl<'a> Package<'a> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn store(&self) -> &FsStore {
        &self.store
    }

    /// Full (`code == true`, cached) or metadata-only (`code == false`,
    /// always fresh) package data.
    pub fn data(&self, code: bool) -> Result<Arc<PackageData>> {
        if code {
            if let Some(hit) = self.registry.cache.read().get(&self.id) {
                return Ok(hit.clone());
            }
        }
        let data = Arc::new(self.read_data(code)?);
        if code {
            self.registry
                .cache
                .write()
                .insert(self.id.clone(), data.clone());
        }
        Ok(data)
    }

    fn read_data(&self, code: bool) -> Result<PackageData> {
        let meta_value = self.store.read_json(files::METADATA).map_err(|e| match e {
            WizError::NotFound(_) => {
                WizError::NotFound(format!("package `{}` has no metadata file", self.id))
            }
            other => other,
        })?;
        let mut package: PackageMeta = serde_json::from_value(meta_value)?;
        // The directory name is authoritative for the id.
        package.id = self.id.clone();

        let mut data = PackageData {
            package,
            ..Default::default()
        };
        if code {
            data.view = self.store.read(files::VIEW).unwrap_or_default();
            data.script = self.store.read(files::SCRIPT).unwrap_or_default();
            data.style = self.store.read(files::STYLE).unwrap_or_default();
            data.api = self.store.read(files::API).unwrap_or_default();
            data.socketio = self.store.read(files::EVENT).unwrap_or_default();
            data.dictionary = self
                .store
                .read_json(files::DICTIONARY)
                .unwrap_or_else(|_| Value::Object(Default::default()));
        }
        Ok(data)
    }

    pub fn dictionary(&self) -> LocalizedDictionary {
        LocalizedDictionary::new(
            self.store
                .read_json(files::DICTIONARY)
                .unwrap_or_else(|_| Value::Object(Default::default())),
        )
    }

    /// Source for the external dynamic API loader; `None` when absent or
    /// empty. Loading/compiling it is outside this crate.
    pub fn api_script(&self) -> Option<String> {
        self.store
            .read(files::API)
            .ok()
            .filter(|s| !s.trim().is_empty())
    }

    /// Source for the external live-event loader; same boundary as
    /// [`Package::api_script`].
    pub fn event_script(&self) -> Option<String> {
        self.store
            .read(files::EVENT)
            .ok()
            .filter(|s| !s.trim().is_empty())
    }

    /// Validate, compile, persist and build one update.
    pub fn update(&self, mut payload: UpdatePayload) -> Result<UpdateReport> {
        // `created` is server-owned once set: recover it from disk when
        // the payload does not carry it, so it is stamped exactly once.
        if let Some(pkg) = payload.package.as_mut() {
            if pkg.created.is_none() {
                if let Ok(meta) = self.store.read_json(files::METADATA) {
                    pkg.created = meta
                        .get("created")
                        .and_then(Value::as_str)
                        .map(String::from);
                }
            }
        }

        let valid = validate::validate(payload)?;
        if valid.package.id != self.id {
            return Err(WizError::Validation(format!(
                "package id is immutable: payload says `{}`, package is `{}`",
                valid.package.id, self.id
            )));
        }

        let markup = template::compile(&valid.view, valid.package.uses_indented_syntax());
        let module = codegen::generate(
            &self.id,
            &valid.package.title,
            &valid.script,
            &markup,
            !valid.style.is_empty(),
        );
        let mut warnings = module.warnings.clone();

        self.store
            .write_json(files::METADATA, &serde_json::to_value(&valid.package)?)?;
        self.store.write_json(files::DICTIONARY, &valid.dictionary)?;
        self.store.write(files::VIEW, &valid.view)?;
        self.store.write(files::SCRIPT, &valid.script)?;
        self.store.write(files::STYLE, &valid.style)?;
        self.store.write(files::API, &valid.api)?;
        self.store.write(files::EVENT, &valid.socketio)?;
        self.store.write(files::ENTRY, &module.code)?;

        let report = self.registry.orchestrator.build(
            &self.id,
            &module.code,
            &valid.style,
            &valid.package.theme,
        )?;
        warnings.extend(report.warnings);

        // Refresh the cache entry in one shot so readers never observe a
        // half-updated package.
        let data = Arc::new(PackageData {
            package: valid.package,
            view: valid.view,
            script: valid.script,
            style: valid.style,
            api: valid.api,
            socketio: valid.socketio,
            dictionary: valid.dictionary,
        });
        self.registry.cache.write().insert(self.id.clone(), data);

        Ok(UpdateReport {
            stdout: report.stdout,
            skipped: report.skipped,
            warnings,
        })
    }

    /// Remove the package directory and evict its cache entry.
    pub fn delete(&self) -> Result<()> {
        self.store.delete_all()?;
        self.registry.cache.write().remove(&self.id);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
