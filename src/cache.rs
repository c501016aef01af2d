//! Build-skip cache.
//!
//! The served bundle path is global, so the freshness record is too: one
//! `published.json` holding the package id and module hash that produced
//! the currently published bundle. A bundler run may only be skipped when
//! the same package resubmits the same module *and* its build is still
//! the one being served; any other package's publish invalidates the
//! record by overwriting it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize)]
struct PublishedRecord {
    id: String,
    hash: String,
}

pub struct BuildCache {
    cache_dir: PathBuf,
}

impl BuildCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).ok();
        }
        BuildCache { cache_dir }
    }

    pub fn compute_hash(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn record_path(&self) -> PathBuf {
        self.cache_dir.join("published.json")
    }

    /// True when the currently published bundle was produced by `id` from
    /// exactly this `source`.
    pub fn is_fresh(&self, id: &str, source: &str) -> bool {
        let path = self.record_path();
        let data = match fs::read_to_string(&path) {
            Ok(d) => d,
            Err(_) => return false,
        };
        let record: PublishedRecord = match serde_json::from_str(&data) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("corrupt published-bundle record: {}", e);
                fs::remove_file(path).ok();
                return false;
            }
        };
        record.id == id && record.hash == Self::compute_hash(source)
    }

    /// Record `id`/`source` as the producer of the published bundle,
    /// replacing whatever package published before.
    pub fn record(&self, id: &str, source: &str) {
        let record = PublishedRecord {
            id: id.to_string(),
            hash: Self::compute_hash(source),
        };
        if let Ok(data) = serde_json::to_string(&record) {
            fs::create_dir_all(&self.cache_dir).ok();
            fs::write(self.record_path(), data).ok();
        }
    }

    pub fn clear(&self) {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir).ok();
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}
