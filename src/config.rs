use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths and bundler settings for one workspace.
///
/// The bundler is invoked as `<bundler> run build <entry> <out>` with the
/// workspace root as its working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceConfig {
    /// Workspace root; the bundler's working directory.
    pub root_dir: PathBuf,
    /// Directory holding one subdirectory per package.
    pub packages_dir: PathBuf,
    /// Served build directory. Staging happens under `build/.stage/<id>`.
    pub build_dir: PathBuf,
    /// Directory for build-skip hash records.
    pub cache_dir: PathBuf,

    /// Bundler executable, e.g. `yarn`.
    pub bundler: String,
    /// Seconds to wait for the bundler before killing it.
    pub bundler_timeout_secs: u64,

    pub entry_name: String,
    pub bootstrap_name: String,
    pub bundle_js: String,
    pub bundle_css: String,
    pub bundle_html: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        WorkspaceConfig {
            root_dir: PathBuf::from("."),
            packages_dir: PathBuf::from("apps"),
            build_dir: PathBuf::from("build"),
            cache_dir: PathBuf::from(".wiz/cache"),
            bundler: "yarn".to_string(),
            bundler_timeout_secs: 120,
            entry_name: "app.entry.jsx".to_string(),
            bootstrap_name: "bootstrap.jsx".to_string(),
            bundle_js: "wiz.build.js".to_string(),
            bundle_css: "wiz.build.css".to_string(),
            bundle_html: "wiz.build.html".to_string(),
        }
    }
}

impl WorkspaceConfig {
    /// Config rooted at `root`, with the conventional layout underneath it.
    pub fn rooted(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        WorkspaceConfig {
            root_dir: root.to_path_buf(),
            packages_dir: root.join("apps"),
            build_dir: root.join("build"),
            cache_dir: root.join(".wiz/cache"),
            ..Default::default()
        }
    }

    pub fn package_dir(&self, id: &str) -> PathBuf {
        self.packages_dir.join(id)
    }

    pub fn staging_dir(&self, id: &str) -> PathBuf {
        self.build_dir.join(".stage").join(id)
    }

    /// URL path the served layout uses to reference a build asset.
    pub fn asset_href(&self, name: &str) -> String {
        format!("/build/{}", name)
    }
}
