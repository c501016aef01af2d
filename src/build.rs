//! Build orchestration.
//!
//! Turns one package's generated module into the served bundle: write the
//! entry, bootstrap and stylesheet into a per-update staging directory,
//! run the external bundler against them, atomically publish the outputs,
//! then patch the theme's layout document with asset-reference tags.
//!
//! Staging directories are per package id and publishing happens under a
//! global lock via atomic renames, so concurrent updates of different
//! packages never interleave half-written bundles into the served
//! directory. The bundler subprocess runs with an explicit timeout; an
//! abnormal exit surfaces as [`WizError::Build`] and nothing is published,
//! leaving the previously served bundle intact.

use log::{debug, warn};
use parking_lot::Mutex;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::cache::BuildCache;
use crate::config::WorkspaceConfig;
use crate::error::{
    Result, Warning, WizError, WARN_LAYOUT_MARKER_MISSING, WARN_THEME_REF_MALFORMED,
};
use crate::store::files;

/// Literal insertion point for asset tags in the layout document. The
/// patch is a substring match, not DOM-aware, by contract.
pub const BODY_MARKER: &str = "</body>";

/// Fixed bootstrap module mounting the application root. Built alongside
/// every package's entry so the bundle is self-contained.
const BOOTSTRAP: &str = r##"import React from "react";
import ReactDOM from "react-dom/client";
import Router from "WizRouter";
import { RecoilRoot } from "recoil";

const App = () => {
    return (
        <RecoilRoot>
            <Router />
        </RecoilRoot>
    );
};

ReactDOM.createRoot(document.querySelector("#root")).render(<App />);
"##;

// ═══════════════════════════════════════════════════════════════════════════════
// COLLABORATORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Theme-rendering collaborator: returns the base layout document for a
/// `themeId` / `layoutId` pair.
pub trait ThemeProvider: Send + Sync {
    fn layout_html(&self, theme: &str, layout: &str) -> Result<String>;
}

/// Live-connection collaborator, notified after a successful build so
/// server-side bindings can pick up the changed frontend.
pub trait LiveRebind: Send + Sync {
    fn rebind(&self);
}

/// No-op rebind for deployments without live connections.
pub struct NoRebind;

impl LiveRebind for NoRebind {
    fn rebind(&self) {}
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORCHESTRATOR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Captured bundler stdout+stderr, trimmed. Empty when skipped.
    pub stdout: String,
    /// True when the published bundle already came from this package's
    /// unchanged module and the bundler run was skipped.
    pub skipped: bool,
    pub warnings: Vec<Warning>,
}

pub struct BuildOrchestrator {
    config: WorkspaceConfig,
    cache: BuildCache,
    theme: Box<dyn ThemeProvider>,
    rebind: Box<dyn LiveRebind>,
    publish_lock: Mutex<()>,
}

impl BuildOrchestrator {
    pub fn new(
        config: WorkspaceConfig,
        theme: Box<dyn ThemeProvider>,
        rebind: Box<dyn LiveRebind>,
    ) -> Self {
        let cache = BuildCache::new(&config.cache_dir);
        BuildOrchestrator {
            config,
            cache,
            theme,
            rebind,
            publish_lock: Mutex::new(()),
        }
    }

    /// Build and publish the bundle for one package's generated module.
    pub fn build(&self, id: &str, module: &str, style: &str, theme_ref: &str) -> Result<BuildReport> {
        let staging = self.config.staging_dir(id);
        let result = self.run_pipeline(id, module, style, theme_ref, &staging);
        // A failed build must not leave its staged entry behind.
        fs::remove_dir_all(&staging).ok();
        result
    }

    fn run_pipeline(
        &self,
        id: &str,
        module: &str,
        style: &str,
        theme_ref: &str,
        staging: &Path,
    ) -> Result<BuildReport> {
        let mut warnings = Vec::new();

        fs::create_dir_all(staging)?;
        let entry_path = staging.join(&self.config.entry_name);
        fs::write(&entry_path, module)?;
        fs::write(staging.join(&self.config.bootstrap_name), BOOTSTRAP)?;
        // The generated module imports its stylesheet as a sibling file.
        fs::write(staging.join(files::STYLE), style)?;

        // The served bundle is global: skip only when it was produced by
        // this package from exactly this module.
        let published_js = self.config.build_dir.join(&self.config.bundle_js);
        let skipped = self.cache.is_fresh(id, module) && published_js.exists();

        let stdout = if skipped {
            debug!("published bundle for `{}` is current; skipping bundler", id);
            String::new()
        } else {
            let out_path = staging.join(&self.config.bundle_js);
            let output = self.run_bundler(&entry_path, &out_path)?;
            self.publish(staging)?;
            self.cache.record(id, module);
            output
        };

        self.patch_and_publish_layout(theme_ref, &mut warnings)?;
        self.rebind.rebind();

        Ok(BuildReport {
            stdout,
            skipped,
            warnings,
        })
    }

    /// Remove the served build directory and the build-skip cache.
    /// Destructive and non-recoverable.
    pub fn clean(&self) -> Result<()> {
        let _guard = self.publish_lock.lock();
        if self.config.build_dir.exists() {
            fs::remove_dir_all(&self.config.build_dir)?;
        }
        self.cache.clear();
        Ok(())
    }

    fn run_bundler(&self, entry: &Path, out: &Path) -> Result<String> {
        let mut child = Command::new(&self.config.bundler)
            .arg("run")
            .arg("build")
            .arg(entry)
            .arg(out)
            .current_dir(&self.config.root_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes off-thread so a chatty bundler cannot block on
        // a full pipe buffer while we poll for exit.
        let mut stdout_pipe = child.stdout.take().expect("stdout was piped");
        let mut stderr_pipe = child.stderr.take().expect("stderr was piped");
        let stdout_reader = thread::spawn(move || {
            let mut buf = String::new();
            stdout_pipe.read_to_string(&mut buf).ok();
            buf
        });
        let stderr_reader = thread::spawn(move || {
            let mut buf = String::new();
            stderr_pipe.read_to_string(&mut buf).ok();
            buf
        });

        let deadline = Instant::now() + Duration::from_secs(self.config.bundler_timeout_secs);
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    child.kill().ok();
                    child.wait().ok();
                    let output = Self::join_output(stdout_reader, stderr_reader);
                    return Err(WizError::Build {
                        status: "timeout".to_string(),
                        output,
                    });
                }
                None => thread::sleep(Duration::from_millis(50)),
            }
        };

        let output = Self::join_output(stdout_reader, stderr_reader);
        if !status.success() {
            return Err(WizError::Build {
                status: status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                output,
            });
        }
        Ok(output)
    }

    fn join_output(
        stdout_reader: thread::JoinHandle<String>,
        stderr_reader: thread::JoinHandle<String>,
    ) -> String {
        let mut output = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();
        if !stderr.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&stderr);
        }
        output.trim().to_string()
    }

    /// Move staged bundle outputs into the served directory. Renames under
    /// the publish lock keep the swap atomic for readers.
    fn publish(&self, staging: &Path) -> Result<()> {
        let _guard = self.publish_lock.lock();
        fs::create_dir_all(&self.config.build_dir)?;
        for name in [&self.config.bundle_js, &self.config.bundle_css] {
            let staged = staging.join(name);
            if staged.exists() {
                fs::rename(&staged, self.config.build_dir.join(name))?;
            }
        }
        Ok(())
    }

    fn patch_and_publish_layout(
        &self,
        theme_ref: &str,
        warnings: &mut Vec<Warning>,
    ) -> Result<()> {
        let (theme, layout) = match theme_ref.split_once('/') {
            Some(pair) => pair,
            None => {
                let warning = Warning::new(
                    WARN_THEME_REF_MALFORMED,
                    format!(
                        "theme reference `{}` is not `themeId/layoutId`; layout was not patched",
                        theme_ref
                    ),
                );
                warn!("{}", warning.message);
                warnings.push(warning);
                return Ok(());
            }
        };

        let html = self.theme.layout_html(theme, layout)?;
        let (patched, warning) = patch_layout(
            &html,
            &self.config.asset_href(&self.config.bundle_js),
            &self.config.asset_href(&self.config.bundle_css),
        );
        if let Some(warning) = warning {
            warn!("{}", warning.message);
            warnings.push(warning);
        }

        let _guard = self.publish_lock.lock();
        fs::create_dir_all(&self.config.build_dir)?;
        fs::write(self.config.build_dir.join(&self.config.bundle_html), patched)?;
        Ok(())
    }
}

/// Insert the script and stylesheet tags immediately before the closing
/// body marker. Marker absent: the document is returned unmodified with a
/// warning.
pub fn patch_layout(html: &str, js_href: &str, css_href: &str) -> (String, Option<Warning>) {
    if !html.contains(BODY_MARKER) {
        return (
            html.to_string(),
            Some(Warning::new(
                WARN_LAYOUT_MARKER_MISSING,
                format!(
                    "layout document has no `{}` marker; asset tags were not injected",
                    BODY_MARKER
                ),
            )),
        );
    }
    let tags = format!(
        "<script type='text/javascript' src='{}'></script>\n<link href='{}' rel='stylesheet' />\n{}",
        js_href, css_href, BODY_MARKER
    );
    (html.replace(BODY_MARKER, &tags), None)
}
