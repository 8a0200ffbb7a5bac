//! Templates read from a directory on disk.
//!
//! Logical paths map directly onto the root:
//!
//! ```text
//! templates/
//! ├── app/
//! │   ├── controller/Blog/view/show.tpl
//! │   └── layout/main.tpl
//! └── keel/controller/view/notFound.tpl   ← optional override
//! ```

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use keel_core::{
    application::{ApplicationError, ports::TemplateStore},
    error::KeelResult,
};

/// Environment variable naming the templates directory.
pub const TEMPLATES_DIR_ENV: &str = "KEEL_TEMPLATES_DIR";

/// Read-only store over a directory tree.
#[derive(Debug, Clone)]
pub struct LocalTemplateStore {
    root: PathBuf,
}

impl LocalTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the templates directory.
    ///
    /// Candidates, first existing directory wins:
    /// 1. `$KEEL_TEMPLATES_DIR`
    /// 2. `./templates`
    /// 3. `<executable dir>/templates`
    /// 4. `../templates`
    pub fn discover() -> Option<Self> {
        let found = candidate_paths().into_iter().find(|path| path.is_dir());
        match &found {
            Some(path) => info!(path = %path.display(), "templates directory found"),
            None => warn!("no templates directory found"),
        }
        found.map(Self::new)
    }

    /// Map a logical path onto the root, refusing anything that could
    /// escape it.
    fn resolve(&self, path: &str) -> KeelResult<PathBuf> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe || path.is_empty() {
            return Err(ApplicationError::TemplateStoreError {
                path: path.to_owned(),
                reason: "template paths must be relative and must not contain '..'".into(),
            }
            .into());
        }
        Ok(self.root.join(relative))
    }
}

impl TemplateStore for LocalTemplateStore {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    fn load(&self, path: &str) -> KeelResult<Option<String>> {
        let file = self.resolve(path)?;
        match fs::read_to_string(&file) {
            Ok(source) => {
                debug!(file = %file.display(), "template loaded");
                Ok(Some(source))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ApplicationError::TemplateStoreError {
                path: file.display().to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }

    fn list(&self) -> KeelResult<Vec<String>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = entry.map_err(|e| ApplicationError::TemplateStoreError {
                path: self.root.display().to_string(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            paths.push(normalize_path(relative));
        }
        paths.sort();
        Ok(paths)
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(4);

    if let Ok(env_dir) = std::env::var(TEMPLATES_DIR_ENV) {
        let p = PathBuf::from(env_dir);
        debug!(path = %p.display(), "candidate from $KEEL_TEMPLATES_DIR");
        paths.push(p);
    }

    paths.push(PathBuf::from("templates"));

    if let Some(exe_sibling) = exe_sibling_templates() {
        debug!(path = %exe_sibling.display(), "candidate from exe sibling");
        paths.push(exe_sibling);
    }

    paths.push(PathBuf::from("../templates"));

    paths
}

fn exe_sibling_templates() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("templates")))
}

/// Logical paths always use `/`, whatever the platform separator.
fn normalize_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
