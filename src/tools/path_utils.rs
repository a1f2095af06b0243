//! Shared path validation for file tools

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::{BobError, Result};

/// Resolve `path` against the workspace root and reject anything outside it.
///
/// Works for paths that do not exist yet: `..` is resolved lexically, then
/// the nearest existing ancestor is canonicalized and the missing tail
/// re-appended, so a symlinked directory cannot point writes outside the root.
pub fn resolve_in_workspace(root: &Path, path: &str) -> Result<PathBuf> {
    let root = root.canonicalize().unwrap_or_else(|_| normalize(root));
    let requested = Path::new(path);

    let joined = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        root.join(requested)
    };

    let resolved = canonicalize_existing_prefix(&normalize(&joined));

    if !resolved.starts_with(&root) {
        return Err(BobError::tool(format!(
            "Access denied: '{}' is outside the workspace root ({})",
            path,
            root.display()
        )));
    }

    Ok(resolved)
}

/// Canonicalize the longest existing prefix of `path`, keeping the rest as is
fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if let Ok(canonical) = current.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Path relative to the workspace root, for display
pub fn display_relative(root: &Path, path: &Path) -> String {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    path.strip_prefix(&root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Files read during the session; `edit` refuses files not in here
#[derive(Debug, Clone, Default)]
pub struct ReadTracker {
    inner: Arc<Mutex<HashSet<PathBuf>>>,
}

impl ReadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, path: &Path) {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path.to_path_buf());
    }

    pub fn has_read(&self, path: &Path) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(path)
    }
}
