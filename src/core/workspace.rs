//! Workspace settings
//!
//! Each workspace keeps its state in a `.bob/` directory at its root:
//! `settings.json` (model and tool permissions) and `conversations/`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{BobError, Result};
use crate::tools::permissions::PermissionSet;

const WORKSPACE_DIR: &str = ".bob";

/// Persisted workspace settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Model identifier used in this workspace
    pub model: String,
    /// Tool permissions, all denied until enabled
    #[serde(default)]
    pub permissions: PermissionSet,
    /// RFC 3339 creation time
    pub created_at: String,
    /// RFC 3339 time of the last save
    pub last_updated: String,
}

impl WorkspaceSettings {
    pub fn new(model: impl Into<String>) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            model: model.into(),
            permissions: PermissionSet::default(),
            created_at: now.clone(),
            last_updated: now,
        }
    }
}

/// Handle on a workspace's `.bob/` directory
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Workspace rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace rooted at the current directory
    pub fn current() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.state_dir().join("settings.json")
    }

    pub fn conversations_dir(&self) -> PathBuf {
        self.state_dir().join("conversations")
    }

    pub fn is_initialized(&self) -> bool {
        self.state_dir().exists()
    }

    /// Create `.bob/` and `.bob/conversations/`.
    ///
    /// Returns `false` if the workspace already existed.
    pub fn initialize(&self, model: &str) -> Result<bool> {
        if self.is_initialized() {
            return Ok(false);
        }

        fs::create_dir_all(self.conversations_dir())?;
        self.save_settings(&mut WorkspaceSettings::new(model))?;

        tracing::info!(root = %self.root.display(), "initialized workspace");
        Ok(true)
    }

    /// Load settings, replacing a corrupted file with defaults.
    ///
    /// The corrupted file is kept as `settings.json.bak`.
    pub fn load_settings(&self, default_model: &str) -> Result<WorkspaceSettings> {
        let path = self.settings_path();

        if !path.exists() {
            return Err(BobError::workspace(format!(
                "Settings file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(&path)?;
        match serde_json::from_str::<WorkspaceSettings>(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                let backup = path.with_extension("json.bak");
                fs::copy(&path, &backup)?;

                let mut settings = WorkspaceSettings::new(default_model);
                self.save_settings(&mut settings)?;

                tracing::warn!(
                    error = %e,
                    backup = %backup.display(),
                    "corrupted settings.json backed up and reset"
                );
                Ok(settings)
            }
        }
    }

    /// Save settings, bumping `last_updated`
    pub fn save_settings(&self, settings: &mut WorkspaceSettings) -> Result<()> {
        settings.last_updated = Utc::now().to_rfc3339();

        fs::create_dir_all(self.state_dir())?;
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(self.settings_path(), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::permissions::Permission;

    #[test]
    fn test_initialize_creates_layout_once() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());

        assert!(workspace.initialize("gpt-4o-mini").unwrap());
        assert!(workspace.conversations_dir().is_dir());
        assert!(workspace.settings_path().is_file());
        assert!(!workspace.initialize("gpt-4o-mini").unwrap());
    }

    #[test]
    fn test_settings_roundtrip_keeps_permissions() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        workspace.initialize("gpt-4o-mini").unwrap();

        let mut settings = workspace.load_settings("gpt-4o-mini").unwrap();
        settings.permissions.set(Permission::ShellCommands, true);
        workspace.save_settings(&mut settings).unwrap();

        let reloaded = workspace.load_settings("gpt-4o-mini").unwrap();
        assert!(reloaded.permissions.allows(Permission::ShellCommands));
        assert!(!reloaded.permissions.allows(Permission::FileOperations));
    }

    #[test]
    fn test_corrupted_settings_are_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        workspace.initialize("gpt-4o-mini").unwrap();
        fs::write(workspace.settings_path(), "{not json").unwrap();

        let settings = workspace.load_settings("fallback-model").unwrap();

        assert_eq!(settings.model, "fallback-model");
        assert_eq!(settings.permissions, PermissionSet::default());
        let backup = workspace.settings_path().with_extension("json.bak");
        assert_eq!(fs::read_to_string(backup).unwrap(), "{not json");
    }

    #[test]
    fn test_missing_settings_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        assert!(matches!(
            workspace.load_settings("m"),
            Err(BobError::Workspace(_))
        ));
    }
}
