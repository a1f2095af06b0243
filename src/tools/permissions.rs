//! Tool permissions
//!
//! Grants are loaded once per workspace session and only changed by explicit
//! enable/disable actions. The executor reads an immutable snapshot taken at
//! batch start, so a change mid-batch never mixes grants within one batch.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::{BobError, Result};

/// A capability that a tool may require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "allow_file_operations")]
    FileOperations,
    #[serde(rename = "allow_shell_commands")]
    ShellCommands,
    #[serde(rename = "allow_network_access")]
    NetworkAccess,
}

impl Permission {
    pub const ALL: [Permission; 3] = [
        Permission::FileOperations,
        Permission::ShellCommands,
        Permission::NetworkAccess,
    ];

    /// Stable identifier, as stored in workspace settings
    pub fn id(&self) -> &'static str {
        match self {
            Permission::FileOperations => "allow_file_operations",
            Permission::ShellCommands => "allow_shell_commands",
            Permission::NetworkAccess => "allow_network_access",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Permission {
    type Err = BobError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "allow_file_operations" | "file_operations" | "file_write" | "files" | "file" => {
                Ok(Permission::FileOperations)
            }
            "allow_shell_commands" | "shell_commands" | "shell_exec" | "shell" => {
                Ok(Permission::ShellCommands)
            }
            "allow_network_access" | "network_access" | "network" => Ok(Permission::NetworkAccess),
            other => Err(BobError::Other(format!(
                "Unknown permission '{}'. Expected one of: files, shell, network",
                other
            ))),
        }
    }
}

/// Mapping from permission to grant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    #[serde(default)]
    pub allow_file_operations: bool,
    #[serde(default)]
    pub allow_shell_commands: bool,
    #[serde(default)]
    pub allow_network_access: bool,
}

impl PermissionSet {
    /// Everything granted
    pub fn all() -> Self {
        Self {
            allow_file_operations: true,
            allow_shell_commands: true,
            allow_network_access: true,
        }
    }

    /// Builder-style grant
    pub fn with(mut self, permission: Permission, granted: bool) -> Self {
        self.set(permission, granted);
        self
    }

    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::FileOperations => self.allow_file_operations,
            Permission::ShellCommands => self.allow_shell_commands,
            Permission::NetworkAccess => self.allow_network_access,
        }
    }

    pub fn set(&mut self, permission: Permission, granted: bool) {
        match permission {
            Permission::FileOperations => self.allow_file_operations = granted,
            Permission::ShellCommands => self.allow_shell_commands = granted,
            Permission::NetworkAccess => self.allow_network_access = granted,
        }
    }

    /// Grants present in both sets
    pub fn intersect(&self, other: &PermissionSet) -> PermissionSet {
        PermissionSet {
            allow_file_operations: self.allow_file_operations && other.allow_file_operations,
            allow_shell_commands: self.allow_shell_commands && other.allow_shell_commands,
            allow_network_access: self.allow_network_access && other.allow_network_access,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Permission, bool)> + '_ {
        Permission::ALL.into_iter().map(move |p| (p, self.allows(p)))
    }
}

/// Permission set shared between the UI (writer) and running batches (readers)
#[derive(Debug, Clone, Default)]
pub struct SharedPermissions {
    inner: Arc<RwLock<PermissionSet>>,
}

impl SharedPermissions {
    pub fn new(set: PermissionSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(set)),
        }
    }

    /// Copy of the current grants
    pub async fn snapshot(&self) -> PermissionSet {
        *self.inner.read().await
    }

    /// Explicit enable/disable action
    pub async fn set(&self, permission: Permission, granted: bool) {
        let mut guard = self.inner.write().await;
        guard.set(permission, granted);
        tracing::info!(permission = %permission, granted, "permission changed");
    }

    /// Replace all grants, e.g. after reloading workspace settings
    pub async fn replace(&self, set: PermissionSet) {
        *self.inner.write().await = set;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_denies_everything() {
        let set = PermissionSet::default();
        assert!(set.iter().all(|(_, granted)| !granted));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(
            "shell".parse::<Permission>().unwrap(),
            Permission::ShellCommands
        );
        assert_eq!(
            "allow_file_operations".parse::<Permission>().unwrap(),
            Permission::FileOperations
        );
        assert_eq!(
            "network-access".parse::<Permission>().unwrap(),
            Permission::NetworkAccess
        );
        assert!("root".parse::<Permission>().is_err());
    }

    #[test]
    fn test_intersect() {
        let parent = PermissionSet::default().with(Permission::FileOperations, true);
        let ceiling = PermissionSet::all().with(Permission::NetworkAccess, false);
        let effective = parent.intersect(&ceiling);

        assert!(effective.allows(Permission::FileOperations));
        assert!(!effective.allows(Permission::ShellCommands));
        assert!(!effective.allows(Permission::NetworkAccess));
    }

    #[tokio::test]
    async fn test_snapshot_is_isolated_from_later_changes() {
        let shared = SharedPermissions::new(PermissionSet::all());
        let snapshot = shared.snapshot().await;

        shared.set(Permission::ShellCommands, false).await;

        assert!(snapshot.allows(Permission::ShellCommands));
        assert!(!shared.snapshot().await.allows(Permission::ShellCommands));
    }

    #[test]
    fn test_serialized_ids() {
        let json = serde_json::to_value(PermissionSet::default()).unwrap();
        assert_eq!(json["allow_shell_commands"], false);
        assert_eq!(
            serde_json::to_value(Permission::NetworkAccess).unwrap(),
            "allow_network_access"
        );
    }
}
