//! Vault configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use attrvault_keys::DEFAULT_TOKEN_TTL;

use crate::error::{Result, VaultError};
use crate::records::RecordKind;

/// Configuration for a vault deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Directory for the file key store.
    pub key_dir: PathBuf,
    /// Session token lifetime in seconds.
    pub token_ttl_secs: i64,
    /// Required roles per record kind.
    pub templates: BTreeMap<RecordKind, Vec<String>>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            key_dir: PathBuf::from("keys"),
            token_ttl_secs: DEFAULT_TOKEN_TTL,
            templates: RecordKind::ALL
                .into_iter()
                .map(|kind| {
                    let roles = kind.required_roles().iter().map(|r| r.to_string()).collect();
                    (kind, roles)
                })
                .collect(),
        }
    }
}

impl VaultConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| VaultError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.token_ttl_secs <= 0 {
            return Err(VaultError::Config("token_ttl_secs must be positive".into()));
        }
        if self.templates.is_empty() {
            return Err(VaultError::Config("no record templates".into()));
        }
        if let Some((kind, _)) = self.templates.iter().find(|(_, roles)| roles.is_empty()) {
            return Err(VaultError::Config(format!("template {kind} has no roles")));
        }
        Ok(())
    }

    /// Required roles for `kind`.
    pub fn required_roles(&self, kind: RecordKind) -> Result<&[String]> {
        self.templates
            .get(&kind)
            .map(Vec::as_slice)
            .ok_or_else(|| VaultError::UnknownRecordKind(kind.to_string()))
    }
}
