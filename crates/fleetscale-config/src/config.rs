//! `fleetscale.yml` schema
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration.

use crate::error::{ConfigError, Result};
use crate::secrets::Secrets;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScaleConfig {
    pub fleet: FleetConfig,
    pub paths: PathsConfig,
    /// Logical secret name → environment variable holding it
    pub secrets: BTreeMap<String, String>,
}

/// What the fleet looks like
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub prefix: String,
    pub instance_type: String,
    pub region: String,
    pub image: String,
    pub login_user: String,
    pub group: String,
    /// Public key installed on new nodes; `~` is expanded
    pub ssh_public_key: PathBuf,
    pub reach_timeout_secs: u64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            prefix: "ftl2-scale".to_string(),
            instance_type: "g6-nanode-1".to_string(),
            region: "us-east".to_string(),
            image: "linode/fedora43".to_string(),
            login_user: "root".to_string(),
            group: "scale".to_string(),
            ssh_public_key: PathBuf::from("~/.ssh/id_rsa.pub"),
            reach_timeout_secs: 120,
        }
    }
}

impl FleetConfig {
    pub fn reach_timeout(&self) -> Duration {
        Duration::from_secs(self.reach_timeout_secs)
    }
}

/// Local files, relative to the working directory unless absolute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub state_file: PathBuf,
    pub inventory: PathBuf,
    pub playbook_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(".ftl2-state.json"),
            inventory: PathBuf::from("ansible-inventory"),
            playbook_dir: PathBuf::from("playbooks"),
        }
    }
}

/// Bindings used when the file does not declare any
pub fn default_secret_bindings() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("access_token".to_string(), "LINODE_TOKEN".to_string()),
        ("root_pass".to_string(), "LINODE_ROOT_PASS".to_string()),
    ])
}

impl ScaleConfig {
    /// Parse a YAML document; `origin` is only used in error messages
    pub fn from_yaml(content: &str, origin: &Path) -> Result<Self> {
        // serde_yaml rejects an empty document
        let mut config: ScaleConfig = if content.trim().is_empty() {
            ScaleConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: origin.to_path_buf(),
                source,
            })?
        };

        if config.secrets.is_empty() {
            config.secrets = default_secret_bindings();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content, path)
    }

    /// Defaults with the standard secret bindings
    pub fn builtin() -> Self {
        Self {
            secrets: default_secret_bindings(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fleet = &self.fleet;
        if fleet.prefix.is_empty() || fleet.prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "fleet.prefix must be a non-empty word, got '{}'",
                fleet.prefix
            )));
        }
        if fleet.reach_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fleet.reach_timeout_secs must be greater than 0".to_string(),
            ));
        }
        for (field, value) in [
            ("fleet.instance_type", &fleet.instance_type),
            ("fleet.region", &fleet.region),
            ("fleet.image", &fleet.image),
            ("fleet.login_user", &fleet.login_user),
            ("fleet.group", &fleet.group),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", field)));
            }
        }
        Ok(())
    }

    /// Read every bound secret from the environment
    pub fn resolve_secrets(&self) -> Secrets {
        Secrets::from_env(&self.secrets)
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
