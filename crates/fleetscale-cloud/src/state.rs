//! Durable ledger of provisioned resources
//!
//! Manages the state file (`.ftl2-state.json` by default) that maps each
//! logical resource name to the record the provider returned for it. The file
//! is the sole source of truth for what exists: every mutation rewrites the
//! whole document atomically before returning.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const STATE_VERSION: u32 = 1;
const BACKUP_SUFFIX: &str = "backup";
const TMP_SUFFIX: &str = "tmp";

/// Persisted description of one provisioned node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Logical name, `<prefix>-<index>`
    #[serde(default)]
    pub name: String,

    /// Cloud backend that created the resource
    pub provider: String,

    /// Provider-assigned identifier
    #[serde(alias = "id", deserialize_with = "string_or_number")]
    pub provider_id: String,

    /// Network addresses, primary first
    #[serde(alias = "ipv4")]
    pub addresses: Vec<String>,

    /// Display name, generally equal to `name`
    pub label: String,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ResourceRecord {
    /// Build a record; a resource without any address cannot be managed
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        provider_id: impl Into<String>,
        addresses: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        if addresses.is_empty() {
            return Err(CloudError::MalformedResponse {
                name,
                reason: "no addresses".to_string(),
            });
        }
        Ok(Self {
            label: name.clone(),
            name,
            provider: provider.into(),
            provider_id: provider_id.into(),
            addresses,
            created_at: Utc::now(),
        })
    }

    /// Primary address used for management connections
    pub fn primary_address(&self) -> &str {
        self.addresses.first().map(String::as_str).unwrap_or_default()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for provider id, got {}",
            other
        ))),
    }
}

/// On-disk document
///
/// Older ledgers are a bare `name → record` object; they load into
/// `resources` and are upgraded on the next write.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateDocument {
    #[serde(default = "current_version")]
    version: u32,
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
    resources: BTreeMap<String, ResourceRecord>,
}

fn current_version() -> u32 {
    STATE_VERSION
}

impl StateDocument {
    fn parse(content: &str) -> serde_json::Result<Self> {
        let versioned_err = match serde_json::from_str::<StateDocument>(content) {
            Ok(document) => return Ok(document),
            Err(e) => e,
        };
        match serde_json::from_str::<BTreeMap<String, ResourceRecord>>(content) {
            Ok(resources) => {
                tracing::debug!("Loaded unversioned state with {} resources", resources.len());
                Ok(Self {
                    resources,
                    ..Default::default()
                })
            }
            Err(_) => Err(versioned_err),
        }
    }
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

/// Name-keyed store of [`ResourceRecord`]s backed by a JSON file
///
/// Single writer: concurrent processes against the same file are not
/// supported.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    document: StateDocument,
}

impl StateStore {
    /// Load the store, starting empty if the file does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            tracing::debug!("State file {} not found, starting empty", path.display());
            return Ok(Self {
                path,
                document: StateDocument::default(),
            });
        }

        let content = fs::read_to_string(&path).await?;
        let mut document = StateDocument::parse(&content).map_err(|e| {
            CloudError::StateError(format!("{} is not a valid state file: {}", path.display(), e))
        })?;

        if document.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                document.version, STATE_VERSION
            )));
        }

        for (key, record) in document.resources.iter_mut() {
            if record.name.is_empty() {
                record.name = key.clone();
            } else if record.name != *key {
                return Err(CloudError::StateError(format!(
                    "record '{}' is stored under key '{}'",
                    record.name, key
                )));
            }
            if record.addresses.is_empty() {
                return Err(CloudError::StateError(format!(
                    "record '{}' has no addresses",
                    key
                )));
            }
        }

        tracing::debug!(
            "Loaded state with {} resources from {}",
            document.resources.len(),
            path.display()
        );
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has(&self, name: &str) -> bool {
        self.document.resources.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&ResourceRecord> {
        self.document
            .resources
            .get(name)
            .ok_or_else(|| CloudError::ResourceNotFound(name.to_string()))
    }

    /// Insert a new record and persist it
    pub async fn add(&mut self, record: ResourceRecord) -> Result<()> {
        let name = record.name.clone();
        if self.has(&name) {
            return Err(CloudError::ResourceAlreadyExists(name));
        }

        self.document.resources.insert(name.clone(), record);
        if let Err(e) = self.persist().await {
            self.document.resources.remove(&name);
            return Err(e);
        }
        tracing::debug!("Recorded {} in state", name);
        Ok(())
    }

    /// Delete a record and persist the removal
    pub async fn remove(&mut self, name: &str) -> Result<ResourceRecord> {
        let record = self
            .document
            .resources
            .remove(name)
            .ok_or_else(|| CloudError::ResourceNotFound(name.to_string()))?;

        if let Err(e) = self.persist().await {
            self.document.resources.insert(name.to_string(), record);
            return Err(e);
        }
        tracing::debug!("Removed {} from state", name);
        Ok(record)
    }

    /// Names of all tracked resources
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.document.resources.keys().map(String::as_str)
    }

    /// Sorted names starting with `prefix`
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.resources()
            .filter(|name| name.starts_with(prefix))
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.document.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.resources.is_empty()
    }

    async fn persist(&mut self) -> Result<()> {
        self.document.updated_at = Utc::now();
        let content = serde_json::to_string_pretty(&self.document)?;
        write_atomic(&self.path, content.as_bytes(), true).await?;
        tracing::debug!(
            "Saved state with {} resources",
            self.document.resources.len()
        );
        Ok(())
    }
}

/// Replace `path` with `content` so that readers see either the old or the
/// new document, never a partial one.
pub(crate) async fn write_atomic(path: &Path, content: &[u8], keep_backup: bool) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).await?;
    }

    let tmp = sibling(path, TMP_SUFFIX);
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    drop(file);

    if keep_backup && path.exists() {
        fs::copy(path, sibling(path, BACKUP_SUFFIX)).await?;
    }
    fs::rename(&tmp, path).await?;
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
