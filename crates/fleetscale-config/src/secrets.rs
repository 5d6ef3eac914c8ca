//! Secrets resolved from environment variables

use crate::error::{ConfigError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Secret values keyed by logical name
///
/// `Debug` never prints the values.
#[derive(Clone, Default)]
pub struct Secrets {
    values: BTreeMap<String, String>,
    bindings: BTreeMap<String, String>,
}

impl Secrets {
    /// Read each bound variable; unset or empty variables are left out
    pub fn from_env(bindings: &BTreeMap<String, String>) -> Self {
        let values = bindings
            .iter()
            .filter_map(|(name, env)| match std::env::var(env) {
                Ok(value) if !value.is_empty() => Some((name.clone(), value)),
                _ => {
                    tracing::debug!("Secret '{}' not set ({})", name, env);
                    None
                }
            })
            .collect();

        Self {
            values,
            bindings: bindings.clone(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| ConfigError::MissingSecret {
            name: name.to_string(),
            env: self
                .bindings
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.to_uppercase()),
        })
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("resolved", &self.values.keys().collect::<Vec<_>>())
            .field("bindings", &self.bindings)
            .finish()
    }
}
