//! Configuration
//!
//! Settings for the registry and for descriptor construction, persisted as
//! JSON and overridable from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const ENV_DEFAULT_DOMAIN: &str = "MBEAN_DEFAULT_DOMAIN";
pub const ENV_WARN_OMITTED: &str = "MBEAN_WARN_OMITTED";
pub const ENV_OVERLOAD_POLICY: &str = "MBEAN_OVERLOAD_POLICY";

/// What `invoke` does when several same-named operations accept the arguments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverloadPolicy {
    /// Use the first matching operation in declaration order
    #[default]
    FirstDeclared,
    /// Fail with `AmbiguousOperation`
    Reject,
}

impl FromStr for OverloadPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first_declared" | "first" => Ok(OverloadPolicy::FirstDeclared),
            "reject" => Ok(OverloadPolicy::Reject),
            other => Err(anyhow::anyhow!("Unknown overload policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManagementConfig {
    /// Domain used for object names registered with an empty domain
    pub default_domain: String,
    /// Log attributes dropped for being neither readable nor writable at warn level
    pub warn_on_omitted_attributes: bool,
    pub overload_policy: OverloadPolicy,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            default_domain: "DefaultDomain".to_string(),
            warn_on_omitted_attributes: true,
            overload_policy: OverloadPolicy::FirstDeclared,
        }
    }
}

impl ManagementConfig {
    /// Defaults plus process environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from a key lookup. Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(domain) = lookup(ENV_DEFAULT_DOMAIN) {
            self.default_domain = domain;
        }

        if let Some(raw) = lookup(ENV_WARN_OMITTED) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.warn_on_omitted_attributes = true,
                "0" | "false" | "no" | "off" => self.warn_on_omitted_attributes = false,
                other => warn!("Ignoring {}={}: expected a boolean", ENV_WARN_OMITTED, other),
            }
        }

        if let Some(raw) = lookup(ENV_OVERLOAD_POLICY) {
            match raw.parse() {
                Ok(policy) => self.overload_policy = policy,
                Err(e) => warn!("Ignoring {}: {}", ENV_OVERLOAD_POLICY, e),
            }
        }
    }
}

/// Loads and saves [`ManagementConfig`] as a JSON file
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the file, writing defaults first when it does not exist
    pub fn load(&self) -> Result<ManagementConfig> {
        if !self.path.exists() {
            debug!("No config at {:?}, writing defaults", self.path);
            let default = ManagementConfig::default();
            self.save(&default)?;
            return Ok(default);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config at {:?}", self.path))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config at {:?}", self.path))?;
        Ok(config)
    }

    pub fn save(&self, config: &ManagementConfig) -> Result<()> {
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write config at {:?}", self.path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_save_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(temp_file.path());

        let config = ManagementConfig {
            default_domain: "app".to_string(),
            warn_on_omitted_attributes: false,
            overload_policy: OverloadPolicy::Reject,
        };

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn test_config_load_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nonexistent_config.json");
        let manager = ConfigManager::new(&path);

        let loaded = manager.load().unwrap();

        assert_eq!(loaded, ManagementConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), r#"{ "overload_policy": "reject" }"#).unwrap();

        let loaded = ConfigManager::new(temp_file.path()).load().unwrap();

        assert_eq!(loaded.overload_policy, OverloadPolicy::Reject);
        assert_eq!(loaded.default_domain, "DefaultDomain");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DEFAULT_DOMAIN, "metrics"),
            (ENV_WARN_OMITTED, "off"),
            (ENV_OVERLOAD_POLICY, "Reject"),
        ]);
        let mut config = ManagementConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.default_domain, "metrics");
        assert!(!config.warn_on_omitted_attributes);
        assert_eq!(config.overload_policy, OverloadPolicy::Reject);
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = ManagementConfig::default();
        config.apply_overrides(|key| match key {
            ENV_WARN_OMITTED => Some("maybe".to_string()),
            ENV_OVERLOAD_POLICY => Some("random".to_string()),
            _ => None,
        });
        assert_eq!(config, ManagementConfig::default());
    }
}
