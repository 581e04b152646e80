//! Runtime configuration for lookup and submission.
//!
//! Loaded from TOML, then overridden from the environment.
//!
//! # Example
//!
//! ```toml
//! [lookup]
//! base_url = "https://postal.example.com/api"
//! auth_token = "pk_..."
//! debounce_ms = 800
//! timeout_ms = 10000
//!
//! [submit]
//! url = "https://admissions.example.com/api/applications"
//! auth_token = "sess_..."
//! ```
//!
//! Environment overrides: `ADMIT_LOOKUP_BASE_URL`, `ADMIT_LOOKUP_AUTH_TOKEN`,
//! `ADMIT_DEBOUNCE_MS`, `ADMIT_LOOKUP_TIMEOUT_MS`, `ADMIT_SUBMIT_URL` and
//! `ADMIT_SUBMIT_AUTH_TOKEN`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::EnricherSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{var} must be a whole number of milliseconds, got '{value}'")]
    BadDuration { var: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdmitConfig {
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub submit: SubmitConfig,
}

/// `[lookup]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupConfig {
    pub base_url: Option<String>,
    pub auth_token: Option<String>,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_lookup_timeout_ms")]
    pub timeout_ms: u64,
    /// JSON postal table used instead of the remote service.
    pub table: Option<PathBuf>,
}

/// `[submit]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitConfig {
    pub url: Option<String>,
    pub auth_token: Option<String>,
    #[serde(default = "default_submit_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_debounce_ms() -> u64 {
    800
}

fn default_lookup_timeout_ms() -> u64 {
    10_000
}

fn default_submit_timeout_ms() -> u64 {
    30_000
}

impl Default for LookupConfig {
    fn default() -> Self {
        LookupConfig {
            base_url: None,
            auth_token: None,
            debounce_ms: default_debounce_ms(),
            timeout_ms: default_lookup_timeout_ms(),
            table: None,
        }
    }
}

impl Default for SubmitConfig {
    fn default() -> Self {
        SubmitConfig {
            url: None,
            auth_token: None,
            timeout_ms: default_submit_timeout_ms(),
        }
    }
}

impl LookupConfig {
    pub fn enricher_settings(&self) -> EnricherSettings {
        EnricherSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

impl AdmitConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `path` (when given), then apply process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Self::from_toml_str(&content, path)?
            }
            None => AdmitConfig::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Override settings from `env`. Unset or empty variables are ignored.
    pub fn apply_env(
        &mut self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |var: &str| env(var).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("ADMIT_LOOKUP_BASE_URL") {
            self.lookup.base_url = Some(v);
        }
        if let Some(v) = get("ADMIT_LOOKUP_AUTH_TOKEN") {
            self.lookup.auth_token = Some(v);
        }
        if let Some(v) = get("ADMIT_SUBMIT_URL") {
            self.submit.url = Some(v);
        }
        if let Some(v) = get("ADMIT_SUBMIT_AUTH_TOKEN") {
            self.submit.auth_token = Some(v);
        }
        if let Some(v) = get("ADMIT_DEBOUNCE_MS") {
            self.lookup.debounce_ms = millis("ADMIT_DEBOUNCE_MS", &v)?;
        }
        if let Some(v) = get("ADMIT_LOOKUP_TIMEOUT_MS") {
            self.lookup.timeout_ms = millis("ADMIT_LOOKUP_TIMEOUT_MS", &v)?;
        }
        Ok(())
    }
}

fn millis(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::BadDuration {
            var,
            value: value.to_string(),
        })
}
