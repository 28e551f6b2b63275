//! Loader configuration: path aliases, shims, and the declaration table.

pub mod locator;
pub mod table;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults;

pub use locator::{BaseLocation, Location};
pub use table::{Declaration, DeclarationTable};

/// Errors raised while parsing or registering declarations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("'{resource}' lists undeclared prerequisite '{prerequisite}'")]
    MissingPrerequisite {
        resource: String,
        prerequisite: String,
    },

    #[error("Circular dependency: {}", cycle.join(" -> "))]
    Cycle { cycle: Vec<String> },

    #[error("Invalid base URL '{0}': {1}")]
    InvalidBaseUrl(String, String),

    #[error("Invalid locator '{locator}' for '{resource}': {reason}")]
    InvalidLocator {
        resource: String,
        locator: String,
        reason: String,
    },

    #[error("Invalid integrity digest for '{0}': expected 64 hex characters")]
    InvalidIntegrity(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shim entry for a resource: prerequisites and the symbol it exports.
///
/// Accepts both the object form `{"deps": [...], "exports": "X"}` and the
/// shorthand array form `["dep", ...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ShimRepr")]
pub struct ShimEntry {
    pub deps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exports: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ShimRepr {
    Deps(Vec<String>),
    Full {
        #[serde(default)]
        deps: Vec<String>,
        #[serde(default)]
        exports: Option<String>,
    },
}

impl From<ShimRepr> for ShimEntry {
    fn from(repr: ShimRepr) -> Self {
        match repr {
            ShimRepr::Deps(deps) => Self {
                deps,
                exports: None,
            },
            ShimRepr::Full { deps, exports } => Self { deps, exports },
        }
    }
}

/// Declarative loader configuration, shaped like a module loader's config call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderConfig {
    #[serde(default = "defaults::base_url")]
    pub base_url: String,
    /// Short name -> resource locator
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
    /// Short name -> prerequisites / exported symbol
    #[serde(default)]
    pub shim: BTreeMap<String, ShimEntry>,
    /// Short name -> expected SHA-256 of the loaded body (hex)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub integrity: BTreeMap<String, String>,
    /// Seconds to wait for a request before giving up; 0 disables the limit
    #[serde(default = "defaults::wait_seconds")]
    pub wait_seconds: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            paths: BTreeMap::new(),
            shim: BTreeMap::new(),
            integrity: BTreeMap::new(),
            wait_seconds: defaults::WAIT_SECONDS,
        }
    }
}

impl LoaderConfig {
    /// Create an empty configuration rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Apply environment overrides (`PAGEBOOT_BASE_URL`).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(defaults::BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                log::debug!("Base URL overridden from environment: {}", base_url);
                self.base_url = base_url;
            }
        }
        self
    }

    /// Declare a path alias.
    pub fn path(mut self, name: impl Into<String>, locator: impl Into<String>) -> Self {
        self.paths.insert(name.into(), locator.into());
        self
    }

    /// Declare prerequisites for a resource.
    pub fn shim<I, S>(mut self, name: impl Into<String>, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shim.entry(name.into()).or_default().deps = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Declare the symbol a resource exports.
    pub fn exports(mut self, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.shim.entry(name.into()).or_default().exports = Some(symbol.into());
        self
    }

    /// Pin the expected SHA-256 digest of a resource.
    pub fn integrity(mut self, name: impl Into<String>, sha256: impl Into<String>) -> Self {
        self.integrity.insert(name.into(), sha256.into());
        self
    }

    /// Set the wait window in seconds (0 disables it).
    pub fn wait_seconds(mut self, seconds: u64) -> Self {
        self.wait_seconds = seconds;
        self
    }

    /// The wait window, if one is configured.
    pub fn wait_duration(&self) -> Option<Duration> {
        (self.wait_seconds > 0).then(|| Duration::from_secs(self.wait_seconds))
    }
}
