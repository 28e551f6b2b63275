//! Resource locator resolution.

use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::config::ConfigError;
use crate::defaults::SCRIPT_EXTENSION;

/// Where resources are loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseLocation {
    /// A filesystem directory
    Directory(PathBuf),
    /// A URL prefix, always ending in `/`
    Url(Url),
}

/// Resolved location of a single resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Url(Url),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{}", url),
        }
    }
}

impl BaseLocation {
    /// Parse a base URL. Anything that is not an absolute URL is a directory.
    pub fn parse(base_url: &str) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Ok(Self::Directory(PathBuf::from(".")));
        }

        if !has_scheme(trimmed) {
            return Ok(Self::Directory(PathBuf::from(trimmed)));
        }

        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        };

        let url = Url::parse(&normalized)
            .map_err(|e| ConfigError::InvalidBaseUrl(base_url.to_string(), e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(
                base_url.to_string(),
                "URL cannot be used as a base".into(),
            ));
        }
        Ok(Self::Url(url))
    }

    /// Resolve a resource locator against this base.
    ///
    /// Absolute URLs and `/`-rooted locators are used verbatim; everything
    /// else is joined onto the base with the script extension appended.
    pub fn resolve(&self, resource: &str, locator: &str) -> Result<Location, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidLocator {
            resource: resource.to_string(),
            locator: locator.to_string(),
            reason,
        };

        if locator.trim().is_empty() {
            return Err(invalid("empty locator".into()));
        }

        if has_scheme(locator) {
            return Url::parse(locator)
                .map(Location::Url)
                .map_err(|e| invalid(e.to_string()));
        }

        if locator.starts_with('/') {
            return match self {
                Self::Directory(_) => Ok(Location::File(PathBuf::from(locator))),
                Self::Url(base) => base
                    .join(locator)
                    .map(Location::Url)
                    .map_err(|e| invalid(e.to_string())),
            };
        }

        let relative = with_extension(locator);
        match self {
            Self::Directory(dir) => Ok(Location::File(dir.join(relative))),
            Self::Url(base) => base
                .join(&relative)
                .map(Location::Url)
                .map_err(|e| invalid(e.to_string())),
        }
    }
}

fn has_scheme(locator: &str) -> bool {
    locator.contains("://")
}

fn with_extension(locator: &str) -> String {
    if locator.ends_with(SCRIPT_EXTENSION) {
        locator.to_string()
    } else {
        format!("{}{}", locator, SCRIPT_EXTENSION)
    }
}
