//! Resource fetching and integrity verification.

use std::borrow::Cow;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

use crate::config::{Declaration, Location};

/// Reasons a single resource failed to load.
///
/// Cloneable so one failure can be observed by every waiter on the resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("IO error reading {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Integrity mismatch: expected {expected}, got {actual}")]
    Integrity { expected: String, actual: String },

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("Prerequisite '{0}' failed to load")]
    PrerequisiteFailed(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Boxed future returned by [`ResourceFetcher::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a>>;

/// Fetches the body of a declared resource.
pub trait ResourceFetcher: Send + Sync {
    fn fetch<'a>(&'a self, declaration: &'a Declaration) -> FetchFuture<'a>;
}

/// A loaded resource: the handle passed to continuations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub location: Location,
    pub body: Vec<u8>,
    /// Hex SHA-256 of `body`
    pub sha256: String,
    /// Global symbol the resource exports, if declared
    pub exports: Option<String>,
}

impl Resource {
    /// Build a handle from a fetched body, enforcing the declared digest.
    pub fn from_body(declaration: &Declaration, body: Vec<u8>) -> Result<Self, FetchError> {
        let actual = ::hex::encode(Sha256::digest(&body));
        if let Some(expected) = &declaration.integrity {
            if *expected != actual {
                return Err(FetchError::Integrity {
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        Ok(Self {
            name: declaration.name.clone(),
            location: declaration.location.clone(),
            body,
            sha256: actual,
            exports: declaration.exports.clone(),
        })
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Default fetcher: filesystem paths via `tokio::fs`, URLs via `reqwest`.
pub struct ScriptFetcher {
    client: Client,
}

impl ScriptFetcher {
    /// Create a fetcher with no request timeout.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a fetcher whose HTTP requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    async fn read_file(path: &Path) -> Result<Vec<u8>, FetchError> {
        tokio::fs::read(path).await.map_err(|e| FetchError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| FetchError::InvalidLocator(url.to_string()))?;
            return Self::read_file(&path).await;
        }

        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

impl ResourceFetcher for ScriptFetcher {
    fn fetch<'a>(&'a self, declaration: &'a Declaration) -> FetchFuture<'a> {
        Box::pin(async move {
            match &declaration.location {
                Location::File(path) => Self::read_file(path).await,
                Location::Url(url) => self.download(url).await,
            }
        })
    }
}

impl Default for ScriptFetcher {
    fn default() -> Self {
        Self::new()
    }
}
