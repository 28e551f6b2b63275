//! Shared per-resource load state.
//!
//! Each resource moves through PENDING -> REQUESTED -> AVAILABLE | FAILED.
//! Settled states are terminal; a failed resource is never retried.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::loader::fetch::{FetchError, Resource};

/// A failure attributed to the resource whose fetch actually failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub resource: String,
    pub reason: FetchError,
}

/// Load state of a single resource.
#[derive(Debug, Clone)]
pub enum LoadState {
    /// Scheduled, waiting on prerequisites
    Pending,
    /// Fetch issued
    Requested,
    /// Loaded and verified
    Available(Arc<Resource>),
    /// Fetch failed, or a prerequisite failed
    Failed(LoadFailure),
}

impl LoadState {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Available(_) | Self::Failed(_))
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Requested => write!(f, "REQUESTED"),
            Self::Available(_) => write!(f, "AVAILABLE"),
            Self::Failed(_) => write!(f, "FAILED"),
        }
    }
}

type StateSender = Arc<watch::Sender<LoadState>>;

/// Registry of resource load states, shared by every request of a bootstrapper.
pub struct ResourceRegistry {
    entries: Mutex<HashMap<String, StateSender>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create the entry for `name`.
    ///
    /// Returns `true` alongside the sender when the entry was created by this
    /// call; the caller then owns starting the load.
    pub(crate) fn claim(&self, name: &str) -> (StateSender, bool) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(existing) = entries.get(name) {
            return (Arc::clone(existing), false);
        }

        let (sender, _) = watch::channel(LoadState::Pending);
        let sender = Arc::new(sender);
        entries.insert(name.to_string(), Arc::clone(&sender));
        (sender, true)
    }

    /// Subscribe to state changes for `name`.
    pub fn subscribe(&self, name: &str) -> Option<watch::Receiver<LoadState>> {
        let entries = self.entries.lock().unwrap();
        entries.get(name).map(|sender| sender.subscribe())
    }

    /// Current state of `name`, if it was ever scheduled.
    pub fn state(&self, name: &str) -> Option<LoadState> {
        let entries = self.entries.lock().unwrap();
        entries.get(name).map(|sender| sender.borrow().clone())
    }

    /// The loaded handle for `name`, if available.
    pub fn get_if_available(&self, name: &str) -> Option<Arc<Resource>> {
        match self.state(name)? {
            LoadState::Available(resource) => Some(resource),
            _ => None,
        }
    }

    /// All scheduled resources and their states, sorted by name.
    pub fn list(&self) -> Vec<(String, LoadState)> {
        let entries = self.entries.lock().unwrap();
        let mut listing: Vec<_> = entries
            .iter()
            .map(|(name, sender)| (name.clone(), sender.borrow().clone()))
            .collect();
        listing.sort_by(|a, b| a.0.cmp(&b.0));
        listing
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait until a resource settles and return its final state.
pub(crate) async fn settled(mut receiver: watch::Receiver<LoadState>) -> Result<LoadState> {
    let state = receiver
        .wait_for(LoadState::is_settled)
        .await
        .map_err(|_| Error::ChannelClosed)?;
    Ok((*state).clone())
}
