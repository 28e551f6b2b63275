//! Load lifecycle events delivered to an optional observer.

use std::sync::Arc;

/// A step in the life of a load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    /// A resource's prerequisites are available and its fetch was issued
    Requested { name: String, location: String },
    /// A resource finished loading
    Available { name: String },
    /// A resource failed, or was blocked by a failed prerequisite
    Failed { name: String, reason: String },
    /// The continuation of a request ran
    Fired { names: Vec<String> },
}

impl LoadEvent {
    /// The resource this event concerns, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Requested { name, .. } | Self::Available { name } | Self::Failed { name, .. } => {
                Some(name)
            }
            Self::Fired { .. } => None,
        }
    }
}

/// Observer callback for load events.
pub type EventCallback = Arc<dyn Fn(&LoadEvent) + Send + Sync>;
