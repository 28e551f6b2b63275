//! Deferred multi-dependency loading.
//!
//! This module provides:
//! - Resource fetching and verification (`fetch`)
//! - Shared per-resource load state (`registry`)
//! - The fan-in barrier gating continuations (`barrier`)
//! - The bootstrapper tying them together (`bootstrapper`)

pub mod barrier;
pub mod bootstrapper;
pub mod events;
pub mod fetch;
pub mod registry;

pub use barrier::{CancelHandle, Handles, LoadBarrier};
pub use bootstrapper::{Bootstrapper, LoadRequest};
pub use events::{EventCallback, LoadEvent};
pub use fetch::{FetchError, FetchFuture, Resource, ResourceFetcher, ScriptFetcher};
pub use registry::{LoadFailure, LoadState, ResourceRegistry};
