//! pageboot - deferred multi-dependency bootstrapping for static pages.
//!
//! Declares named resources with prerequisite ordering, loads them
//! concurrently in that order, and runs a single continuation once every
//! requested resource is available.

mod defaults;
pub mod error;

pub mod config;
pub mod loader;
pub mod page;

pub use error::{Error, Result};

pub use config::{
    BaseLocation, ConfigError, Declaration, DeclarationTable, LoaderConfig, Location, ShimEntry,
};

pub use loader::{
    Bootstrapper, CancelHandle, EventCallback, FetchError, FetchFuture, Handles, LoadBarrier,
    LoadEvent, LoadFailure, LoadRequest, LoadState, Resource, ResourceFetcher, ResourceRegistry,
    ScriptFetcher,
};

pub use page::{
    Accordion, AccordionOptions, Active, ActivatedPage, HighlightBackend, HighlighterKind,
    PageConfig, PageContext, PageError, PageScript, PanelSpec, Prettify, Prism,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
