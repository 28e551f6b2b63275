//! The bootstrapper: ordered loading behind a one-shot continuation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::{DeclarationTable, LoaderConfig};
use crate::error::{Error, Result};
use crate::loader::barrier::{CancelHandle, Handles, LoadBarrier};
use crate::loader::events::{EventCallback, LoadEvent};
use crate::loader::fetch::{FetchError, Resource, ResourceFetcher, ScriptFetcher};
use crate::loader::registry::{settled, LoadFailure, LoadState, ResourceRegistry};

/// Loads declared resources in prerequisite order and runs continuations
/// once everything a request names is available.
///
/// Cloning is cheap and clones share the same load registry.
#[derive(Clone)]
pub struct Bootstrapper {
    table: Arc<DeclarationTable>,
    fetcher: Arc<dyn ResourceFetcher>,
    registry: Arc<ResourceRegistry>,
    observer: Option<EventCallback>,
}

impl Bootstrapper {
    /// Create a bootstrapper over registered declarations.
    pub fn new(table: Arc<DeclarationTable>, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            table,
            fetcher,
            registry: Arc::new(ResourceRegistry::new()),
            observer: None,
        }
    }

    /// Register `config` and load with the default [`ScriptFetcher`].
    ///
    /// Fails before any load is attempted if the declarations are invalid.
    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        let table = DeclarationTable::register(config)?;
        Ok(Self::new(Arc::new(table), Arc::new(ScriptFetcher::new())))
    }

    /// Attach an observer for load events.
    pub fn with_observer(mut self, observer: EventCallback) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn table(&self) -> &DeclarationTable {
        &self.table
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Issue loads for `names` and their transitive prerequisites.
    ///
    /// Loads start immediately on the current Tokio runtime; the returned
    /// request resolves once all of `names` are available.
    pub fn request<I, S>(&self, names: I) -> LoadRequest
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut receivers: HashMap<String, watch::Receiver<LoadState>> = HashMap::new();

        for name in self.table.load_order(&names) {
            let (sender, fresh) = self.registry.claim(&name);
            if fresh {
                // load_order yields prerequisites first, so they are all in `receivers`
                let prerequisites: Vec<_> = self
                    .table
                    .prerequisites(&name)
                    .iter()
                    .filter_map(|p| receivers.get(p).map(|r| (p.clone(), r.clone())))
                    .collect();

                tokio::spawn(self.clone().load(name.clone(), prerequisites, Arc::clone(&sender)));
            }
            receivers.insert(name, sender.subscribe());
        }

        let entries = names
            .iter()
            .filter_map(|name| receivers.get(name).map(|r| (name.clone(), r.clone())))
            .collect();

        LoadRequest {
            names,
            barrier: LoadBarrier::new(entries),
            wait: self.table.wait(),
            observer: self.observer.clone(),
        }
    }

    /// Request `names` and run `continuation` once with their handles.
    pub async fn request_and_run<I, S, F, T>(&self, names: I, continuation: F) -> Result<T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(Handles) -> T,
    {
        self.request(names).run(continuation).await
    }

    async fn load(
        self,
        name: String,
        prerequisites: Vec<(String, watch::Receiver<LoadState>)>,
        sender: Arc<watch::Sender<LoadState>>,
    ) {
        for (prerequisite, receiver) in prerequisites {
            match settled(receiver).await {
                Ok(LoadState::Available(_)) => {}
                Ok(LoadState::Failed(failure)) => {
                    log::debug!(
                        "'{}' blocked by failed prerequisite '{}'",
                        name,
                        failure.resource
                    );
                    self.emit(LoadEvent::Failed {
                        name: name.clone(),
                        reason: FetchError::PrerequisiteFailed(failure.resource.clone()).to_string(),
                    });
                    sender.send_replace(LoadState::Failed(failure));
                    return;
                }
                _ => {
                    let reason = FetchError::Other(format!(
                        "state of prerequisite '{}' was lost",
                        prerequisite
                    ));
                    self.fail(&name, reason, &sender);
                    return;
                }
            }
        }

        let declaration = match self.table.declaration(&name) {
            Ok(declaration) => declaration,
            Err(e) => {
                self.fail(&name, FetchError::InvalidLocator(e.to_string()), &sender);
                return;
            }
        };

        sender.send_replace(LoadState::Requested);
        log::debug!("Requesting '{}' from {}", name, declaration.location);
        self.emit(LoadEvent::Requested {
            name: name.clone(),
            location: declaration.location.to_string(),
        });

        let loaded = self
            .fetcher
            .fetch(&declaration)
            .await
            .and_then(|body| Resource::from_body(&declaration, body));

        match loaded {
            Ok(resource) => {
                log::info!("Loaded '{}' ({} bytes)", name, resource.body.len());
                // Dependents may only be requested after this event is out
                self.emit(LoadEvent::Available { name: name.clone() });
                sender.send_replace(LoadState::Available(Arc::new(resource)));
            }
            Err(reason) => self.fail(&name, reason, &sender),
        }
    }

    fn fail(&self, name: &str, reason: FetchError, sender: &watch::Sender<LoadState>) {
        log::error!("Failed to load '{}': {}", name, reason);
        self.emit(LoadEvent::Failed {
            name: name.to_string(),
            reason: reason.to_string(),
        });
        sender.send_replace(LoadState::Failed(LoadFailure {
            resource: name.to_string(),
            reason,
        }));
    }

    fn emit(&self, event: LoadEvent) {
        if let Some(observer) = &self.observer {
            observer(&event);
        }
    }
}

/// An issued load request. Consumed when it resolves, so its continuation
/// can run at most once.
pub struct LoadRequest {
    names: Vec<String>,
    barrier: LoadBarrier,
    wait: Option<Duration>,
    observer: Option<EventCallback>,
}

impl LoadRequest {
    /// The requested names, in request order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Handle that cancels this request before its continuation runs.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.barrier.cancel_handle()
    }

    /// Override the wait window taken from the loader configuration.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait = timeout;
        self
    }

    /// Resolve to the handles for the requested names, in request order.
    pub async fn wait(self) -> Result<Handles> {
        match self.barrier.wait(self.wait).await {
            Ok(handles) => Ok(handles),
            Err(e) => {
                match &e {
                    Error::LoadFailed { resource, .. } => {
                        log::error!("Load request aborted: '{}' failed to load", resource)
                    }
                    Error::Timeout { .. } | Error::Cancelled => {
                        log::warn!("Load request abandoned: {}", e)
                    }
                    _ => log::error!("Load request failed: {}", e),
                }
                Err(e)
            }
        }
    }

    /// Wait for every requested resource, then run `continuation` once.
    ///
    /// On any failure the continuation is dropped without running.
    pub async fn run<F, T>(self, continuation: F) -> Result<T>
    where
        F: FnOnce(Handles) -> T,
    {
        let observer = self.observer.clone();
        let names = self.names.clone();
        let handles = self.wait().await?;

        log::info!("{} requested resources available; running continuation", names.len());
        if let Some(observer) = &observer {
            observer(&LoadEvent::Fired { names });
        }
        Ok(continuation(handles))
    }
}
