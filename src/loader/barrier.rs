//! One-shot barrier that fans in per-resource completion.

use std::collections::HashSet;
use std::ops::Index;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::loader::fetch::Resource;
use crate::loader::registry::{settled, LoadState};

/// Loaded handles, positional in request order.
#[derive(Debug, Clone, Default)]
pub struct Handles {
    entries: Vec<Arc<Resource>>,
}

impl Handles {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Resource> {
        self.entries.get(index).map(|r| r.as_ref())
    }

    /// First handle whose resource is named `name`.
    pub fn by_name(&self, name: &str) -> Option<&Resource> {
        self.entries
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.entries.iter().map(|r| r.as_ref())
    }

    pub fn into_vec(self) -> Vec<Arc<Resource>> {
        self.entries
    }
}

impl Index<usize> for Handles {
    type Output = Resource;

    fn index(&self, index: usize) -> &Resource {
        &self.entries[index]
    }
}

/// Cancels a pending [`LoadBarrier`]. Cloneable; any clone may cancel.
#[derive(Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Waits for every entry to become available, or for the first failure.
///
/// Consumed by [`LoadBarrier::wait`], so it resolves at most once.
pub struct LoadBarrier {
    entries: Vec<(String, watch::Receiver<LoadState>)>,
    cancel: CancelHandle,
}

impl LoadBarrier {
    pub fn new(entries: Vec<(String, watch::Receiver<LoadState>)>) -> Self {
        Self {
            entries,
            cancel: CancelHandle::new(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Resolve to the handles in entry order.
    ///
    /// Fails fast on the first failed entry, regardless of position. With a
    /// `timeout`, entries still unsettled when it elapses are reported.
    pub async fn wait(self, timeout: Option<Duration>) -> Result<Handles> {
        let Self { entries, cancel } = self;
        let mut cancelled = cancel.sender.subscribe();
        if *cancelled.borrow() {
            return Err(Error::Cancelled);
        }

        let names: Vec<String> = entries.iter().map(|(name, _)| name.clone()).collect();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watchers = JoinSet::new();
        for (index, (_, receiver)) in entries.into_iter().enumerate() {
            let tx = tx.clone();
            watchers.spawn(async move {
                let _ = tx.send((index, settled(receiver).await));
            });
        }
        drop(tx);

        // A window too large to represent never elapses
        let deadline = timeout.and_then(|d| Instant::now().checked_add(d));
        let mut slots: Vec<Option<Arc<Resource>>> = vec![None; names.len()];
        let mut remaining = names.len();

        while remaining > 0 {
            let next = tokio::select! {
                biased;
                _ = until_cancelled(&mut cancelled) => return Err(Error::Cancelled),
                _ = sleep_until(deadline) => {
                    let mut seen = HashSet::new();
                    let pending: Vec<String> = names
                        .iter()
                        .zip(&slots)
                        .filter(|(name, slot)| slot.is_none() && seen.insert(*name))
                        .map(|(name, _)| name.clone())
                        .collect();
                    return Err(Error::Timeout { pending });
                }
                next = rx.recv() => next,
            };

            match next {
                Some((index, Ok(LoadState::Available(resource)))) => {
                    if slots[index].replace(resource).is_none() {
                        remaining -= 1;
                    }
                }
                Some((_, Ok(LoadState::Failed(failure)))) => {
                    return Err(Error::LoadFailed {
                        resource: failure.resource,
                        reason: failure.reason,
                    });
                }
                Some((_, Err(e))) => return Err(e),
                Some((_, Ok(_))) | None => return Err(Error::ChannelClosed),
            }
        }

        Ok(Handles {
            entries: slots.into_iter().flatten().collect(),
        })
    }
}

async fn until_cancelled(receiver: &mut watch::Receiver<bool>) {
    if receiver.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
