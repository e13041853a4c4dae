//! OffloadManager implementation for background task execution.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{Instrument, debug, info_span};

use crate::CacheKey;

#[cfg(feature = "metrics")]
use crate::metrics::{OFFLOAD_TASKS_ACTIVE, OFFLOAD_TASKS_DEDUPLICATED, OFFLOAD_TASKS_SPAWNED};

/// In-flight marker for a key.
#[derive(Debug)]
struct Ticket {
    started: Instant,
}

/// Internal state shared across clones.
#[derive(Debug, Default)]
struct OffloadManagerInner {
    tickets: DashMap<CacheKey, Ticket>,
}

/// Removes the ticket of a task when the task settles.
///
/// Held by the spawned future, so the ticket also goes away when the task
/// panics or is dropped by a shutting down runtime.
struct TicketGuard {
    inner: Arc<OffloadManagerInner>,
    key: CacheKey,
}

impl Drop for TicketGuard {
    fn drop(&mut self) {
        if let Some((_, ticket)) = self.inner.tickets.remove(&self.key) {
            debug!(
                key = %self.key,
                elapsed_ms = ticket.started.elapsed().as_millis() as u64,
                "offload task settled"
            );
            #[cfg(feature = "metrics")]
            metrics::gauge!(*OFFLOAD_TASKS_ACTIVE).decrement(1.0);
        }
    }
}

/// Runs at most one background task per [`CacheKey`].
///
/// Claiming a key and deciding to spawn is a single atomic step on the
/// ticket map, so concurrent callers for the same key can never both spawn.
/// The ticket is released when the task settles, whatever its outcome.
#[derive(Clone, Debug, Default)]
pub struct OffloadManager {
    inner: Arc<OffloadManagerInner>,
}

impl OffloadManager {
    /// Create a new OffloadManager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` for `key` unless a task for `key` is already in flight.
    ///
    /// Returns `true` if the task was spawned, `false` if it was deduplicated.
    /// Must be called from within a Tokio runtime.
    pub fn spawn_with_key<F>(&self, key: CacheKey, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.inner.tickets.entry(key.clone()) {
            Entry::Occupied(_) => {
                debug!(key = %key, "task deduplicated - already in flight");
                #[cfg(feature = "metrics")]
                metrics::counter!(*OFFLOAD_TASKS_DEDUPLICATED).increment(1);
                return false;
            }
            Entry::Vacant(slot) => {
                slot.insert(Ticket {
                    started: Instant::now(),
                });
            }
        }

        #[cfg(feature = "metrics")]
        {
            metrics::counter!(*OFFLOAD_TASKS_SPAWNED).increment(1);
            metrics::gauge!(*OFFLOAD_TASKS_ACTIVE).increment(1.0);
        }

        let span = info_span!("offload_task", key = %key);
        let guard = TicketGuard {
            inner: self.inner.clone(),
            key,
        };
        tokio::spawn(
            async move {
                let _guard = guard;
                task.await;
            }
            .instrument(span),
        );
        true
    }

    /// Check if a task for `key` is in flight.
    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.inner.tickets.contains_key(key)
    }

    /// Get the number of tasks in flight.
    pub fn active_task_count(&self) -> usize {
        self.inner.tickets.len()
    }

    /// Wait for all currently tracked tasks to complete.
    ///
    /// Yields between checks to let tasks make progress.
    pub async fn wait_all(&self) {
        while !self.inner.tickets.is_empty() {
            tokio::task::yield_now().await;
        }
    }

    /// Wait for all tasks with a timeout.
    ///
    /// Returns `true` if all tasks completed within the timeout,
    /// `false` if the timeout was reached.
    pub async fn wait_all_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_all()).await.is_ok()
    }
}
