//! Concurrent consumers of pull request lifecycle events.

use std::sync::Arc;

use gix_forge::events::Event;
use gix_forge::{EventReader, ForgeConfig, PullReqEvent};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::head_ref::HeadRefSync;

/// A set of running head-ref workers.
#[derive(Debug)]
pub struct Workers {
    handles: Vec<JoinHandle<()>>,
}

impl Workers {
    /// Spawn `count` workers on the current runtime, all reading from `reader`.
    ///
    /// Each worker handles one event at a time, so up to `count` events are in flight. Failures
    /// are logged and the event is dropped. Workers stop once all reporters are gone and the
    /// channel is drained.
    ///
    /// # Panics
    ///
    /// If called outside of a tokio runtime.
    pub fn spawn(sync: Arc<HeadRefSync>, reader: EventReader<PullReqEvent>, count: usize) -> Self {
        let reader = Arc::new(Mutex::new(reader));
        let handles = (0..count.max(1))
            .map(|id| tokio::spawn(run(id, Arc::clone(&sync), Arc::clone(&reader))))
            .collect();
        Self { handles }
    }

    /// Spawn as many workers as configured by `pullreq.headRefWorkers`.
    ///
    /// # Panics
    ///
    /// If called outside of a tokio runtime.
    pub fn from_config(sync: Arc<HeadRefSync>, reader: EventReader<PullReqEvent>, config: &ForgeConfig) -> Self {
        Self::spawn(sync, reader, config.head_ref_workers)
    }

    /// The number of workers.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns true if there are no workers.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for all workers to finish.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "head-ref worker terminated abnormally");
            }
        }
    }

    /// Stop all workers without waiting for in-flight events.
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

async fn run(id: usize, sync: Arc<HeadRefSync>, reader: Arc<Mutex<EventReader<PullReqEvent>>>) {
    loop {
        let Some(event) = reader.lock().await.read().await else {
            break;
        };
        if let Err(err) = sync.handle(&event).await {
            if err.is_conflict() {
                tracing::warn!(worker = id, event = event.name(), error = %err, "head ref was moved by another writer");
            } else {
                tracing::error!(worker = id, event = event.name(), error = %err, "failed to synchronize head ref");
            }
        }
    }
    tracing::debug!(worker = id, "head-ref worker stopped");
}
