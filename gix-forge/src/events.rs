//! Asynchronous domain events and the fire-and-forget [`Reporter`] that publishes them.
//!
//! ### Delivery contract
//!
//! * [`Reporter::report()`] never blocks the caller and never fails. If the channel is full, the
//!   send is moved onto a spawned task of the current tokio runtime. At most `capacity` such
//!   deferred sends are pending per channel.
//! * Events are unordered. Once backpressure kicks in, events of one report batch may be delivered
//!   in any order.
//! * Consumers must be idempotent. A durable event system behind this interface delivers
//!   at-least-once and may redeliver, so nothing beyond at-least-once may be assumed.
//! * This in-memory channel never redelivers, but drops events with a warning if there is no
//!   runtime to defer to, if the deferred sends are exhausted, or if all readers are gone.

use std::sync::Arc;

use gix_hash::ObjectId;
use tokio::sync::{mpsc, Semaphore};

/// An event that can be published through a [`Reporter`].
pub trait Event: Send + 'static {
    /// A short, stable name used in logs, like `branch-created`.
    fn name(&self) -> &'static str;
}

/// Payload for a created reference.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RefCreatedPayload {
    /// Repository the reference lives in.
    pub repo_id: i64,
    /// Who pushed.
    pub principal_id: i64,
    /// Fully qualified reference name.
    pub ref_name: String,
    /// The value the reference was created with.
    pub sha: ObjectId,
}

/// Payload for an updated reference.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RefUpdatedPayload {
    /// Repository the reference lives in.
    pub repo_id: i64,
    /// Who pushed.
    pub principal_id: i64,
    /// Fully qualified reference name.
    pub ref_name: String,
    /// The previous value.
    pub old_sha: ObjectId,
    /// The new value.
    pub new_sha: ObjectId,
    /// True unless `old_sha` is known to be an ancestor of `new_sha`.
    pub forced: bool,
}

/// Payload for a deleted reference.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RefDeletedPayload {
    /// Repository the reference lived in.
    pub repo_id: i64,
    /// Who pushed.
    pub principal_id: i64,
    /// Fully qualified reference name.
    pub ref_name: String,
    /// The last value of the reference.
    pub sha: ObjectId,
}

/// Reference lifecycle events produced after a push.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum GitEvent {
    BranchCreated(RefCreatedPayload),
    BranchUpdated(RefUpdatedPayload),
    BranchDeleted(RefDeletedPayload),
    TagCreated(RefCreatedPayload),
    TagUpdated(RefUpdatedPayload),
    TagDeleted(RefDeletedPayload),
}

impl Event for GitEvent {
    fn name(&self) -> &'static str {
        match self {
            GitEvent::BranchCreated(_) => "branch-created",
            GitEvent::BranchUpdated(_) => "branch-updated",
            GitEvent::BranchDeleted(_) => "branch-deleted",
            GitEvent::TagCreated(_) => "tag-created",
            GitEvent::TagUpdated(_) => "tag-updated",
            GitEvent::TagDeleted(_) => "tag-deleted",
        }
    }
}

/// Payload for a newly created pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreatedPayload {
    /// Repository the pull request targets.
    pub target_repo_id: i64,
    /// Pull request number within the target repository.
    pub number: i64,
    /// The source commit at creation time.
    pub source_sha: ObjectId,
}

/// Payload for a push to the source branch of an open pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BranchUpdatedPayload {
    /// Repository the pull request targets.
    pub target_repo_id: i64,
    /// Pull request number within the target repository.
    pub number: i64,
    /// The source commit before the push.
    pub old_sha: ObjectId,
    /// The source commit after the push.
    pub new_sha: ObjectId,
}

/// Payload for a reopened pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReopenedPayload {
    /// Repository the pull request targets.
    pub target_repo_id: i64,
    /// Pull request number within the target repository.
    pub number: i64,
    /// The source commit at the time of reopening.
    pub source_sha: ObjectId,
}

/// Pull request lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum PullReqEvent {
    Created(CreatedPayload),
    BranchUpdated(BranchUpdatedPayload),
    Reopened(ReopenedPayload),
}

impl Event for PullReqEvent {
    fn name(&self) -> &'static str {
        match self {
            PullReqEvent::Created(_) => "pullreq-created",
            PullReqEvent::BranchUpdated(_) => "pullreq-branch-updated",
            PullReqEvent::Reopened(_) => "pullreq-reopened",
        }
    }
}

/// Create a bounded event channel holding up to `capacity` undelivered events.
///
/// `capacity` is clamped to at least 1. Up to `capacity` more events may wait in deferred sends
/// while the channel is full.
pub fn channel<T: Event>(capacity: usize) -> (Reporter<T>, EventReader<T>) {
    let capacity = capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    (
        Reporter {
            tx,
            deferred: Arc::new(Semaphore::new(capacity)),
            max_deferred: capacity,
        },
        EventReader { rx },
    )
}

/// The publishing side of an event channel. Cheap to clone.
#[derive(Debug)]
pub struct Reporter<T> {
    tx: mpsc::Sender<T>,
    /// Permits for sends waiting on a full channel, shared by all clones.
    deferred: Arc<Semaphore>,
    max_deferred: usize,
}

impl<T> Clone for Reporter<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            deferred: Arc::clone(&self.deferred),
            max_deferred: self.max_deferred,
        }
    }
}

impl<T> Reporter<T> {
    /// The number of events waiting for room in the channel.
    pub fn pending_deferred(&self) -> usize {
        self.max_deferred - self.deferred.available_permits()
    }
}

impl<T: Event> Reporter<T> {
    /// Publish `event` without waiting for it to be consumed.
    pub fn report(&self, event: T) {
        let event = match self.tx.try_send(event) {
            Ok(()) => return,
            Err(mpsc::error::TrySendError::Closed(event)) => {
                tracing::warn!(event = event.name(), "event dropped: no reader left");
                return;
            }
            Err(mpsc::error::TrySendError::Full(event)) => event,
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(event = event.name(), "event dropped: channel full and no runtime to defer to");
            return;
        };
        let Ok(permit) = Arc::clone(&self.deferred).try_acquire_owned() else {
            tracing::warn!(
                event = event.name(),
                pending = self.max_deferred,
                "event dropped: channel full and too many deferred sends"
            );
            return;
        };
        let tx = self.tx.clone();
        handle.spawn(async move {
            let name = event.name();
            if tx.send(event).await.is_err() {
                tracing::warn!(event = name, "event dropped: no reader left");
            }
            drop(permit);
        });
    }
}

/// The consuming side of an event channel.
#[derive(Debug)]
pub struct EventReader<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> EventReader<T> {
    /// Wait for the next event, or `None` once all reporters are dropped and the channel is drained.
    pub async fn read(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Return the next event if one is immediately available.
    pub fn try_read(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}
