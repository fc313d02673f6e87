//! Classification of applied ref updates into typed git events.

use gix_forge::events::{RefCreatedPayload, RefDeletedPayload, RefUpdatedPayload};
use gix_forge::{GitBackend, GitEvent, RefUpdate, Repository};

/// The namespace a reference lives in, as far as events are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// `refs/heads/*`
    Branch,
    /// `refs/tags/*`
    Tag,
}

impl RefKind {
    /// The kind of `update`, or `None` if it is neither a branch nor a tag.
    pub fn of(update: &RefUpdate) -> Option<Self> {
        if update.branch_name().is_some() {
            Some(RefKind::Branch)
        } else if update.tag_name().is_some() {
            Some(RefKind::Tag)
        } else {
            None
        }
    }
}

/// Classify all `updates` of one push to `repo` by `principal_id`, in order.
///
/// References other than branches and tags are skipped. A branch update costs one ancestry query
/// to determine whether it was forced. If that query fails the update is considered forced: the
/// reference already moved, and downstream consumers are better off doing too much than too little.
/// Tag updates are always forced.
pub async fn classify(
    git: &dyn GitBackend,
    repo: &Repository,
    principal_id: i64,
    updates: &[RefUpdate],
) -> Vec<GitEvent> {
    let mut out = Vec::with_capacity(updates.len());
    for update in updates {
        let Some(kind) = RefKind::of(update) else {
            continue;
        };

        let event = if update.is_create() {
            let payload = RefCreatedPayload {
                repo_id: repo.id,
                principal_id,
                ref_name: update.name.clone(),
                sha: update.new,
            };
            match kind {
                RefKind::Branch => GitEvent::BranchCreated(payload),
                RefKind::Tag => GitEvent::TagCreated(payload),
            }
        } else if update.is_delete() {
            let payload = RefDeletedPayload {
                repo_id: repo.id,
                principal_id,
                ref_name: update.name.clone(),
                sha: update.old,
            };
            match kind {
                RefKind::Branch => GitEvent::BranchDeleted(payload),
                RefKind::Tag => GitEvent::TagDeleted(payload),
            }
        } else {
            let forced = match kind {
                RefKind::Tag => true,
                RefKind::Branch => is_forced(git, repo, update).await,
            };
            let payload = RefUpdatedPayload {
                repo_id: repo.id,
                principal_id,
                ref_name: update.name.clone(),
                old_sha: update.old,
                new_sha: update.new,
                forced,
            };
            match kind {
                RefKind::Branch => GitEvent::BranchUpdated(payload),
                RefKind::Tag => GitEvent::TagUpdated(payload),
            }
        };
        out.push(event);
    }
    out
}

async fn is_forced(git: &dyn GitBackend, repo: &Repository, update: &RefUpdate) -> bool {
    match git.is_ancestor(&repo.git_uid, update.old, update.new).await {
        Ok(is_ancestor) => !is_ancestor,
        Err(err) => {
            tracing::warn!(
                repo_id = repo.id,
                ref_name = %update.name,
                error = %err,
                "failed to check ancestry, treating update as forced"
            );
            true
        }
    }
}
