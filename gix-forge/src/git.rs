//! The git backend capability consumed by this workspace.
//!
//! Process execution, object storage and repository creation are provided by the surrounding
//! system. This trait only names the three operations the pull request core relies on.

use gix_hash::ObjectId;

use crate::refs::{BRANCH_PREFIX, PULLREQ_PREFIX, TAG_PREFIX};
use crate::Result;

/// The kind of reference addressed by a short name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefType {
    /// `refs/heads/<name>`
    Branch,
    /// `refs/tags/<name>`
    Tag,
    /// `refs/pullreq/<number>/head`, managed by the server.
    PullReqHead,
}

impl RefType {
    /// Expand a short `name` into the fully qualified reference name.
    pub fn full_name(self, name: &str) -> String {
        match self {
            RefType::Branch => format!("{BRANCH_PREFIX}{name}"),
            RefType::Tag => format!("{TAG_PREFIX}{name}"),
            RefType::PullReqHead => format!("{PULLREQ_PREFIX}{name}/head"),
        }
    }
}

/// What the caller expects the current value of a reference to be for a conditional update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefExpectation {
    /// The reference must not exist yet.
    Absent,
    /// The reference must currently point to this object.
    Value(ObjectId),
    /// Any current value is acceptable, including a missing reference.
    Any,
}

impl RefExpectation {
    /// Returns true if `current` satisfies this expectation.
    pub fn is_satisfied_by(&self, current: Option<&ObjectId>) -> bool {
        match (self, current) {
            (RefExpectation::Any, _) => true,
            (RefExpectation::Absent, None) => true,
            (RefExpectation::Absent, Some(_)) => false,
            (RefExpectation::Value(expected), Some(actual)) => expected == actual,
            (RefExpectation::Value(_), None) => false,
        }
    }
}

impl std::fmt::Display for RefExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefExpectation::Absent => f.write_str("absent"),
            RefExpectation::Value(id) => write!(f, "{id}"),
            RefExpectation::Any => f.write_str("any value"),
        }
    }
}

/// Access to the repositories of the git server.
///
/// Implementations address repositories by their git uid, see [`Repository::git_uid`][crate::Repository::git_uid].
#[async_trait::async_trait]
pub trait GitBackend: Send + Sync {
    /// Read the current value of the reference `name` of type `ref_type`, `None` if it doesn't exist.
    async fn get_ref(&self, repo_uid: &str, name: &str, ref_type: RefType) -> Result<Option<ObjectId>>;

    /// Set reference `name` of type `ref_type` to `new_value`, but only if its current value
    /// satisfies `old_value`.
    ///
    /// A mismatch must fail with [`Error::RefConflict`][crate::Error::RefConflict] and leave the
    /// reference untouched.
    async fn update_ref(
        &self,
        repo_uid: &str,
        name: &str,
        ref_type: RefType,
        new_value: ObjectId,
        old_value: RefExpectation,
    ) -> Result<()>;

    /// Returns true if `ancestor` is reachable from `descendant`.
    async fn is_ancestor(&self, repo_uid: &str, ancestor: ObjectId, descendant: ObjectId) -> Result<bool>;
}
