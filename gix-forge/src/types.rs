//! The pull request review model as read from the PR store.

use gix_hash::ObjectId;

/// Identity information about a principal (user or service account).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrincipalInfo {
    /// Numeric principal id.
    pub id: i64,
    /// Unique, human-chosen identifier.
    pub uid: String,
    /// Name shown in messages.
    pub display_name: String,
}

impl PrincipalInfo {
    /// Create a principal with `uid` also used as display name.
    pub fn new(id: i64, uid: impl Into<String>) -> Self {
        let uid = uid.into();
        Self {
            id,
            display_name: uid.clone(),
            uid,
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }
}

/// Repository information needed to address it in the git backend and in UI urls.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Repository {
    /// Numeric repository id.
    pub id: i64,
    /// Identifier of the repository within the git backend.
    pub git_uid: String,
    /// Path of the repository as shown in urls, like `space/repo`.
    pub path: String,
    /// Short name of the default branch.
    pub default_branch: String,
}

/// Lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PullReqState {
    /// Open for review.
    Open,
    /// Merged into the target branch. Terminal.
    Merged,
    /// Closed without merging. May be reopened.
    Closed,
}

impl PullReqState {
    /// The lowercase name of the state.
    pub fn as_str(self) -> &'static str {
        match self {
            PullReqState::Open => "open",
            PullReqState::Merged => "merged",
            PullReqState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for PullReqState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pull request record.
///
/// Owned by the PR store and only mutated through [`PullReqStore::update_opt_lock()`][crate::PullReqStore::update_opt_lock()].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PullReq {
    /// Store-wide unique id.
    pub id: i64,
    /// Sequential number, unique within the target repository.
    pub number: i64,
    /// Optimistic-lock version, advanced by the store on every write.
    pub version: i64,
    /// Creation time in milliseconds since the unix epoch.
    pub created: i64,
    /// Time of the last title or description edit, in milliseconds since the unix epoch.
    pub edited: i64,

    /// Lifecycle state.
    pub state: PullReqState,
    /// Title, never empty.
    pub title: String,
    /// Free-form description.
    pub description: String,

    /// Repository the changes come from.
    pub source_repo_id: i64,
    /// Short name of the branch the changes come from.
    pub source_branch: String,
    /// The commit the source branch currently points to.
    pub source_sha: ObjectId,
    /// Repository the changes are proposed to.
    pub target_repo_id: i64,
    /// Short name of the branch the changes are proposed to.
    pub target_branch: String,

    /// Monotonic counter incremented on semantically significant edits.
    pub activity_seq: u64,
    /// Number of unresolved comment threads.
    pub unresolved_count: u32,
}

/// The decision a reviewer made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ReviewDecision {
    /// No decision yet.
    Pending,
    /// Changes were approved.
    Approved,
    /// Changes were requested.
    #[cfg_attr(feature = "serde", serde(rename = "changereq"))]
    ChangeRequested,
    /// Reviewed without approving or requesting changes.
    Reviewed,
}

/// A reviewer of a pull request. Unique per pull request and principal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reviewer {
    /// The pull request this reviewer belongs to.
    pub pull_req_id: i64,
    /// Who reviews.
    pub reviewer: PrincipalInfo,
    /// The latest decision.
    pub review_decision: ReviewDecision,
    /// The source commit the decision was made against, if any was made.
    pub sha: Option<ObjectId>,
}

impl Reviewer {
    /// Create a reviewer with `decision` made against `sha`.
    pub fn new(pull_req_id: i64, reviewer: PrincipalInfo, decision: ReviewDecision, sha: Option<ObjectId>) -> Self {
        Self {
            pull_req_id,
            reviewer,
            review_decision: decision,
            sha,
        }
    }
}

/// Status of a reported status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CheckStatus {
    /// Reported but not started.
    Pending,
    /// In progress.
    Running,
    /// Completed successfully.
    Success,
    /// Completed with a failure.
    Failure,
    /// Could not complete.
    Error,
}

/// One reported status check on a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckResult {
    /// Identifier of the check, as referenced by protection rules.
    pub identifier: String,
    /// Reported status.
    pub status: CheckStatus,
}

impl CheckResult {
    /// Create a new check result.
    pub fn new(identifier: impl Into<String>, status: CheckStatus) -> Self {
        Self {
            identifier: identifier.into(),
            status,
        }
    }
}
