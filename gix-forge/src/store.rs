//! The pull request and repository store capabilities consumed by this workspace.

use crate::types::{PullReq, PullReqState, Repository};
use crate::Result;

/// The field pull requests are sorted by when listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PullReqSort {
    /// Creation time.
    #[default]
    Created,
    /// Time of the last edit.
    Edited,
    /// Pull request number.
    Number,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

/// Filter for listing pull requests.
///
/// Unset fields don't restrict the result. An empty `states` list matches all states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullReqFilter {
    /// 1-based page number.
    pub page: u32,
    /// Maximum number of items per page.
    pub size: u32,
    /// Only pull requests from this source repository.
    pub source_repo_id: Option<i64>,
    /// Only pull requests from this source branch.
    pub source_branch: Option<String>,
    /// Only pull requests into this target repository.
    pub target_repo_id: Option<i64>,
    /// Only pull requests in any of these states.
    pub states: Vec<PullReqState>,
    /// Sort field.
    pub sort: PullReqSort,
    /// Sort direction.
    pub order: Order,
}

impl Default for PullReqFilter {
    fn default() -> Self {
        Self {
            page: 1,
            size: 50,
            source_repo_id: None,
            source_branch: None,
            target_repo_id: None,
            states: Vec::new(),
            sort: PullReqSort::default(),
            order: Order::default(),
        }
    }
}

impl PullReqFilter {
    /// Restrict to pull requests originating from `branch` of repository `repo_id`.
    pub fn with_source(mut self, repo_id: i64, branch: impl Into<String>) -> Self {
        self.source_repo_id = Some(repo_id);
        self.source_branch = Some(branch.into());
        self
    }

    /// Restrict to pull requests into repository `repo_id`.
    pub fn with_target_repo(mut self, repo_id: i64) -> Self {
        self.target_repo_id = Some(repo_id);
        self
    }

    /// Restrict to the given states.
    pub fn with_states(mut self, states: impl IntoIterator<Item = PullReqState>) -> Self {
        self.states = states.into_iter().collect();
        self
    }

    /// Select a page.
    pub fn with_page(mut self, page: u32, size: u32) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    /// Set sort field and direction.
    pub fn sorted_by(mut self, sort: PullReqSort, order: Order) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    /// Returns true if `pr` passes all restrictions of this filter, ignoring paging.
    pub fn matches(&self, pr: &PullReq) -> bool {
        self.source_repo_id.map_or(true, |id| pr.source_repo_id == id)
            && self.source_branch.as_deref().map_or(true, |b| pr.source_branch == b)
            && self.target_repo_id.map_or(true, |id| pr.target_repo_id == id)
            && (self.states.is_empty() || self.states.contains(&pr.state))
    }
}

/// A mutation applied to a copy of a pull request inside [`PullReqStore::update_opt_lock()`].
pub type Mutator<'a> = dyn FnMut(&mut PullReq) -> Result<()> + Send + 'a;

/// Persistent storage of pull requests.
#[async_trait::async_trait]
pub trait PullReqStore: Send + Sync {
    /// Find pull request `number` of the target repository `repo_id`.
    async fn find_by_number(&self, repo_id: i64, number: i64) -> Result<PullReq>;

    /// List pull requests matching `filter`, sorted and paged as it describes.
    async fn list(&self, filter: &PullReqFilter) -> Result<Vec<PullReq>>;

    /// Apply `mutate` to a copy of `pr` and store it, but only if the stored version still equals `pr.version`.
    ///
    /// Returns the stored pull request with its advanced version. If the stored version moved on,
    /// this fails with [`Error::Conflict`][crate::Error::Conflict] and nothing is written; callers must
    /// re-read and retry or surface the conflict. An error returned by `mutate` aborts the write.
    async fn update_opt_lock(&self, pr: &PullReq, mutate: &mut Mutator<'_>) -> Result<PullReq>;
}

/// Lookup of repository information.
#[async_trait::async_trait]
pub trait RepoStore: Send + Sync {
    /// Find repository `repo_id`.
    async fn find(&self, repo_id: i64) -> Result<Repository>;
}
