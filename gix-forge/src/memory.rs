//! In-memory implementations of the forge capabilities.
//!
//! They hold all state behind a mutex and are meant for tests and single-process setups.
//! Semantics match what the traits require, including conditional ref updates and the
//! optimistic lock of the pull request store.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use gix_hash::ObjectId;

use crate::git::{GitBackend, RefExpectation, RefType};
use crate::store::{Mutator, Order, PullReqFilter, PullReqSort, PullReqStore, RepoStore};
use crate::types::{PullReq, Repository};
use crate::{Error, Result};

/// Maximum number of commits visited by [`MemoryGit::is_ancestor()`].
const MAX_TRAVERSAL_DEPTH: usize = 10_000;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct GitState {
    /// `(repo uid, full ref name) -> value`
    refs: HashMap<(String, String), ObjectId>,
    /// `commit -> parents`, shared by all repositories.
    commits: HashMap<ObjectId, Vec<ObjectId>>,
}

/// A [`GitBackend`] keeping references and a commit graph in memory.
#[derive(Debug, Default)]
pub struct MemoryGit {
    state: Mutex<GitState>,
}

impl MemoryGit {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record commit `id` with the given `parents`.
    pub fn add_commit(&self, id: ObjectId, parents: impl IntoIterator<Item = ObjectId>) -> &Self {
        lock(&self.state).commits.insert(id, parents.into_iter().collect());
        self
    }

    /// Unconditionally set the fully qualified reference `full_name` of `repo_uid`.
    pub fn set_ref(&self, repo_uid: &str, full_name: &str, value: ObjectId) -> &Self {
        lock(&self.state)
            .refs
            .insert((repo_uid.to_owned(), full_name.to_owned()), value);
        self
    }

    /// Read the fully qualified reference `full_name` of `repo_uid`.
    pub fn ref_value(&self, repo_uid: &str, full_name: &str) -> Option<ObjectId> {
        lock(&self.state)
            .refs
            .get(&(repo_uid.to_owned(), full_name.to_owned()))
            .copied()
    }
}

#[async_trait::async_trait]
impl GitBackend for MemoryGit {
    async fn get_ref(&self, repo_uid: &str, name: &str, ref_type: RefType) -> Result<Option<ObjectId>> {
        Ok(self.ref_value(repo_uid, &ref_type.full_name(name)))
    }

    async fn update_ref(
        &self,
        repo_uid: &str,
        name: &str,
        ref_type: RefType,
        new_value: ObjectId,
        old_value: RefExpectation,
    ) -> Result<()> {
        let full_name = ref_type.full_name(name);
        let key = (repo_uid.to_owned(), full_name);
        let mut state = lock(&self.state);
        let actual = state.refs.get(&key).copied();
        if !old_value.is_satisfied_by(actual.as_ref()) {
            return Err(Error::RefConflict {
                name: key.1,
                expected: old_value,
                actual,
            });
        }
        state.refs.insert(key, new_value);
        Ok(())
    }

    async fn is_ancestor(&self, _repo_uid: &str, ancestor: ObjectId, descendant: ObjectId) -> Result<bool> {
        let state = lock(&self.state);
        for id in [&ancestor, &descendant] {
            if !state.commits.contains_key(id) {
                return Err(Error::Backend(format!("commit {id} not found")));
            }
        }

        let mut visited = HashSet::new();
        let mut to_visit = vec![descendant];
        while let Some(current) = to_visit.pop() {
            if current == ancestor {
                return Ok(true);
            }
            if !visited.insert(current) {
                continue;
            }
            if visited.len() > MAX_TRAVERSAL_DEPTH {
                return Err(Error::Backend(format!(
                    "ancestry walk from {descendant} exceeded {MAX_TRAVERSAL_DEPTH} commits"
                )));
            }
            if let Some(parents) = state.commits.get(&current) {
                to_visit.extend(parents.iter().filter(|p| !visited.contains(*p)));
            }
        }
        Ok(false)
    }
}

/// A [`PullReqStore`] keeping pull requests in memory, keyed by target repository and number.
#[derive(Debug, Default)]
pub struct MemoryPullReqStore {
    prs: Mutex<HashMap<(i64, i64), PullReq>>,
}

impl MemoryPullReqStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `pr` as is, without any version check.
    pub fn insert(&self, pr: PullReq) -> &Self {
        lock(&self.prs).insert((pr.target_repo_id, pr.number), pr);
        self
    }

    /// Return a copy of the stored pull request, if present.
    pub fn get(&self, repo_id: i64, number: i64) -> Option<PullReq> {
        lock(&self.prs).get(&(repo_id, number)).cloned()
    }
}

#[async_trait::async_trait]
impl PullReqStore for MemoryPullReqStore {
    async fn find_by_number(&self, repo_id: i64, number: i64) -> Result<PullReq> {
        self.get(repo_id, number)
            .ok_or_else(|| Error::not_found(format!("pull request #{number} of repository {repo_id}")))
    }

    async fn list(&self, filter: &PullReqFilter) -> Result<Vec<PullReq>> {
        let mut out: Vec<_> = lock(&self.prs).values().filter(|pr| filter.matches(pr)).cloned().collect();
        out.sort_by(|a, b| {
            let ord = match filter.sort {
                PullReqSort::Created => a.created.cmp(&b.created),
                PullReqSort::Edited => a.edited.cmp(&b.edited),
                PullReqSort::Number => std::cmp::Ordering::Equal,
            }
            .then_with(|| (a.target_repo_id, a.number).cmp(&(b.target_repo_id, b.number)));
            match filter.order {
                Order::Asc => ord,
                Order::Desc => ord.reverse(),
            }
        });
        let size = filter.size as usize;
        let skip = (filter.page.max(1) as usize - 1).saturating_mul(size);
        Ok(out.into_iter().skip(skip).take(size).collect())
    }

    async fn update_opt_lock(&self, pr: &PullReq, mutate: &mut Mutator<'_>) -> Result<PullReq> {
        let mut prs = lock(&self.prs);
        let key = (pr.target_repo_id, pr.number);
        let stored = prs.get(&key).ok_or_else(|| {
            Error::not_found(format!("pull request #{} of repository {}", pr.number, pr.target_repo_id))
        })?;
        if stored.version != pr.version {
            return Err(Error::Conflict {
                what: format!("pull request #{}", pr.number),
                expected: pr.version,
                actual: stored.version,
            });
        }

        let mut updated = stored.clone();
        mutate(&mut updated)?;
        updated.version = stored.version + 1;
        prs.insert(key, updated.clone());
        Ok(updated)
    }
}

/// A [`RepoStore`] keeping repositories in memory.
#[derive(Debug, Default)]
pub struct MemoryRepoStore {
    repos: Mutex<HashMap<i64, Repository>>,
}

impl MemoryRepoStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `repo`.
    pub fn insert(&self, repo: Repository) -> &Self {
        lock(&self.repos).insert(repo.id, repo);
        self
    }
}

#[async_trait::async_trait]
impl RepoStore for MemoryRepoStore {
    async fn find(&self, repo_id: i64) -> Result<Repository> {
        lock(&self.repos)
            .get(&repo_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("repository {repo_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(n: u8) -> ObjectId {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        ObjectId::from_bytes_or_panic(&bytes)
    }

    #[tokio::test]
    async fn ancestry() -> Result<()> {
        let git = MemoryGit::new();
        git.add_commit(oid(1), [])
            .add_commit(oid(2), [oid(1)])
            .add_commit(oid(3), [oid(2)])
            .add_commit(oid(4), [oid(1)]);

        assert!(git.is_ancestor("r", oid(1), oid(3)).await?);
        assert!(git.is_ancestor("r", oid(3), oid(3)).await?);
        assert!(!git.is_ancestor("r", oid(3), oid(1)).await?);
        assert!(!git.is_ancestor("r", oid(2), oid(4)).await?);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_commits_are_errors() {
        let git = MemoryGit::new();
        git.add_commit(oid(1), []);
        let err = git.is_ancestor("r", oid(1), oid(9)).await.expect_err("unknown");
        assert_eq!(err.kind(), crate::Kind::Backend);
    }

    #[tokio::test]
    async fn conditional_updates() -> Result<()> {
        let git = MemoryGit::new();
        git.update_ref("r", "1", RefType::PullReqHead, oid(1), RefExpectation::Absent)
            .await?;
        let err = git
            .update_ref("r", "1", RefType::PullReqHead, oid(2), RefExpectation::Absent)
            .await
            .expect_err("exists");
        assert!(err.is_conflict());

        git.update_ref("r", "1", RefType::PullReqHead, oid(2), RefExpectation::Value(oid(1)))
            .await?;
        assert_eq!(git.get_ref("r", "1", RefType::PullReqHead).await?, Some(oid(2)));
        assert_eq!(git.ref_value("r", "refs/pullreq/1/head"), Some(oid(2)));
        assert_eq!(git.get_ref("other", "1", RefType::PullReqHead).await?, None);
        Ok(())
    }
}
