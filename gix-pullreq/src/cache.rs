//! A read-through cache of repository git information.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use gix_forge::{RepoStore, Repository};

/// How long entries are reused unless configured otherwise.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Hit and miss counters of a [`RepoGitInfoCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that went to the store.
    pub misses: u64,
}

#[derive(Debug)]
struct Entry {
    repo: Repository,
    fetched: Instant,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<i64, Entry>,
    stats: CacheStats,
}

/// Caches repository ids to the repository information needed to address them in the git backend.
///
/// Entries expire `ttl` after they were fetched, and expired entries are purged on the next miss.
/// Failed lookups are not cached. The store is never called while the cache is locked, so
/// lookups of different repositories run concurrently. Concurrent misses of the same repository
/// may each read it from the store.
pub struct RepoGitInfoCache {
    repos: Arc<dyn RepoStore>,
    ttl: Duration,
    state: Mutex<State>,
}

impl RepoGitInfoCache {
    /// Create an empty cache reading from `repos`, keeping entries for [`DEFAULT_TTL`].
    pub fn new(repos: Arc<dyn RepoStore>) -> Self {
        Self::with_ttl(repos, DEFAULT_TTL)
    }

    /// Create an empty cache reading from `repos`, keeping entries for `ttl`.
    pub fn with_ttl(repos: Arc<dyn RepoStore>, ttl: Duration) -> Self {
        Self {
            repos,
            ttl,
            state: Mutex::new(State::default()),
        }
    }

    /// Return the repository `repo_id`, reading it from the store if it isn't cached or expired.
    pub async fn get(&self, repo_id: i64) -> gix_forge::Result<Repository> {
        {
            let mut state = self.lock();
            let fresh = state
                .entries
                .get(&repo_id)
                .filter(|entry| entry.fetched.elapsed() < self.ttl)
                .map(|entry| entry.repo.clone());
            if let Some(repo) = fresh {
                state.stats.hits += 1;
                return Ok(repo);
            }
            state.stats.misses += 1;
            let ttl = self.ttl;
            state.entries.retain(|_, entry| entry.fetched.elapsed() < ttl);
        }

        let repo = self.repos.find(repo_id).await?;
        self.lock().entries.insert(
            repo_id,
            Entry {
                repo: repo.clone(),
                fetched: Instant::now(),
            },
        );
        Ok(repo)
    }

    /// Forget `repo_id`, for instance after its default branch changed.
    pub fn invalidate(&self, repo_id: i64) {
        self.lock().entries.remove(&repo_id);
    }

    /// The number of cached entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of hits and misses so far.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
