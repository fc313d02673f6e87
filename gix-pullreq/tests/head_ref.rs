//! Head-ref synchronization against an in-memory git backend.

use std::sync::Arc;
use std::time::Duration;

use gix_forge::events::{self, BranchUpdatedPayload, CreatedPayload, ReopenedPayload};
use gix_forge::memory::{MemoryGit, MemoryRepoStore};
use gix_forge::{ForgeConfig, Kind, ObjectId, PullReqEvent, RepoStore, Repository};
use tokio::sync::Barrier;
use gix_pullreq::{CacheStats, Error, HeadRefSync, Workers};
use pretty_assertions::assert_eq;

const REPO: i64 = 1;
const UID: &str = "git-uid-1";

fn oid(n: u8) -> ObjectId {
    let mut bytes = [0u8; 20];
    bytes[19] = n;
    ObjectId::from_bytes_or_panic(&bytes)
}

fn head_ref(number: i64) -> String {
    format!("refs/pullreq/{number}/head")
}

fn repository(id: i64) -> Repository {
    Repository {
        id,
        git_uid: format!("git-uid-{id}"),
        path: format!("space/repo{id}"),
        default_branch: "main".into(),
    }
}

fn setup() -> (Arc<MemoryGit>, HeadRefSync) {
    let git = Arc::new(MemoryGit::new());
    let repos = MemoryRepoStore::new();
    repos.insert(repository(REPO));
    let sync = HeadRefSync::new(git.clone(), Arc::new(repos));
    (git, sync)
}

/// A store whose lookups only complete once `barrier` is reached by as many lookups at once.
struct RendezvousRepos {
    inner: MemoryRepoStore,
    barrier: Barrier,
}

#[async_trait::async_trait]
impl RepoStore for RendezvousRepos {
    async fn find(&self, repo_id: i64) -> gix_forge::Result<Repository> {
        self.barrier.wait().await;
        self.inner.find(repo_id).await
    }
}

fn created(number: i64, sha: ObjectId) -> PullReqEvent {
    PullReqEvent::Created(CreatedPayload {
        target_repo_id: REPO,
        number,
        source_sha: sha,
    })
}

fn branch_updated(number: i64, old_sha: ObjectId, new_sha: ObjectId) -> PullReqEvent {
    PullReqEvent::BranchUpdated(BranchUpdatedPayload {
        target_repo_id: REPO,
        number,
        old_sha,
        new_sha,
    })
}

fn reopened(number: i64, sha: ObjectId) -> PullReqEvent {
    PullReqEvent::Reopened(ReopenedPayload {
        target_repo_id: REPO,
        number,
        source_sha: sha,
    })
}

#[tokio::test]
async fn created_then_updated_moves_the_head_ref() -> Result<(), Error> {
    let (git, sync) = setup();
    sync.handle(&created(7, oid(1))).await?;
    assert_eq!(git.ref_value(UID, &head_ref(7)), Some(oid(1)));

    sync.handle(&branch_updated(7, oid(1), oid(2))).await?;
    assert_eq!(git.ref_value(UID, &head_ref(7)), Some(oid(2)));
    Ok(())
}

#[tokio::test]
async fn creation_requires_the_head_ref_to_be_absent() -> Result<(), Error> {
    let (git, sync) = setup();
    sync.handle(&created(7, oid(1))).await?;

    let err = sync.handle(&created(7, oid(2))).await.expect_err("already exists");
    assert!(err.is_conflict());
    assert_eq!(err.to_string(), "failed to update PR head ref");
    assert_eq!(git.ref_value(UID, &head_ref(7)), Some(oid(1)));
    Ok(())
}

#[tokio::test]
async fn branch_update_with_stale_old_value_leaves_the_ref_untouched() {
    let (git, sync) = setup();
    git.set_ref(UID, &head_ref(7), oid(3));

    let err = sync
        .handle(&branch_updated(7, oid(1), oid(2)))
        .await
        .expect_err("ref is at 3, not 1");
    assert_eq!(err.kind(), Kind::Conflict);
    assert_eq!(err.to_string(), "failed to update PR head ref after new commit");
    assert_eq!(git.ref_value(UID, &head_ref(7)), Some(oid(3)), "never retried or forced");
}

#[tokio::test]
async fn branch_update_of_missing_head_ref_is_a_conflict() {
    let (git, sync) = setup();
    let err = sync
        .handle(&branch_updated(7, oid(1), oid(2)))
        .await
        .expect_err("nothing to move");
    assert!(err.is_conflict());
    assert_eq!(git.ref_value(UID, &head_ref(7)), None);
}

#[tokio::test]
async fn reopen_overwrites_any_value() -> Result<(), Error> {
    let (git, sync) = setup();
    sync.handle(&reopened(7, oid(1))).await?;
    assert_eq!(git.ref_value(UID, &head_ref(7)), Some(oid(1)), "absent is accepted");

    git.set_ref(UID, &head_ref(7), oid(9));
    sync.handle(&reopened(7, oid(2))).await?;
    assert_eq!(git.ref_value(UID, &head_ref(7)), Some(oid(2)), "unrelated values are replaced");
    Ok(())
}

#[tokio::test]
async fn unknown_target_repository_fails_before_touching_git() {
    let (git, sync) = setup();
    let event = PullReqEvent::Created(CreatedPayload {
        target_repo_id: 99,
        number: 1,
        source_sha: oid(1),
    });

    let err = sync.handle(&event).await.expect_err("no such repo");
    assert!(matches!(err, Error::RepoGitInfo(_)));
    assert_eq!(err.kind(), Kind::NotFound);
    assert_eq!(err.to_string(), "failed to get repo git info");
    assert_eq!(git.ref_value(UID, &head_ref(1)), None);
}

#[tokio::test]
async fn repository_lookups_are_cached() -> Result<(), Error> {
    let (_git, sync) = setup();
    sync.handle(&created(1, oid(1))).await?;
    sync.handle(&created(2, oid(1))).await?;
    sync.handle(&branch_updated(1, oid(1), oid(2))).await?;

    assert_eq!(sync.cache_stats(), CacheStats { hits: 2, misses: 1 });
    Ok(())
}

#[tokio::test]
async fn lookups_of_different_repositories_run_concurrently() -> Result<(), Error> {
    let git = Arc::new(MemoryGit::new());
    let repos = RendezvousRepos {
        inner: MemoryRepoStore::new(),
        barrier: Barrier::new(3),
    };
    for id in 1..=3 {
        repos.inner.insert(repository(id));
    }
    let sync = HeadRefSync::new(git.clone(), Arc::new(repos));
    let created_in = |repo: i64| {
        PullReqEvent::Created(CreatedPayload {
            target_repo_id: repo,
            number: 1,
            source_sha: oid(1),
        })
    };
    let (a, b, c) = (created_in(1), created_in(2), created_in(3));

    let (a, b, c) = tokio::time::timeout(
        Duration::from_secs(10),
        async { tokio::join!(sync.handle(&a), sync.handle(&b), sync.handle(&c)) },
    )
    .await
    .expect("one lookup must not wait for another to finish");
    a?;
    b?;
    c?;

    for id in 1..=3 {
        assert_eq!(git.ref_value(&format!("git-uid-{id}"), &head_ref(1)), Some(oid(1)));
    }
    assert_eq!(sync.cache_stats(), CacheStats { hits: 0, misses: 3 });
    Ok(())
}

#[tokio::test]
async fn configured_workers_and_channel() {
    let config: ForgeConfig = "[events]\ncapacity = 4\n[pullreq]\nheadRefWorkers = 2\nrepoCacheTtlSeconds = 60\n"
        .parse()
        .expect("valid configuration");
    let git = Arc::new(MemoryGit::new());
    let repos = MemoryRepoStore::new();
    repos.insert(repository(REPO));
    let sync = HeadRefSync::from_config(git.clone(), Arc::new(repos), &config);

    let (reporter, reader) = config.event_channel();
    let workers = Workers::from_config(Arc::new(sync), reader, &config);
    assert_eq!(workers.len(), 2);

    for number in 1..=3 {
        reporter.report(created(number, oid(1)));
    }
    drop(reporter);
    workers.join().await;

    for number in 1..=3 {
        assert_eq!(git.ref_value(UID, &head_ref(number)), Some(oid(1)));
    }
}

#[tokio::test]
async fn workers_drain_the_channel_and_stop_when_reporters_are_gone() {
    let (git, sync) = setup();
    let (reporter, reader) = events::channel(8);
    let workers = Workers::spawn(Arc::new(sync), reader, 3);
    assert_eq!(workers.len(), 3);

    for number in 1..=5 {
        reporter.report(created(number, oid(number as u8)));
    }
    // Fails with a conflict, which is logged and doesn't stop the worker.
    reporter.report(branch_updated(1, oid(9), oid(8)));
    drop(reporter);
    workers.join().await;

    for number in 1..=5 {
        assert_eq!(git.ref_value(UID, &head_ref(number)), Some(oid(number as u8)));
    }
}

#[tokio::test]
async fn at_least_one_worker_is_spawned() {
    let (_git, sync) = setup();
    let (reporter, reader) = events::channel::<PullReqEvent>(1);
    let workers = Workers::spawn(Arc::new(sync), reader, 0);
    assert_eq!(workers.len(), 1);
    assert!(!workers.is_empty());

    drop(reporter);
    workers.join().await;
}
