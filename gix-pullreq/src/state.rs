//! Closing and reopening pull requests.

use std::sync::Arc;

use gix_forge::events::ReopenedPayload;
use gix_forge::{
    GitBackend, PullReq, PullReqEvent, PullReqFilter, PullReqState, PullReqStore, RefType, RepoStore, Reporter,
};

use crate::{Error, Result};

/// Performs pull request state transitions and publishes the resulting lifecycle events.
///
/// Merged pull requests are final. Closed ones may be reopened.
pub struct StateController {
    git: Arc<dyn GitBackend>,
    pull_reqs: Arc<dyn PullReqStore>,
    repos: Arc<dyn RepoStore>,
    reporter: Reporter<PullReqEvent>,
}

impl StateController {
    /// Create a new controller.
    pub fn new(
        git: Arc<dyn GitBackend>,
        pull_reqs: Arc<dyn PullReqStore>,
        repos: Arc<dyn RepoStore>,
        reporter: Reporter<PullReqEvent>,
    ) -> Self {
        Self {
            git,
            pull_reqs,
            repos,
            reporter,
        }
    }

    /// Close the open pull request `number` of repository `repo_id`.
    pub async fn close(&self, repo_id: i64, number: i64) -> Result<PullReq> {
        let pr = self.pull_reqs.find_by_number(repo_id, number).await?;
        expect_state(&pr, PullReqState::Open, "close")?;

        let pr = self
            .pull_reqs
            .update_opt_lock(&pr, &mut |pr: &mut PullReq| {
                expect_state(pr, PullReqState::Open, "close").map_err(into_forge)?;
                pr.state = PullReqState::Closed;
                pr.activity_seq += 1;
                Ok(())
            })
            .await?;
        tracing::debug!(repo_id, number, "pull request closed");
        Ok(pr)
    }

    /// Reopen the closed pull request `number` of repository `repo_id`.
    ///
    /// The source commit is refreshed from the source branch, which must still exist. Fails if
    /// another open pull request already proposes the same source branch to the same target branch.
    pub async fn reopen(&self, repo_id: i64, number: i64) -> Result<PullReq> {
        let pr = self.pull_reqs.find_by_number(repo_id, number).await?;
        expect_state(&pr, PullReqState::Closed, "reopen")?;

        let source_repo = self.repos.find(pr.source_repo_id).await?;
        let source_sha = self
            .git
            .get_ref(&source_repo.git_uid, &pr.source_branch, RefType::Branch)
            .await?
            .ok_or_else(|| Error::Validation(format!("source branch '{}' does not exist", pr.source_branch)))?;

        let filter = PullReqFilter::default()
            .with_source(pr.source_repo_id, pr.source_branch.clone())
            .with_target_repo(pr.target_repo_id)
            .with_states([PullReqState::Open]);
        let duplicates = self.pull_reqs.list(&filter).await?;
        if let Some(other) = duplicates
            .iter()
            .find(|other| other.target_branch == pr.target_branch && other.number != pr.number)
        {
            return Err(Error::Validation(format!(
                "pull request #{} for branch '{}' into '{}' is already open",
                other.number, pr.source_branch, pr.target_branch
            )));
        }

        let pr = self
            .pull_reqs
            .update_opt_lock(&pr, &mut |pr: &mut PullReq| {
                expect_state(pr, PullReqState::Closed, "reopen").map_err(into_forge)?;
                pr.state = PullReqState::Open;
                pr.source_sha = source_sha;
                pr.activity_seq += 1;
                Ok(())
            })
            .await?;

        self.reporter.report(PullReqEvent::Reopened(ReopenedPayload {
            target_repo_id: pr.target_repo_id,
            number: pr.number,
            source_sha: pr.source_sha,
        }));
        tracing::debug!(repo_id, number, sha = %pr.source_sha, "pull request reopened");
        Ok(pr)
    }
}

fn expect_state(pr: &PullReq, expected: PullReqState, action: &str) -> Result<()> {
    if pr.state == expected {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "can't {action} pull request #{} in state {}",
            pr.number, pr.state
        )))
    }
}

fn into_forge(err: Error) -> gix_forge::Error {
    match err {
        Error::Forge(err) => err,
        other => gix_forge::Error::Validation(other.to_string()),
    }
}
