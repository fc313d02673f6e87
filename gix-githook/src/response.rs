//! The synchronous hook response shown to the person pushing.

use gix_forge::{Order, PullReq, PullReqFilter, PullReqSort, PullReqState, PullReqStore, RefUpdate, Repository, UrlProvider};

/// Plain-text messages appended to the output of `git push`, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookOutput {
    /// One line per message.
    pub messages: Vec<String>,
}

impl HookOutput {
    /// Returns true if there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// The branch to suggest pull requests for, if `updates` qualify.
///
/// Only a push of exactly one branch that is created or updated qualifies, and never a push
/// to the default branch of `repo`.
pub fn suggestion_branch<'a>(repo: &Repository, updates: &'a [RefUpdate]) -> Option<&'a str> {
    let [update] = updates else {
        return None;
    };
    let branch = update.branch_name()?;
    if update.is_delete() || branch == repo.default_branch {
        return None;
    }
    Some(branch)
}

/// Suggest pull requests for the pushed `branch` of `repo`: list up to `limit` open ones that
/// originate from it, or point to the page creating a new one.
///
/// A failed lookup is logged and produces no messages.
pub async fn suggest_pull_requests(
    pull_reqs: &dyn PullReqStore,
    urls: &dyn UrlProvider,
    repo: &Repository,
    branch: &str,
    limit: u32,
) -> Vec<String> {
    let filter = PullReqFilter::default()
        .with_source(repo.id, branch)
        .with_states([PullReqState::Open])
        .with_page(1, limit)
        .sorted_by(PullReqSort::Created, Order::Asc);
    match pull_reqs.list(&filter).await {
        Ok(prs) if prs.is_empty() => new_pull_request_messages(urls, repo, branch),
        Ok(prs) => open_pull_requests_messages(urls, repo, branch, &prs),
        Err(err) => {
            tracing::warn!(
                repo_id = repo.id,
                branch,
                error = %err,
                "failed to find pull requests for branch '{branch}' originating from repo '{}'",
                repo.path
            );
            Vec::new()
        }
    }
}

fn open_pull_requests_messages(urls: &dyn UrlProvider, repo: &Repository, branch: &str, prs: &[PullReq]) -> Vec<String> {
    let mut out = Vec::with_capacity(2 * prs.len() + 1);
    out.push(format!("Branch {branch:?} has open PRs:"));
    for pr in prs {
        out.push(format!("  (#{}) {}", pr.number, pr.title));
        out.push(format!("    {}", urls.pull_request_url(&repo.path, pr.number)));
    }
    out
}

fn new_pull_request_messages(urls: &dyn UrlProvider, repo: &Repository, branch: &str) -> Vec<String> {
    vec![
        format!("Create a new PR for branch {branch:?}"),
        format!("  {}", urls.compare_url(&repo.path, &repo.default_branch, branch)),
    ]
}
