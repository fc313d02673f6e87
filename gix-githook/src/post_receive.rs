//! The post-receive hook handler.

use std::sync::Arc;

use gix_forge::{ForgeConfig, GitBackend, GitEvent, PullReqStore, RepoStore, Reporter, UrlProvider};

use crate::input::PostReceiveInput;
use crate::response::{suggest_pull_requests, suggestion_branch, HookOutput};
use crate::{classify, Error};

/// Handles the post-receive hook of pushes, after all reference updates were applied.
///
/// Reporting events and suggesting pull requests are best-effort: their failures are logged and
/// never fail the hook, as the push already succeeded.
pub struct PostReceiveHandler {
    git: Arc<dyn GitBackend>,
    pull_reqs: Arc<dyn PullReqStore>,
    repos: Arc<dyn RepoStore>,
    urls: Arc<dyn UrlProvider>,
    reporter: Reporter<GitEvent>,
    suggest_pull_requests: bool,
    max_suggested_pull_requests: u32,
}

impl PostReceiveHandler {
    /// Create a handler publishing git events to `reporter`, configured by `config`.
    pub fn new(
        git: Arc<dyn GitBackend>,
        pull_reqs: Arc<dyn PullReqStore>,
        repos: Arc<dyn RepoStore>,
        reporter: Reporter<GitEvent>,
        config: &ForgeConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            git,
            pull_reqs,
            repos,
            urls: Arc::new(config.url_provider()?),
            reporter,
            suggest_pull_requests: config.suggest_pull_requests,
            max_suggested_pull_requests: config.max_suggested_pull_requests.max(1),
        })
    }

    /// Use `urls` to generate the urls shown in suggestions.
    pub fn with_url_provider(mut self, urls: Arc<dyn UrlProvider>) -> Self {
        self.urls = urls;
        self
    }

    /// Report events for all updates of `input` and build the response for the pusher.
    ///
    /// Fails only if the repository can't be found.
    pub async fn post_receive(&self, input: &PostReceiveInput) -> Result<HookOutput, Error> {
        let repo = self.repos.find(input.repo_id).await?;

        let events = classify(self.git.as_ref(), &repo, input.principal_id, &input.ref_updates).await;
        tracing::debug!(
            repo_id = repo.id,
            updates = input.ref_updates.len(),
            events = events.len(),
            "reporting reference events"
        );
        for event in events {
            self.reporter.report(event);
        }

        let mut out = HookOutput::default();
        if !self.suggest_pull_requests {
            return Ok(out);
        }
        if let Some(branch) = suggestion_branch(&repo, &input.ref_updates) {
            out.messages.extend(
                suggest_pull_requests(
                    self.pull_reqs.as_ref(),
                    self.urls.as_ref(),
                    &repo,
                    branch,
                    self.max_suggested_pull_requests,
                )
                .await,
            );
        }
        Ok(out)
    }
}
