//! Generation of UI urls shown to users, for instance in hook output.

use crate::{Error, Result};

/// Produce user-facing urls for pull request related pages.
pub trait UrlProvider: Send + Sync {
    /// The url of pull request `number` in the repository at `repo_path`.
    fn pull_request_url(&self, repo_path: &str, number: i64) -> String;
    /// The url of the page comparing `head` against `base` in the repository at `repo_path`,
    /// from which a new pull request can be created.
    fn compare_url(&self, repo_path: &str, base: &str, head: &str) -> String;
}

/// A [`UrlProvider`] rooted at the base url of the web UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiUrlProvider {
    base: String,
}

impl UiUrlProvider {
    /// Create a provider for the UI at `base_url`, which must be an absolute `http` or `https` url.
    ///
    /// A trailing `/` is ignored.
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = url::Url::parse(base_url.trim())
            .map_err(|err| Error::Validation(format!("invalid UI url '{base_url}': {err}")))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Validation(format!(
                "invalid UI url '{base_url}': expected an absolute http(s) url"
            )));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(Error::Validation(format!(
                "invalid UI url '{base_url}': query and fragment are not allowed"
            )));
        }
        Ok(Self {
            base: parsed.as_str().trim_end_matches('/').to_owned(),
        })
    }

    /// The normalized base url, without trailing `/`.
    pub fn base(&self) -> &str {
        &self.base
    }

    fn repo_url(&self, repo_path: &str) -> String {
        format!("{}/{}", self.base, repo_path.trim_matches('/'))
    }
}

impl UrlProvider for UiUrlProvider {
    fn pull_request_url(&self, repo_path: &str, number: i64) -> String {
        format!("{}/pulls/{number}", self.repo_url(repo_path))
    }

    fn compare_url(&self, repo_path: &str, base: &str, head: &str) -> String {
        format!("{}/pulls/compare/{base}...{head}", self.repo_url(repo_path))
    }
}
