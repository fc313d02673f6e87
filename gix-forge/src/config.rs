//! Forge configuration parsed from git-config files.

use std::str::FromStr;
use std::time::Duration;

use bstr::ByteSlice;
use gix_config::File;

use crate::events::{self, Event, EventReader, Reporter};
use crate::urls::UiUrlProvider;
use crate::{Error, Result};

const DEFAULT_UI_URL: &str = "http://localhost:3000";

/// Settings shared by the hook, event and pull request crates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeConfig {
    /// Base url of the web UI, used to build urls shown in hook output.
    pub ui_url: String,
    /// Whether pushes print pull request suggestions.
    pub suggest_pull_requests: bool,
    /// How many open pull requests to list at most for a pushed branch.
    pub max_suggested_pull_requests: u32,
    /// Capacity of each event channel.
    pub event_capacity: usize,
    /// Number of concurrent head-ref synchronizer workers.
    pub head_ref_workers: usize,
    /// How long resolved repository information is reused before it is read again.
    pub repo_cache_ttl: Duration,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            ui_url: DEFAULT_UI_URL.into(),
            suggest_pull_requests: true,
            max_suggested_pull_requests: 2,
            event_capacity: 1024,
            head_ref_workers: 4,
            repo_cache_ttl: Duration::from_secs(300),
        }
    }
}

impl ForgeConfig {
    /// Load configuration from a git config file, using defaults for unset keys.
    ///
    /// Recognized keys:
    /// - `forge.uiUrl` (default: `http://localhost:3000`)
    /// - `githook.suggestPullRequests` (default: true)
    /// - `githook.maxSuggestedPullRequests` (default: 2)
    /// - `events.capacity` (default: 1024)
    /// - `pullreq.headRefWorkers` (default: 4)
    /// - `pullreq.repoCacheTtlSeconds` (default: 300)
    pub fn from_config(config: &File<'_>) -> Result<Self> {
        let mut out = Self::default();

        if let Some(value) = config.string("forge.uiUrl") {
            let value = value
                .to_str()
                .map_err(|_| Error::Validation("'forge.uiUrl' is not valid UTF-8".into()))?;
            out.ui_url = UiUrlProvider::new(value)
                .map_err(|err| match err {
                    Error::Validation(msg) => Error::Validation(format!("'forge.uiUrl': {msg}")),
                    other => other,
                })?
                .base()
                .to_owned();
        }
        if let Some(value) = boolean(config, "githook.suggestPullRequests")? {
            out.suggest_pull_requests = value;
        }
        if let Some(value) = positive(config, "githook.maxSuggestedPullRequests")? {
            out.max_suggested_pull_requests = u32::try_from(value).map_err(|_| {
                Error::Validation(format!(
                    "'githook.maxSuggestedPullRequests' is too large, got: {value}"
                ))
            })?;
        }
        if let Some(value) = positive(config, "events.capacity")? {
            out.event_capacity = value as usize;
        }
        if let Some(value) = positive(config, "pullreq.headRefWorkers")? {
            out.head_ref_workers = value as usize;
        }
        if let Some(value) = positive(config, "pullreq.repoCacheTtlSeconds")? {
            out.repo_cache_ttl = Duration::from_secs(value);
        }

        Ok(out)
    }

    /// The url provider for the configured UI.
    pub fn url_provider(&self) -> Result<UiUrlProvider> {
        UiUrlProvider::new(&self.ui_url)
    }

    /// Create an event channel with the configured capacity.
    pub fn event_channel<T: Event>(&self) -> (Reporter<T>, EventReader<T>) {
        events::channel(self.event_capacity)
    }
}

impl FromStr for ForgeConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let file = File::try_from(s).map_err(|err| Error::Validation(format!("invalid configuration: {err}")))?;
        Self::from_config(&file)
    }
}

fn boolean(config: &File<'_>, key: &str) -> Result<Option<bool>> {
    config
        .boolean(key)
        .transpose()
        .map_err(|err| Error::Validation(format!("invalid boolean value for '{key}': {err}")))
}

fn positive(config: &File<'_>, key: &str) -> Result<Option<u64>> {
    let Some(value) = config
        .integer(key)
        .transpose()
        .map_err(|err| Error::Validation(format!("invalid integer value for '{key}': {err}")))?
    else {
        return Ok(None);
    };
    if value < 1 {
        return Err(Error::Validation(format!("'{key}' must be at least 1, got: {value}")));
    }
    Ok(Some(value as u64))
}
