//! gix-pullreq: Pull request lifecycle for gitoxide-based forges.
//!
//! - [`HeadRefSync`] keeps `refs/pullreq/<number>/head` in line with the source branch, driven by
//!   [`PullReqEvent`][gix_forge::PullReqEvent]s which [`Workers`] consume concurrently.
//! - [`update_pull_request()`] edits title and description through the optimistic lock of the
//!   pull request store.
//! - [`StateController`] closes and reopens pull requests.
#![deny(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod cache;
mod error;
pub mod head_ref;
mod state;
mod update;
mod worker;

pub use cache::{CacheStats, RepoGitInfoCache};
pub use error::{Error, Result};
pub use head_ref::HeadRefSync;
pub use state::StateController;
pub use update::{update_pull_request, UpdateInput};
pub use worker::Workers;
