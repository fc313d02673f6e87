//! gix-forge: Shared pull-request primitives for gitoxide-based forges.
//!
//! This crate provides the building blocks used by `gix-protection`,
//! `gix-githook` and `gix-pullreq`:
//!
//! - the review model ([`PullReq`], [`Reviewer`], [`CheckResult`]) as read from the PR store,
//! - [`RefUpdate`] as observed by the git server's receive path,
//! - the external capabilities this core consumes ([`GitBackend`], [`PullReqStore`], [`RepoStore`]),
//! - typed domain events and the fire-and-forget [`Reporter`],
//! - configuration and UI url generation.
//!
//! Storage engines and the git process layer live outside of this workspace. The
//! [`memory`] module carries in-memory implementations suitable for tests and minimal setups.
#![deny(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod events;
pub mod git;
pub mod memory;
pub mod refs;
pub mod store;
pub mod types;
pub mod urls;

pub use config::ForgeConfig;
pub use error::{Error, Kind, Result};
pub use events::{EventReader, GitEvent, PullReqEvent, Reporter};
pub use git::{GitBackend, RefExpectation, RefType};
pub use refs::RefUpdate;
pub use store::{Order, PullReqFilter, PullReqSort, PullReqStore, RepoStore};
pub use types::{
    CheckResult, CheckStatus, PrincipalInfo, PullReq, PullReqState, Repository, ReviewDecision, Reviewer,
};
pub use urls::{UiUrlProvider, UrlProvider};

/// Re-export of the object id type used for all commit hashes.
pub use gix_hash::ObjectId;
