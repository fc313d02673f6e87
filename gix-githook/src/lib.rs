//! gix-githook: Post-receive handling for gitoxide-based forges.
//!
//! After a push was applied, the git server calls the post-receive hook with all reference
//! updates. The [`PostReceiveHandler`]
//!
//! - classifies them into typed [`GitEvent`][gix_forge::GitEvent]s and publishes those without
//!   blocking (see [`classify()`]),
//! - and, for a push of a single branch, tells the pusher about its open pull requests or how to
//!   create one (see [`response`]).
//!
//! The remote client waits for the hook to finish, so nothing here retries or blocks on
//! consumers.
#![deny(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod classify;
mod error;
pub mod input;
mod post_receive;
pub mod response;

pub use classify::{classify, RefKind};
pub use error::Error;
pub use input::{parse_ref_updates, PostReceiveInput};
pub use post_receive::PostReceiveHandler;
pub use response::HookOutput;
