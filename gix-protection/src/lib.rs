//! gix-protection: Branch protection for pull requests.
//!
//! A [`PullReqPolicy`] describes what must hold before a pull request may be merged: approvals,
//! resolved comments, successful status checks and allowed merge methods. Policies are
//! sanitized once when written, producing a [`SanitizedPolicy`] which implements the
//! [`MergeVerifier`].
//!
//! Verification is a pure function of its input. It never short-circuits: every violated
//! requirement is reported in the resulting [`RuleViolations`]. Whether violations may be
//! bypassed is decided by the caller, see [`RuleViolations::with_bypass()`].
//!
//! ```
//! use gix_protection::{MergeMethod, SanitizedPolicy};
//!
//! let policy = SanitizedPolicy::from_json(
//!     r#"{"approvals":{"require_minimum_count":2},"merge":{"strategies_allowed":["squash","merge"]}}"#,
//! )?;
//! assert_eq!(policy.merge.strategies_allowed, [MergeMethod::Merge, MergeMethod::Squash]);
//! # Ok::<_, gix_protection::Error>(())
//! ```
#![deny(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod codeowners;
pub mod error;
pub mod rules;
pub mod verify;
pub mod violations;

pub use codeowners::{CodeOwnerEvaluation, EvaluationEntry, OwnerEvaluation, PatternDecision, UserGroupOwnerEvaluation};
pub use error::{Error, Section};
pub use rules::{Approvals, Comments, Merge, MergeMethod, PullReqPolicy, SanitizedPolicy, StatusChecks};
pub use verify::{code, MergeVerifier, MergeVerifyInput, MergeVerifyOutput};
pub use violations::{RuleViolations, Violation};
