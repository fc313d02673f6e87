//! Errors raised when a protection policy is written.

use gix_forge::Kind;

/// The part of a pull request policy an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// `approvals`
    Approvals,
    /// `status_checks`
    StatusChecks,
    /// `merge`
    Merge,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Section::Approvals => "approvals",
            Section::StatusChecks => "status checks",
            Section::Merge => "merge",
        })
    }
}

/// A policy was rejected at write time.
///
/// Evaluation never fails: a policy that made it past [`PullReqPolicy::sanitize()`][crate::PullReqPolicy::sanitize()]
/// is structurally valid.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A sub-policy holds an invalid combination of values.
    #[error("{section}: {message}")]
    Invalid {
        /// The offending sub-policy.
        section: Section,
        /// What is wrong with it.
        message: String,
    },
    /// The policy document could not be decoded.
    #[error("failed to decode policy")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(section: Section, message: impl Into<String>) -> Self {
        Error::Invalid {
            section,
            message: message.into(),
        }
    }

    /// All policy errors are validation failures.
    pub fn kind(&self) -> Kind {
        Kind::Validation
    }
}
