//! Error types shared by the forge capabilities.

use gix_hash::ObjectId;

use crate::git::RefExpectation;

/// Result type alias for forge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable high-level error classification for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The requested entity does not exist.
    NotFound,
    /// A concurrent writer won: optimistic-lock version or ref compare-and-swap mismatch.
    Conflict,
    /// Input or configuration was rejected.
    Validation,
    /// The git backend or a store failed for reasons unrelated to the request.
    Backend,
    /// Other unclassified errors.
    Other,
}

impl Kind {
    /// Returns true if the caller may re-read current state and try again.
    ///
    /// Nothing in this workspace retries on its own.
    pub fn is_retryable(self) -> bool {
        matches!(self, Kind::Conflict | Kind::Backend)
    }
}

/// Errors surfaced by the git backend, the PR store and configuration parsing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity does not exist.
    #[error("{what} not found")]
    NotFound {
        /// Human-readable description of what was looked up.
        what: String,
    },

    /// The stored version advanced since the entity was read.
    #[error("version conflict on {what}: expected version {expected}, stored version is {actual}")]
    Conflict {
        /// Human-readable description of the entity.
        what: String,
        /// The version the caller read.
        expected: i64,
        /// The version found in the store.
        actual: i64,
    },

    /// A conditional reference update found an unexpected current value.
    #[error("reference '{name}' expected to be {expected} but is {}", display_actual(.actual))]
    RefConflict {
        /// Fully qualified reference name.
        name: String,
        /// What the caller expected the current value to be.
        expected: RefExpectation,
        /// The actual current value, `None` if the reference does not exist.
        actual: Option<ObjectId>,
    },

    /// Input or configuration validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// The git backend failed.
    #[error("git backend error: {0}")]
    Backend(String),

    /// A store failed.
    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    /// Fast classification helper returning a stable error kind.
    pub fn kind(&self) -> Kind {
        match self {
            Error::NotFound { .. } => Kind::NotFound,
            Error::Conflict { .. } | Error::RefConflict { .. } => Kind::Conflict,
            Error::Validation(_) => Kind::Validation,
            Error::Backend(_) | Error::Store(_) => Kind::Backend,
        }
    }

    /// Convenience for constructing a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }

    /// Returns true if a concurrent writer won.
    pub fn is_conflict(&self) -> bool {
        self.kind() == Kind::Conflict
    }
}

fn display_actual(actual: &Option<ObjectId>) -> String {
    match actual {
        Some(id) => id.to_string(),
        None => "missing".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(Error::not_found("pull request #1").kind(), Kind::NotFound);
        assert_eq!(Error::Validation("x".into()).kind(), Kind::Validation);
        assert_eq!(Error::Backend("x".into()).kind(), Kind::Backend);
        assert_eq!(Error::Store("x".into()).kind(), Kind::Backend);
        let conflict = Error::Conflict {
            what: "pull request #1".into(),
            expected: 1,
            actual: 2,
        };
        assert!(conflict.is_conflict());
        assert!(Kind::Conflict.is_retryable());
        assert!(!Kind::Validation.is_retryable());
    }

    #[test]
    fn ref_conflict_message_names_both_sides() {
        let err = Error::RefConflict {
            name: "refs/pullreq/7/head".into(),
            expected: RefExpectation::Absent,
            actual: None,
        };
        assert_eq!(
            err.to_string(),
            "reference 'refs/pullreq/7/head' expected to be absent but is missing"
        );
    }
}
