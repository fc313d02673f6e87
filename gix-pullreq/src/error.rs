//! Errors of pull request lifecycle operations.

use gix_forge::Kind;

/// Result type alias for pull request operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors of pull request lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The repository a pull request event refers to could not be resolved.
    #[error("failed to get repo git info")]
    RepoGitInfo(#[source] gix_forge::Error),
    /// The pull request head reference could not be written.
    #[error("failed to update PR head ref{context}")]
    HeadRef {
        /// What triggered the update, empty for creation.
        context: &'static str,
        /// The backend error, a conflict if another writer won.
        #[source]
        source: gix_forge::Error,
    },
    /// The requested change was rejected.
    #[error("{0}")]
    Validation(String),
    /// A forge capability failed.
    #[error(transparent)]
    Forge(#[from] gix_forge::Error),
}

impl Error {
    /// Fast classification helper returning a stable error kind.
    pub fn kind(&self) -> Kind {
        match self {
            Error::RepoGitInfo(err) | Error::HeadRef { source: err, .. } | Error::Forge(err) => err.kind(),
            Error::Validation(_) => Kind::Validation,
        }
    }

    /// Returns true if a concurrent writer won.
    pub fn is_conflict(&self) -> bool {
        self.kind() == Kind::Conflict
    }
}
