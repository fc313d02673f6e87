//! Errors of the post-receive hook.

use gix_forge::Kind;

/// Errors of the post-receive handling.
///
/// Only input and repository lookup failures surface here. Everything that happens after the
/// push was applied is best-effort and merely logged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The hook input could not be parsed.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The hook input was well-formed but invalid.
    #[error("validation error: {0}")]
    Validation(String),
    /// A forge capability failed.
    #[error(transparent)]
    Forge(#[from] gix_forge::Error),
}

impl Error {
    /// Fast classification helper returning a stable error kind.
    pub fn kind(&self) -> Kind {
        match self {
            Error::Protocol(_) | Error::Validation(_) => Kind::Validation,
            Error::Forge(err) => err.kind(),
        }
    }
}
