//! Reference names and the ref updates observed on the receive path.

use gix_hash::ObjectId;

/// Prefix of references of type branch.
pub const BRANCH_PREFIX: &str = "refs/heads/";
/// Prefix of references of type tag.
pub const TAG_PREFIX: &str = "refs/tags/";
/// Prefix of the server-managed pull request references.
pub const PULLREQ_PREFIX: &str = "refs/pullreq/";

/// The all-zero object id used by git to denote "no value" on either side of a ref update.
pub fn nil_sha() -> ObjectId {
    ObjectId::null(gix_hash::Kind::Sha1)
}

/// A single reference mutation as reported by the git server after it was applied.
///
/// Lives only for the duration of one hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RefUpdate {
    /// Fully qualified reference name, like `refs/heads/main`.
    pub name: String,
    /// The previous value, null if the reference was created.
    pub old: ObjectId,
    /// The new value, null if the reference was deleted.
    pub new: ObjectId,
}

impl RefUpdate {
    /// Create a new ref update.
    pub fn new(name: impl Into<String>, old: ObjectId, new: ObjectId) -> Self {
        Self {
            name: name.into(),
            old,
            new,
        }
    }

    /// The reference did not exist before.
    pub fn is_create(&self) -> bool {
        self.old.is_null()
    }

    /// The reference does not exist anymore.
    pub fn is_delete(&self) -> bool {
        self.new.is_null()
    }

    /// The short branch name if this updates a `refs/heads/` reference.
    pub fn branch_name(&self) -> Option<&str> {
        self.name.strip_prefix(BRANCH_PREFIX)
    }

    /// The short tag name if this updates a `refs/tags/` reference.
    pub fn tag_name(&self) -> Option<&str> {
        self.name.strip_prefix(TAG_PREFIX)
    }
}
