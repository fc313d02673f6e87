//! The branch protection policy for pull requests.
//!
//! A [`PullReqPolicy`] is plain, serializable data. It becomes usable for evaluation only after
//! [`PullReqPolicy::sanitize()`] turned it into a [`SanitizedPolicy`], which happens once when a
//! policy is written or loaded.

use std::collections::HashSet;

use crate::error::{Error, Section};

/// Maximum length of a required status check identifier.
pub const MAX_IDENTIFIER_LEN: usize = 100;

/// A way of merging a pull request into its target branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum MergeMethod {
    Merge,
    Squash,
    Rebase,
    FastForward,
}

impl MergeMethod {
    /// All merge methods, in their canonical order.
    pub const ALL: [MergeMethod; 4] = [
        MergeMethod::FastForward,
        MergeMethod::Merge,
        MergeMethod::Rebase,
        MergeMethod::Squash,
    ];

    /// The name as used in policy documents.
    pub fn as_str(self) -> &'static str {
        match self {
            MergeMethod::Merge => "merge",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "rebase",
            MergeMethod::FastForward => "fast-forward",
        }
    }
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MergeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MergeMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unrecognized merge strategy: {s}"))
    }
}

/// Review requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Approvals {
    /// Every code owner pattern touched by the change must be approved.
    #[serde(skip_serializing_if = "is_false")]
    pub require_code_owners: bool,
    /// The minimum number of qualifying approvals.
    #[serde(skip_serializing_if = "is_zero")]
    pub require_minimum_count: u32,
    /// Only approvals of the current source commit qualify.
    #[serde(skip_serializing_if = "is_false")]
    pub require_latest_commit: bool,
    /// A reviewer requesting changes blocks the merge.
    #[serde(skip_serializing_if = "is_false")]
    pub require_no_change_request: bool,
}

impl Approvals {
    fn sanitize(&self) -> Result<(), Error> {
        if self.require_latest_commit && self.require_minimum_count == 0 && !self.require_code_owners {
            return Err(Error::invalid(
                Section::Approvals,
                "require latest commit can only be used with require code owners or require minimum count",
            ));
        }
        Ok(())
    }
}

/// Comment requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Comments {
    /// All comment threads must be resolved.
    #[serde(skip_serializing_if = "is_false")]
    pub require_resolve_all: bool,
}

/// Status check requirements.
///
/// Decodes from `require_identifiers`, falling back to the legacy `require_uids` key when the
/// former is empty or missing. Both keys are written so older readers keep working.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "StatusChecksRepr", into = "StatusChecksRepr")]
pub struct StatusChecks {
    /// Identifiers of checks which must have succeeded on the source commit.
    pub require_identifiers: Vec<String>,
}

#[derive(Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct StatusChecksRepr {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    require_identifiers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    require_uids: Vec<String>,
}

impl From<StatusChecksRepr> for StatusChecks {
    fn from(repr: StatusChecksRepr) -> Self {
        let require_identifiers = if repr.require_identifiers.is_empty() {
            repr.require_uids
        } else {
            repr.require_identifiers
        };
        StatusChecks { require_identifiers }
    }
}

impl From<StatusChecks> for StatusChecksRepr {
    fn from(checks: StatusChecks) -> Self {
        StatusChecksRepr {
            require_uids: checks.require_identifiers.clone(),
            require_identifiers: checks.require_identifiers,
        }
    }
}

impl StatusChecks {
    fn sanitize(&self) -> Result<(), Error> {
        let invalid = |msg: String| Error::invalid(Section::StatusChecks, format!("required identifiers error: {msg}"));
        let mut seen = HashSet::new();
        for identifier in &self.require_identifiers {
            if identifier.is_empty() {
                return Err(invalid("identifier must not be empty".into()));
            }
            if identifier.trim() != identifier {
                return Err(invalid(format!(
                    "identifier '{identifier}' must not have leading or trailing whitespace"
                )));
            }
            if identifier.len() > MAX_IDENTIFIER_LEN {
                return Err(invalid(format!(
                    "identifier '{identifier}' is longer than {MAX_IDENTIFIER_LEN} characters"
                )));
            }
            if !seen.insert(identifier.as_str()) {
                return Err(invalid(format!("duplicate identifier '{identifier}'")));
            }
        }
        Ok(())
    }
}

/// Merge requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Merge {
    /// The merge methods which may be used. Empty means all are allowed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub strategies_allowed: Vec<MergeMethod>,
    /// Delete the source branch once merged.
    #[serde(skip_serializing_if = "is_false")]
    pub delete_branch: bool,
}

impl Merge {
    fn sanitize(&mut self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        for strategy in &self.strategies_allowed {
            if !seen.insert(*strategy) {
                return Err(Error::invalid(
                    Section::Merge,
                    format!("duplicate entry in merge strategy list: {strategy}"),
                ));
            }
        }
        self.strategies_allowed.sort_by_key(|m| m.as_str());
        Ok(())
    }
}

/// The protection policy applied to pull requests targeting a protected branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PullReqPolicy {
    /// Review requirements.
    pub approvals: Approvals,
    /// Comment requirements.
    pub comments: Comments,
    /// Status check requirements.
    pub status_checks: StatusChecks,
    /// Merge requirements.
    pub merge: Merge,
}

impl PullReqPolicy {
    /// Validate all sub-policies and normalize them for storage and evaluation.
    ///
    /// The first invalid sub-policy is reported, prefixed with its name.
    pub fn sanitize(mut self) -> Result<SanitizedPolicy, Error> {
        self.approvals.sanitize()?;
        self.status_checks.sanitize()?;
        self.merge.sanitize()?;
        Ok(SanitizedPolicy(self))
    }
}

/// A [`PullReqPolicy`] which passed [`PullReqPolicy::sanitize()`] and may be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "PullReqPolicy", into = "PullReqPolicy")]
pub struct SanitizedPolicy(PullReqPolicy);

impl SanitizedPolicy {
    /// Decode a JSON policy document and sanitize it.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str::<PullReqPolicy>(json)?.sanitize()
    }

    /// Encode the policy as JSON document.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Return the underlying policy.
    pub fn into_inner(self) -> PullReqPolicy {
        self.0
    }
}

impl std::ops::Deref for SanitizedPolicy {
    type Target = PullReqPolicy;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<PullReqPolicy> for SanitizedPolicy {
    type Error = Error;

    fn try_from(policy: PullReqPolicy) -> Result<Self, Self::Error> {
        policy.sanitize()
    }
}

impl From<SanitizedPolicy> for PullReqPolicy {
    fn from(policy: SanitizedPolicy) -> Self {
        policy.0
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(v: &bool) -> bool {
    !*v
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(v: &u32) -> bool {
    *v == 0
}
