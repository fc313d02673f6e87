//! Evaluation of a pull request against its protection policy.

use std::collections::BTreeSet;

use gix_forge::{CheckResult, CheckStatus, PrincipalInfo, PullReq, ReviewDecision, Reviewer};

use crate::codeowners::{CodeOwnerEvaluation, PatternDecision};
use crate::rules::{MergeMethod, SanitizedPolicy};
use crate::violations::RuleViolations;

/// Stable violation codes.
pub mod code {
    /// Fewer qualifying approvals than required.
    pub const APPROVALS_MIN_COUNT: &str = "pullreq.approvals.require_minimum_count";
    /// Fewer approvals of the latest commit than required.
    pub const APPROVALS_MIN_COUNT_LATEST: &str = "pullreq.approvals.require_minimum_count:latest_commit";
    /// A reviewer requested changes on the current source commit.
    pub const APPROVALS_CHANGE_REQUESTED: &str = "pullreq.approvals.require_change_requested";
    /// A reviewer requested changes on an older source commit.
    pub const APPROVALS_CHANGE_REQUESTED_OLD_SHA: &str = "pullreq.approvals.require_change_requested_old_SHA";
    /// No code owner of a pattern approved yet.
    pub const CODE_OWNERS_NO_APPROVAL: &str = "pullreq.approvals.require_code_owners:no_approval";
    /// A code owner of a pattern requested changes.
    pub const CODE_OWNERS_CHANGE_REQUESTED: &str = "pullreq.approvals.require_code_owners:change_requested";
    /// No code owner of a pattern approved the current source commit.
    pub const CODE_OWNERS_NO_LATEST_APPROVAL: &str = "pullreq.approvals.require_code_owners:no_latest_approval";
    /// There are unresolved comments.
    pub const COMMENTS_RESOLVE_ALL: &str = "pullreq.comments.require_resolve_all";
    /// Required status checks did not succeed.
    pub const STATUS_CHECKS_IDENTIFIERS: &str = "pullreq.status_checks.required_identifiers";
    /// The requested merge method is not allowed.
    pub const MERGE_STRATEGIES_ALLOWED: &str = "pullreq.merge.strategies_allowed";
}

/// A consistent snapshot of everything a merge decision depends on.
///
/// Callers read it within one storage transaction; the verifier does not check freshness.
#[derive(Debug, Clone, Copy)]
pub struct MergeVerifyInput<'a> {
    /// The pull request to merge.
    pub pull_req: &'a PullReq,
    /// All reviewers of the pull request.
    pub reviewers: &'a [Reviewer],
    /// The code owner evaluation, only consulted if the policy requires code owners.
    /// `None` is treated like an evaluation without entries.
    pub code_owners: Option<&'a CodeOwnerEvaluation>,
    /// Status check results reported for the source commit.
    pub check_results: &'a [CheckResult],
    /// The merge method requested by the user, if any.
    pub method: Option<MergeMethod>,
}

/// What the policy implies for the merge, independent of violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MergeVerifyOutput {
    /// Whether the source branch is to be deleted after merging.
    pub delete_source_branch: bool,
    /// The merge methods the user may choose from, only filled if no method was requested.
    pub allowed_methods: Vec<MergeMethod>,
    /// The reviewers whose approvals qualified.
    pub approved_by: Vec<PrincipalInfo>,
}

/// Evaluate whether and how a pull request may be merged.
pub trait MergeVerifier {
    /// Run all checks against `input`, collecting every violation.
    ///
    /// Never fails: absent reviewers or check results are valid states which may produce violations.
    fn merge_verify(&self, input: &MergeVerifyInput<'_>) -> (MergeVerifyOutput, RuleViolations);

    /// The identifiers of all status checks that gate merging, irrespective of current results.
    fn required_checks(&self) -> BTreeSet<String>;
}

impl MergeVerifier for SanitizedPolicy {
    fn merge_verify(&self, input: &MergeVerifyInput<'_>) -> (MergeVerifyOutput, RuleViolations) {
        let mut violations = RuleViolations::new();
        let pr = input.pull_req;
        let source_sha = Some(pr.source_sha);
        let approvals = &self.approvals;

        let mut out = MergeVerifyOutput {
            delete_source_branch: self.merge.delete_branch,
            ..Default::default()
        };

        for reviewer in input.reviewers {
            match reviewer.review_decision {
                ReviewDecision::Approved => {
                    if approvals.require_latest_commit && reviewer.sha != source_sha {
                        continue;
                    }
                    out.approved_by.push(reviewer.reviewer.clone());
                }
                ReviewDecision::ChangeRequested if approvals.require_no_change_request => {
                    let name = &reviewer.reviewer.display_name;
                    if reviewer.sha == source_sha {
                        violations.add(code::APPROVALS_CHANGE_REQUESTED, format!("Reviewer {name} requested changes"));
                    } else {
                        violations.add(
                            code::APPROVALS_CHANGE_REQUESTED_OLD_SHA,
                            format!("Reviewer {name} requested changes for an older commit"),
                        );
                    }
                }
                ReviewDecision::ChangeRequested | ReviewDecision::Pending | ReviewDecision::Reviewed => {}
            }
        }

        let have = out.approved_by.len();
        let need = approvals.require_minimum_count as usize;
        if have < need {
            if approvals.require_latest_commit {
                violations.add(
                    code::APPROVALS_MIN_COUNT_LATEST,
                    format!("Insufficient number of approvals of the latest commit. Have {have} but need at least {need}."),
                );
            } else {
                violations.add(
                    code::APPROVALS_MIN_COUNT,
                    format!("Insufficient number of approvals. Have {have} but need at least {need}."),
                );
            }
        }

        if approvals.require_code_owners {
            for entry in input.code_owners.into_iter().flat_map(|c| c.entries.iter()) {
                let pattern = &entry.pattern;
                match entry.decision() {
                    PatternDecision::Pending => violations.add(
                        code::CODE_OWNERS_NO_APPROVAL,
                        format!("Code owners approval pending for {pattern:?}"),
                    ),
                    PatternDecision::ChangeRequested => violations.add(
                        code::CODE_OWNERS_CHANGE_REQUESTED,
                        format!("Code owners requested changes for {pattern:?}"),
                    ),
                    PatternDecision::Approved(approvers) => {
                        if approvals.require_latest_commit && !approvers.iter().any(|a| a.review_sha == source_sha) {
                            violations.add(
                                code::CODE_OWNERS_NO_LATEST_APPROVAL,
                                format!("Code owners approval pending on latest commit for {pattern:?}"),
                            );
                        }
                    }
                }
            }
        }

        if self.comments.require_resolve_all && pr.unresolved_count > 0 {
            violations.add(
                code::COMMENTS_RESOLVE_ALL,
                format!(
                    "All comments must be resolved. There are {} unresolved comments.",
                    pr.unresolved_count
                ),
            );
        }

        let failing: Vec<&str> = self
            .status_checks
            .require_identifiers
            .iter()
            .filter(|required| {
                !input
                    .check_results
                    .iter()
                    .any(|r| &r.identifier == *required && r.status == CheckStatus::Success)
            })
            .map(String::as_str)
            .collect();
        if !failing.is_empty() {
            violations.add(
                code::STATUS_CHECKS_IDENTIFIERS,
                format!(
                    "The following status checks are required to be completed successfully: {}",
                    failing.join(", ")
                ),
            );
        }

        let allowed = &self.merge.strategies_allowed;
        match input.method {
            None if allowed.is_empty() => out.allowed_methods = MergeMethod::ALL.to_vec(),
            None => out.allowed_methods.clone_from(allowed),
            Some(method) if !allowed.is_empty() && !allowed.contains(&method) => {
                let names: Vec<_> = allowed.iter().map(|m| m.as_str()).collect();
                violations.add(
                    code::MERGE_STRATEGIES_ALLOWED,
                    format!(
                        "The requested merge strategy {:?} is not allowed. Allowed strategies are [{}].",
                        method.as_str(),
                        names.join(" ")
                    ),
                );
            }
            Some(_) => {}
        }

        (out, violations)
    }

    fn required_checks(&self) -> BTreeSet<String> {
        self.status_checks.require_identifiers.iter().cloned().collect()
    }
}
