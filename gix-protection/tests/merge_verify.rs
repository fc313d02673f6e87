//! Merge verification against sanitized policies.

use gix_forge::{CheckResult, CheckStatus, ObjectId, PrincipalInfo, PullReq, PullReqState, ReviewDecision, Reviewer};
use gix_protection::{
    code, CodeOwnerEvaluation, EvaluationEntry, MergeMethod, MergeVerifier, MergeVerifyInput, OwnerEvaluation,
    PullReqPolicy, SanitizedPolicy, UserGroupOwnerEvaluation,
};
use pretty_assertions::assert_eq;

mod util {
    use super::*;

    pub fn oid(n: u8) -> ObjectId {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        ObjectId::from_bytes_or_panic(&bytes)
    }

    pub const CURRENT: u8 = 2;
    pub const OLD: u8 = 1;

    pub fn pull_req() -> PullReq {
        PullReq {
            id: 10,
            number: 1,
            version: 1,
            created: 0,
            edited: 0,
            state: PullReqState::Open,
            title: "Add feature".into(),
            description: String::new(),
            source_repo_id: 1,
            source_branch: "feature".into(),
            source_sha: oid(CURRENT),
            target_repo_id: 1,
            target_branch: "main".into(),
            activity_seq: 0,
            unresolved_count: 0,
        }
    }

    pub fn reviewer(id: i64, decision: ReviewDecision, sha: u8) -> Reviewer {
        Reviewer::new(
            10,
            PrincipalInfo::new(id, format!("user{id}")).with_display_name(format!("User {id}")),
            decision,
            Some(oid(sha)),
        )
    }

    pub fn owner(id: i64, decision: ReviewDecision, sha: u8) -> OwnerEvaluation {
        OwnerEvaluation {
            owner: PrincipalInfo::new(id, format!("owner{id}")),
            review_decision: decision,
            review_sha: Some(oid(sha)),
        }
    }

    pub fn sanitized(f: impl FnOnce(&mut PullReqPolicy)) -> SanitizedPolicy {
        let mut policy = PullReqPolicy::default();
        f(&mut policy);
        policy.sanitize().expect("test policies are valid")
    }

    pub fn input<'a>(pr: &'a PullReq, reviewers: &'a [Reviewer]) -> MergeVerifyInput<'a> {
        MergeVerifyInput {
            pull_req: pr,
            reviewers,
            code_owners: None,
            check_results: &[],
            method: None,
        }
    }
}
use util::*;

#[test]
fn empty_policy_allows_everything() {
    let policy = sanitized(|_| {});
    let pr = pull_req();
    let (out, violations) = policy.merge_verify(&input(&pr, &[]));
    assert!(violations.is_empty());
    assert_eq!(out.allowed_methods, MergeMethod::ALL.to_vec());
    assert!(!out.delete_source_branch);
    assert!(policy.required_checks().is_empty());
}

#[test]
fn minimum_count_boundary() {
    for n in 1..=5u8 {
        let policy = sanitized(|p| p.approvals.require_minimum_count = u32::from(n));
        let pr = pull_req();

        let below: Vec<_> = (1..n).map(|i| reviewer(i64::from(i), ReviewDecision::Approved, CURRENT)).collect();
        let (out, violations) = policy.merge_verify(&input(&pr, &below));
        assert_eq!(violations.codes().collect::<Vec<_>>(), [code::APPROVALS_MIN_COUNT], "n = {n}");
        assert_eq!(out.approved_by.len(), usize::from(n - 1));

        let exact: Vec<_> = (1..=n).map(|i| reviewer(i64::from(i), ReviewDecision::Approved, CURRENT)).collect();
        let (out, violations) = policy.merge_verify(&input(&pr, &exact));
        assert!(violations.is_empty(), "n = {n}: {violations:?}");
        assert_eq!(out.approved_by.len(), usize::from(n));
    }
}

#[test]
fn minimum_count_message() {
    let policy = sanitized(|p| p.approvals.require_minimum_count = 2);
    let pr = pull_req();
    let (_, violations) = policy.merge_verify(&input(&pr, &[reviewer(1, ReviewDecision::Approved, OLD)]));
    assert_eq!(
        violations.violations[0].message,
        "Insufficient number of approvals. Have 1 but need at least 2."
    );
}

#[test]
fn stale_approvals_never_count_with_latest_commit_required() {
    let policy = sanitized(|p| {
        p.approvals.require_minimum_count = 2;
        p.approvals.require_latest_commit = true;
    });
    let pr = pull_req();
    let reviewers = [
        reviewer(1, ReviewDecision::Approved, OLD),
        reviewer(2, ReviewDecision::Approved, CURRENT),
        reviewer(3, ReviewDecision::Approved, 7),
    ];
    let (out, violations) = policy.merge_verify(&input(&pr, &reviewers));
    assert_eq!(out.approved_by, vec![reviewers[1].reviewer.clone()]);
    assert_eq!(violations.codes().collect::<Vec<_>>(), [code::APPROVALS_MIN_COUNT_LATEST]);
    assert_eq!(
        violations.violations[0].message,
        "Insufficient number of approvals of the latest commit. Have 1 but need at least 2."
    );
}

#[test]
fn scenario_stale_approval_counts_without_latest_commit() {
    let policy = sanitized(|p| p.approvals.require_minimum_count = 1);
    let pr = pull_req();
    let (out, violations) = policy.merge_verify(&input(&pr, &[reviewer(1, ReviewDecision::Approved, OLD)]));
    assert!(violations.is_empty());
    assert_eq!(out.approved_by.len(), 1);
}

#[test]
fn scenario_stale_approval_rejected_with_latest_commit() {
    let policy = sanitized(|p| {
        p.approvals.require_minimum_count = 1;
        p.approvals.require_latest_commit = true;
    });
    let pr = pull_req();
    let (out, violations) = policy.merge_verify(&input(&pr, &[reviewer(1, ReviewDecision::Approved, OLD)]));
    assert_eq!(violations.codes().collect::<Vec<_>>(), [code::APPROVALS_MIN_COUNT_LATEST]);
    assert_eq!(out.approved_by.len(), 0);
}

#[test]
fn change_requests_distinguish_current_and_old_commits() {
    let pr = pull_req();
    let reviewers = [
        reviewer(1, ReviewDecision::ChangeRequested, CURRENT),
        reviewer(2, ReviewDecision::ChangeRequested, OLD),
        reviewer(3, ReviewDecision::Reviewed, CURRENT),
    ];

    let lenient = sanitized(|_| {});
    assert!(lenient.merge_verify(&input(&pr, &reviewers)).1.is_empty());

    let strict = sanitized(|p| p.approvals.require_no_change_request = true);
    let (_, violations) = strict.merge_verify(&input(&pr, &reviewers));
    assert_eq!(
        violations.codes().collect::<Vec<_>>(),
        [code::APPROVALS_CHANGE_REQUESTED, code::APPROVALS_CHANGE_REQUESTED_OLD_SHA]
    );
    assert_eq!(violations.violations[0].message, "Reviewer User 1 requested changes");
    assert_eq!(
        violations.violations[1].message,
        "Reviewer User 2 requested changes for an older commit"
    );
}

#[test]
fn code_owner_patterns() {
    let policy = sanitized(|p| {
        p.approvals.require_code_owners = true;
        p.approvals.require_latest_commit = true;
    });
    let pr = pull_req();
    let entry = |pattern: &str, owners: Vec<OwnerEvaluation>, members: Vec<OwnerEvaluation>| EvaluationEntry {
        line_number: 1,
        pattern: pattern.into(),
        owner_evaluations: owners,
        user_group_owner_evaluations: vec![UserGroupOwnerEvaluation {
            identifier: "devs".into(),
            name: "Developers".into(),
            evaluations: members,
        }],
    };
    let owners = CodeOwnerEvaluation {
        entries: vec![
            entry("/docs", vec![owner(1, ReviewDecision::Pending, CURRENT)], vec![]),
            entry(
                "/src",
                vec![owner(1, ReviewDecision::Approved, CURRENT), owner(2, ReviewDecision::Approved, CURRENT)],
                vec![owner(3, ReviewDecision::ChangeRequested, OLD)],
            ),
            entry("/ci", vec![], vec![owner(4, ReviewDecision::Approved, OLD)]),
            entry("/lib", vec![owner(5, ReviewDecision::Approved, OLD)], vec![owner(6, ReviewDecision::Approved, CURRENT)]),
        ],
    };

    let (_, violations) = policy.merge_verify(&MergeVerifyInput {
        code_owners: Some(&owners),
        ..input(&pr, &[])
    });
    assert_eq!(
        violations.codes().collect::<Vec<_>>(),
        [
            code::CODE_OWNERS_NO_APPROVAL,
            code::CODE_OWNERS_CHANGE_REQUESTED,
            code::CODE_OWNERS_NO_LATEST_APPROVAL
        ]
    );
    let messages: Vec<_> = violations.violations.iter().map(|v| v.message.as_str()).collect();
    assert_eq!(
        messages,
        [
            "Code owners approval pending for \"/docs\"",
            "Code owners requested changes for \"/src\"",
            "Code owners approval pending on latest commit for \"/ci\"",
        ]
    );
}

#[test]
fn code_owners_are_ignored_unless_required() {
    let policy = sanitized(|_| {});
    let pr = pull_req();
    let owners = CodeOwnerEvaluation {
        entries: vec![EvaluationEntry {
            pattern: "*".into(),
            owner_evaluations: vec![owner(1, ReviewDecision::ChangeRequested, CURRENT)],
            ..Default::default()
        }],
    };
    let (_, violations) = policy.merge_verify(&MergeVerifyInput {
        code_owners: Some(&owners),
        ..input(&pr, &[])
    });
    assert!(violations.is_empty());
}

#[test]
fn unresolved_comments() {
    let policy = sanitized(|p| p.comments.require_resolve_all = true);
    let mut pr = pull_req();
    assert!(policy.merge_verify(&input(&pr, &[])).1.is_empty());

    pr.unresolved_count = 3;
    let (_, violations) = policy.merge_verify(&input(&pr, &[]));
    assert_eq!(
        violations.violations[0].message,
        "All comments must be resolved. There are 3 unresolved comments."
    );
}

#[test]
fn missing_status_checks_are_reported_together() {
    let policy = sanitized(|p| {
        p.status_checks.require_identifiers = vec!["build".into(), "lint".into(), "test".into()];
    });
    let pr = pull_req();
    let results = [
        CheckResult::new("build", CheckStatus::Success),
        CheckResult::new("lint", CheckStatus::Failure),
        CheckResult::new("unrelated", CheckStatus::Success),
    ];
    let (_, violations) = policy.merge_verify(&MergeVerifyInput {
        check_results: &results,
        ..input(&pr, &[])
    });
    assert_eq!(violations.len(), 1);
    assert_eq!(violations.violations[0].code, code::STATUS_CHECKS_IDENTIFIERS);
    assert_eq!(
        violations.violations[0].message,
        "The following status checks are required to be completed successfully: lint, test"
    );
    assert_eq!(
        policy.required_checks().into_iter().collect::<Vec<_>>(),
        ["build", "lint", "test"]
    );
}

#[test]
fn any_successful_result_satisfies_a_check() {
    let policy = sanitized(|p| p.status_checks.require_identifiers = vec!["build".into()]);
    let pr = pull_req();
    let results = [
        CheckResult::new("build", CheckStatus::Failure),
        CheckResult::new("build", CheckStatus::Success),
    ];
    let (_, violations) = policy.merge_verify(&MergeVerifyInput {
        check_results: &results,
        ..input(&pr, &[])
    });
    assert!(violations.is_empty());
}

#[test]
fn merge_methods() {
    let policy = sanitized(|p| {
        p.merge.strategies_allowed = vec![MergeMethod::Squash, MergeMethod::Merge];
        p.merge.delete_branch = true;
    });
    let pr = pull_req();

    let (out, violations) = policy.merge_verify(&input(&pr, &[]));
    assert!(violations.is_empty());
    assert_eq!(out.allowed_methods, [MergeMethod::Merge, MergeMethod::Squash]);
    assert!(out.delete_source_branch);

    let (out, violations) = policy.merge_verify(&MergeVerifyInput {
        method: Some(MergeMethod::Squash),
        ..input(&pr, &[])
    });
    assert!(violations.is_empty());
    assert!(out.allowed_methods.is_empty());

    let (out, violations) = policy.merge_verify(&MergeVerifyInput {
        method: Some(MergeMethod::Rebase),
        ..input(&pr, &[])
    });
    assert_eq!(
        violations.violations[0].message,
        "The requested merge strategy \"rebase\" is not allowed. Allowed strategies are [merge squash]."
    );
    assert!(out.delete_source_branch, "independent of violations");

    let unrestricted = sanitized(|_| {});
    let (_, violations) = unrestricted.merge_verify(&MergeVerifyInput {
        method: Some(MergeMethod::FastForward),
        ..input(&pr, &[])
    });
    assert!(violations.is_empty());
}

#[test]
fn violations_accumulate_without_short_circuit() {
    let policy = sanitized(|p| {
        p.approvals.require_minimum_count = 1;
        p.approvals.require_no_change_request = true;
        p.comments.require_resolve_all = true;
        p.status_checks.require_identifiers = vec!["build".into()];
        p.merge.strategies_allowed = vec![MergeMethod::Merge];
    });
    let mut pr = pull_req();
    pr.unresolved_count = 1;
    let reviewers = [reviewer(1, ReviewDecision::ChangeRequested, CURRENT)];
    let (_, violations) = policy.merge_verify(&MergeVerifyInput {
        method: Some(MergeMethod::Squash),
        ..input(&pr, &reviewers)
    });
    assert_eq!(
        violations.codes().collect::<Vec<_>>(),
        [
            code::APPROVALS_CHANGE_REQUESTED,
            code::APPROVALS_MIN_COUNT,
            code::COMMENTS_RESOLVE_ALL,
            code::STATUS_CHECKS_IDENTIFIERS,
            code::MERGE_STRATEGIES_ALLOWED,
        ]
    );
    assert!(violations.is_critical());
    assert!(!violations.with_bypass(true).is_critical());
}
