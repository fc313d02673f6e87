//! Code owner evaluations as produced by an external code owners evaluator, and their
//! aggregation into one decision per ownership pattern.

use gix_forge::{ObjectId, PrincipalInfo, ReviewDecision};

/// The review state of one owner.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OwnerEvaluation {
    /// The owner.
    pub owner: PrincipalInfo,
    /// The owner's latest decision.
    pub review_decision: ReviewDecision,
    /// The source commit the decision was made against.
    pub review_sha: Option<ObjectId>,
}

/// The review states of the members of a user group listed as owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UserGroupOwnerEvaluation {
    /// The group identifier as written in the code owners file.
    pub identifier: String,
    /// Display name of the group.
    pub name: String,
    /// One evaluation per group member.
    pub evaluations: Vec<OwnerEvaluation>,
}

/// The evaluations of all owners of one pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EvaluationEntry {
    /// The line of the pattern within the code owners file.
    pub line_number: i64,
    /// The file pattern.
    pub pattern: String,
    /// Owners listed individually.
    pub owner_evaluations: Vec<OwnerEvaluation>,
    /// Owners listed as groups.
    pub user_group_owner_evaluations: Vec<UserGroupOwnerEvaluation>,
}

/// The code owner evaluation of a pull request: one entry per pattern matching a changed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CodeOwnerEvaluation {
    /// Entries in code owners file order.
    pub entries: Vec<EvaluationEntry>,
}

/// The aggregate decision of all owners of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternDecision<'a> {
    /// At least one owner approved and nobody requested changes.
    Approved(Vec<&'a OwnerEvaluation>),
    /// An owner, individual or group member, requested changes.
    ChangeRequested,
    /// No owner decided yet.
    Pending,
}

impl EvaluationEntry {
    /// All evaluations of this pattern: individual owners first, then group members.
    pub fn evaluations(&self) -> impl Iterator<Item = &OwnerEvaluation> + '_ {
        self.owner_evaluations
            .iter()
            .chain(self.user_group_owner_evaluations.iter().flat_map(|g| g.evaluations.iter()))
    }

    /// Reduce all evaluations of this pattern to one decision.
    ///
    /// A single change request vetoes any number of approvals.
    pub fn decision(&self) -> PatternDecision<'_> {
        let mut approvers = Vec::new();
        for evaluation in self.evaluations() {
            match evaluation.review_decision {
                ReviewDecision::ChangeRequested => return PatternDecision::ChangeRequested,
                ReviewDecision::Approved => approvers.push(evaluation),
                ReviewDecision::Pending | ReviewDecision::Reviewed => {}
            }
        }
        if approvers.is_empty() {
            PatternDecision::Pending
        } else {
            PatternDecision::Approved(approvers)
        }
    }
}
