//! Rule evaluation for protected refs.
//!
//! One rule set per protection class, dispatched over the closed
//! [`ProtectionClass`] enum:
//! - Trunk: no deletion, no non-fast-forward updates
//! - ReleaseTag: write-once, no move, no deletion
//! - ReleaseBranch: must descend from trunk; once tagged, rewriting or
//!   deleting its history requires the tagged commit to be merged into trunk
//! - Unprotected: always accepted, no history access
//!
//! Oracle failures never abort the evaluation: the affected update is
//! rejected with [`ReasonCode::OracleFailure`]. Accepting an unverifiable
//! update would bypass protection, so the engine fails closed.

pub mod ff;

pub use ff::is_fast_forward;

use gix_hash::ObjectId;

use crate::classify::{ProtectionClass, RefPatterns};
use crate::oracle::{GraphOracle, OracleError};
use crate::protocol::RefUpdate;

/// Reason codes for rule decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReasonCode {
    /// The update is allowed.
    Allowed,
    /// Denied: the trunk branch cannot be deleted.
    TrunkDeleted,
    /// Denied: non-fast-forward update of the trunk branch.
    TrunkNonFastForward,
    /// Denied: release tags cannot be deleted.
    TagDeleted,
    /// Denied: release tags cannot be moved to another commit.
    TagMoved,
    /// Denied: a release branch must descend from the trunk branch.
    BranchNotFromTrunk,
    /// Denied: the force-push would discard a tagged commit that is not
    /// merged into trunk.
    BranchDiscardsTaggedCommit,
    /// Denied: the branch carries a tagged commit that is not merged into
    /// trunk.
    BranchCarriesUnmergedTag,
    /// Denied because a graph query failed; the update could not be
    /// verified.
    OracleFailure,
}

/// Outcome of evaluating a single ref update.
///
/// Produced once per update and never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decision {
    /// Whether the update is allowed.
    pub allowed: bool,
    /// The reason code for the decision.
    pub reason: ReasonCode,
    /// Human-readable message surfaced to the pushing client on rejection.
    pub message: String,
}

impl Decision {
    /// An accepting decision.
    pub fn accept() -> Self {
        Self {
            allowed: true,
            reason: ReasonCode::Allowed,
            message: String::new(),
        }
    }

    /// A rejecting decision with a user-facing message.
    pub fn reject(reason: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason,
            message: message.into(),
        }
    }
}

/// Evaluates proposed ref updates against the protection rules.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    patterns: RefPatterns,
}

impl RuleEngine {
    pub fn new(patterns: RefPatterns) -> Self {
        Self { patterns }
    }

    /// The patterns this engine classifies ref names with.
    pub fn patterns(&self) -> &RefPatterns {
        &self.patterns
    }

    /// Evaluate one update, classifying its ref name first.
    pub fn evaluate(&self, update: &RefUpdate, oracle: &impl GraphOracle) -> Decision {
        let class = self.patterns.classify(update.name());
        self.evaluate_classified(update, class, oracle)
    }

    /// Evaluate one update whose protection class is already known.
    pub fn evaluate_classified(
        &self,
        update: &RefUpdate,
        class: ProtectionClass,
        oracle: &impl GraphOracle,
    ) -> Decision {
        let _span = gix_trace::detail!("gix_ref_guard::evaluate");
        let outcome = match class {
            ProtectionClass::Unprotected => return Decision::accept(),
            ProtectionClass::Trunk => trunk_rules(update, oracle),
            ProtectionClass::ReleaseTag => Ok(tag_rules(update)),
            ProtectionClass::ReleaseBranch => self.release_branch_rules(update, oracle),
        };
        outcome.unwrap_or_else(|err| {
            Decision::reject(
                ReasonCode::OracleFailure,
                format!(
                    "internal error while verifying '{}': history query failed ({err})",
                    update.name()
                ),
            )
        })
    }

    fn release_branch_rules(
        &self,
        update: &RefUpdate,
        oracle: &impl GraphOracle,
    ) -> Result<Decision, OracleError> {
        let trunk = self.patterns.trunk_ref();
        match update {
            RefUpdate::Create { new, name } => {
                // An orphan history shares no merge base with trunk; a
                // repository without the trunk ref has nothing to descend
                // from either.
                let Some(trunk_head) = oracle.current_target(trunk)? else {
                    return Ok(reject_not_from_trunk(name, trunk));
                };
                if oracle.merge_base(*new, trunk_head)?.is_some() {
                    Ok(Decision::accept())
                } else {
                    Ok(reject_not_from_trunk(name, trunk))
                }
            }
            RefUpdate::Update { old, new, name } => {
                if ff::is_fast_forward(*old, *new, oracle)? {
                    return Ok(Decision::accept());
                }
                let trunk_head = oracle.current_target(trunk)?;
                for tagged in oracle.tagged_commits_within(*old)? {
                    if oracle.is_ancestor(tagged, *new)? {
                        continue;
                    }
                    if merged_into(tagged, trunk_head, oracle)? {
                        continue;
                    }
                    return Ok(Decision::reject(
                        ReasonCode::BranchDiscardsTaggedCommit,
                        format!("force-push of '{name}' would discard tagged release commit {tagged}"),
                    ));
                }
                Ok(Decision::accept())
            }
            RefUpdate::Delete { old, name } => {
                let trunk_head = oracle.current_target(trunk)?;
                for tagged in oracle.tagged_commits_within(*old)? {
                    if merged_into(tagged, trunk_head, oracle)? {
                        continue;
                    }
                    return Ok(Decision::reject(
                        ReasonCode::BranchCarriesUnmergedTag,
                        format!(
                            "release branch '{name}' has a release tag at {tagged} and cannot be \
                             deleted until that commit is merged into {trunk}"
                        ),
                    ));
                }
                Ok(Decision::accept())
            }
        }
    }
}

fn trunk_rules(update: &RefUpdate, oracle: &impl GraphOracle) -> Result<Decision, OracleError> {
    match update {
        RefUpdate::Delete { name, .. } => Ok(Decision::reject(
            ReasonCode::TrunkDeleted,
            format!("trunk branch '{name}' cannot be deleted"),
        )),
        RefUpdate::Update { old, new, name } => {
            if ff::is_fast_forward(*old, *new, oracle)? {
                Ok(Decision::accept())
            } else {
                Ok(Decision::reject(
                    ReasonCode::TrunkNonFastForward,
                    format!("non-fast-forward update of trunk branch '{name}' rejected"),
                ))
            }
        }
        RefUpdate::Create { .. } => Ok(Decision::accept()),
    }
}

/// Release tags are write-once; no history access is needed to decide.
fn tag_rules(update: &RefUpdate) -> Decision {
    match update {
        RefUpdate::Delete { name, .. } => Decision::reject(
            ReasonCode::TagDeleted,
            format!("release tag '{name}' cannot be deleted"),
        ),
        RefUpdate::Update { old, new, name } => {
            if old == new {
                // re-pushing the existing target is a no-op
                Decision::accept()
            } else {
                Decision::reject(
                    ReasonCode::TagMoved,
                    format!("release tag '{name}' cannot be moved or force-updated"),
                )
            }
        }
        RefUpdate::Create { .. } => Decision::accept(),
    }
}

/// "Merged into trunk" means being an ancestor of the current trunk head.
/// Without a trunk ref nothing counts as merged.
fn merged_into(
    commit: ObjectId,
    trunk_head: Option<ObjectId>,
    oracle: &impl GraphOracle,
) -> Result<bool, OracleError> {
    match trunk_head {
        Some(head) => oracle.is_ancestor(commit, head),
        None => Ok(false),
    }
}

fn reject_not_from_trunk(name: &str, trunk: &str) -> Decision {
    Decision::reject(
        ReasonCode::BranchNotFromTrunk,
        format!("release branch '{name}' must descend from {trunk}"),
    )
}
