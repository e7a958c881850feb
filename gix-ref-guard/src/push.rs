//! Push-transaction aggregation.
//!
//! The host's invocation contract is all-or-nothing: one exit signal for the
//! whole push. Every update is still evaluated — not short-circuited — so
//! the client sees the complete list of violations instead of only the
//! first. If a host ever supports partial per-ref admission, this module is
//! the only place the aggregation policy lives.

use crate::oracle::GraphOracle;
use crate::policy::{ReasonCode, RuleEngine};
use crate::protocol::UpdateList;

/// One rejected ref update with its user-facing reason.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rejection {
    /// The refname the rejected update targeted.
    pub ref_name: String,
    /// The reason code of the rejecting decision.
    pub reason: ReasonCode,
    /// Human-readable message surfaced to the pushing client.
    pub message: String,
}

/// Aggregated outcome of one push evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PushDecision {
    /// Whether the push as a whole may proceed.
    pub admit: bool,
    /// Every rejected update, in the order the updates were received.
    pub rejections: Vec<Rejection>,
}

impl PushDecision {
    /// Process-style signal for the host: 0 admits the push, 1 denies it.
    pub fn exit_code(&self) -> i32 {
        if self.admit {
            0
        } else {
            1
        }
    }
}

/// Evaluates a whole push transaction update by update.
#[derive(Debug)]
pub struct PushEvaluator<'a, O> {
    engine: &'a RuleEngine,
    oracle: &'a O,
}

impl<'a, O: GraphOracle> PushEvaluator<'a, O> {
    pub fn new(engine: &'a RuleEngine, oracle: &'a O) -> Self {
        Self { engine, oracle }
    }

    /// Evaluate all updates in the order received and AND their outcomes.
    pub fn evaluate(&self, updates: &UpdateList) -> PushDecision {
        let _span = gix_trace::coarse!("gix_ref_guard::evaluate_push");
        let mut rejections = Vec::new();
        for update in updates.iter() {
            let decision = self.engine.evaluate(update, self.oracle);
            if !decision.allowed {
                rejections.push(Rejection {
                    ref_name: update.name().to_owned(),
                    reason: decision.reason,
                    message: decision.message,
                });
            }
        }
        PushDecision {
            admit: rejections.is_empty(),
            rejections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RefPatterns;
    use crate::oracle::InMemoryOracle;
    use crate::protocol::RefUpdate;
    use gix_hash::ObjectId;

    fn oid(suffix: u8) -> ObjectId {
        let mut bytes = [0u8; 20];
        bytes[19] = suffix;
        ObjectId::from_bytes_or_panic(&bytes)
    }

    fn oracle() -> InMemoryOracle {
        InMemoryOracle::new()
            .with_commit(oid(1), [])
            .with_commit(oid(2), [oid(1)])
            .with_ref("refs/heads/master", oid(2))
    }

    #[test]
    fn empty_pushes_admit() {
        let engine = RuleEngine::new(RefPatterns::default());
        let oracle = oracle();
        let decision = PushEvaluator::new(&engine, &oracle).evaluate(&UpdateList::new());
        assert!(decision.admit);
        assert_eq!(decision.exit_code(), 0);
    }

    #[test]
    fn one_violation_denies_the_whole_push() {
        let engine = RuleEngine::new(RefPatterns::default());
        let oracle = oracle();
        let mut updates = UpdateList::new();
        updates.push(RefUpdate::Create {
            new: oid(2),
            name: "refs/heads/feature".to_string(),
        });
        updates.push(RefUpdate::Delete {
            old: oid(2),
            name: "refs/heads/master".to_string(),
        });
        let decision = PushEvaluator::new(&engine, &oracle).evaluate(&updates);
        assert!(!decision.admit);
        assert_eq!(decision.exit_code(), 1);
        assert_eq!(decision.rejections.len(), 1);
        assert_eq!(decision.rejections[0].ref_name, "refs/heads/master");
        assert_eq!(decision.rejections[0].reason, ReasonCode::TrunkDeleted);
    }

    #[test]
    fn all_updates_are_evaluated_in_order() {
        let engine = RuleEngine::new(RefPatterns::default());
        let oracle = oracle().with_tag("refs/tags/1.0.0", oid(1));
        let mut updates = UpdateList::new();
        updates.push(RefUpdate::Delete {
            old: oid(1),
            name: "refs/tags/1.0.0".to_string(),
        });
        updates.push(RefUpdate::Delete {
            old: oid(2),
            name: "refs/heads/master".to_string(),
        });
        let decision = PushEvaluator::new(&engine, &oracle).evaluate(&updates);
        assert!(!decision.admit);
        let reasons: Vec<_> = decision.rejections.iter().map(|r| r.reason).collect();
        assert_eq!(reasons, vec![ReasonCode::TagDeleted, ReasonCode::TrunkDeleted]);
    }
}
