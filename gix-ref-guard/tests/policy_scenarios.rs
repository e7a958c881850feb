//! End-to-end policy scenarios over an in-memory history.
//!
//! Each test tells one story a server-side hook would see: a sequence of
//! pushes against a repository in a known state, with the expected
//! accept/reject outcome for every step.

use gix_hash::ObjectId;
use gix_ref_guard::oracle::InMemoryOracle;
use gix_ref_guard::{PushEvaluator, ReasonCode, RefPatterns, RefUpdate, RuleEngine, UpdateList};
use pretty_assertions::assert_eq;

fn oid(suffix: u8) -> ObjectId {
    let mut bytes = [0u8; 20];
    bytes[19] = suffix;
    ObjectId::from_bytes_or_panic(&bytes)
}

fn engine() -> RuleEngine {
    RuleEngine::new(RefPatterns::default())
}

fn single(update: RefUpdate) -> UpdateList {
    let mut list = UpdateList::new();
    list.push(update);
    list
}

fn create(name: &str, new: u8) -> RefUpdate {
    RefUpdate::Create {
        new: oid(new),
        name: name.to_string(),
    }
}

fn update(name: &str, old: u8, new: u8) -> RefUpdate {
    RefUpdate::Update {
        old: oid(old),
        new: oid(new),
        name: name.to_string(),
    }
}

fn delete(name: &str, old: u8) -> RefUpdate {
    RefUpdate::Delete {
        old: oid(old),
        name: name.to_string(),
    }
}

/// master: A(1) --- B(2), plus an orphan commit C(3).
fn master_with_orphan() -> InMemoryOracle {
    InMemoryOracle::new()
        .with_commit(oid(1), [])
        .with_commit(oid(2), [oid(1)])
        .with_commit(oid(3), [])
        .with_ref("refs/heads/master", oid(2))
}

#[test]
fn deleting_master_is_rejected() {
    let oracle = master_with_orphan();
    let engine = engine();
    let decision = PushEvaluator::new(&engine, &oracle).evaluate(&single(delete("refs/heads/master", 2)));
    assert!(!decision.admit);
    assert_eq!(decision.exit_code(), 1);
    assert_eq!(decision.rejections[0].reason, ReasonCode::TrunkDeleted);
}

#[test]
fn force_pushing_an_orphan_history_over_master_is_rejected() {
    // `master1` holds only the orphan commit C; pushing it over master
    // cannot be a fast-forward.
    let oracle = master_with_orphan();
    let engine = engine();
    let decision = PushEvaluator::new(&engine, &oracle).evaluate(&single(update("refs/heads/master", 2, 3)));
    assert!(!decision.admit);
    assert_eq!(decision.rejections[0].reason, ReasonCode::TrunkNonFastForward);
}

#[test]
fn ordinary_development_on_master_is_accepted() {
    let oracle = master_with_orphan().with_commit(oid(4), [oid(2)]);
    let engine = engine();
    let evaluator = PushEvaluator::new(&engine, &oracle);
    assert!(evaluator.evaluate(&single(update("refs/heads/master", 2, 4))).admit);
    assert!(evaluator.evaluate(&single(create("refs/heads/topic", 4))).admit);
    assert!(evaluator.evaluate(&single(delete("refs/heads/topic", 4))).admit);
}

#[test]
fn release_tag_lifecycle() {
    // tag 1.0.0 at master~1 (A), master at B
    let engine = engine();
    let evaluator_oracle = master_with_orphan();
    let evaluator = PushEvaluator::new(&engine, &evaluator_oracle);

    // pushing the new tag
    assert!(evaluator.evaluate(&single(create("refs/tags/1.0.0", 1))).admit);

    // with the tag in place: deleting and re-pointing are both rejected
    let tagged = master_with_orphan().with_tag("refs/tags/1.0.0", oid(1));
    let evaluator = PushEvaluator::new(&engine, &tagged);

    let deletion = evaluator.evaluate(&single(delete("refs/tags/1.0.0", 1)));
    assert!(!deletion.admit);
    assert_eq!(deletion.rejections[0].reason, ReasonCode::TagDeleted);

    // "recreating" the tag at master is an update from the server's view,
    // since the rejected deletion left the tag in place
    let moved = evaluator.evaluate(&single(update("refs/tags/1.0.0", 1, 2)));
    assert!(!moved.admit);
    assert_eq!(moved.rejections[0].reason, ReasonCode::TagMoved);

    // re-pushing the identical target is a no-op and passes
    assert!(evaluator.evaluate(&single(update("refs/tags/1.0.0", 1, 1))).admit);
}

/// master: A(1) --- B(2); release/1.0.0: B --- R1(4) --- R2(5).
fn release_branch_graph() -> InMemoryOracle {
    InMemoryOracle::new()
        .with_commit(oid(1), [])
        .with_commit(oid(2), [oid(1)])
        .with_commit(oid(4), [oid(2)])
        .with_commit(oid(5), [oid(4)])
        .with_ref("refs/heads/master", oid(2))
        .with_ref("refs/heads/release/1.0.0", oid(5))
}

#[test]
fn release_branch_lifecycle() {
    let engine = engine();

    // branched from master and pushed
    let oracle = release_branch_graph();
    let evaluator = PushEvaluator::new(&engine, &oracle);
    assert!(evaluator.evaluate(&single(create("refs/heads/release/1.0.0", 4))).admit);

    // normal commit and push on it
    assert!(evaluator
        .evaluate(&single(update("refs/heads/release/1.0.0", 4, 5)))
        .admit);

    // deletable while no tag depends on it
    assert!(evaluator.evaluate(&single(delete("refs/heads/release/1.0.0", 5))).admit);

    // tag it: deletion is now blocked
    let tagged = release_branch_graph().with_tag("refs/tags/1.0.0", oid(5));
    let evaluator = PushEvaluator::new(&engine, &tagged);
    let blocked = evaluator.evaluate(&single(delete("refs/heads/release/1.0.0", 5)));
    assert!(!blocked.admit);
    assert_eq!(blocked.rejections[0].reason, ReasonCode::BranchCarriesUnmergedTag);

    // merge 1.0.0 into master (merge commit M(6)), deletion is allowed again
    let merged = release_branch_graph()
        .with_tag("refs/tags/1.0.0", oid(5))
        .with_commit(oid(6), [oid(2), oid(5)])
        .with_ref("refs/heads/master", oid(6));
    let evaluator = PushEvaluator::new(&engine, &merged);
    assert!(evaluator.evaluate(&single(delete("refs/heads/release/1.0.0", 5))).admit);
}

#[test]
fn orphan_release_branches_are_rejected() {
    let engine = engine();
    let oracle = release_branch_graph().with_commit(oid(9), []);
    let evaluator = PushEvaluator::new(&engine, &oracle);
    let decision = evaluator.evaluate(&single(create("refs/heads/release/2.0.0", 9)));
    assert!(!decision.admit);
    assert_eq!(decision.rejections[0].reason, ReasonCode::BranchNotFromTrunk);
}

#[test]
fn force_push_discarding_a_tagged_commit_is_rejected_until_merged() {
    let engine = engine();

    // tag R2(5), then force the branch back to R1(4): the tagged commit
    // would no longer be reachable from the branch
    let tagged = release_branch_graph().with_tag("refs/tags/1.0.0", oid(5));
    let evaluator = PushEvaluator::new(&engine, &tagged);
    let rewound = evaluator.evaluate(&single(update("refs/heads/release/1.0.0", 5, 4)));
    assert!(!rewound.admit);
    assert_eq!(rewound.rejections[0].reason, ReasonCode::BranchDiscardsTaggedCommit);

    // the identical force-push is fine once the tagged commit is in master
    let merged = release_branch_graph()
        .with_tag("refs/tags/1.0.0", oid(5))
        .with_commit(oid(6), [oid(2), oid(5)])
        .with_ref("refs/heads/master", oid(6));
    let evaluator = PushEvaluator::new(&engine, &merged);
    assert!(evaluator
        .evaluate(&single(update("refs/heads/release/1.0.0", 5, 4)))
        .admit);
}

#[test]
fn evaluation_is_idempotent() {
    let engine = engine();
    let oracle = release_branch_graph().with_tag("refs/tags/1.0.0", oid(5));
    let evaluator = PushEvaluator::new(&engine, &oracle);

    let mut updates = UpdateList::new();
    updates.push(delete("refs/heads/release/1.0.0", 5));
    updates.push(update("refs/heads/master", 2, 4));
    updates.push(create("refs/heads/topic", 5));

    let first = evaluator.evaluate(&updates);
    let second = evaluator.evaluate(&updates);
    assert_eq!(first, second);
}

#[test]
fn unanswerable_queries_fail_closed() {
    let engine = engine();
    // the oracle knows nothing about these commits
    let oracle = InMemoryOracle::new().with_ref("refs/heads/master", oid(2));
    let evaluator = PushEvaluator::new(&engine, &oracle);
    let decision = evaluator.evaluate(&single(update("refs/heads/master", 2, 3)));
    assert!(!decision.admit);
    assert_eq!(decision.rejections[0].reason, ReasonCode::OracleFailure);
}
