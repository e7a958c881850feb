//! Read-only queries against repository history.
//!
//! The rule engine never touches repository storage directly. All graph
//! questions go through the [`GraphOracle`] trait so the decision logic can
//! be backed by an in-memory DAG in tests and by the object database in
//! production, without depending on either.
//!
//! A single oracle instance represents a consistent, frozen view of history
//! for the duration of one push evaluation; the host serializes concurrent
//! pushes, so implementations need not defend against mutation mid-query.

pub mod memory;
#[cfg(feature = "oracle-odb")]
pub mod odb;

pub use memory::InMemoryOracle;
#[cfg(feature = "oracle-odb")]
pub use odb::OdbOracle;

use gix_hash::ObjectId;

/// Why a graph query could not be answered.
///
/// The rule engine treats every variant the same way: the update under
/// evaluation is rejected with an internal-error reason. Retrying is
/// pointless — a deterministic query over frozen history returns the same
/// answer every time.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// An object referenced by the query does not exist in the repository.
    #[error("object {oid} not found in repository history")]
    MissingObject { oid: ObjectId },
    /// An object exists but could not be decoded.
    #[error("object {oid} could not be decoded: {message}")]
    CorruptObject { oid: ObjectId, message: String },
    /// A traversal gave up before finding an answer.
    #[error("history traversal exceeded {limit} commits")]
    TraversalLimit { limit: usize },
}

/// Read-only view of the commit graph and refs.
///
/// All queries are side-effect-free. Ancestry is reflexive: a commit counts
/// as an ancestor of itself.
pub trait GraphOracle {
    /// Is `a` an ancestor of (or equal to) `b`?
    fn is_ancestor(&self, a: ObjectId, b: ObjectId) -> Result<bool, OracleError>;

    /// The nearest common ancestor of `a` and `b`, or `None` for disjoint
    /// histories.
    fn merge_base(&self, a: ObjectId, b: ObjectId) -> Result<Option<ObjectId>, OracleError>;

    /// The commits that are direct tag targets and lie at or within the
    /// ancestry of `tip`.
    ///
    /// Annotated tags are peeled to the commit they point at; tags whose
    /// targets are reachable only as descendants of `tip` are not reported.
    fn tagged_commits_within(&self, tip: ObjectId) -> Result<Vec<ObjectId>, OracleError>;

    /// The current target of `ref_name`, or `None` if it does not exist.
    fn current_target(&self, ref_name: &str) -> Result<Option<ObjectId>, OracleError>;
}
