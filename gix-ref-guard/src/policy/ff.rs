//! Fast-forward detection over the graph oracle.

use gix_hash::ObjectId;

use crate::oracle::{GraphOracle, OracleError};

/// Check if moving a ref from `old` to `new` is a fast-forward.
///
/// Equal ids are trivially a fast-forward (no change); otherwise `new` must
/// have `old` in its ancestry, so no previously reachable history is
/// discarded.
pub fn is_fast_forward(old: ObjectId, new: ObjectId, oracle: &impl GraphOracle) -> Result<bool, OracleError> {
    if old == new {
        return Ok(true);
    }
    oracle.is_ancestor(old, new)
}
