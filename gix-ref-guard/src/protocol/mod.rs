// Input records for one push evaluation: typed ref updates plus the frozen
// ref snapshot oracle backends read from.
pub mod commands;

use gix_hash::ObjectId;

/// A named ref and its current target, one entry of the snapshot taken when
/// a push evaluation begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefRecord {
    pub oid: ObjectId,
    pub name: String,
}

impl RefRecord {
    pub fn new(oid: ObjectId, name: impl Into<String>) -> Self {
        Self { oid, name: name.into() }
    }
}

/// Re-exports for crate users.
pub use commands::{RefUpdate, UpdateList};
