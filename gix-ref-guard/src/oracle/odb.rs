//! Object-database backed oracle for evaluating pushes inside a real
//! repository.

use std::collections::{HashSet, VecDeque};

use gix_hash::ObjectId;
use gix_object::{CommitRef, Find, Kind, TagRef};

use super::{GraphOracle, OracleError};
use crate::protocol::RefRecord;

/// Upper bound on commits visited per graph query.
///
/// Exceeding it is reported as [`OracleError::TraversalLimit`] rather than
/// answered optimistically: a truncated ancestor set could hide a tagged
/// commit and let a destructive update through.
const MAX_TRAVERSAL: usize = 100_000;

/// Nested annotated tags are peeled at most this deep.
const MAX_TAG_PEEL: usize = 10;

/// A [`GraphOracle`] over the repository object database and a frozen ref
/// snapshot.
///
/// The snapshot is the list of refs the host advertised when the push
/// evaluation began. Reading refs from a snapshot instead of the ref store
/// keeps the whole evaluation on one consistent view of the repository; the
/// host already serializes pushes, so the snapshot cannot go stale while a
/// decision is being made.
pub struct OdbOracle {
    odb: gix_odb::Handle,
    refs: Vec<RefRecord>,
}

impl OdbOracle {
    /// Create an oracle over `odb` and the refs advertised for this push.
    pub fn new(odb: gix_odb::Handle, refs: Vec<RefRecord>) -> Self {
        Self { odb, refs }
    }

    fn parents_of(&self, oid: ObjectId) -> Result<Vec<ObjectId>, OracleError> {
        let mut buf = Vec::new();
        let data = self
            .odb
            .try_find(&oid, &mut buf)
            .map_err(|err| OracleError::CorruptObject {
                oid,
                message: err.to_string(),
            })?
            .ok_or(OracleError::MissingObject { oid })?;
        if data.kind != Kind::Commit {
            return Err(OracleError::CorruptObject {
                oid,
                message: format!("expected commit, found {}", data.kind),
            });
        }
        let commit = CommitRef::from_bytes(data.data).map_err(|err| OracleError::CorruptObject {
            oid,
            message: err.to_string(),
        })?;
        Ok(commit.parents().collect())
    }

    /// Every commit reachable from `tip`, including `tip` itself.
    fn ancestors(&self, tip: ObjectId) -> Result<HashSet<ObjectId>, OracleError> {
        let mut seen = HashSet::new();
        let mut to_visit = vec![tip];
        while let Some(current) = to_visit.pop() {
            if !seen.insert(current) {
                continue;
            }
            if seen.len() > MAX_TRAVERSAL {
                return Err(OracleError::TraversalLimit { limit: MAX_TRAVERSAL });
            }
            for parent in self.parents_of(current)? {
                if !seen.contains(&parent) {
                    to_visit.push(parent);
                }
            }
        }
        Ok(seen)
    }

    /// Resolve a possibly-annotated tag target to the commit it points at,
    /// or `None` for tags of trees and blobs.
    fn peel_to_commit(&self, mut oid: ObjectId) -> Result<Option<ObjectId>, OracleError> {
        for _ in 0..MAX_TAG_PEEL {
            let mut buf = Vec::new();
            let data = self
                .odb
                .try_find(&oid, &mut buf)
                .map_err(|err| OracleError::CorruptObject {
                    oid,
                    message: err.to_string(),
                })?
                .ok_or(OracleError::MissingObject { oid })?;
            match data.kind {
                Kind::Commit => return Ok(Some(oid)),
                Kind::Tag => {
                    let tag = TagRef::from_bytes(data.data).map_err(|err| OracleError::CorruptObject {
                        oid,
                        message: err.to_string(),
                    })?;
                    oid = tag.target();
                }
                Kind::Tree | Kind::Blob => return Ok(None),
            }
        }
        Err(OracleError::CorruptObject {
            oid,
            message: format!("tag chain longer than {MAX_TAG_PEEL}"),
        })
    }
}

impl GraphOracle for OdbOracle {
    fn is_ancestor(&self, a: ObjectId, b: ObjectId) -> Result<bool, OracleError> {
        // Equal ids are trivially related; no object access needed.
        if a == b {
            return Ok(true);
        }
        let mut seen = HashSet::new();
        let mut to_visit = vec![b];
        while let Some(current) = to_visit.pop() {
            if !seen.insert(current) {
                continue;
            }
            if seen.len() > MAX_TRAVERSAL {
                return Err(OracleError::TraversalLimit { limit: MAX_TRAVERSAL });
            }
            if current == a {
                return Ok(true);
            }
            for parent in self.parents_of(current)? {
                if !seen.contains(&parent) {
                    to_visit.push(parent);
                }
            }
        }
        Ok(false)
    }

    fn merge_base(&self, a: ObjectId, b: ObjectId) -> Result<Option<ObjectId>, OracleError> {
        let of_a = self.ancestors(a)?;
        // Breadth-first from `b` so the first common commit is a nearest one.
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([b]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            if seen.len() > MAX_TRAVERSAL {
                return Err(OracleError::TraversalLimit { limit: MAX_TRAVERSAL });
            }
            if of_a.contains(&current) {
                return Ok(Some(current));
            }
            queue.extend(self.parents_of(current)?);
        }
        Ok(None)
    }

    fn tagged_commits_within(&self, tip: ObjectId) -> Result<Vec<ObjectId>, OracleError> {
        let within = self.ancestors(tip)?;
        let mut found = Vec::new();
        for record in self.refs.iter().filter(|r| r.name.starts_with("refs/tags/")) {
            if let Some(commit) = self.peel_to_commit(record.oid)? {
                if within.contains(&commit) {
                    found.push(commit);
                }
            }
        }
        found.sort();
        found.dedup();
        Ok(found)
    }

    fn current_target(&self, ref_name: &str) -> Result<Option<ObjectId>, OracleError> {
        Ok(self.refs.iter().find(|r| r.name == ref_name).map(|r| r.oid))
    }
}
