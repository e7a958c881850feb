//! In-memory commit graph for tests and embedded use.

use std::collections::{HashMap, HashSet, VecDeque};

use gix_hash::ObjectId;

use super::{GraphOracle, OracleError};

/// A [`GraphOracle`] over an explicitly constructed DAG.
///
/// Commits, refs and tags are declared up front with the builder methods;
/// queries walk the declared parent edges. A commit id used as a parent or
/// query argument without having been declared surfaces as
/// [`OracleError::MissingObject`] at query time, which doubles as a way to
/// exercise the fail-closed path in tests.
///
/// ```
/// use gix_hash::ObjectId;
/// use gix_ref_guard::oracle::{GraphOracle, InMemoryOracle};
///
/// let a = ObjectId::from_hex(b"1111111111111111111111111111111111111111").unwrap();
/// let b = ObjectId::from_hex(b"2222222222222222222222222222222222222222").unwrap();
/// let oracle = InMemoryOracle::new()
///     .with_commit(a, [])
///     .with_commit(b, [a])
///     .with_ref("refs/heads/master", b);
/// assert!(oracle.is_ancestor(a, b).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryOracle {
    parents: HashMap<ObjectId, Vec<ObjectId>>,
    refs: HashMap<String, ObjectId>,
    tags: HashMap<String, ObjectId>,
}

impl InMemoryOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a commit and its parents.
    pub fn with_commit(mut self, id: ObjectId, parents: impl IntoIterator<Item = ObjectId>) -> Self {
        self.parents.insert(id, parents.into_iter().collect());
        self
    }

    /// Declare a branch or any other non-tag ref by full name.
    pub fn with_ref(mut self, name: impl Into<String>, target: ObjectId) -> Self {
        self.refs.insert(name.into(), target);
        self
    }

    /// Declare a tag by full name (`refs/tags/...`); `target` is the commit
    /// the (already peeled) tag points at.
    pub fn with_tag(mut self, name: impl Into<String>, target: ObjectId) -> Self {
        self.tags.insert(name.into(), target);
        self
    }

    fn parents_of(&self, id: ObjectId) -> Result<&[ObjectId], OracleError> {
        self.parents
            .get(&id)
            .map(Vec::as_slice)
            .ok_or(OracleError::MissingObject { oid: id })
    }

    /// Every commit reachable from `tip`, including `tip` itself.
    fn ancestors(&self, tip: ObjectId) -> Result<HashSet<ObjectId>, OracleError> {
        let mut seen = HashSet::new();
        let mut to_visit = vec![tip];
        while let Some(current) = to_visit.pop() {
            if !seen.insert(current) {
                continue;
            }
            for &parent in self.parents_of(current)? {
                if !seen.contains(&parent) {
                    to_visit.push(parent);
                }
            }
        }
        Ok(seen)
    }
}

impl GraphOracle for InMemoryOracle {
    fn is_ancestor(&self, a: ObjectId, b: ObjectId) -> Result<bool, OracleError> {
        Ok(self.ancestors(b)?.contains(&a))
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
            if of_a.contains(&current) {
                return Ok(Some(current));
            }
            queue.extend(self.parents_of(current)?.iter().copied());
        }
        Ok(None)
    }

    fn tagged_commits_within(&self, tip: ObjectId) -> Result<Vec<ObjectId>, OracleError> {
        let within = self.ancestors(tip)?;
        let mut found: Vec<_> = self.tags.values().copied().filter(|t| within.contains(t)).collect();
        found.sort();
        found.dedup();
        Ok(found)
    }

    fn current_target(&self, ref_name: &str) -> Result<Option<ObjectId>, OracleError> {
        Ok(self.refs.get(ref_name).or_else(|| self.tags.get(ref_name)).copied())
    }
}
