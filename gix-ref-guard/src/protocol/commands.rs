// Update-record parsing for the pre-receive record stream.
//
// The host hands the hook one record per line of the form
//   "<old-oid> <new-oid> <refname>"
//
// The zero oid encodes an absent side: an all-zero old oid is a creation, an
// all-zero new oid a deletion, both present is an ordinary update. Both zero
// on one line is invalid.
//
// How the host obtains these lines (stdin, structured call) is its business;
// this file focuses on robust, typed parsing independent of IO.

use crate::Error;
use gix_hash::ObjectId;

/// A single proposed ref update as received from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefUpdate {
    /// Create a new reference pointing at `new`.
    Create { new: ObjectId, name: String },
    /// Update an existing reference from `old` to `new`.
    Update { old: ObjectId, new: ObjectId, name: String },
    /// Delete an existing reference which had `old` object.
    Delete { old: ObjectId, name: String },
}

impl RefUpdate {
    /// The refname targeted by this update.
    pub fn name(&self) -> &str {
        match self {
            RefUpdate::Create { name, .. } => name,
            RefUpdate::Update { name, .. } => name,
            RefUpdate::Delete { name, .. } => name,
        }
    }

    /// The previous target, or `None` if the ref did not exist.
    pub fn old(&self) -> Option<ObjectId> {
        match self {
            RefUpdate::Create { .. } => None,
            RefUpdate::Update { old, .. } | RefUpdate::Delete { old, .. } => Some(*old),
        }
    }

    /// The proposed target, or `None` if the ref is being deleted.
    pub fn new(&self) -> Option<ObjectId> {
        match self {
            RefUpdate::Create { new, .. } | RefUpdate::Update { new, .. } => Some(*new),
            RefUpdate::Delete { .. } => None,
        }
    }
}

/// The ordered list of updates making up one push transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateList {
    updates: Vec<RefUpdate>,
}

impl UpdateList {
    pub fn new() -> Self {
        Self { updates: Vec::new() }
    }

    pub fn push(&mut self, update: RefUpdate) {
        self.updates.push(update);
    }

    pub fn iter(&self) -> impl Iterator<Item = &RefUpdate> {
        self.updates.iter()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Parse update records from text, one logical line per `\n`.
    ///
    /// Notes
    /// - Object-format enforcement is minimal: both 40 (SHA-1) and 64
    ///   (SHA-256) hex lengths are accepted via `ObjectId::from_hex()`.
    /// - Invariants enforced:
    ///   - Create: old is zero, new is non-zero
    ///   - Delete: new is zero, old is non-zero
    ///   - Update: old and new are non-zero
    ///   - Both zero → invalid
    pub fn parse_from_text(text: &str) -> Result<Self, Error> {
        let mut list = UpdateList::new();
        for raw_line in text.lines() {
            let line = raw_line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            list.push(parse_record(line)?);
        }
        Ok(list)
    }
}

/// Parse one "<old> <new> <refname>" record.
fn parse_record(line: &str) -> Result<RefUpdate, Error> {
    let mut it = line.split_whitespace();
    let old_hex = it.next().ok_or_else(|| Error::Protocol("missing <old> oid".into()))?;
    let new_hex = it.next().ok_or_else(|| Error::Protocol("missing <new> oid".into()))?;
    let name = it.next().ok_or_else(|| Error::Protocol("missing <refname>".into()))?;

    // Refnames can't contain spaces, so extra tokens are invalid.
    if it.next().is_some() {
        return Err(Error::Protocol("unexpected tokens after <refname>".into()));
    }

    let old_is_zero = is_all_zeros(old_hex);
    let new_is_zero = is_all_zeros(new_hex);

    let old = if old_is_zero {
        None
    } else {
        Some(parse_oid(old_hex).map_err(|e| Error::Protocol(format!("invalid old oid '{old_hex}': {e}")))?)
    };

    let new = if new_is_zero {
        None
    } else {
        Some(parse_oid(new_hex).map_err(|e| Error::Protocol(format!("invalid new oid '{new_hex}': {e}")))?)
    };

    match (old, new) {
        (None, None) => Err(Error::Validation("both old and new are zero (invalid record)".into())),
        (None, Some(new)) => Ok(RefUpdate::Create {
            new,
            name: name.to_owned(),
        }),
        (Some(old), None) => Ok(RefUpdate::Delete {
            old,
            name: name.to_owned(),
        }),
        (Some(old), Some(new)) => Ok(RefUpdate::Update {
            old,
            new,
            name: name.to_owned(),
        }),
    }
}

/// Try to decode a hex string into an ObjectId using gix-hash utilities.
fn parse_oid(hex: &str) -> Result<ObjectId, String> {
    ObjectId::from_hex(hex.as_bytes()).map_err(|e| e.to_string())
}

/// Return true if all chars are ASCII '0'.
fn is_all_zeros(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b == b'0')
}
