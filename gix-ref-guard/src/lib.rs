/*!
Server-side update policies for protected refs.

This crate decides whether a push may go through. For every proposed ref
update of a push transaction it determines the protection class of the ref
name, evaluates the class's rule set against repository history, and
aggregates the per-ref outcomes into a single admit/deny decision the host
reports back to the pushing client.

The protected refs and their rules:

- the *trunk* branch can neither be deleted nor force-pushed;
- *release tags* are write-once: they can be created, but never moved or
  deleted;
- *release branches* must descend from trunk, and once a release tag points
  into their history they can only be rewritten or deleted after that tagged
  commit has been merged into trunk.

Everything else is accepted without touching history.

History access goes through the [`GraphOracle`] trait so the decision logic
is independent of the repository store: tests run against
[`oracle::InMemoryOracle`], production hosts use [`oracle::OdbOracle`]
(feature `oracle-odb`) over the object database and a frozen ref snapshot.

Design principles
- No I/O in the decision path other than oracle queries.
- Every decision is a pure function of (updates, oracle snapshot); nothing is
  retried and nothing is persisted.
- Graph queries that fail make the affected update fail closed: an
  unverifiable update is rejected, never waved through.
*/

#![forbid(unsafe_code)]

pub mod classify;
pub mod config;
pub mod oracle;
pub mod policy;
pub mod protocol;
pub mod push;

pub use classify::{ProtectionClass, RefPatterns, TagPattern};
pub use config::GuardConfig;
pub use oracle::GraphOracle;
pub use policy::{Decision, ReasonCode, RuleEngine};
pub use protocol::{RefRecord, RefUpdate, UpdateList};
pub use push::{PushDecision, PushEvaluator, Rejection};

/// Stable high-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Protocol,
    Validation,
    Configuration,
    Oracle,
    Io,
}

/// Error type for operations provided by this crate.
///
/// Policy violations are not errors: they are [`Decision`] values reported to
/// the pushing client. This type covers the paths that must fail hard, such
/// as malformed update records and invalid configuration.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Protocol-level errors, e.g. malformed update records.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Validation errors, e.g. an update record with both sides absent.
    #[error("validation error: {0}")]
    Validation(String),
    /// Malformed classifier patterns. The host must refuse to run with
    /// ambiguous policy, so these are fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A graph query could not be answered.
    #[error(transparent)]
    Oracle(#[from] oracle::OracleError),
    /// I/O errors from filesystem or OS interactions.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Fast classification helper returning a stable error kind.
    pub fn kind(&self) -> Kind {
        match self {
            Error::Protocol(_) => Kind::Protocol,
            Error::Validation(_) => Kind::Validation,
            Error::Configuration(_) => Kind::Configuration,
            Error::Oracle(_) => Kind::Oracle,
            Error::Io(_) => Kind::Io,
        }
    }
}
