//! Configuration parsing for the ref protection patterns.
//!
//! The host loads configuration once at startup; a malformed value means the
//! hook refuses to run rather than run with ambiguous policy.
//!
//! # Configuration Keys
//!
//! - `guard.trunkRef`: the trunk branch, either a full ref name or a bare
//!   branch name which is normalized to `refs/heads/<name>`
//!   (default `refs/heads/master`)
//! - `guard.releaseBranchPrefix`: path under `refs/heads/` that release
//!   branches live in (default `release/`)
//! - `guard.releaseTagPattern`: template for release-tag short names with a
//!   `<version>` placeholder (default `<version>`)

use crate::classify::{RefPatterns, TagPattern};
use crate::Error;

/// Result type for configuration parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration loader for the protection patterns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuardConfig {
    patterns: RefPatterns,
}

impl GuardConfig {
    /// Load the guard configuration from a Git config file, falling back to
    /// the documented defaults for unset keys.
    pub fn from_config(config: &gix_config::File<'static>) -> Result<Self> {
        let trunk_ref = match read_string(config, "guard.trunkRef")? {
            Some(value) => normalize_trunk_ref(&value)?,
            None => "refs/heads/master".to_string(),
        };
        let release_branch_prefix =
            read_string(config, "guard.releaseBranchPrefix")?.unwrap_or_else(|| "release/".to_string());
        let release_tag_pattern = match read_string(config, "guard.releaseTagPattern")? {
            Some(value) => TagPattern::parse(&value)?,
            None => TagPattern::default(),
        };

        let patterns = RefPatterns::new(trunk_ref, release_branch_prefix, release_tag_pattern)?;
        Ok(Self { patterns })
    }

    /// The validated patterns.
    pub fn patterns(&self) -> &RefPatterns {
        &self.patterns
    }

    /// Convert into the validated patterns.
    pub fn into_patterns(self) -> RefPatterns {
        self.patterns
    }
}

fn read_string(config: &gix_config::File<'static>, key: &str) -> Result<Option<String>> {
    match config.string(key) {
        Some(value) => {
            let value = std::str::from_utf8(value.as_ref())
                .map_err(|e| Error::Configuration(format!("invalid UTF-8 in '{key}': {e}")))?;
            Ok(Some(value.to_owned()))
        }
        None => Ok(None),
    }
}

/// Accept both `refs/heads/master` and the bare `master`.
fn normalize_trunk_ref(value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(Error::Configuration("'guard.trunkRef' is empty".into()));
    }
    if value.starts_with("refs/") {
        Ok(value.to_owned())
    } else {
        Ok(format!("refs/heads/{value}"))
    }
}
