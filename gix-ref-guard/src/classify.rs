//! Ref-name classification into protection classes.
//!
//! Classification is a pure function of the ref name: no history access, no
//! error path. Names that match none of the configured patterns fall through
//! to [`ProtectionClass::Unprotected`] and are never evaluated against
//! history.

use crate::Error;

/// The protection class of a ref name. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtectionClass {
    /// The configured trunk branch, matched by exact name.
    Trunk,
    /// A branch carrying release history, `refs/heads/<prefix><version>`.
    ReleaseBranch,
    /// A release tag under `refs/tags/` whose short name matches the tag
    /// pattern.
    ReleaseTag,
    /// Everything else.
    Unprotected,
}

/// Template matching release-tag short names.
///
/// A template is a literal prefix/suffix around exactly one `<version>`
/// placeholder, where a version is one or more dot-separated runs of ASCII
/// digits. The default template `"<version>"` matches `1.0.0` but not
/// `v1.0.0` or `nightly`; a team tagging with a `v` prefix would configure
/// `"v<version>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPattern {
    prefix: String,
    suffix: String,
}

impl TagPattern {
    /// Parse a template string. Fails if the `<version>` placeholder is
    /// missing, occurs more than once, or the literal parts contain
    /// whitespace.
    pub fn parse(template: &str) -> Result<Self, Error> {
        let Some((prefix, suffix)) = template.split_once("<version>") else {
            return Err(Error::Configuration(format!(
                "release tag pattern '{template}' lacks the <version> placeholder"
            )));
        };
        if suffix.contains("<version>") {
            return Err(Error::Configuration(format!(
                "release tag pattern '{template}' contains more than one <version> placeholder"
            )));
        }
        if prefix.chars().chain(suffix.chars()).any(char::is_whitespace) {
            return Err(Error::Configuration(format!(
                "release tag pattern '{template}' contains whitespace"
            )));
        }
        Ok(Self {
            prefix: prefix.to_owned(),
            suffix: suffix.to_owned(),
        })
    }

    /// Check a tag short name (the part after `refs/tags/`).
    pub fn matches(&self, short_name: &str) -> bool {
        let Some(rest) = short_name.strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        let Some(version) = rest.strip_suffix(self.suffix.as_str()) else {
            return false;
        };
        is_version(version)
    }
}

/// A dotted numeric version string: one or more `.`-separated fields of
/// ASCII digits.
fn is_version(s: &str) -> bool {
    !s.is_empty()
        && s.split('.')
            .all(|field| !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit()))
}

/// Name patterns identifying the protected refs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefPatterns {
    trunk_ref: String,
    release_branch_prefix: String,
    release_tag_pattern: TagPattern,
}

impl RefPatterns {
    /// Create validated patterns.
    ///
    /// `trunk_ref` must be a full ref name (`refs/...`);
    /// `release_branch_prefix` is the path under `refs/heads/` that release
    /// branches live in, e.g. `release/`.
    pub fn new(
        trunk_ref: impl Into<String>,
        release_branch_prefix: impl Into<String>,
        release_tag_pattern: TagPattern,
    ) -> Result<Self, Error> {
        let trunk_ref = trunk_ref.into();
        let release_branch_prefix = release_branch_prefix.into();
        if !trunk_ref.starts_with("refs/") || trunk_ref.len() == "refs/".len() {
            return Err(Error::Configuration(format!(
                "trunk ref '{trunk_ref}' is not a full ref name"
            )));
        }
        if release_branch_prefix.is_empty() {
            return Err(Error::Configuration("release branch prefix is empty".into()));
        }
        for name in [trunk_ref.as_str(), release_branch_prefix.as_str()] {
            if name.chars().any(char::is_whitespace) {
                return Err(Error::Configuration(format!("'{name}' contains whitespace")));
            }
        }
        Ok(Self {
            trunk_ref,
            release_branch_prefix,
            release_tag_pattern,
        })
    }

    /// The full name of the trunk ref.
    pub fn trunk_ref(&self) -> &str {
        &self.trunk_ref
    }

    /// Map a ref name to its protection class.
    pub fn classify(&self, ref_name: &str) -> ProtectionClass {
        if ref_name == self.trunk_ref {
            return ProtectionClass::Trunk;
        }
        if let Some(short) = ref_name.strip_prefix("refs/tags/") {
            if self.release_tag_pattern.matches(short) {
                return ProtectionClass::ReleaseTag;
            }
            return ProtectionClass::Unprotected;
        }
        if let Some(branch) = ref_name.strip_prefix("refs/heads/") {
            if let Some(version) = branch.strip_prefix(self.release_branch_prefix.as_str()) {
                if is_version(version) {
                    return ProtectionClass::ReleaseBranch;
                }
            }
        }
        ProtectionClass::Unprotected
    }
}

impl Default for RefPatterns {
    fn default() -> Self {
        Self {
            trunk_ref: "refs/heads/master".into(),
            release_branch_prefix: "release/".into(),
            release_tag_pattern: TagPattern::default(),
        }
    }
}
