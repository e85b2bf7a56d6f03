//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ObjectId`] - SHA-256 content address of a stored object
//! - [`BranchName`] - Validated branch name
//! - [`RefName`] - Validated reference name (`HEAD`, `refs/heads/...`, `refs/tags/...`)
//! - [`UtcTimestamp`] - RFC3339 timestamp
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so the stores never see a malformed id or name.
//!
//! # Examples
//!
//! ```
//! use kitwork::core::types::{BranchName, ObjectId, RefName};
//!
//! let branch = BranchName::new("feature/parser").unwrap();
//! let id = ObjectId::hash_bytes(b"hello\n");
//! let refname = RefName::for_branch(&branch);
//!
//! assert_eq!(refname.as_str(), "refs/heads/feature/parser");
//! assert_eq!(id.as_str().len(), 64);
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(ObjectId::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

/// Characters that may never appear in a branch or ref name.
const FORBIDDEN_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];

/// Shared refname rules for branches and refs.
///
/// Returns a human readable reason on failure; callers wrap it in the
/// matching [`TypeError`] variant.
fn check_refname_rules(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".into());
    }
    if name == "@" {
        return Err("name cannot be '@' (reserved)".into());
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err("name cannot start or end with '/'".into());
    }
    for needle in ["..", "@{", "//"] {
        if name.contains(needle) {
            return Err(format!("name cannot contain '{needle}'"));
        }
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(format!("name cannot contain '{c}'"));
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Err("name cannot contain control characters".into());
    }
    for component in name.split('/') {
        if component.starts_with('.') {
            return Err("path component cannot start with '.'".into());
        }
        if component.ends_with(".lock") {
            return Err("path component cannot end with '.lock'".into());
        }
    }
    Ok(())
}

/// A SHA-256 object identifier, stored as 64 lowercase hex characters.
///
/// # Example
///
/// ```
/// use kitwork::core::types::ObjectId;
///
/// let id = ObjectId::hash_bytes(b"");
/// assert_eq!(
///     id.as_str(),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// assert_eq!(id.short(7), "e3b0c44");
/// assert_eq!(id.fanout(), ("e3", "b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Length of a hex-encoded SHA-256 digest.
    pub const HEX_LEN: usize = 64;

    /// Parse and validate an object id. The id is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidObjectId` unless the input is exactly
    /// 64 hexadecimal characters.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into().to_ascii_lowercase();
        if id.len() != Self::HEX_LEN {
            return Err(TypeError::InvalidObjectId(format!(
                "expected {} hex characters, got {}",
                Self::HEX_LEN,
                id.len()
            )));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidObjectId(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Compute the content address of a byte sequence.
    pub fn hash_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(hex::encode(digest))
    }

    /// Abbreviated form: the first `len` characters (or the full id).
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Split into the two-character shard prefix and the remaining name.
    pub fn fanout(&self) -> (&str, &str) {
        self.0.split_at(2)
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated branch name.
///
/// Branch names follow the usual refname rules: not empty, not `@`, no
/// leading `-`, no `..`, `@{`, `//`, spaces or glob characters, and no
/// component starting with `.` or ending with `.lock`.
///
/// # Example
///
/// ```
/// use kitwork::core::types::BranchName;
///
/// let name = BranchName::new("feature/my-branch").unwrap();
/// assert_eq!(name.as_str(), "feature/my-branch");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("-flag").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '-'".into(),
            ));
        }
        if name == "HEAD" {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be 'HEAD'".into(),
            ));
        }
        check_refname_rules(&name).map_err(TypeError::InvalidBranchName)?;
        Ok(Self(name))
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated reference name.
///
/// Either one of the pseudo-refs at the top of the metadata directory
/// (`HEAD`, `MERGE_HEAD`) or a path under `refs/`.
///
/// # Example
///
/// ```
/// use kitwork::core::types::{BranchName, RefName};
///
/// let branch = BranchName::new("main").unwrap();
/// let refname = RefName::for_branch(&branch);
/// assert_eq!(refname.as_str(), "refs/heads/main");
/// assert_eq!(refname.branch_name(), Some(branch));
///
/// assert_eq!(RefName::head().as_str(), "HEAD");
/// assert!(RefName::new("heads/main").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    const HEAD: &'static str = "HEAD";
    const MERGE_HEAD: &'static str = "MERGE_HEAD";
    const HEADS_PREFIX: &'static str = "refs/heads/";
    const TAGS_PREFIX: &'static str = "refs/tags/";

    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name is neither a
    /// pseudo-ref nor a valid path under `refs/`.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name == Self::HEAD || name == Self::MERGE_HEAD {
            return Ok(Self(name));
        }
        if !name.starts_with("refs/") {
            return Err(TypeError::InvalidRefName(format!(
                "'{name}' must be HEAD, MERGE_HEAD or start with 'refs/'"
            )));
        }
        check_refname_rules(&name).map_err(TypeError::InvalidRefName)?;
        Ok(Self(name))
    }

    /// The `HEAD` pseudo-ref.
    pub fn head() -> Self {
        Self(Self::HEAD.to_string())
    }

    /// The `MERGE_HEAD` pseudo-ref recording a pending merge.
    pub fn merge_head() -> Self {
        Self(Self::MERGE_HEAD.to_string())
    }

    /// Ref name for a branch (`refs/heads/<branch>`).
    pub fn for_branch(branch: &BranchName) -> Self {
        Self(format!("{}{}", Self::HEADS_PREFIX, branch.as_str()))
    }

    /// Ref name for a tag (`refs/tags/<tag>`). Tags share the branch naming rules.
    pub fn for_tag(tag: &BranchName) -> Self {
        Self(format!("{}{}", Self::TAGS_PREFIX, tag.as_str()))
    }

    /// The branch this ref names, if it is a branch ref.
    pub fn branch_name(&self) -> Option<BranchName> {
        self.0
            .strip_prefix(Self::HEADS_PREFIX)
            .and_then(|b| BranchName::new(b).ok())
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A UTC timestamp, serialized as RFC3339.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    ///
    /// Sub-second precision is dropped so that a commit re-encodes to the
    /// same bytes after a decode.
    pub fn now() -> Self {
        let now = chrono::Utc::now();
        Self::from_unix(now.timestamp()).unwrap_or(Self(now))
    }

    /// Create a timestamp from seconds since the Unix epoch.
    pub fn from_unix(secs: i64) -> Option<Self> {
        chrono::DateTime::from_timestamp(secs, 0).map(Self)
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
