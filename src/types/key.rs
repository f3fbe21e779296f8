//! TypeKey: the (namespace, name) identity of every type and global.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProgramDataError, Result};

/// Identity of a type, global or function.
///
/// The namespace is slash-delimited and never carries a leading slash; the
/// empty namespace is the root. Comparison is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeKey {
    namespace: String,
    name: String,
}

impl TypeKey {
    /// Create a key, stripping a single leading `/` from the namespace.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let mut namespace = namespace.into();
        if namespace.starts_with('/') {
            namespace.remove(0);
        }
        Self {
            namespace,
            name: name.into(),
        }
    }

    /// Create a key in the root namespace.
    pub fn root(name: impl Into<String>) -> Self {
        Self::new("", name)
    }

    /// Parse `ns/sub/name`, `/ns/name` or `name`.
    ///
    /// The split happens on the last `/`. An empty string is rejected.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(ProgramDataError::InvalidTypeKey(
                "cannot parse an empty type name".to_string(),
            ));
        }

        let s = s.strip_prefix('/').unwrap_or(s);
        Ok(match s.rfind('/') {
            Some(index) => Self::new(&s[..index], &s[index + 1..]),
            None => Self::new("", s),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A copy of this key with a different name in the same namespace.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            namespace: self.namespace.clone(),
            name: name.into(),
        }
    }

    /// A copy with surrounding whitespace removed from both parts.
    pub fn trimmed(&self) -> Self {
        Self::new(self.namespace.trim(), self.name.trim())
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for TypeKey {
    type Err = ProgramDataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
