//! # Permission Codenames
//!
//! A codename is a dotted capability identifier such as `users.edit`: a
//! category prefix, a dot, and a verb. The single codename `*` is reserved
//! and means every capability.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The reserved codename granting every capability.
pub const WILDCARD: &str = "*";

/// Build the codename for a verb on a category, e.g. `("users", "edit")` ->
/// `users.edit`.
///
/// # Example
///
/// ```
/// use platform_rbac::permissions::codename;
///
/// assert_eq!(codename("services", "deploy"), "services.deploy");
/// ```
pub fn codename(category: &str, verb: &str) -> String {
    format!("{}.{}", category, verb)
}

/// Split a codename into `(category, verb)` at its last dot.
///
/// Returns `None` for the wildcard and for anything without a dot.
pub fn split_codename(codename: &str) -> Option<(&str, &str)> {
    let (category, verb) = codename.rsplit_once('.')?;
    if category.is_empty() || verb.is_empty() {
        return None;
    }
    Some((category, verb))
}

/// Check that a codename segment (category or verb) is well formed.
///
/// Segments are non-empty and limited to lowercase ASCII letters, digits,
/// `_` and `-`.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// A flattened set of codenames, as held by an actor across all roles.
///
/// # Example
///
/// ```
/// use platform_rbac::permissions::CodenameSet;
///
/// let mut set = CodenameSet::new();
/// set.insert("users.view");
/// assert!(set.has("users.view"));
/// assert!(!set.has("users.edit"));
///
/// set.insert("*");
/// assert!(set.has("users.edit"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodenameSet {
    codenames: HashSet<String>,
}

impl CodenameSet {
    /// Create a new empty set.
    pub fn new() -> Self {
        Self {
            codenames: HashSet::new(),
        }
    }

    /// Add a codename.
    ///
    /// # Returns
    ///
    /// `true` if the codename was not already present
    pub fn insert(&mut self, codename: impl Into<String>) -> bool {
        self.codenames.insert(codename.into())
    }

    /// Remove a codename.
    pub fn remove(&mut self, codename: &str) -> bool {
        self.codenames.remove(codename)
    }

    /// Merge another set into this one.
    pub fn merge(&mut self, other: &CodenameSet) {
        self.codenames.extend(other.codenames.iter().cloned());
    }

    /// Whether the set holds the wildcard codename.
    pub fn is_wildcard(&self) -> bool {
        self.codenames.contains(WILDCARD)
    }

    /// Exact membership, ignoring the wildcard.
    pub fn contains(&self, codename: &str) -> bool {
        self.codenames.contains(codename)
    }

    /// Membership honoring the wildcard.
    pub fn has(&self, codename: &str) -> bool {
        self.is_wildcard() || self.contains(codename)
    }

    /// Iterate over the codenames in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codenames.iter().map(String::as_str)
    }

    /// Get the count of codenames.
    pub fn len(&self) -> usize {
        self.codenames.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.codenames.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CodenameSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            codenames: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for CodenameSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        self.codenames.extend(iter.into_iter().map(Into::into));
    }
}
