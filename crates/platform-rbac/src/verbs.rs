//! # Verbs
//!
//! Verbs name what an actor wants to do to a resource. Every extensible
//! resource type gets the four base verbs; types may add custom verbs of
//! their own, and the resource-name ACL understands the special `full` verb.

use serde::{Deserialize, Serialize};

/// ACL verb granting every verb on a resource name.
pub const VERB_FULL: &str = "full";

/// The four verbs generated for every extensible resource type.
///
/// - **View**: Read resource data
/// - **Create**: Create new instances
/// - **Edit**: Modify existing instances
/// - **Delete**: Remove instances
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum BaseVerb {
    /// Read/view a resource.
    View,

    /// Create a new resource.
    Create,

    /// Modify an existing resource.
    Edit,

    /// Permanently remove a resource.
    Delete,
}

impl BaseVerb {
    /// Get the codename suffix for this verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseVerb::View => "view",
            BaseVerb::Create => "create",
            BaseVerb::Edit => "edit",
            BaseVerb::Delete => "delete",
        }
    }

    /// Parse a verb, accepting the aliases older callers still send.
    ///
    /// # Example
    ///
    /// ```
    /// use platform_rbac::verbs::BaseVerb;
    ///
    /// assert_eq!(BaseVerb::parse("view"), Some(BaseVerb::View));
    /// assert_eq!(BaseVerb::parse("change"), Some(BaseVerb::Edit));
    /// assert_eq!(BaseVerb::parse("deploy"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "view" | "read" | "get" => Some(BaseVerb::View),
            "create" | "add" | "new" => Some(BaseVerb::Create),
            "edit" | "update" | "write" | "change" => Some(BaseVerb::Edit),
            "delete" | "remove" | "destroy" => Some(BaseVerb::Delete),
            _ => None,
        }
    }

    /// All base verbs in catalog order.
    pub fn all() -> [Self; 4] {
        [BaseVerb::View, BaseVerb::Create, BaseVerb::Edit, BaseVerb::Delete]
    }

    /// Check whether `verb` is exactly one of the base verb suffixes.
    ///
    /// Aliases do not count; this is used to detect custom actions whose key
    /// would shadow a generated base codename.
    pub fn is_base(verb: &str) -> bool {
        Self::all().iter().any(|v| v.as_str() == verb)
    }

    /// Human-readable label prefix used when generating catalog labels.
    pub fn display_name(&self) -> &'static str {
        match self {
            BaseVerb::View => "View",
            BaseVerb::Create => "Create",
            BaseVerb::Edit => "Edit",
            BaseVerb::Delete => "Delete",
        }
    }
}

impl std::fmt::Display for BaseVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("view", Some(BaseVerb::View))]
    #[case("READ", Some(BaseVerb::View))]
    #[case("add", Some(BaseVerb::Create))]
    #[case("update", Some(BaseVerb::Edit))]
    #[case("change", Some(BaseVerb::Edit))]
    #[case("destroy", Some(BaseVerb::Delete))]
    #[case("deploy", None)]
    #[case("", None)]
    fn test_verb_parsing(#[case] input: &str, #[case] expected: Option<BaseVerb>) {
        assert_eq!(BaseVerb::parse(input), expected);
    }

    #[test]
    fn test_is_base_ignores_aliases() {
        assert!(BaseVerb::is_base("view"));
        assert!(BaseVerb::is_base("delete"));
        assert!(!BaseVerb::is_base("read"));
        assert!(!BaseVerb::is_base("View"));
        assert!(!BaseVerb::is_base(VERB_FULL));
    }

    #[test]
    fn test_all_verbs_order() {
        let names: Vec<&str> = BaseVerb::all().iter().map(|v| v.as_str()).collect();
        assert_eq!(names, vec!["view", "create", "edit", "delete"]);
    }
}
