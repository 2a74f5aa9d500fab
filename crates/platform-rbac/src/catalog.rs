//! # Permission Catalog
//!
//! The authoritative set of codenames: a fixed static list plus the codenames
//! generated for every registered extensible resource type. Each type gets the
//! four base verbs (view/create/edit/delete) and one codename per custom
//! action, except custom actions whose key would shadow a base verb.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{CatalogError, CatalogResult};
use crate::models::Permission;
use crate::permissions::{codename, is_valid_segment, WILDCARD};
use crate::verbs::BaseVerb;

/// Static catalog rows: `(codename, category, label)`.
const STATIC_PERMISSIONS: &[(&str, &str, &str)] = &[
    (WILDCARD, "system", "Full access"),
    // Users
    ("users.view", "users", "View users"),
    ("users.create", "users", "Create users"),
    ("users.edit", "users", "Edit users"),
    ("users.delete", "users", "Delete users"),
    // Roles
    ("roles.view", "roles", "View roles"),
    ("roles.create", "roles", "Create roles"),
    ("roles.edit", "roles", "Edit roles"),
    ("roles.delete", "roles", "Delete roles"),
    // Services
    ("services.view", "services", "View services"),
    ("services.deploy", "services", "Deploy services"),
    ("services.stop", "services", "Stop services"),
    ("services.edit", "services", "Edit service settings"),
    // Tags
    ("tags.view", "tags", "View tags"),
    ("tags.edit", "tags", "Edit tags"),
    // Settings
    ("settings.view", "settings", "View settings"),
    ("settings.edit", "settings", "Edit settings"),
    // Audit
    ("audit.view", "audit", "View audit log"),
    // Jobs
    ("jobs.view", "jobs", "View scheduled jobs"),
    ("jobs.run", "jobs", "Run scheduled jobs"),
    // Files
    ("files.view", "files", "View files"),
    ("files.upload", "files", "Upload files"),
    ("files.delete", "files", "Delete files"),
    // Notifications
    ("notifications.view", "notifications", "View notifications"),
];

/// A custom action declared by an extensible resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAction {
    /// Codename suffix, e.g. `publish`
    pub key: String,
    /// Human-readable label, e.g. `Publish articles`
    pub label: String,
}

impl CustomAction {
    /// Creates a custom action.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// An extensible resource type registered at runtime.
///
/// # Example
///
/// ```
/// use platform_rbac::catalog::{CustomAction, ExtensibleTypeDefinition};
///
/// let def = ExtensibleTypeDefinition::new("articles", "Articles")
///     .with_action(CustomAction::new("publish", "Publish articles"));
/// assert_eq!(def.codenames(), vec![
///     "articles.view",
///     "articles.create",
///     "articles.edit",
///     "articles.delete",
///     "articles.publish",
/// ]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensibleTypeDefinition {
    /// Codename prefix, e.g. `articles`
    pub slug: String,

    /// Human-readable plural name
    pub label: String,

    /// Additional verbs beyond the base four
    #[serde(default)]
    pub custom_actions: Vec<CustomAction>,
}

impl ExtensibleTypeDefinition {
    /// Creates a definition with no custom actions.
    pub fn new(slug: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            label: label.into(),
            custom_actions: Vec::new(),
        }
    }

    /// Add a custom action.
    pub fn with_action(mut self, action: CustomAction) -> Self {
        self.custom_actions.push(action);
        self
    }

    /// Decode a JSON array of definitions.
    ///
    /// Decoding does not validate; validation happens when the catalog is
    /// generated.
    pub fn parse_list(json: &str) -> CatalogResult<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject a definition that would produce malformed codenames.
    pub fn validate(&self) -> CatalogResult<()> {
        if !is_valid_segment(&self.slug) {
            return Err(CatalogError::InvalidSlug(self.slug.clone()));
        }
        if self.label.trim().is_empty() {
            return Err(CatalogError::MissingLabel(self.slug.clone()));
        }
        for action in &self.custom_actions {
            if !is_valid_segment(&action.key) {
                return Err(CatalogError::InvalidAction {
                    slug: self.slug.clone(),
                    action: action.key.clone(),
                });
            }
            if action.label.trim().is_empty() {
                return Err(CatalogError::MissingLabel(codename(&self.slug, &action.key)));
            }
        }
        Ok(())
    }

    /// Codenames this definition generates, in catalog order.
    pub fn codenames(&self) -> Vec<String> {
        self.permissions().into_iter().map(|p| p.codename).collect()
    }

    fn permissions(&self) -> Vec<Permission> {
        let mut rows: Vec<Permission> = BaseVerb::all()
            .iter()
            .map(|verb| {
                Permission::new(
                    codename(&self.slug, verb.as_str()),
                    self.slug.clone(),
                    format!("{} {}", verb.display_name(), self.label.to_lowercase()),
                )
                .with_description(format!(
                    "{} access to {} records",
                    verb.display_name(),
                    self.label
                ))
            })
            .collect();

        let mut seen = HashSet::new();
        for action in &self.custom_actions {
            if BaseVerb::is_base(&action.key) {
                tracing::warn!(
                    slug = %self.slug,
                    action = %action.key,
                    "Custom action shadows a base verb, skipping"
                );
                continue;
            }
            if !seen.insert(action.key.as_str()) {
                continue;
            }
            rows.push(
                Permission::new(
                    codename(&self.slug, &action.key),
                    self.slug.clone(),
                    action.label.clone(),
                )
                .with_description(format!("{} ({})", action.label, self.label)),
            );
        }
        rows
    }
}

/// The computed codename superset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionCatalog {
    entries: BTreeMap<String, Permission>,
}

impl PermissionCatalog {
    /// Catalog holding only the static list.
    pub fn builtin() -> Self {
        let entries = STATIC_PERMISSIONS
            .iter()
            .map(|(code, category, label)| {
                (code.to_string(), Permission::new(*code, *category, *label))
            })
            .collect();
        Self { entries }
    }

    /// Compute the full catalog for a set of type definitions.
    ///
    /// Every definition is validated before anything is generated, so a
    /// single malformed definition yields an error and no catalog at all.
    /// Static rows win over generated rows with the same codename.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] for an invalid slug, invalid action key,
    /// empty label, or a slug registered twice.
    pub fn generate(definitions: &[ExtensibleTypeDefinition]) -> CatalogResult<Self> {
        let mut slugs = HashSet::new();
        for def in definitions {
            def.validate()?;
            if !slugs.insert(def.slug.as_str()) {
                return Err(CatalogError::DuplicateSlug(def.slug.clone()));
            }
        }

        let mut catalog = Self::builtin();
        for def in definitions {
            for permission in def.permissions() {
                if catalog.entries.contains_key(&permission.codename) {
                    tracing::debug!(
                        codename = %permission.codename,
                        "Generated codename already in static catalog"
                    );
                    continue;
                }
                catalog.entries.insert(permission.codename.clone(), permission);
            }
        }
        Ok(catalog)
    }

    /// Check whether a codename is part of the catalog.
    pub fn contains(&self, codename: &str) -> bool {
        self.entries.contains_key(codename)
    }

    /// Look up a catalog row.
    pub fn get(&self, codename: &str) -> Option<&Permission> {
        self.entries.get(codename)
    }

    /// All rows, ordered by codename.
    pub fn entries(&self) -> impl Iterator<Item = &Permission> {
        self.entries.values()
    }

    /// All codenames, ordered.
    pub fn codenames(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Rows belonging to one category.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Permission> {
        self.entries.values().filter(move |p| p.category == category)
    }

    /// Get the count of codenames.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn articles() -> ExtensibleTypeDefinition {
        ExtensibleTypeDefinition::new("articles", "Articles")
            .with_action(CustomAction::new("publish", "Publish articles"))
    }

    #[test]
    fn test_builtin_contains_wildcard() {
        let catalog = PermissionCatalog::builtin();
        assert!(catalog.contains(WILDCARD));
        assert!(catalog.contains("services.deploy"));
        assert_eq!(catalog.len(), STATIC_PERMISSIONS.len());
    }

    #[test]
    fn test_generate_base_and_custom() {
        let catalog = PermissionCatalog::generate(&[articles()]).unwrap();
        for code in [
            "articles.view",
            "articles.create",
            "articles.edit",
            "articles.delete",
            "articles.publish",
        ] {
            assert!(catalog.contains(code), "missing {}", code);
        }
        assert_eq!(catalog.len(), STATIC_PERMISSIONS.len() + 5);
        assert_eq!(catalog.by_category("articles").count(), 5);
        assert_eq!(catalog.get("articles.publish").unwrap().label, "Publish articles");
    }

    #[test]
    fn test_custom_action_colliding_with_base_is_skipped() {
        let def = ExtensibleTypeDefinition::new("articles", "Articles")
            .with_action(CustomAction::new("edit", "Edit differently"))
            .with_action(CustomAction::new("archive", "Archive articles"))
            .with_action(CustomAction::new("archive", "Archive again"));
        let catalog = PermissionCatalog::generate(&[def]).unwrap();
        assert_eq!(catalog.by_category("articles").count(), 5);
        assert_eq!(catalog.get("articles.edit").unwrap().label, "Edit articles");
        assert_eq!(catalog.get("articles.archive").unwrap().label, "Archive articles");
    }

    #[test]
    fn test_invalid_slug_is_fatal() {
        let defs = vec![articles(), ExtensibleTypeDefinition::new("Bad Slug", "Bad")];
        let err = PermissionCatalog::generate(&defs).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidSlug(_)));
    }

    #[test]
    fn test_invalid_action_is_fatal() {
        let def = ExtensibleTypeDefinition::new("articles", "Articles")
            .with_action(CustomAction::new("go.live", "Go live"));
        let err = PermissionCatalog::generate(&[def]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ACTION");
    }

    #[test]
    fn test_duplicate_slug_is_fatal() {
        let err = PermissionCatalog::generate(&[articles(), articles()]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateSlug(ref s) if s == "articles"));
    }

    #[test]
    fn test_missing_label_is_fatal() {
        let def = ExtensibleTypeDefinition::new("articles", "  ");
        assert!(matches!(
            PermissionCatalog::generate(&[def]),
            Err(CatalogError::MissingLabel(_))
        ));
    }

    #[test]
    fn test_static_rows_win_over_generated() {
        let def = ExtensibleTypeDefinition::new("users", "People");
        let catalog = PermissionCatalog::generate(&[def]).unwrap();
        assert_eq!(catalog.get("users.view").unwrap().label, "View users");
        assert_eq!(catalog.len(), STATIC_PERMISSIONS.len());
    }

    #[test]
    fn test_parse_list() {
        let json = r#"[
            {"slug": "articles", "label": "Articles",
             "custom_actions": [{"key": "publish", "label": "Publish articles"}]},
            {"slug": "invoices", "label": "Invoices"}
        ]"#;
        let defs = ExtensibleTypeDefinition::parse_list(json).unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0], articles());
        assert!(defs[1].custom_actions.is_empty());

        let err = ExtensibleTypeDefinition::parse_list("{not json").unwrap_err();
        assert!(matches!(err, CatalogError::Malformed(_)));
    }
}
