//! Domain models for the permission graph
//!
//! This module holds the records the engine reads from storage: actors and
//! their role memberships, roles and their codenames, and the three kinds of
//! override rows (object ACL, tag grants, resource-name ACL).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Identifier of an actor.
pub type ActorId = Uuid;

/// Identifier of a role.
pub type RoleId = Uuid;

/// Identifier of a protected object.
pub type ObjectId = Uuid;

/// Identifier of a tag.
pub type TagId = Uuid;

/// An authenticated identity capable of holding permissions.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use platform_rbac::Actor;
///
/// let role_id = Uuid::now_v7();
/// let actor = Actor::new("alice").with_role(role_id);
/// assert!(actor.is_active);
/// assert!(actor.roles.contains(&role_id));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Unique actor ID
    pub id: ActorId,

    /// Login name, unique across actors
    pub username: String,

    /// Inactive actors hold no capabilities
    pub is_active: bool,

    /// Role memberships
    #[serde(default)]
    pub roles: HashSet<RoleId>,
}

impl Actor {
    /// Creates an active actor with no roles.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            username: username.into(),
            is_active: true,
            roles: HashSet::new(),
        }
    }

    /// Add a role membership.
    pub fn with_role(mut self, role_id: RoleId) -> Self {
        self.roles.insert(role_id);
        self
    }

    /// Mark the actor inactive.
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// How an actor is looked up in the actor repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorLookup {
    /// Look up by primary key
    Id(ActorId),
    /// Look up by login name
    Username(String),
}

impl From<ActorId> for ActorLookup {
    fn from(id: ActorId) -> Self {
        ActorLookup::Id(id)
    }
}

impl std::fmt::Display for ActorLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorLookup::Id(id) => write!(f, "id:{}", id),
            ActorLookup::Username(name) => write!(f, "username:{}", name),
        }
    }
}

/// A named bundle of permission codenames.
///
/// Protected roles are created by catalog seeding, always hold the full
/// catalog, and cannot be deleted through administrative operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique role ID
    pub id: RoleId,

    /// Unique role name
    pub name: String,

    /// Whether the role is managed by seeding
    pub is_protected: bool,

    /// Granted codenames
    #[serde(default)]
    pub permissions: HashSet<String>,

    /// When the role was created
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Creates a user-managed role with no permissions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            is_protected: false,
            permissions: HashSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Creates a protected role with no permissions.
    pub fn protected(name: impl Into<String>) -> Self {
        Self {
            is_protected: true,
            ..Self::new(name)
        }
    }

    /// Grant a codename.
    pub fn with_permission(mut self, codename: impl Into<String>) -> Self {
        self.permissions.insert(codename.into());
        self
    }

    /// Grant several codenames.
    pub fn with_permissions<I, S>(mut self, codenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions.extend(codenames.into_iter().map(Into::into));
        self
    }
}

/// A stored catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Unique dotted codename, e.g. `users.edit`
    pub codename: String,

    /// Grouping shown in administration screens
    pub category: String,

    /// Short human-readable label
    pub label: String,

    /// Longer description
    #[serde(default)]
    pub description: String,
}

impl Permission {
    /// Creates a catalog row with an empty description.
    pub fn new(
        codename: impl Into<String>,
        category: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            codename: codename.into(),
            category: category.into(),
            label: label.into(),
            description: String::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Effect of an object ACL row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AclEffect {
    /// Grants the verb
    Allow,
    /// Revokes the verb, beating every grant
    Deny,
}

/// A protected object as seen by the object ACL resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedObject {
    /// Object ID
    pub id: ObjectId,

    /// Codename prefix of the object's type, e.g. `documents`
    pub resource_type: String,

    /// Tags attached to the object
    #[serde(default)]
    pub tags: HashSet<TagId>,
}

impl ProtectedObject {
    /// Creates an untagged object of the given type.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            resource_type: resource_type.into(),
            tags: HashSet::new(),
        }
    }

    /// Attach a tag.
    pub fn with_tag(mut self, tag_id: TagId) -> Self {
        self.tags.insert(tag_id);
        self
    }
}

/// Per-object override: `(object, role, verb, effect)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectAclEntry {
    /// Object the row applies to
    pub object_id: ObjectId,
    /// Role the row applies to
    pub role_id: RoleId,
    /// Verb the row applies to
    pub verb: String,
    /// Allow or deny
    pub effect: AclEffect,
}

impl ObjectAclEntry {
    /// Creates an allow row.
    pub fn allow(object_id: ObjectId, role_id: RoleId, verb: impl Into<String>) -> Self {
        Self {
            object_id,
            role_id,
            verb: verb.into(),
            effect: AclEffect::Allow,
        }
    }

    /// Creates a deny row.
    pub fn deny(object_id: ObjectId, role_id: RoleId, verb: impl Into<String>) -> Self {
        Self {
            object_id,
            role_id,
            verb: verb.into(),
            effect: AclEffect::Deny,
        }
    }
}

/// A label that can be attached to objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// Tag ID
    pub id: TagId,
    /// Unique tag name
    pub name: String,
}

impl Tag {
    /// Creates a tag.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
        }
    }
}

/// Grant of a verb to a role on every object carrying a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagPermissionEntry {
    /// Tag the grant propagates through
    pub tag_id: TagId,
    /// Role receiving the grant
    pub role_id: RoleId,
    /// Granted verb
    pub verb: String,
}

impl TagPermissionEntry {
    /// Creates a tag grant.
    pub fn new(tag_id: TagId, role_id: RoleId, verb: impl Into<String>) -> Self {
        Self {
            tag_id,
            role_id,
            verb: verb.into(),
        }
    }
}

/// Resource-name override: `(resource name, role, verb)`.
///
/// The verb `full` grants every verb on the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceAclEntry {
    /// Resource name, e.g. `billing-api`
    pub resource_name: String,
    /// Role the row applies to
    pub role_id: RoleId,
    /// Granted verb, or `full`
    pub verb: String,
}

impl ResourceAclEntry {
    /// Creates a resource-name ACL row.
    pub fn new(resource_name: impl Into<String>, role_id: RoleId, verb: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            role_id,
            verb: verb.into(),
        }
    }

    /// Check whether this row grants `verb`.
    pub fn grants(&self, verb: &str) -> bool {
        self.verb == verb || self.verb == crate::verbs::VERB_FULL
    }
}
