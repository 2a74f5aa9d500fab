//! Repository contracts
//!
//! The engine owns no storage. Collaborators implement these traits over
//! whatever backs the business entities; [`MemoryStore`](crate::MemoryStore)
//! is the in-process reference implementation.
//!
//! All calls are synchronous and bounded: a permission check performs at most
//! a handful of them on the calling thread.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use platform_rbac::{
    Actor, ActorId, ActorLookup, ObjectAclEntry, ObjectId, Permission, ProtectedObject,
    ResourceAclEntry, Role, RoleId, TagId, TagPermissionEntry,
};

use crate::error::RepositoryResult;

/// Actor storage.
pub trait ActorRepository: Send + Sync {
    /// Load an actor with its role memberships.
    fn load_actor(&self, lookup: &ActorLookup) -> RepositoryResult<Option<Actor>>;

    /// Replace an actor's role memberships.
    fn set_actor_roles(&self, actor_id: ActorId, roles: HashSet<RoleId>) -> RepositoryResult<()>;
}

/// Role storage and the role -> codename edges.
pub trait RoleRepository: Send + Sync {
    /// Load one role.
    fn role(&self, id: RoleId) -> RepositoryResult<Option<Role>>;

    /// Load several roles; unknown ids are skipped.
    fn roles(&self, ids: &HashSet<RoleId>) -> RepositoryResult<Vec<Role>>;

    /// Find a role by its unique name.
    fn role_by_name(&self, name: &str) -> RepositoryResult<Option<Role>>;

    /// Store a new role.
    fn insert_role(&self, role: Role) -> RepositoryResult<()>;

    /// Delete a role and every membership and ACL row that references it.
    fn delete_role(&self, id: RoleId) -> RepositoryResult<bool>;

    /// Grant a codename; returns `true` if it was not already held.
    fn grant_codename(&self, id: RoleId, codename: &str) -> RepositoryResult<bool>;

    /// Revoke a codename; returns `true` if it was held.
    fn revoke_codename(&self, id: RoleId, codename: &str) -> RepositoryResult<bool>;

    /// Revoke a codename from every role; returns how many roles held it.
    fn revoke_codename_everywhere(&self, codename: &str) -> RepositoryResult<usize>;

    /// Flag a role as protected; returns `true` if it was not already.
    fn mark_protected(&self, id: RoleId) -> RepositoryResult<bool>;
}

/// Outcome of a catalog row upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Row did not exist
    Created,
    /// Row existed with different category, label or description
    Updated,
    /// Row existed unchanged
    Unchanged,
}

/// Catalog storage.
pub trait PermissionRepository: Send + Sync {
    /// All stored catalog rows.
    fn list_permissions(&self) -> RepositoryResult<Vec<Permission>>;

    /// Insert or update a catalog row keyed by codename.
    fn upsert_permission(&self, permission: &Permission) -> RepositoryResult<UpsertOutcome>;

    /// Delete a catalog row; returns `true` if it existed.
    fn delete_permission(&self, codename: &str) -> RepositoryResult<bool>;
}

/// Protected objects and their ACL rows.
pub trait ObjectRepository: Send + Sync {
    /// Load an object with its tags.
    fn object(&self, id: ObjectId) -> RepositoryResult<Option<ProtectedObject>>;

    /// ACL rows for one object and verb, both effects.
    fn object_acl(&self, id: ObjectId, verb: &str) -> RepositoryResult<Vec<ObjectAclEntry>>;
}

/// Tag grants.
pub trait TagRepository: Send + Sync {
    /// Grants of `verb` through any of `tags`.
    fn tag_grants(
        &self,
        tags: &HashSet<TagId>,
        verb: &str,
    ) -> RepositoryResult<Vec<TagPermissionEntry>>;
}

/// Resource-name ACL rows.
pub trait ResourceAclRepository: Send + Sync {
    /// Every row for a resource name, all verbs.
    fn resource_acl(&self, resource_name: &str) -> RepositoryResult<Vec<ResourceAclEntry>>;
}

/// The set of collaborators an engine reads from.
#[derive(Clone)]
pub struct Repositories {
    /// Actor storage
    pub actors: Arc<dyn ActorRepository>,
    /// Role storage
    pub roles: Arc<dyn RoleRepository>,
    /// Catalog storage
    pub permissions: Arc<dyn PermissionRepository>,
    /// Object ACL storage
    pub objects: Arc<dyn ObjectRepository>,
    /// Tag grant storage
    pub tags: Arc<dyn TagRepository>,
    /// Resource-name ACL storage
    pub resource_acl: Arc<dyn ResourceAclRepository>,
}

impl Repositories {
    /// Use one store for every contract.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ActorRepository
            + RoleRepository
            + PermissionRepository
            + ObjectRepository
            + TagRepository
            + ResourceAclRepository
            + 'static,
    {
        Self {
            actors: store.clone(),
            roles: store.clone(),
            permissions: store.clone(),
            objects: store.clone(),
            tags: store.clone(),
            resource_acl: store,
        }
    }
}

impl fmt::Debug for Repositories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
