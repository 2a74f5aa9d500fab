//! In-memory repository implementation.
//!
//! Suitable for single-process deployments, demos and tests. Every contract
//! in [`repository`](crate::repository) is implemented over one set of
//! tables behind a `parking_lot` lock.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use platform_rbac::{
    Actor, ActorId, ActorLookup, ObjectAclEntry, ObjectId, Permission, ProtectedObject,
    ResourceAclEntry, Role, RoleId, Tag, TagId, TagPermissionEntry,
};

use crate::error::{RepositoryError, RepositoryResult};
use crate::repository::{
    ActorRepository, ObjectRepository, PermissionRepository, ResourceAclRepository,
    RoleRepository, TagRepository, UpsertOutcome,
};

#[derive(Debug, Default)]
struct Tables {
    actors: HashMap<ActorId, Actor>,
    roles: HashMap<RoleId, Role>,
    permissions: BTreeMap<String, Permission>,
    objects: HashMap<ObjectId, ProtectedObject>,
    object_acl: Vec<ObjectAclEntry>,
    tags: HashMap<TagId, Tag>,
    tag_grants: Vec<TagPermissionEntry>,
    resource_acl: Vec<ResourceAclEntry>,
}

/// In-memory store implementing every repository contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    actor_loads: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn available(&self) -> RepositoryResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    /// Make every subsequent call fail with [`RepositoryError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of actor loads served so far.
    pub fn actor_loads(&self) -> u64 {
        self.actor_loads.load(Ordering::SeqCst)
    }

    /// Store an actor.
    pub fn add_actor(&self, actor: Actor) -> ActorId {
        let id = actor.id;
        self.tables.write().actors.insert(id, actor);
        id
    }

    /// Store a role, replacing any role with the same id.
    pub fn add_role(&self, role: Role) -> RoleId {
        let id = role.id;
        self.tables.write().roles.insert(id, role);
        id
    }

    /// Store a protected object.
    pub fn add_object(&self, object: ProtectedObject) -> ObjectId {
        let id = object.id;
        self.tables.write().objects.insert(id, object);
        id
    }

    /// Delete a protected object and its ACL rows.
    pub fn remove_object(&self, id: ObjectId) -> bool {
        let mut tables = self.tables.write();
        tables.object_acl.retain(|e| e.object_id != id);
        tables.objects.remove(&id).is_some()
    }

    /// Store an object ACL row.
    pub fn add_object_acl(&self, entry: ObjectAclEntry) {
        let mut tables = self.tables.write();
        if !tables.object_acl.contains(&entry) {
            tables.object_acl.push(entry);
        }
    }

    /// Store a tag.
    pub fn add_tag(&self, tag: Tag) -> TagId {
        let id = tag.id;
        self.tables.write().tags.insert(id, tag);
        id
    }

    /// Attach a tag to an object; returns `false` if the object is unknown.
    pub fn tag_object(&self, object_id: ObjectId, tag_id: TagId) -> bool {
        match self.tables.write().objects.get_mut(&object_id) {
            Some(object) => {
                object.tags.insert(tag_id);
                true
            }
            None => false,
        }
    }

    /// Store a tag grant.
    pub fn add_tag_grant(&self, entry: TagPermissionEntry) {
        let mut tables = self.tables.write();
        if !tables.tag_grants.contains(&entry) {
            tables.tag_grants.push(entry);
        }
    }

    /// Store a resource-name ACL row.
    pub fn add_resource_acl(&self, entry: ResourceAclEntry) {
        let mut tables = self.tables.write();
        if !tables.resource_acl.contains(&entry) {
            tables.resource_acl.push(entry);
        }
    }

    /// Delete every resource-name ACL row for a name, returning it to
    /// unrestricted mode.
    pub fn clear_resource_acl(&self, resource_name: &str) -> usize {
        let mut tables = self.tables.write();
        let before = tables.resource_acl.len();
        tables.resource_acl.retain(|e| e.resource_name != resource_name);
        before - tables.resource_acl.len()
    }

    /// Number of stored catalog rows.
    pub fn permission_count(&self) -> usize {
        self.tables.read().permissions.len()
    }
}

impl ActorRepository for MemoryStore {
    fn load_actor(&self, lookup: &ActorLookup) -> RepositoryResult<Option<Actor>> {
        self.available()?;
        self.actor_loads.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.read();
        let actor = match lookup {
            ActorLookup::Id(id) => tables.actors.get(id),
            ActorLookup::Username(name) => tables.actors.values().find(|a| &a.username == name),
        };
        Ok(actor.cloned())
    }

    fn set_actor_roles(&self, actor_id: ActorId, roles: HashSet<RoleId>) -> RepositoryResult<()> {
        self.available()?;
        let mut tables = self.tables.write();
        let actor = tables
            .actors
            .get_mut(&actor_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("actor {}", actor_id)))?;
        actor.roles = roles;
        Ok(())
    }
}

impl RoleRepository for MemoryStore {
    fn role(&self, id: RoleId) -> RepositoryResult<Option<Role>> {
        self.available()?;
        Ok(self.tables.read().roles.get(&id).cloned())
    }

    fn roles(&self, ids: &HashSet<RoleId>) -> RepositoryResult<Vec<Role>> {
        self.available()?;
        let tables = self.tables.read();
        Ok(ids.iter().filter_map(|id| tables.roles.get(id).cloned()).collect())
    }

    fn role_by_name(&self, name: &str) -> RepositoryResult<Option<Role>> {
        self.available()?;
        Ok(self.tables.read().roles.values().find(|r| r.name == name).cloned())
    }

    fn insert_role(&self, role: Role) -> RepositoryResult<()> {
        self.available()?;
        let mut tables = self.tables.write();
        if tables.roles.values().any(|r| r.name == role.name) {
            return Err(RepositoryError::Conflict(format!("role name {} taken", role.name)));
        }
        tables.roles.insert(role.id, role);
        Ok(())
    }

    fn delete_role(&self, id: RoleId) -> RepositoryResult<bool> {
        self.available()?;
        let mut tables = self.tables.write();
        if tables.roles.remove(&id).is_none() {
            return Ok(false);
        }
        for actor in tables.actors.values_mut() {
            actor.roles.remove(&id);
        }
        tables.object_acl.retain(|e| e.role_id != id);
        tables.tag_grants.retain(|e| e.role_id != id);
        tables.resource_acl.retain(|e| e.role_id != id);
        Ok(true)
    }

    fn grant_codename(&self, id: RoleId, codename: &str) -> RepositoryResult<bool> {
        self.available()?;
        let mut tables = self.tables.write();
        let role = tables
            .roles
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("role {}", id)))?;
        Ok(role.permissions.insert(codename.to_string()))
    }

    fn revoke_codename(&self, id: RoleId, codename: &str) -> RepositoryResult<bool> {
        self.available()?;
        let mut tables = self.tables.write();
        let role = tables
            .roles
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("role {}", id)))?;
        Ok(role.permissions.remove(codename))
    }

    fn revoke_codename_everywhere(&self, codename: &str) -> RepositoryResult<usize> {
        self.available()?;
        let mut tables = self.tables.write();
        let mut revoked = 0;
        for role in tables.roles.values_mut() {
            if role.permissions.remove(codename) {
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    fn mark_protected(&self, id: RoleId) -> RepositoryResult<bool> {
        self.available()?;
        let mut tables = self.tables.write();
        let role = tables
            .roles
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("role {}", id)))?;
        let changed = !role.is_protected;
        role.is_protected = true;
        Ok(changed)
    }
}

impl PermissionRepository for MemoryStore {
    fn list_permissions(&self) -> RepositoryResult<Vec<Permission>> {
        self.available()?;
        Ok(self.tables.read().permissions.values().cloned().collect())
    }

    fn upsert_permission(&self, permission: &Permission) -> RepositoryResult<UpsertOutcome> {
        self.available()?;
        let mut tables = self.tables.write();
        let outcome = match tables.permissions.get(&permission.codename) {
            None => UpsertOutcome::Created,
            Some(existing) if existing == permission => return Ok(UpsertOutcome::Unchanged),
            Some(_) => UpsertOutcome::Updated,
        };
        tables
            .permissions
            .insert(permission.codename.clone(), permission.clone());
        Ok(outcome)
    }

    fn delete_permission(&self, codename: &str) -> RepositoryResult<bool> {
        self.available()?;
        Ok(self.tables.write().permissions.remove(codename).is_some())
    }
}

impl ObjectRepository for MemoryStore {
    fn object(&self, id: ObjectId) -> RepositoryResult<Option<ProtectedObject>> {
        self.available()?;
        Ok(self.tables.read().objects.get(&id).cloned())
    }

    fn object_acl(&self, id: ObjectId, verb: &str) -> RepositoryResult<Vec<ObjectAclEntry>> {
        self.available()?;
        Ok(self
            .tables
            .read()
            .object_acl
            .iter()
            .filter(|e| e.object_id == id && e.verb == verb)
            .cloned()
            .collect())
    }
}

impl TagRepository for MemoryStore {
    fn tag_grants(
        &self,
        tags: &HashSet<TagId>,
        verb: &str,
    ) -> RepositoryResult<Vec<TagPermissionEntry>> {
        self.available()?;
        Ok(self
            .tables
            .read()
            .tag_grants
            .iter()
            .filter(|e| tags.contains(&e.tag_id) && e.verb == verb)
            .cloned()
            .collect())
    }
}

impl ResourceAclRepository for MemoryStore {
    fn resource_acl(&self, resource_name: &str) -> RepositoryResult<Vec<ResourceAclEntry>> {
        self.available()?;
        Ok(self
            .tables
            .read()
            .resource_acl
            .iter()
            .filter(|e| e.resource_name == resource_name)
            .cloned()
            .collect())
    }
}
