//! Permission engine
//!
//! The facade route handlers and job runners call. It owns the permission
//! cache and wires the role graph and both ACL resolvers to the repositories.
//!
//! Checks never fail: an absent actor or object, or a storage error, is a
//! deny. Administrative mutations that can change what many actors hold
//! clear the whole cache before returning.

use std::collections::HashSet;
use std::sync::Arc;

use platform_rbac::{ActorId, ActorLookup, ExtensibleTypeDefinition, ObjectId, RoleId};

use crate::cache::PermissionCache;
use crate::config::EngineConfig;
use crate::error::{AuthzError, AuthzResult};
use crate::graph::RoleGraph;
use crate::object_acl::{ObjectAclPolicy, ObjectAclResolver};
use crate::repository::Repositories;
use crate::resolver::{Decision, PolicyResolver};
use crate::resource_acl::{script_verb, ResourceAclPolicy, ResourceAclResolver};
use crate::seeding::{CatalogSeeder, SeedReport};

/// Multi-layer permission resolution engine.
///
/// Construct once at startup and share behind an `Arc`.
pub struct PermissionEngine {
    config: EngineConfig,
    repos: Repositories,
    cache: Arc<PermissionCache>,
    graph: RoleGraph,
    objects: ObjectAclResolver,
    resources: ResourceAclResolver,
}

impl std::fmt::Debug for PermissionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionEngine")
            .field("config", &self.config)
            .field("cached_actors", &self.cache.len())
            .finish()
    }
}

impl PermissionEngine {
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidConfig`] if `config` does not validate.
    pub fn new(repos: Repositories, config: EngineConfig) -> AuthzResult<Self> {
        config.validate()?;

        let cache = Arc::new(PermissionCache::new(config.cache_ttl()));
        let graph = RoleGraph::new(repos.actors.clone(), repos.roles.clone(), cache.clone());
        let objects = PolicyResolver::new(ObjectAclPolicy::new(
            repos.objects.clone(),
            repos.tags.clone(),
        ));
        let resources = PolicyResolver::new(ResourceAclPolicy::new(
            repos.resource_acl.clone(),
            config.resource_category.clone(),
        ));

        Ok(Self {
            config,
            repos,
            cache,
            graph,
            objects,
            resources,
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The engine-owned permission cache.
    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    /// Resolve an actor reference to its id, if the actor exists.
    pub fn resolve_actor(&self, lookup: &ActorLookup) -> Option<ActorId> {
        match self.repos.actors.load_actor(lookup) {
            Ok(actor) => actor.map(|a| a.id),
            Err(e) => {
                tracing::warn!(lookup = %lookup, error = %e, "Failed to resolve actor");
                None
            }
        }
    }

    /// Whether the actor holds `codename`, directly, through `*`, or through
    /// a deprecated codename that maps to it.
    pub fn check_permission(&self, actor_id: ActorId, codename: &str) -> bool {
        self.graph.check_permission(actor_id, codename)
    }

    /// Whether the actor may perform `verb` on an object.
    pub fn check_object_permission(&self, actor_id: ActorId, object_id: ObjectId, verb: &str) -> bool {
        self.explain_object_permission(actor_id, object_id, verb).allowed
    }

    /// [`check_object_permission`](Self::check_object_permission) with the
    /// deciding stage.
    pub fn explain_object_permission(
        &self,
        actor_id: ActorId,
        object_id: ObjectId,
        verb: &str,
    ) -> Decision {
        match self.graph.grants(actor_id) {
            Some(grants) => self
                .objects
                .resolve(&grants, &object_id, verb, self.graph.legacy()),
            None => Decision::denied(),
        }
    }

    /// Whether the actor may perform `verb` on a named resource.
    pub fn check_resource_permission(&self, actor_id: ActorId, resource_name: &str, verb: &str) -> bool {
        self.explain_resource_permission(actor_id, resource_name, verb)
            .allowed
    }

    /// [`check_resource_permission`](Self::check_resource_permission) with
    /// the deciding stage.
    pub fn explain_resource_permission(
        &self,
        actor_id: ActorId,
        resource_name: &str,
        verb: &str,
    ) -> Decision {
        match self.graph.grants(actor_id) {
            Some(grants) => self
                .resources
                .resolve(&grants, resource_name, verb, self.graph.legacy()),
            None => Decision::denied(),
        }
    }

    /// Whether the actor may run a script against a named resource.
    ///
    /// The script identifier is mapped to `stop` or `deploy` first.
    pub fn check_resource_script_permission(
        &self,
        actor_id: ActorId,
        resource_name: &str,
        script: &str,
    ) -> bool {
        self.check_resource_permission(actor_id, resource_name, script_verb(script))
    }

    /// Drop one actor's cached grants, or every actor's when `None`.
    pub fn invalidate(&self, actor_id: Option<ActorId>) {
        match actor_id {
            Some(id) => {
                self.cache.invalidate(id);
                tracing::debug!(actor_id = %id, "Permission cache entry invalidated");
            }
            None => {
                self.cache.clear();
                tracing::info!("Permission cache cleared");
            }
        }
    }

    /// Recompute the catalog and bring storage in line with it.
    ///
    /// The cache is cleared before this returns, whether or not seeding
    /// succeeded.
    ///
    /// # Errors
    ///
    /// [`AuthzError::Configuration`] for a malformed definition (nothing is
    /// written), [`AuthzError::Repository`] for storage failures.
    pub fn reseed_catalog(&self, definitions: &[ExtensibleTypeDefinition]) -> AuthzResult<SeedReport> {
        let seeder = CatalogSeeder::new(
            self.repos.roles.as_ref(),
            self.repos.permissions.as_ref(),
            &self.config.protected_role_name,
        );
        let result = seeder.reseed(definitions);
        self.invalidate(None);
        result
    }

    /// Grant a codename to a role.
    ///
    /// # Returns
    ///
    /// `true` if the role did not already hold it
    pub fn grant_role_permission(&self, role_id: RoleId, codename: &str) -> AuthzResult<bool> {
        self.require_role(role_id)?;
        let result = self.repos.roles.grant_codename(role_id, codename);
        self.invalidate(None);
        Ok(result?)
    }

    /// Revoke a codename from a role.
    ///
    /// # Returns
    ///
    /// `true` if the role held it
    pub fn revoke_role_permission(&self, role_id: RoleId, codename: &str) -> AuthzResult<bool> {
        self.require_role(role_id)?;
        let result = self.repos.roles.revoke_codename(role_id, codename);
        self.invalidate(None);
        Ok(result?)
    }

    /// Delete a user-created role with its memberships and ACL rows.
    ///
    /// # Errors
    ///
    /// [`AuthzError::ProtectedRole`] for the seeded protected role,
    /// [`AuthzError::NotFound`] for an unknown role.
    pub fn delete_role(&self, role_id: RoleId) -> AuthzResult<()> {
        let role = self.require_role(role_id)?;
        if role.is_protected {
            return Err(AuthzError::ProtectedRole(role.name));
        }
        let result = self.repos.roles.delete_role(role_id);
        self.invalidate(None);
        result?;
        tracing::info!(role_id = %role_id, role = %role.name, "Role deleted");
        Ok(())
    }

    /// Replace an actor's role memberships.
    pub fn assign_actor_roles(&self, actor_id: ActorId, roles: HashSet<RoleId>) -> AuthzResult<()> {
        let result = self.repos.actors.set_actor_roles(actor_id, roles);
        self.invalidate(Some(actor_id));
        result.map_err(|e| match e {
            crate::error::RepositoryError::NotFound(what) => AuthzError::NotFound(what),
            other => AuthzError::Repository(other),
        })
    }

    fn require_role(&self, role_id: RoleId) -> AuthzResult<platform_rbac::Role> {
        self.repos
            .roles
            .role(role_id)?
            .ok_or_else(|| AuthzError::NotFound(format!("role {}", role_id)))
    }
}
