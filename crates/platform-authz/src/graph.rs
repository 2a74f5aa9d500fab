//! Role graph
//!
//! Actors reach codenames through roles. A check flattens the graph for one
//! actor (the union of every codename on every role the actor holds) and
//! keeps the result in the [`PermissionCache`] for one TTL interval.

use std::collections::HashSet;
use std::sync::Arc;

use platform_rbac::{ActorId, ActorLookup, CodenameSet, LegacyCodenameMapper, RoleId};

use crate::cache::PermissionCache;
use crate::error::RepositoryResult;
use crate::repository::{ActorRepository, RoleRepository};

/// An actor's flattened view of the role graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorGrants {
    /// Actor the grants belong to
    pub actor_id: ActorId,
    /// Roles the actor holds
    pub roles: HashSet<RoleId>,
    /// Union of the codenames on those roles
    pub codenames: CodenameSet,
}

impl ActorGrants {
    /// Creates a flattened view.
    pub fn new(actor_id: ActorId, roles: HashSet<RoleId>, codenames: CodenameSet) -> Self {
        Self {
            actor_id,
            roles,
            codenames,
        }
    }

    /// Grants of an actor holding nothing.
    pub fn empty(actor_id: ActorId) -> Self {
        Self::new(actor_id, HashSet::new(), CodenameSet::new())
    }

    /// Whether the actor holds the wildcard codename.
    pub fn is_wildcard(&self) -> bool {
        self.codenames.is_wildcard()
    }

    /// Whether the actor holds at least one of `roles`.
    pub fn holds_any_role(&self, roles: &HashSet<RoleId>) -> bool {
        !self.roles.is_disjoint(roles)
    }

    /// Flat codename check.
    ///
    /// Wildcard, then exact match, then any deprecated codename that maps to
    /// `codename`.
    pub fn allows(&self, codename: &str, legacy: &LegacyCodenameMapper) -> bool {
        if self.codenames.has(codename) {
            return true;
        }
        legacy
            .deprecated_for(codename)
            .any(|old| self.codenames.contains(old))
    }
}

/// Read side of the actor -> role -> codename graph.
pub struct RoleGraph {
    actors: Arc<dyn ActorRepository>,
    roles: Arc<dyn RoleRepository>,
    cache: Arc<PermissionCache>,
    legacy: LegacyCodenameMapper,
}

impl std::fmt::Debug for RoleGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleGraph")
            .field("cache_ttl", &self.cache.ttl())
            .finish()
    }
}

impl RoleGraph {
    /// Create a graph reader over the given repositories and cache.
    pub fn new(
        actors: Arc<dyn ActorRepository>,
        roles: Arc<dyn RoleRepository>,
        cache: Arc<PermissionCache>,
    ) -> Self {
        Self {
            actors,
            roles,
            cache,
            legacy: LegacyCodenameMapper::new(),
        }
    }

    /// The legacy codename table consulted by flat checks.
    pub fn legacy(&self) -> &LegacyCodenameMapper {
        &self.legacy
    }

    /// Flattened grants for an actor, from cache when valid.
    ///
    /// Returns `None` when the actor does not exist or storage failed; neither
    /// outcome is cached.
    pub fn grants(&self, actor_id: ActorId) -> Option<Arc<ActorGrants>> {
        if let Some(grants) = self.cache.get(actor_id) {
            return Some(grants);
        }

        let ticket = self.cache.ticket();
        match self.flatten(actor_id) {
            Ok(Some(grants)) => {
                let grants = Arc::new(grants);
                if !self.cache.insert(ticket, grants.clone()) {
                    tracing::debug!(actor_id = %actor_id, "Discarded fill raced by invalidation");
                }
                Some(grants)
            }
            Ok(None) => {
                tracing::debug!(actor_id = %actor_id, "Actor not found");
                None
            }
            Err(e) => {
                tracing::warn!(actor_id = %actor_id, error = %e, "Failed to load role graph");
                None
            }
        }
    }

    /// Read the graph for one actor, bypassing the cache.
    pub fn flatten(&self, actor_id: ActorId) -> RepositoryResult<Option<ActorGrants>> {
        let Some(actor) = self.actors.load_actor(&ActorLookup::Id(actor_id))? else {
            return Ok(None);
        };
        if !actor.is_active {
            return Ok(Some(ActorGrants::empty(actor_id)));
        }

        let mut codenames = CodenameSet::new();
        for role in self.roles.roles(&actor.roles)? {
            codenames.extend(role.permissions);
        }
        Ok(Some(ActorGrants::new(actor_id, actor.roles, codenames)))
    }

    /// `checkPermission`: flat codename check through the cache.
    pub fn check_permission(&self, actor_id: ActorId, codename: &str) -> bool {
        self.grants(actor_id)
            .map_or(false, |grants| grants.allows(codename, &self.legacy))
    }
}
