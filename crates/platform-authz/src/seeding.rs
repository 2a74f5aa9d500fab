//! Catalog seeding
//!
//! Brings stored permission rows and the protected role in line with the
//! computed [`PermissionCatalog`]. Seeding runs at process start and whenever
//! extensible type definitions change. It is idempotent: a second run with
//! the same definitions changes nothing.

use serde::Serialize;
use std::collections::HashSet;

use platform_rbac::{ExtensibleTypeDefinition, PermissionCatalog, Role};

use crate::error::AuthzResult;
use crate::repository::{PermissionRepository, RoleRepository, UpsertOutcome};

/// What a seeding run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Catalog rows inserted
    pub created: usize,
    /// Catalog rows whose category, label or description changed
    pub updated: usize,
    /// Catalog rows already up to date
    pub unchanged: usize,
    /// Stored codenames no longer generated, now deleted
    pub pruned: Vec<String>,
    /// Role grants removed along with pruned codenames
    pub revoked_grants: usize,
    /// Whether the protected role had to be created
    pub protected_role_created: bool,
    /// Whether an existing role of that name had to be flagged protected
    pub protected_role_adopted: bool,
    /// Codenames newly granted to the protected role
    pub protected_grants_added: usize,
}

impl SeedReport {
    /// Whether the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.created == 0
            && self.updated == 0
            && self.pruned.is_empty()
            && self.revoked_grants == 0
            && !self.protected_role_created
            && !self.protected_role_adopted
            && self.protected_grants_added == 0
    }
}

/// Applies a catalog to storage.
pub struct CatalogSeeder<'a> {
    roles: &'a dyn RoleRepository,
    permissions: &'a dyn PermissionRepository,
    protected_role_name: &'a str,
}

impl<'a> CatalogSeeder<'a> {
    /// Create a seeder over role and catalog storage.
    pub fn new(
        roles: &'a dyn RoleRepository,
        permissions: &'a dyn PermissionRepository,
        protected_role_name: &'a str,
    ) -> Self {
        Self {
            roles,
            permissions,
            protected_role_name,
        }
    }

    /// Seed storage from type definitions.
    ///
    /// The catalog is computed before anything is written, so a malformed
    /// definition aborts with a configuration error and leaves storage
    /// untouched. User-created roles are never deleted; they only lose
    /// pruned codenames.
    pub fn reseed(&self, definitions: &[ExtensibleTypeDefinition]) -> AuthzResult<SeedReport> {
        let catalog = PermissionCatalog::generate(definitions)?;
        let mut report = SeedReport::default();

        for permission in catalog.entries() {
            match self.permissions.upsert_permission(permission)? {
                UpsertOutcome::Created => report.created += 1,
                UpsertOutcome::Updated => report.updated += 1,
                UpsertOutcome::Unchanged => report.unchanged += 1,
            }
        }

        for stored in self.permissions.list_permissions()? {
            if catalog.contains(&stored.codename) {
                continue;
            }
            report.revoked_grants += self.roles.revoke_codename_everywhere(&stored.codename)?;
            self.permissions.delete_permission(&stored.codename)?;
            report.pruned.push(stored.codename);
        }

        let role = match self.roles.role_by_name(self.protected_role_name)? {
            Some(role) => {
                if self.roles.mark_protected(role.id)? {
                    tracing::warn!(
                        role_id = %role.id,
                        role = %role.name,
                        "Adopted existing role as the protected role"
                    );
                    report.protected_role_adopted = true;
                }
                role
            }
            None => {
                let role = Role::protected(self.protected_role_name);
                self.roles.insert_role(role.clone())?;
                report.protected_role_created = true;
                role
            }
        };
        let held: HashSet<&str> = role.permissions.iter().map(String::as_str).collect();
        for code in catalog.codenames() {
            if held.contains(code) {
                continue;
            }
            if self.roles.grant_codename(role.id, code)? {
                report.protected_grants_added += 1;
            }
        }

        tracing::info!(
            catalog_size = catalog.len(),
            created = report.created,
            updated = report.updated,
            pruned = report.pruned.len(),
            revoked_grants = report.revoked_grants,
            protected_role = self.protected_role_name,
            protected_grants_added = report.protected_grants_added,
            "Permission catalog seeded"
        );
        Ok(report)
    }
}
