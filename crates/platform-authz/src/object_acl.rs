//! Object ACL policy
//!
//! Per-object allow/deny rows, plus grants propagated through tags. The
//! precedence chain is:
//!
//! 1. wildcard -> allow
//! 2. object missing -> deny
//! 3. deny row for any held role -> deny
//! 4. allow row for any held role -> allow
//! 5. tag grant for any held role -> allow
//! 6. flat check of `{resource_type}.{verb}`
//!
//! Deny is evaluated before allow, so one denying role beats any number of
//! allowing roles and any flat grant.

use std::collections::HashSet;
use std::sync::Arc;

use platform_rbac::{codename, AclEffect, ObjectId, ProtectedObject, RoleId};

use crate::error::RepositoryResult;
use crate::repository::{ObjectRepository, TagRepository};
use crate::resolver::{OverridePolicy, OverrideRows, PolicyResolver, Stage};

const OBJECT_STAGES: &[Stage] = &[
    Stage::Wildcard,
    Stage::TargetExists,
    Stage::ExplicitDeny,
    Stage::ExplicitAllow,
    Stage::TagGrant,
    Stage::FlatFallback,
];

/// Object ACL rows and tag grants, keyed by object id.
pub struct ObjectAclPolicy {
    objects: Arc<dyn ObjectRepository>,
    tags: Arc<dyn TagRepository>,
}

impl ObjectAclPolicy {
    /// Create the policy over object and tag storage.
    pub fn new(objects: Arc<dyn ObjectRepository>, tags: Arc<dyn TagRepository>) -> Self {
        Self { objects, tags }
    }
}

impl std::fmt::Debug for ObjectAclPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectAclPolicy").finish_non_exhaustive()
    }
}

impl OverridePolicy for ObjectAclPolicy {
    type Target = ObjectId;
    type Located = ProtectedObject;

    fn kind(&self) -> &'static str {
        "object_acl"
    }

    fn stages(&self) -> &'static [Stage] {
        OBJECT_STAGES
    }

    fn locate(&self, target: &ObjectId) -> RepositoryResult<Option<ProtectedObject>> {
        self.objects.object(*target)
    }

    fn override_rows(&self, located: &ProtectedObject, verb: &str) -> RepositoryResult<OverrideRows> {
        let entries = self.objects.object_acl(located.id, verb)?;
        let mut rows = OverrideRows {
            any: !entries.is_empty(),
            ..OverrideRows::default()
        };
        for entry in entries {
            match entry.effect {
                AclEffect::Deny => rows.deny.insert(entry.role_id),
                AclEffect::Allow => rows.allow.insert(entry.role_id),
            };
        }
        Ok(rows)
    }

    fn tag_roles(&self, located: &ProtectedObject, verb: &str) -> RepositoryResult<HashSet<RoleId>> {
        if located.tags.is_empty() {
            return Ok(HashSet::new());
        }
        Ok(self
            .tags
            .tag_grants(&located.tags, verb)?
            .into_iter()
            .map(|grant| grant.role_id)
            .collect())
    }

    fn fallback_codename(&self, located: &ProtectedObject, verb: &str) -> String {
        codename(&located.resource_type, verb)
    }
}

/// Resolver for `checkObjectPermission`.
pub type ObjectAclResolver = PolicyResolver<ObjectAclPolicy>;

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::graph::ActorGrants;
    use crate::memory::MemoryStore;
    use platform_rbac::{
        LegacyCodenameMapper, ObjectAclEntry, Role, Tag, TagPermissionEntry,
    };
    use uuid::Uuid;

    struct Fixture {
        store: Arc<MemoryStore>,
        resolver: ObjectAclResolver,
        legacy: LegacyCodenameMapper,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let resolver = PolicyResolver::new(ObjectAclPolicy::new(store.clone(), store.clone()));
            Self {
                store,
                resolver,
                legacy: LegacyCodenameMapper::new(),
            }
        }

        fn check(&self, grants: &ActorGrants, object: ObjectId, verb: &str) -> (bool, Option<Stage>) {
            let d = self.resolver.resolve(grants, &object, verb, &self.legacy);
            (d.allowed, d.stage)
        }
    }

    fn grants(roles: &[RoleId], codenames: &[&str]) -> ActorGrants {
        ActorGrants::new(
            Uuid::now_v7(),
            roles.iter().copied().collect(),
            codenames.iter().copied().collect(),
        )
    }

    #[test]
    fn test_missing_object_denies() {
        let fx = Fixture::new();
        let g = grants(&[], &["documents.view"]);
        assert_eq!(
            fx.check(&g, Uuid::now_v7(), "view"),
            (false, Some(Stage::TargetExists))
        );
    }

    #[test]
    fn test_deny_row_beats_allow_row_and_flat_grant() {
        let fx = Fixture::new();
        let r1 = fx.store.add_role(Role::new("Denied"));
        let r2 = fx.store.add_role(Role::new("Allowed"));
        let doc = fx.store.add_object(ProtectedObject::new("documents"));
        fx.store.add_object_acl(ObjectAclEntry::deny(doc, r1, "edit"));
        fx.store.add_object_acl(ObjectAclEntry::allow(doc, r2, "edit"));

        let g = grants(&[r1, r2], &["documents.edit"]);
        assert_eq!(fx.check(&g, doc, "edit"), (false, Some(Stage::ExplicitDeny)));

        // Deny rows are per verb.
        assert_eq!(fx.check(&g, doc, "view"), (false, Some(Stage::FlatFallback)));
    }

    #[test]
    fn test_allow_row_without_flat_codename() {
        let fx = Fixture::new();
        let r = fx.store.add_role(Role::new("Reviewers"));
        let doc = fx.store.add_object(ProtectedObject::new("documents"));
        fx.store.add_object_acl(ObjectAclEntry::allow(doc, r, "view"));

        let g = grants(&[r], &[]);
        assert_eq!(fx.check(&g, doc, "view"), (true, Some(Stage::ExplicitAllow)));
    }

    #[test]
    fn test_tag_grant_propagates() {
        let fx = Fixture::new();
        let r = fx.store.add_role(Role::new("Finance"));
        let tag = fx.store.add_tag(Tag::new("finance"));
        let doc = fx.store.add_object(ProtectedObject::new("documents").with_tag(tag));
        let other = fx.store.add_object(ProtectedObject::new("documents"));
        fx.store.add_tag_grant(TagPermissionEntry::new(tag, r, "view"));

        let g = grants(&[r], &[]);
        assert_eq!(fx.check(&g, doc, "view"), (true, Some(Stage::TagGrant)));
        assert_eq!(fx.check(&g, other, "view"), (false, Some(Stage::FlatFallback)));
        assert_eq!(fx.check(&g, doc, "edit"), (false, Some(Stage::FlatFallback)));
    }

    #[test]
    fn test_deny_row_beats_tag_grant() {
        let fx = Fixture::new();
        let r = fx.store.add_role(Role::new("Finance"));
        let tag = fx.store.add_tag(Tag::new("finance"));
        let doc = fx.store.add_object(ProtectedObject::new("documents").with_tag(tag));
        fx.store.add_tag_grant(TagPermissionEntry::new(tag, r, "view"));
        fx.store.add_object_acl(ObjectAclEntry::deny(doc, r, "view"));

        let g = grants(&[r], &[]);
        assert_eq!(fx.check(&g, doc, "view"), (false, Some(Stage::ExplicitDeny)));
    }

    #[test]
    fn test_rows_for_other_roles_do_not_apply() {
        let fx = Fixture::new();
        let mine = fx.store.add_role(Role::new("Mine"));
        let theirs = fx.store.add_role(Role::new("Theirs"));
        let doc = fx.store.add_object(ProtectedObject::new("documents"));
        fx.store.add_object_acl(ObjectAclEntry::deny(doc, theirs, "view"));

        let g = grants(&[mine], &["documents.view"]);
        assert_eq!(fx.check(&g, doc, "view"), (true, Some(Stage::FlatFallback)));
    }

    #[test]
    fn test_storage_failure_denies() {
        let fx = Fixture::new();
        let doc = fx.store.add_object(ProtectedObject::new("documents"));
        fx.store.set_unavailable(true);
        let g = grants(&[], &["documents.view"]);
        assert_eq!(fx.check(&g, doc, "view"), (false, Some(Stage::TargetExists)));
    }
}
