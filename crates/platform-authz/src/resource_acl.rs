//! Resource-name ACL policy
//!
//! Overrides keyed by a resource name (a service, a deployment target) rather
//! than an object id. A name is in one of two modes:
//!
//! - **unrestricted**: no rows exist for the name; every verb falls back to
//!   the flat codename `{resource_category}.{verb}`.
//! - **restricted**: at least one row exists, for any verb; only a row
//!   matching the verb (or a `full` row) grants access, and global grants
//!   are ignored for every verb on that name.
//!
//! Restricting a name for one verb therefore restricts it for all verbs. That
//! behavior is kept as-is; see DESIGN.md.

use std::collections::HashSet;
use std::sync::Arc;

use platform_rbac::codename;

use crate::error::RepositoryResult;
use crate::repository::ResourceAclRepository;
use crate::resolver::{OverridePolicy, OverrideRows, PolicyResolver, Stage};

/// Verb checked for scripts that stop or kill a resource.
pub const VERB_STOP: &str = "stop";

/// Verb checked for every other script.
pub const VERB_DEPLOY: &str = "deploy";

const RESOURCE_STAGES: &[Stage] = &[
    Stage::Wildcard,
    Stage::TargetExists,
    Stage::ExplicitAllow,
    Stage::RestrictedMode,
    Stage::FlatFallback,
];

/// Map a script or action identifier to the verb it needs.
///
/// Identifiers mentioning `stop` or `kill` (any case) need `stop`; everything
/// else needs `deploy`.
///
/// # Example
///
/// ```
/// use platform_authz::resource_acl::script_verb;
///
/// assert_eq!(script_verb("scripts/Stop-Service.sh"), "stop");
/// assert_eq!(script_verb("killall"), "stop");
/// assert_eq!(script_verb("rollout.sh"), "deploy");
/// ```
pub fn script_verb(identifier: &str) -> &'static str {
    let lowered = identifier.to_lowercase();
    if lowered.contains("stop") || lowered.contains("kill") {
        VERB_STOP
    } else {
        VERB_DEPLOY
    }
}

/// Resource-name ACL rows.
pub struct ResourceAclPolicy {
    acl: Arc<dyn ResourceAclRepository>,
    category: String,
}

impl ResourceAclPolicy {
    /// Create the policy; `category` is the codename prefix for the flat
    /// fallback.
    pub fn new(acl: Arc<dyn ResourceAclRepository>, category: impl Into<String>) -> Self {
        Self {
            acl,
            category: category.into(),
        }
    }

    /// Codename prefix used by the flat fallback.
    pub fn category(&self) -> &str {
        &self.category
    }
}

impl std::fmt::Debug for ResourceAclPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceAclPolicy")
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl OverridePolicy for ResourceAclPolicy {
    type Target = str;
    type Located = String;

    fn kind(&self) -> &'static str {
        "resource_acl"
    }

    fn stages(&self) -> &'static [Stage] {
        RESOURCE_STAGES
    }

    fn locate(&self, target: &str) -> RepositoryResult<Option<String>> {
        // Names are free-form and matched exactly; only a blank name is absent.
        Ok((!target.trim().is_empty()).then(|| target.to_string()))
    }

    fn override_rows(&self, located: &String, verb: &str) -> RepositoryResult<OverrideRows> {
        let entries = self.acl.resource_acl(located)?;
        let allow: HashSet<_> = entries
            .iter()
            .filter(|entry| entry.grants(verb))
            .map(|entry| entry.role_id)
            .collect();
        Ok(OverrideRows {
            deny: HashSet::new(),
            allow,
            any: !entries.is_empty(),
        })
    }

    fn fallback_codename(&self, _located: &String, verb: &str) -> String {
        codename(&self.category, verb)
    }
}

/// Resolver for `checkResourcePermission`.
pub type ResourceAclResolver = PolicyResolver<ResourceAclPolicy>;
