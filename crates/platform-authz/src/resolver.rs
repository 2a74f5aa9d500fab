//! Overridable policy resolver
//!
//! Object ACLs and resource-name ACLs are both "override rows on top of the
//! flat role graph". They differ in where rows come from and in when the flat
//! fallback applies. Both run through [`PolicyResolver`], parameterized by an
//! [`OverridePolicy`] that supplies the rows and the ordered list of
//! [`Stage`]s to evaluate.
//!
//! Each stage either decides (`Some(allowed)`) or passes (`None`). The first
//! stage that decides wins; if none does, the answer is deny.

use std::collections::HashSet;
use std::fmt;

use platform_rbac::{LegacyCodenameMapper, RoleId};

use crate::error::RepositoryResult;
use crate::graph::ActorGrants;

/// One step of a precedence chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Actor holds `*` -> allow
    Wildcard,
    /// Target is missing -> deny
    TargetExists,
    /// A deny row matches one of the actor's roles -> deny
    ExplicitDeny,
    /// An allow row matches one of the actor's roles -> allow
    ExplicitAllow,
    /// A tag on the target grants the verb to one of the actor's roles -> allow
    TagGrant,
    /// Any override row exists for the target -> deny
    RestrictedMode,
    /// Flat codename check against the role graph
    FlatFallback,
}

impl Stage {
    /// Stable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Wildcard => "wildcard",
            Stage::TargetExists => "target_exists",
            Stage::ExplicitDeny => "explicit_deny",
            Stage::ExplicitAllow => "explicit_allow",
            Stage::TagGrant => "tag_grant",
            Stage::RestrictedMode => "restricted_mode",
            Stage::FlatFallback => "flat_fallback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a resolution, with the stage that decided it.
///
/// `stage` is `None` when no stage decided, or when the actor could not be
/// loaded at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether access is granted
    pub allowed: bool,
    /// Deciding stage
    pub stage: Option<Stage>,
}

impl Decision {
    /// Deny without a deciding stage.
    pub fn denied() -> Self {
        Self {
            allowed: false,
            stage: None,
        }
    }

    fn decided(allowed: bool, stage: Stage) -> Self {
        Self {
            allowed,
            stage: Some(stage),
        }
    }
}

/// Override rows matching one target and verb, keyed by role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideRows {
    /// Roles denied the verb
    pub deny: HashSet<RoleId>,
    /// Roles allowed the verb
    pub allow: HashSet<RoleId>,
    /// Whether the target has any override row at all, for any verb
    pub any: bool,
}

/// Source of override rows for one kind of target.
pub trait OverridePolicy: Send + Sync {
    /// What checks are keyed by.
    type Target: ?Sized + fmt::Display;

    /// The target once looked up in storage.
    type Located;

    /// Name of the policy for logs.
    fn kind(&self) -> &'static str;

    /// Precedence chain, evaluated in order.
    fn stages(&self) -> &'static [Stage];

    /// Look the target up; `None` means it does not exist.
    fn locate(&self, target: &Self::Target) -> RepositoryResult<Option<Self::Located>>;

    /// Override rows for the target and verb.
    fn override_rows(&self, located: &Self::Located, verb: &str) -> RepositoryResult<OverrideRows>;

    /// Roles granted the verb through tags on the target.
    fn tag_roles(&self, located: &Self::Located, verb: &str) -> RepositoryResult<HashSet<RoleId>> {
        let _ = (located, verb);
        Ok(HashSet::new())
    }

    /// Codename checked by [`Stage::FlatFallback`].
    fn fallback_codename(&self, located: &Self::Located, verb: &str) -> String;
}

/// Runs an [`OverridePolicy`]'s precedence chain.
#[derive(Debug)]
pub struct PolicyResolver<P> {
    policy: P,
}

impl<P: OverridePolicy> PolicyResolver<P> {
    /// Create a resolver for a policy.
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    /// The underlying policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Decide whether `grants` may perform `verb` on `target`.
    ///
    /// Storage failures deny at the stage that hit them.
    pub fn resolve(
        &self,
        grants: &ActorGrants,
        target: &P::Target,
        verb: &str,
        legacy: &LegacyCodenameMapper,
    ) -> Decision {
        let mut resolution = Resolution {
            policy: &self.policy,
            grants,
            target,
            verb,
            legacy,
            located: None,
            rows: None,
        };

        for &stage in self.policy.stages() {
            match resolution.evaluate(stage) {
                Ok(Some(allowed)) => {
                    tracing::debug!(
                        kind = self.policy.kind(),
                        actor_id = %grants.actor_id,
                        target = %target,
                        verb,
                        stage = stage.as_str(),
                        allowed,
                        "Permission resolved"
                    );
                    return Decision::decided(allowed, stage);
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(
                        kind = self.policy.kind(),
                        target = %target,
                        verb,
                        stage = stage.as_str(),
                        error = %e,
                        "Storage failure during permission check, denying"
                    );
                    return Decision::decided(false, stage);
                }
            }
        }
        Decision::denied()
    }
}

/// State for one resolution; storage is read at most once per kind.
struct Resolution<'r, P: OverridePolicy> {
    policy: &'r P,
    grants: &'r ActorGrants,
    target: &'r P::Target,
    verb: &'r str,
    legacy: &'r LegacyCodenameMapper,
    located: Option<Option<P::Located>>,
    rows: Option<OverrideRows>,
}

impl<'r, P: OverridePolicy> Resolution<'r, P> {
    /// The located target, or `None` if it does not exist.
    fn located(&mut self) -> RepositoryResult<Option<&P::Located>> {
        if self.located.is_none() {
            self.located = Some(self.policy.locate(self.target)?);
        }
        Ok(self.located.as_ref().and_then(Option::as_ref))
    }

    /// Override rows for the target, or `None` if it does not exist.
    fn rows(&mut self) -> RepositoryResult<Option<&OverrideRows>> {
        if self.rows.is_none() {
            let (policy, verb) = (self.policy, self.verb);
            let Some(found) = self.located()? else {
                return Ok(None);
            };
            let rows = policy.override_rows(found, verb)?;
            self.rows = Some(rows);
        }
        Ok(self.rows.as_ref())
    }

    /// One stage: `Some(allowed)` decides, `None` passes. A missing target
    /// denies at whichever stage first needs it.
    fn evaluate(&mut self, stage: Stage) -> RepositoryResult<Option<bool>> {
        let (policy, grants, verb) = (self.policy, self.grants, self.verb);
        match stage {
            Stage::Wildcard => Ok(grants.is_wildcard().then_some(true)),
            Stage::TargetExists => Ok(self.located()?.is_none().then_some(false)),
            Stage::ExplicitDeny => Ok(self
                .rows()?
                .map_or(Some(false), |rows| grants.holds_any_role(&rows.deny).then_some(false))),
            Stage::ExplicitAllow => Ok(self
                .rows()?
                .map_or(Some(false), |rows| grants.holds_any_role(&rows.allow).then_some(true))),
            Stage::RestrictedMode => Ok(self
                .rows()?
                .map_or(Some(false), |rows| rows.any.then_some(false))),
            Stage::TagGrant => {
                let Some(found) = self.located()? else {
                    return Ok(Some(false));
                };
                let tagged = policy.tag_roles(found, verb)?;
                Ok(grants.holds_any_role(&tagged).then_some(true))
            }
            Stage::FlatFallback => {
                let legacy = self.legacy;
                let Some(found) = self.located()? else {
                    return Ok(Some(false));
                };
                let codename = policy.fallback_codename(found, verb);
                Ok(Some(grants.allows(&codename, legacy)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_rbac::CodenameSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Policy over fixed rows, used to exercise the chain itself.
    struct FixedPolicy {
        stages: &'static [Stage],
        exists: bool,
        rows: OverrideRows,
        tagged: HashSet<RoleId>,
        row_loads: AtomicUsize,
    }

    impl OverridePolicy for FixedPolicy {
        type Target = str;
        type Located = ();

        fn kind(&self) -> &'static str {
            "fixed"
        }

        fn stages(&self) -> &'static [Stage] {
            self.stages
        }

        fn locate(&self, _target: &str) -> RepositoryResult<Option<()>> {
            Ok(self.exists.then_some(()))
        }

        fn override_rows(&self, _located: &(), _verb: &str) -> RepositoryResult<OverrideRows> {
            self.row_loads.fetch_add(1, Ordering::Relaxed);
            Ok(self.rows.clone())
        }

        fn tag_roles(&self, _located: &(), _verb: &str) -> RepositoryResult<HashSet<RoleId>> {
            Ok(self.tagged.clone())
        }

        fn fallback_codename(&self, _located: &(), verb: &str) -> String {
            format!("things.{}", verb)
        }
    }

    const FULL_CHAIN: &[Stage] = &[
        Stage::Wildcard,
        Stage::TargetExists,
        Stage::ExplicitDeny,
        Stage::ExplicitAllow,
        Stage::TagGrant,
        Stage::FlatFallback,
    ];

    fn grants(roles: &[RoleId], codenames: &[&str]) -> ActorGrants {
        ActorGrants::new(
            Uuid::now_v7(),
            roles.iter().copied().collect(),
            codenames.iter().copied().collect::<CodenameSet>(),
        )
    }

    fn policy() -> FixedPolicy {
        FixedPolicy {
            stages: FULL_CHAIN,
            exists: true,
            rows: OverrideRows::default(),
            tagged: HashSet::new(),
            row_loads: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_first_deciding_stage_wins() {
        let r1 = Uuid::now_v7();
        let mut p = policy();
        p.rows.deny.insert(r1);
        p.rows.allow.insert(r1);
        p.tagged.insert(r1);

        let resolver = PolicyResolver::new(p);
        let decision = resolver.resolve(
            &grants(&[r1], &["things.view"]),
            "t",
            "view",
            &LegacyCodenameMapper::new(),
        );
        assert_eq!(
            decision,
            Decision {
                allowed: false,
                stage: Some(Stage::ExplicitDeny)
            }
        );
    }

    #[test]
    fn test_wildcard_beats_missing_target() {
        let mut p = policy();
        p.exists = false;
        let resolver = PolicyResolver::new(p);
        let legacy = LegacyCodenameMapper::new();

        let root = resolver.resolve(&grants(&[], &["*"]), "t", "view", &legacy);
        assert_eq!(root.stage, Some(Stage::Wildcard));
        assert!(root.allowed);

        let nobody = resolver.resolve(&grants(&[], &["things.view"]), "t", "view", &legacy);
        assert_eq!(nobody.stage, Some(Stage::TargetExists));
        assert!(!nobody.allowed);
    }

    #[test]
    fn test_falls_through_to_flat_check() {
        let resolver = PolicyResolver::new(policy());
        let legacy = LegacyCodenameMapper::new();
        let decision = resolver.resolve(&grants(&[], &["things.view"]), "t", "view", &legacy);
        assert_eq!(decision.stage, Some(Stage::FlatFallback));
        assert!(decision.allowed);

        let decision = resolver.resolve(&grants(&[], &["things.view"]), "t", "edit", &legacy);
        assert_eq!(decision.stage, Some(Stage::FlatFallback));
        assert!(!decision.allowed);
    }

    #[test]
    fn test_chain_without_decider_denies() {
        let mut p = policy();
        p.stages = &[Stage::Wildcard, Stage::ExplicitAllow];
        let resolver = PolicyResolver::new(p);
        let decision = resolver.resolve(
            &grants(&[], &["things.view"]),
            "t",
            "view",
            &LegacyCodenameMapper::new(),
        );
        assert_eq!(decision, Decision::denied());
    }

    #[test]
    fn test_restricted_mode_stage() {
        let mut p = policy();
        p.stages = &[Stage::ExplicitAllow, Stage::RestrictedMode, Stage::FlatFallback];
        p.rows.any = true;
        let resolver = PolicyResolver::new(p);
        let decision = resolver.resolve(
            &grants(&[], &["things.view"]),
            "t",
            "view",
            &LegacyCodenameMapper::new(),
        );
        assert_eq!(decision.stage, Some(Stage::RestrictedMode));
        assert!(!decision.allowed);
    }

    #[test]
    fn test_rows_loaded_once_per_resolution() {
        let resolver = PolicyResolver::new(policy());
        let decision = resolver.resolve(
            &grants(&[], &["things.view"]),
            "t",
            "view",
            &LegacyCodenameMapper::new(),
        );
        assert_eq!(decision.stage, Some(Stage::FlatFallback));
        // ExplicitDeny and ExplicitAllow share one load.
        assert_eq!(resolver.policy().row_loads.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_missing_target_denies_without_existence_stage() {
        let mut p = policy();
        p.stages = &[Stage::Wildcard, Stage::ExplicitAllow, Stage::FlatFallback];
        p.exists = false;
        let resolver = PolicyResolver::new(p);
        let decision = resolver.resolve(
            &grants(&[], &["things.view"]),
            "t",
            "view",
            &LegacyCodenameMapper::new(),
        );
        assert_eq!(decision.stage, Some(Stage::ExplicitAllow));
        assert!(!decision.allowed);
        assert_eq!(resolver.policy().row_loads.load(Ordering::Relaxed), 0);
    }
}
