//! # Platform Authorization Engine
//!
//! This crate decides, for every protected action on the Relay platform,
//! whether an actor may perform a verb on a resource. It is shared by route
//! handlers, job runners and CLIs, which consume only its boolean decisions
//! and invalidation hooks.
//!
//! ## Overview
//!
//! Four authority sources are reconciled under a strict precedence order:
//! - **Role graph**: actor -> roles -> codenames, flattened per actor and
//!   cached for a fixed TTL
//! - **Object ACL**: per-object allow/deny rows, plus grants propagated
//!   through tags
//! - **Resource-name ACL**: rows keyed by resource name that switch the name
//!   into restricted mode
//! - **Legacy codenames**: deprecated codenames that still satisfy checks
//!   for their modern replacement
//!
//! ## Architecture
//!
//! ```text
//! caller
//!   ├─ check_permission ────────────┐
//!   ├─ check_object_permission ─────┼─> wildcard ─> resolver stages ─> role graph (cache) ─> legacy mapping
//!   └─ check_resource_permission ───┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "memory")]
//! # {
//! use std::sync::Arc;
//! use platform_authz::{EngineConfig, MemoryStore, PermissionEngine, Repositories};
//! use platform_rbac::{Actor, ResourceAclEntry, Role};
//!
//! let store = Arc::new(MemoryStore::new());
//! let engine = PermissionEngine::new(
//!     Repositories::from_store(store.clone()),
//!     EngineConfig::default(),
//! )
//! .unwrap();
//! engine.reseed_catalog(&[]).unwrap();
//!
//! let deployers = store.add_role(Role::new("Deployers").with_permission("services.deploy"));
//! let actor = store.add_actor(Actor::new("ci").with_role(deployers));
//!
//! // No rows for the name: the flat grant applies.
//! assert!(engine.check_resource_permission(actor, "billing-api", "deploy"));
//!
//! // One row for another role restricts the whole name.
//! let viewers = store.add_role(Role::new("Viewers"));
//! store.add_resource_acl(ResourceAclEntry::new("billing-api", viewers, "view"));
//! assert!(!engine.check_resource_permission(actor, "billing-api", "deploy"));
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `memory` (default): In-memory reference store

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
#[cfg(feature = "memory")]
pub mod memory;
pub mod object_acl;
pub mod repository;
pub mod resolver;
pub mod resource_acl;
pub mod seeding;

// Re-export main types
pub use cache::{CacheStats, PermissionCache};
pub use config::EngineConfig;
pub use engine::PermissionEngine;
pub use error::{AuthzError, AuthzResult, RepositoryError, RepositoryResult};
pub use graph::{ActorGrants, RoleGraph};
#[cfg(feature = "memory")]
pub use memory::MemoryStore;
pub use object_acl::{ObjectAclPolicy, ObjectAclResolver};
pub use repository::{
    ActorRepository, ObjectRepository, PermissionRepository, Repositories, ResourceAclRepository,
    RoleRepository, TagRepository, UpsertOutcome,
};
pub use resolver::{Decision, OverridePolicy, OverrideRows, PolicyResolver, Stage};
pub use resource_acl::{script_verb, ResourceAclPolicy, ResourceAclResolver};
pub use seeding::{CatalogSeeder, SeedReport};
