//! # Platform RBAC (Role-Based Access Control)
//!
//! This crate provides the permission vocabulary for the Relay platform:
//! the records the permission engine reads, the codename conventions, and
//! the catalog every role grant is drawn from.
//!
//! ## Overview
//!
//! The platform-rbac crate handles:
//! - **Codenames**: Dotted capability identifiers (`users.edit`) and the
//!   reserved wildcard `*`
//! - **Verbs**: The four base verbs generated for every resource type
//! - **Catalog**: A static codename list plus codenames generated per
//!   extensible resource type
//! - **Legacy mapping**: Deprecated codenames that still satisfy checks for
//!   their modern replacement
//! - **Models**: Actors, roles, object ACL rows, tag grants and
//!   resource-name ACL rows
//!
//! ## Architecture
//!
//! ```text
//! Actor ──< membership >── Role ──< grant >── Permission (codename)
//!
//! Codename = category "." verb
//!
//! Examples:
//!   "users.edit"        - Edit any user
//!   "articles.publish"  - Custom action on an extensible type
//!   "*"                 - Every capability
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use platform_rbac::{CustomAction, ExtensibleTypeDefinition, PermissionCatalog};
//!
//! let articles = ExtensibleTypeDefinition::new("articles", "Articles")
//!     .with_action(CustomAction::new("publish", "Publish articles"));
//!
//! let catalog = PermissionCatalog::generate(&[articles]).unwrap();
//! assert!(catalog.contains("articles.view"));
//! assert!(catalog.contains("articles.publish"));
//! assert!(catalog.contains("*"));
//! ```
//!
//! ## Integration with platform-authz
//!
//! `platform-authz` resolves checks against these records. This crate has no
//! storage and no shared state.

pub mod catalog;
pub mod error;
pub mod legacy;
pub mod models;
pub mod permissions;
pub mod verbs;

// Re-export main types for convenience
pub use catalog::{CustomAction, ExtensibleTypeDefinition, PermissionCatalog};
pub use error::{CatalogError, CatalogResult};
pub use legacy::LegacyCodenameMapper;
pub use models::{
    AclEffect, Actor, ActorId, ActorLookup, ObjectAclEntry, ObjectId, Permission, ProtectedObject,
    ResourceAclEntry, Role, RoleId, Tag, TagId, TagPermissionEntry,
};
pub use permissions::{codename, CodenameSet, WILDCARD};
pub use verbs::{BaseVerb, VERB_FULL};
