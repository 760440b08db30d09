//! # Warden RBAC
//!
//! Permission nodes, group tiers, and the default-level registry for the
//! Warden authorization engine.
//!
//! ## Overview
//!
//! This crate holds the static vocabulary of the permission system:
//!
//! - **Nodes**: dotted identifiers such as `"build.place"`, with an
//!   `_ALL_` wildcard suffix covering everything under a prefix
//! - **Group tiers**: an explicit, totally ordered privilege ladder
//!   (Guest < Default < ZoneAdmin < Op < Owner)
//! - **Registry**: the startup-phase catalog mapping each node to the
//!   least-privileged tier granted it by default
//! - **Decisions**: the tri-state outcome of a resolution
//!
//! ## Usage
//!
//! ```rust
//! use warden_rbac::{GroupTier, PermNode, PermissionDecision, RegistryBuilder};
//!
//! // Feature modules register their nodes during startup.
//! let mut builder = RegistryBuilder::new();
//! builder
//!     .register(PermNode::parse("build.place").unwrap(), GroupTier::Default)
//!     .unwrap();
//! builder
//!     .register(PermNode::parse("zone._ALL_").unwrap(), GroupTier::ZoneAdmin)
//!     .unwrap();
//!
//! // The frozen registry answers default-level queries.
//! let registry = builder.build();
//! let node = PermNode::parse("zone.create").unwrap();
//! assert_eq!(
//!     registry.level_for(GroupTier::Owner, &node),
//!     PermissionDecision::Allowed
//! );
//! ```
//!
//! Zone-scoped overrides and the resolution walk live in `warden-zones`
//! and `warden-engine`; this crate only supplies defaults.

pub mod decision;
pub mod groups;
pub mod node;
pub mod registry;

// Re-export main types for convenience
pub use decision::PermissionDecision;
pub use groups::GroupTier;
pub use node::{PermNode, WILDCARD};
pub use registry::{PermissionRegistry, RegistryBuilder, RegistryError, RegistryResult};
