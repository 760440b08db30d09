//! # Permission registry
//!
//! The registry is the static catalog of permission nodes and the default
//! group tier each is granted to. Feature modules populate a
//! [`RegistryBuilder`] during startup; [`RegistryBuilder::build`] freezes
//! it into an immutable [`PermissionRegistry`] that the resolver receives
//! by injection. There is no mutable global state and no post-build
//! registration.

use std::collections::HashMap;

use thiserror::Error;

use crate::decision::PermissionDecision;
use crate::groups::GroupTier;
use crate::node::PermNode;

/// Registry configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A node was registered twice with conflicting defaults.
    #[error("permission node registered twice with different defaults: {node} ({existing} vs {requested})")]
    DuplicateNode {
        /// The conflicting node.
        node: PermNode,
        /// The tier already on record.
        existing: GroupTier,
        /// The tier the second registration asked for.
        requested: GroupTier,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// A node's registered default: the least-privileged tier granted the node,
/// plus an optional default value for valued nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeDefault {
    tier: GroupTier,
    value: Option<String>,
}

/// Collects permission registrations during the startup phase.
///
/// # Examples
///
/// ```
/// use warden_rbac::{GroupTier, PermNode, RegistryBuilder};
///
/// let mut builder = RegistryBuilder::new();
/// builder
///     .register(PermNode::parse("build.place").unwrap(), GroupTier::Default)
///     .unwrap();
/// let registry = builder.build();
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    defaults: HashMap<PermNode, NodeDefault>,
}

impl RegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node with the least-privileged tier it is granted to.
    ///
    /// Re-registering a node with the same tier is a no-op; a different
    /// tier is a configuration error.
    pub fn register(&mut self, node: PermNode, tier: GroupTier) -> RegistryResult<()> {
        self.insert(node, tier, None)
    }

    /// Register a valued node with its default value.
    ///
    /// The value is returned by valued resolution when no zone supplies an
    /// override value for the node.
    pub fn register_value(
        &mut self,
        node: PermNode,
        tier: GroupTier,
        value: impl Into<String>,
    ) -> RegistryResult<()> {
        self.insert(node, tier, Some(value.into()))
    }

    fn insert(
        &mut self,
        node: PermNode,
        tier: GroupTier,
        value: Option<String>,
    ) -> RegistryResult<()> {
        if let Some(existing) = self.defaults.get(&node) {
            if existing.tier != tier {
                return Err(RegistryError::DuplicateNode {
                    node,
                    existing: existing.tier,
                    requested: tier,
                });
            }
            // Idempotent re-registration; a later value wins over none.
            if value.is_some() {
                if let Some(slot) = self.defaults.get_mut(&node) {
                    slot.value = value;
                }
            }
            return Ok(());
        }
        self.defaults.insert(node, NodeDefault { tier, value });
        Ok(())
    }

    /// Freeze the collected registrations into an immutable registry.
    pub fn build(self) -> PermissionRegistry {
        PermissionRegistry {
            defaults: self.defaults,
        }
    }
}

/// The immutable catalog of permission nodes and their default tiers.
///
/// An empty registry is valid: every lookup yields
/// [`PermissionDecision::Unset`], never an error.
#[derive(Debug, Default)]
pub struct PermissionRegistry {
    defaults: HashMap<PermNode, NodeDefault>,
}

impl PermissionRegistry {
    /// The default decision for a tier on a node.
    ///
    /// Exact registrations are consulted before wildcard ones. A node
    /// registered at or below `tier` is `Allowed`, one registered above it
    /// is `Denied`, and an unregistered node is `Unset`.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_rbac::{GroupTier, PermNode, PermissionDecision, RegistryBuilder};
    ///
    /// let mut builder = RegistryBuilder::new();
    /// builder
    ///     .register(PermNode::parse("zone._ALL_").unwrap(), GroupTier::ZoneAdmin)
    ///     .unwrap();
    /// let registry = builder.build();
    ///
    /// let node = PermNode::parse("zone.delete").unwrap();
    /// assert_eq!(
    ///     registry.level_for(GroupTier::ZoneAdmin, &node),
    ///     PermissionDecision::Allowed
    /// );
    /// assert_eq!(
    ///     registry.level_for(GroupTier::Default, &node),
    ///     PermissionDecision::Denied
    /// );
    /// ```
    pub fn level_for(&self, tier: GroupTier, node: &PermNode) -> PermissionDecision {
        match self.lookup(node) {
            Some(default) if tier >= default.tier => PermissionDecision::Allowed,
            Some(_) => PermissionDecision::Denied,
            None => PermissionDecision::Unset,
        }
    }

    /// The registered default value for a valued node, if any.
    pub fn default_value(&self, node: &PermNode) -> Option<&str> {
        self.lookup(node).and_then(|d| d.value.as_deref())
    }

    /// Whether the node (or a wildcard covering it) is registered.
    pub fn is_registered(&self, node: &PermNode) -> bool {
        self.lookup(node).is_some()
    }

    /// The number of registered nodes.
    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }

    fn lookup(&self, node: &PermNode) -> Option<&NodeDefault> {
        if let Some(default) = self.defaults.get(node) {
            return Some(default);
        }
        node.wildcard_chain()
            .into_iter()
            .find_map(|wild| self.defaults.get(&wild))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(s: &str) -> PermNode {
        PermNode::parse(s).unwrap()
    }

    #[test]
    fn test_register_and_level_for() {
        let mut builder = RegistryBuilder::new();
        builder.register(node("build.place"), GroupTier::Default).unwrap();
        builder.register(node("zone.delete"), GroupTier::ZoneAdmin).unwrap();
        let registry = builder.build();

        assert_eq!(
            registry.level_for(GroupTier::Default, &node("build.place")),
            PermissionDecision::Allowed
        );
        assert_eq!(
            registry.level_for(GroupTier::Owner, &node("build.place")),
            PermissionDecision::Allowed
        );
        assert_eq!(
            registry.level_for(GroupTier::Guest, &node("build.place")),
            PermissionDecision::Denied
        );
        assert_eq!(
            registry.level_for(GroupTier::Default, &node("zone.delete")),
            PermissionDecision::Denied
        );
    }

    #[test]
    fn test_unregistered_is_unset() {
        let registry = RegistryBuilder::new().build();
        assert_eq!(
            registry.level_for(GroupTier::Owner, &node("never.registered")),
            PermissionDecision::Unset
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_same_tier_is_noop() {
        let mut builder = RegistryBuilder::new();
        builder.register(node("cmd.list"), GroupTier::Guest).unwrap();
        builder.register(node("cmd.list"), GroupTier::Guest).unwrap();
        assert_eq!(builder.build().len(), 1);
    }

    #[test]
    fn test_duplicate_conflicting_tier_fails() {
        let mut builder = RegistryBuilder::new();
        builder.register(node("cmd.list"), GroupTier::Guest).unwrap();
        let err = builder
            .register(node("cmd.list"), GroupTier::Owner)
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateNode { .. }));
    }

    #[test]
    fn test_exact_beats_wildcard() {
        let mut builder = RegistryBuilder::new();
        builder.register(node("zone._ALL_"), GroupTier::ZoneAdmin).unwrap();
        builder.register(node("zone.info"), GroupTier::Guest).unwrap();
        let registry = builder.build();

        // Exact registration wins for the node it names.
        assert_eq!(
            registry.level_for(GroupTier::Guest, &node("zone.info")),
            PermissionDecision::Allowed
        );
        // Siblings still fall through to the wildcard.
        assert_eq!(
            registry.level_for(GroupTier::Guest, &node("zone.delete")),
            PermissionDecision::Denied
        );
    }

    #[test]
    fn test_wildcard_chain_most_specific_first() {
        let mut builder = RegistryBuilder::new();
        builder.register(node("_ALL_"), GroupTier::Owner).unwrap();
        builder.register(node("cmd._ALL_"), GroupTier::Default).unwrap();
        let registry = builder.build();

        assert_eq!(
            registry.level_for(GroupTier::Default, &node("cmd.spawn")),
            PermissionDecision::Allowed
        );
        assert_eq!(
            registry.level_for(GroupTier::Default, &node("other.thing")),
            PermissionDecision::Denied
        );
    }

    #[test]
    fn test_default_value() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_value(node("teleport.cooldown"), GroupTier::Default, "30")
            .unwrap();
        let registry = builder.build();

        assert_eq!(registry.default_value(&node("teleport.cooldown")), Some("30"));
        assert_eq!(registry.default_value(&node("teleport.warmup")), None);
    }
}
