//! # Zones
//!
//! A zone is a named scope owning its own permission override table. The
//! global zone covers everything; each loaded world gets a world zone under
//! it; administrators carve custom zones (optionally bounded) under world
//! zones or other custom zones. A zone stores its parent as a *name*,
//! resolved through the [`ZoneManager`](crate::ZoneManager) table on each
//! traversal, so the forest has no ownership cycles.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_rbac::{GroupTier, PermNode};

use crate::bounds::ZoneBounds;

/// The subject an override applies to: a whole group tier or one actor.
///
/// Actor overrides take precedence over group overrides within a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    /// Every member of a group tier.
    Group(GroupTier),
    /// A single actor.
    Actor(Uuid),
}

impl Subject {
    /// Stable string key used in the zone's serialized override tables.
    pub fn key(&self) -> String {
        match self {
            Self::Group(tier) => format!("group:{}", tier.as_str()),
            Self::Actor(id) => format!("actor:{id}"),
        }
    }

    /// Parse a key produced by [`Subject::key`].
    pub fn parse_key(key: &str) -> Option<Self> {
        if let Some(tier) = key.strip_prefix("group:") {
            return GroupTier::parse(tier).map(Self::Group);
        }
        if let Some(id) = key.strip_prefix("actor:") {
            return Uuid::parse_str(id).ok().map(Self::Actor);
        }
        None
    }
}

/// An explicit grant or refusal recorded for a (subject, node) pair.
///
/// Absence of an override means "unset"; clearing one restores that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Override {
    Allow,
    Deny,
}

/// What kind of zone this is.
///
/// Only custom zones are durable records; global and world zones are
/// re-derived from live world state at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    /// The always-present root zone.
    Global,
    /// One per loaded world, child of the global zone.
    World,
    /// Administrator-created, child of a world zone or another custom zone.
    #[default]
    Custom,
}

/// A named, hierarchical permission scope.
///
/// Override and value tables are keyed by [`Subject::key`] strings and node
/// strings so the whole struct serializes to plain JSON objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    /// Unique zone name.
    pub name: String,

    /// Parent zone name; `None` only for the global zone.
    pub parent: Option<String>,

    /// The world this zone belongs to, if any.
    pub world: Option<String>,

    /// Optional spatial bounds. A custom zone with no bounds covers its
    /// whole world.
    pub bounds: Option<ZoneBounds>,

    /// Zone taxonomy; defaults to `Custom` for loaded records.
    #[serde(default)]
    pub kind: ZoneKind,

    /// Creation time, the tie-break between overlapping zones.
    pub created_at: DateTime<Utc>,

    /// subject key -> node -> allow/deny
    #[serde(default)]
    overrides: HashMap<String, HashMap<String, Override>>,

    /// subject key -> node -> stored value
    #[serde(default)]
    values: HashMap<String, HashMap<String, String>>,
}

impl Zone {
    /// Create a custom zone.
    pub fn new(
        name: impl Into<String>,
        parent: impl Into<String>,
        world: Option<String>,
        bounds: Option<ZoneBounds>,
    ) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent.into()),
            world,
            bounds,
            kind: ZoneKind::Custom,
            created_at: Utc::now(),
            overrides: HashMap::new(),
            values: HashMap::new(),
        }
    }

    pub(crate) fn global(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            world: None,
            bounds: None,
            kind: ZoneKind::Global,
            created_at: Utc::now(),
            overrides: HashMap::new(),
            values: HashMap::new(),
        }
    }

    pub(crate) fn world_zone(name: &str, parent: &str, world: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: Some(parent.to_string()),
            world: Some(world.to_string()),
            bounds: None,
            kind: ZoneKind::World,
            created_at: Utc::now(),
            overrides: HashMap::new(),
            values: HashMap::new(),
        }
    }

    /// Whether this is the global zone.
    pub fn is_global(&self) -> bool {
        self.kind == ZoneKind::Global
    }

    /// Whether this is a world zone.
    pub fn is_world_zone(&self) -> bool {
        self.kind == ZoneKind::World
    }

    /// Whether this zone applies at `point` for spatial resolution.
    ///
    /// Unbounded zones cover their whole world.
    pub fn applies_at(&self, point: &crate::bounds::Point) -> bool {
        self.bounds.map_or(true, |b| b.contains(point))
    }

    /// Record an allow/deny override for a subject on a node.
    pub fn set_override(&mut self, subject: Subject, node: &PermNode, state: Override) {
        self.overrides
            .entry(subject.key())
            .or_default()
            .insert(node.as_str().to_string(), state);
    }

    /// Remove an override, restoring "unset". Returns whether one existed.
    pub fn clear_override(&mut self, subject: Subject, node: &PermNode) -> bool {
        let key = subject.key();
        let Some(table) = self.overrides.get_mut(&key) else {
            return false;
        };
        let removed = table.remove(node.as_str()).is_some();
        if table.is_empty() {
            self.overrides.remove(&key);
        }
        removed
    }

    /// The override recorded for exactly this (subject, node), if any.
    pub fn override_for(&self, subject: Subject, node: &PermNode) -> Option<Override> {
        self.overrides
            .get(&subject.key())
            .and_then(|table| table.get(node.as_str()))
            .copied()
    }

    /// Override lookup with wildcard fallback.
    ///
    /// The exact node is consulted first; wildcard entries apply only when
    /// it misses, most specific prefix first.
    pub fn lookup_override(&self, subject: Subject, node: &PermNode) -> Option<Override> {
        let table = self.overrides.get(&subject.key())?;
        if let Some(state) = table.get(node.as_str()) {
            return Some(*state);
        }
        node.wildcard_chain()
            .into_iter()
            .find_map(|wild| table.get(wild.as_str()).copied())
    }

    /// Record a stored value for a subject on a valued node.
    pub fn set_value(&mut self, subject: Subject, node: &PermNode, value: impl Into<String>) {
        self.values
            .entry(subject.key())
            .or_default()
            .insert(node.as_str().to_string(), value.into());
    }

    /// Remove a stored value. Returns whether one existed.
    pub fn clear_value(&mut self, subject: Subject, node: &PermNode) -> bool {
        let key = subject.key();
        let Some(table) = self.values.get_mut(&key) else {
            return false;
        };
        let removed = table.remove(node.as_str()).is_some();
        if table.is_empty() {
            self.values.remove(&key);
        }
        removed
    }

    /// Value lookup with wildcard fallback, exact node first.
    pub fn lookup_value(&self, subject: Subject, node: &PermNode) -> Option<&str> {
        let table = self.values.get(&subject.key())?;
        if let Some(value) = table.get(node.as_str()) {
            return Some(value.as_str());
        }
        node.wildcard_chain()
            .into_iter()
            .find_map(|wild| table.get(wild.as_str()).map(String::as_str))
    }

    /// Whether the zone has any overrides or values recorded.
    pub fn has_overrides(&self) -> bool {
        !self.overrides.is_empty() || !self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(s: &str) -> PermNode {
        PermNode::parse(s).unwrap()
    }

    #[test]
    fn test_subject_key_round_trip() {
        let group = Subject::Group(GroupTier::ZoneAdmin);
        assert_eq!(Subject::parse_key(&group.key()), Some(group));

        let actor = Subject::Actor(Uuid::now_v7());
        assert_eq!(Subject::parse_key(&actor.key()), Some(actor));

        assert_eq!(Subject::parse_key("group:bogus"), None);
        assert_eq!(Subject::parse_key("actor:not-a-uuid"), None);
        assert_eq!(Subject::parse_key("something"), None);
    }

    #[test]
    fn test_set_and_clear_override() {
        let mut zone = Zone::new("spawn", "__global__", None, None);
        let subject = Subject::Group(GroupTier::Guest);

        zone.set_override(subject, &node("build.place"), Override::Deny);
        assert_eq!(
            zone.override_for(subject, &node("build.place")),
            Some(Override::Deny)
        );

        assert!(zone.clear_override(subject, &node("build.place")));
        assert_eq!(zone.override_for(subject, &node("build.place")), None);
        assert!(!zone.clear_override(subject, &node("build.place")));
        assert!(!zone.has_overrides());
    }

    #[test]
    fn test_lookup_override_exact_beats_wildcard() {
        let mut zone = Zone::new("spawn", "__global__", None, None);
        let subject = Subject::Group(GroupTier::Default);

        zone.set_override(subject, &node("build._ALL_"), Override::Deny);
        zone.set_override(subject, &node("build.interact"), Override::Allow);

        assert_eq!(
            zone.lookup_override(subject, &node("build.interact")),
            Some(Override::Allow)
        );
        assert_eq!(
            zone.lookup_override(subject, &node("build.place")),
            Some(Override::Deny)
        );
        assert_eq!(zone.lookup_override(subject, &node("chat.send")), None);
    }

    #[test]
    fn test_values() {
        let mut zone = Zone::new("spawn", "__global__", None, None);
        let subject = Subject::Group(GroupTier::Default);

        zone.set_value(subject, &node("teleport.cooldown"), "15");
        assert_eq!(
            zone.lookup_value(subject, &node("teleport.cooldown")),
            Some("15")
        );

        zone.set_value(subject, &node("teleport._ALL_"), "60");
        assert_eq!(
            zone.lookup_value(subject, &node("teleport.cooldown")),
            Some("15")
        );
        assert_eq!(
            zone.lookup_value(subject, &node("teleport.warmup")),
            Some("60")
        );

        assert!(zone.clear_value(subject, &node("teleport.cooldown")));
        assert_eq!(
            zone.lookup_value(subject, &node("teleport.cooldown")),
            Some("60")
        );
    }

    #[test]
    fn test_zone_serde_round_trip() {
        let mut zone = Zone::new("spawn", "__world_overworld__", Some("overworld".into()), None);
        let actor = Subject::Actor(Uuid::now_v7());
        zone.set_override(actor, &node("build.place"), Override::Allow);
        zone.set_override(
            Subject::Group(GroupTier::Guest),
            &node("build._ALL_"),
            Override::Deny,
        );
        zone.set_value(Subject::Group(GroupTier::Default), &node("teleport.cooldown"), "30");

        let json = serde_json::to_string(&zone).unwrap();
        let back: Zone = serde_json::from_str(&json).unwrap();

        assert_eq!(back.name, zone.name);
        assert_eq!(back.parent, zone.parent);
        assert_eq!(back.kind, ZoneKind::Custom);
        assert_eq!(
            back.override_for(actor, &node("build.place")),
            Some(Override::Allow)
        );
        assert_eq!(
            back.lookup_override(Subject::Group(GroupTier::Guest), &node("build.break")),
            Some(Override::Deny)
        );
        assert_eq!(
            back.lookup_value(Subject::Group(GroupTier::Default), &node("teleport.cooldown")),
            Some("30")
        );
    }
}
