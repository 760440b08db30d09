//! Permission resolution.
//!
//! A query walks the zone chain most specific first. Within each zone the
//! actor's own overrides are consulted before group overrides, and group
//! overrides highest tier first; within each subject the exact node wins
//! over wildcard entries. The first override found decides. When no zone
//! in the chain has an opinion, the registry default for the actor's
//! highest tier decides.

use std::sync::Arc;

use uuid::Uuid;

use warden_rbac::{GroupTier, PermNode, PermissionDecision, PermissionRegistry};
use warden_zones::{Override, Point, Subject, Zone, ZoneManager, GLOBAL_ZONE};

use crate::memberships::Memberships;

/// Answers permission queries against the live zone and membership state.
///
/// Cheap to clone; holds shared handles only.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    registry: Arc<PermissionRegistry>,
    zones: Arc<ZoneManager>,
    memberships: Arc<Memberships>,
}

impl PermissionResolver {
    pub fn new(
        registry: Arc<PermissionRegistry>,
        zones: Arc<ZoneManager>,
        memberships: Arc<Memberships>,
    ) -> Self {
        Self {
            registry,
            zones,
            memberships,
        }
    }

    /// Resolve a node for an actor standing in the named zone.
    ///
    /// Unknown zone names degrade to the global chain; queries never fail.
    pub fn resolve_in(&self, actor: Uuid, node: &PermNode, zone: &str) -> PermissionDecision {
        self.zones
            .with_chain(zone, |chain| self.resolve_chain(actor, node, chain))
    }

    /// Resolve a node for an actor at a point in a world.
    ///
    /// The zone stack for the point is computed first; overlapping zones
    /// are consulted most specific first.
    pub fn resolve_at(
        &self,
        actor: Uuid,
        node: &PermNode,
        world: &str,
        point: &Point,
    ) -> PermissionDecision {
        let stack = self.zones.resolve_zones_for(world, point);
        let refs: Vec<&Zone> = stack.iter().collect();
        self.resolve_chain(actor, node, &refs)
    }

    /// Resolve against the global chain only.
    pub fn resolve_global(&self, actor: Uuid, node: &PermNode) -> PermissionDecision {
        self.resolve_in(actor, node, GLOBAL_ZONE)
    }

    /// Whether the actor is allowed the node in the named zone.
    ///
    /// An unset result is a refusal; only an explicit or registry-default
    /// allow passes.
    pub fn check(&self, actor: Uuid, node: &PermNode, zone: &str) -> bool {
        self.resolve_in(actor, node, zone).is_allowed()
    }

    /// Resolve the stored value for a valued node, walking the chain the
    /// same way as [`PermissionResolver::resolve_in`] and falling back to
    /// the registry's registered default value.
    pub fn resolve_value(&self, actor: Uuid, node: &PermNode, zone: &str) -> Option<String> {
        let from_zones = self.zones.with_chain(zone, |chain| {
            let names: Vec<&str> = chain.iter().map(|z| z.name.as_str()).collect();
            let tiers = self.memberships.groups_for(actor, &names);

            for zone in chain {
                if let Some(value) = zone.lookup_value(Subject::Actor(actor), node) {
                    return Some(value.to_string());
                }
                for tier in tiers.iter().rev() {
                    if let Some(value) = zone.lookup_value(Subject::Group(*tier), node) {
                        return Some(value.to_string());
                    }
                }
            }
            None
        });
        from_zones.or_else(|| self.registry.default_value(node).map(str::to_string))
    }

    fn resolve_chain(&self, actor: Uuid, node: &PermNode, chain: &[&Zone]) -> PermissionDecision {
        let names: Vec<&str> = chain.iter().map(|z| z.name.as_str()).collect();
        let tiers = self.memberships.groups_for(actor, &names);

        for zone in chain {
            if let Some(state) = zone.lookup_override(Subject::Actor(actor), node) {
                return decision(state);
            }
            for tier in tiers.iter().rev() {
                if let Some(state) = zone.lookup_override(Subject::Group(*tier), node) {
                    return decision(state);
                }
            }
        }

        let highest = tiers.into_iter().next_back().unwrap_or(GroupTier::Default);
        self.registry.level_for(highest, node)
    }
}

fn decision(state: Override) -> PermissionDecision {
    match state {
        Override::Allow => PermissionDecision::Allowed,
        Override::Deny => PermissionDecision::Denied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_rbac::RegistryBuilder;

    fn node(s: &str) -> PermNode {
        PermNode::parse(s).unwrap()
    }

    fn setup() -> (PermissionResolver, Arc<ZoneManager>, Arc<Memberships>, String) {
        let mut builder = RegistryBuilder::new();
        builder.register(node("build.place"), GroupTier::Default).unwrap();
        builder.register(node("chat.send"), GroupTier::Guest).unwrap();
        builder.register(node("admin.ban"), GroupTier::Op).unwrap();
        builder
            .register_value(node("teleport.cooldown"), GroupTier::Default, "30")
            .unwrap();
        let registry = builder.build();
        let zones = Arc::new(ZoneManager::new());
        let world = zones.define_world("overworld").unwrap();
        let memberships = Arc::new(Memberships::new());
        let resolver =
            PermissionResolver::new(Arc::new(registry), zones.clone(), memberships.clone());
        (resolver, zones, memberships, world)
    }

    #[test]
    fn test_registry_fallback_by_tier() {
        let (resolver, _, memberships, _) = setup();
        let actor = Uuid::now_v7();

        // Implicit default tier.
        assert!(resolver.check(actor, &node("build.place"), GLOBAL_ZONE));
        assert!(!resolver.check(actor, &node("admin.ban"), GLOBAL_ZONE));
        assert_eq!(
            resolver.resolve_global(actor, &node("admin.ban")),
            PermissionDecision::Denied
        );
        // Unregistered nodes stay unset, which check() refuses.
        assert_eq!(
            resolver.resolve_global(actor, &node("made.up")),
            PermissionDecision::Unset
        );
        assert!(!resolver.check(actor, &node("made.up"), GLOBAL_ZONE));

        memberships.assign(actor, GroupTier::Op);
        assert!(resolver.check(actor, &node("admin.ban"), GLOBAL_ZONE));
    }

    #[test]
    fn test_child_zone_shadows_parent() {
        let (resolver, zones, _, world) = setup();
        let actor = Uuid::now_v7();
        zones.create_zone("spawn", &world, None, None).unwrap();
        zones.create_zone("arena", "spawn", None, None).unwrap();

        let deny_all = Subject::Group(GroupTier::Default);
        zones
            .set_override("spawn", deny_all, &node("build.place"), Override::Deny)
            .unwrap();

        assert!(!resolver.check(actor, &node("build.place"), "spawn"));
        // Child inherits the parent's deny...
        assert!(!resolver.check(actor, &node("build.place"), "arena"));
        // ...until it speaks for itself.
        zones
            .set_override("arena", deny_all, &node("build.place"), Override::Allow)
            .unwrap();
        assert!(resolver.check(actor, &node("build.place"), "arena"));
        assert!(!resolver.check(actor, &node("build.place"), "spawn"));
    }

    #[test]
    fn test_actor_override_beats_group_override() {
        let (resolver, zones, memberships, world) = setup();
        let actor = Uuid::now_v7();
        memberships.assign(actor, GroupTier::Guest);
        zones.create_zone("spawn", &world, None, None).unwrap();

        zones
            .set_override(
                "spawn",
                Subject::Group(GroupTier::Guest),
                &node("chat.send"),
                Override::Deny,
            )
            .unwrap();
        assert!(!resolver.check(actor, &node("chat.send"), "spawn"));

        zones
            .set_override(
                "spawn",
                Subject::Actor(actor),
                &node("chat.send"),
                Override::Allow,
            )
            .unwrap();
        assert!(resolver.check(actor, &node("chat.send"), "spawn"));
    }

    #[test]
    fn test_higher_tier_override_wins_within_zone() {
        let (resolver, zones, memberships, world) = setup();
        let actor = Uuid::now_v7();
        memberships.assign(actor, GroupTier::Guest);
        memberships.assign(actor, GroupTier::ZoneAdmin);
        zones.create_zone("spawn", &world, None, None).unwrap();

        zones
            .set_override(
                "spawn",
                Subject::Group(GroupTier::Guest),
                &node("build.place"),
                Override::Deny,
            )
            .unwrap();
        zones
            .set_override(
                "spawn",
                Subject::Group(GroupTier::ZoneAdmin),
                &node("build.place"),
                Override::Allow,
            )
            .unwrap();

        assert!(resolver.check(actor, &node("build.place"), "spawn"));
    }

    #[test]
    fn test_wildcard_override_in_chain() {
        let (resolver, zones, _, world) = setup();
        let actor = Uuid::now_v7();
        zones.create_zone("vault", &world, None, None).unwrap();

        zones
            .set_override(
                "vault",
                Subject::Group(GroupTier::Default),
                &node("build._ALL_"),
                Override::Deny,
            )
            .unwrap();

        assert!(!resolver.check(actor, &node("build.place"), "vault"));
        assert!(!resolver.check(actor, &node("build.break"), "vault"));
        // Unrelated subtree untouched.
        assert!(resolver.check(actor, &node("chat.send"), "vault"));
    }

    #[test]
    fn test_resolve_at_uses_most_specific_zone() {
        let (resolver, zones, _, world) = setup();
        let actor = Uuid::now_v7();
        let outer = warden_zones::ZoneBounds::new(Point::new(0, 0, 0), Point::new(100, 255, 100));
        let inner = warden_zones::ZoneBounds::new(Point::new(40, 0, 40), Point::new(60, 255, 60));
        zones.create_zone("spawn", &world, None, Some(outer)).unwrap();
        zones.create_zone("market", "spawn", None, Some(inner)).unwrap();

        let everyone = Subject::Group(GroupTier::Default);
        zones
            .set_override("spawn", everyone, &node("build.place"), Override::Deny)
            .unwrap();
        zones
            .set_override("market", everyone, &node("build.place"), Override::Allow)
            .unwrap();

        let in_market = Point::new(50, 64, 50);
        let in_spawn = Point::new(10, 64, 10);
        let outside = Point::new(500, 64, 500);

        assert_eq!(
            resolver.resolve_at(actor, &node("build.place"), "overworld", &in_market),
            PermissionDecision::Allowed
        );
        assert_eq!(
            resolver.resolve_at(actor, &node("build.place"), "overworld", &in_spawn),
            PermissionDecision::Denied
        );
        assert_eq!(
            resolver.resolve_at(actor, &node("build.place"), "overworld", &outside),
            PermissionDecision::Allowed
        );
    }

    #[test]
    fn test_resolve_value_chain_and_registry_default() {
        let (resolver, zones, _, world) = setup();
        let actor = Uuid::now_v7();
        zones.create_zone("spawn", &world, None, None).unwrap();

        assert_eq!(
            resolver.resolve_value(actor, &node("teleport.cooldown"), "spawn"),
            Some("30".to_string())
        );

        zones
            .set_value(
                "spawn",
                Subject::Group(GroupTier::Default),
                &node("teleport.cooldown"),
                "5",
            )
            .unwrap();
        assert_eq!(
            resolver.resolve_value(actor, &node("teleport.cooldown"), "spawn"),
            Some("5".to_string())
        );
        assert_eq!(
            resolver.resolve_value(actor, &node("teleport.cooldown"), GLOBAL_ZONE),
            Some("30".to_string())
        );
        assert_eq!(resolver.resolve_value(actor, &node("made.up"), "spawn"), None);
    }
}
