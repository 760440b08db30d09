//! Actor group memberships.
//!
//! An actor can hold group tiers globally and per zone. Resolution unions
//! the global tiers with tiers held in any zone of the chain being
//! consulted; an actor with no memberships at all is treated as a member
//! of the default tier.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use warden_rbac::GroupTier;

#[derive(Debug, Default)]
struct Tables {
    global: HashMap<Uuid, BTreeSet<GroupTier>>,
    zones: HashMap<String, HashMap<Uuid, BTreeSet<GroupTier>>>,
}

/// Membership table mapping actors to group tiers, globally and per zone.
#[derive(Debug, Default)]
pub struct Memberships {
    inner: RwLock<Tables>,
}

impl Memberships {
    /// Create an empty membership table.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an actor to a group tier globally. Returns whether the
    /// membership was newly added.
    pub fn assign(&self, actor: Uuid, tier: GroupTier) -> bool {
        self.write().global.entry(actor).or_default().insert(tier)
    }

    /// Remove an actor from a global group tier. Returns whether the
    /// membership existed.
    pub fn unassign(&self, actor: Uuid, tier: GroupTier) -> bool {
        let mut tables = self.write();
        let Some(tiers) = tables.global.get_mut(&actor) else {
            return false;
        };
        let removed = tiers.remove(&tier);
        if tiers.is_empty() {
            tables.global.remove(&actor);
        }
        removed
    }

    /// Add an actor to a group tier within one zone only.
    pub fn assign_in(&self, zone: &str, actor: Uuid, tier: GroupTier) -> bool {
        self.write()
            .zones
            .entry(zone.to_string())
            .or_default()
            .entry(actor)
            .or_default()
            .insert(tier)
    }

    /// Remove a zone-scoped membership. Returns whether it existed.
    pub fn unassign_in(&self, zone: &str, actor: Uuid, tier: GroupTier) -> bool {
        let mut tables = self.write();
        let Some(table) = tables.zones.get_mut(zone) else {
            return false;
        };
        let Some(tiers) = table.get_mut(&actor) else {
            return false;
        };
        let removed = tiers.remove(&tier);
        if tiers.is_empty() {
            table.remove(&actor);
        }
        if table.is_empty() {
            tables.zones.remove(zone);
        }
        removed
    }

    /// Drop all memberships scoped to a zone. Called when the zone is
    /// deleted.
    pub fn clear_zone(&self, zone: &str) {
        self.write().zones.remove(zone);
    }

    /// The tiers an actor holds when standing in a zone chain: global
    /// memberships plus memberships scoped to any chain zone. An actor
    /// with none gets the default tier.
    pub fn groups_for<S: AsRef<str>>(&self, actor: Uuid, chain: &[S]) -> BTreeSet<GroupTier> {
        let tables = self.read();
        let mut tiers: BTreeSet<GroupTier> = tables
            .global
            .get(&actor)
            .cloned()
            .unwrap_or_default();
        for zone in chain {
            if let Some(scoped) = tables
                .zones
                .get(zone.as_ref())
                .and_then(|table| table.get(&actor))
            {
                tiers.extend(scoped.iter().copied());
            }
        }
        if tiers.is_empty() {
            tiers.insert(GroupTier::Default);
        }
        tiers
    }

    /// The highest tier the actor holds along a chain.
    pub fn highest_tier<S: AsRef<str>>(&self, actor: Uuid, chain: &[S]) -> GroupTier {
        self.groups_for(actor, chain)
            .into_iter()
            .next_back()
            .unwrap_or_default()
    }

    /// Move an actor from `source` to `target` tier.
    ///
    /// Zone-scoped membership is consulted first when `zone` is given,
    /// then the global table. Returns `false` when the actor does not
    /// hold `source`, which makes repeated promotion attempts no-ops.
    pub fn promote(
        &self,
        actor: Uuid,
        zone: Option<&str>,
        source: GroupTier,
        target: GroupTier,
    ) -> bool {
        let mut tables = self.write();

        if let Some(zone) = zone {
            if let Some(tiers) = tables
                .zones
                .get_mut(zone)
                .and_then(|table| table.get_mut(&actor))
            {
                if tiers.remove(&source) {
                    tiers.insert(target);
                    return true;
                }
            }
        }

        match tables.global.get_mut(&actor) {
            Some(tiers) => {
                if tiers.remove(&source) {
                    tiers.insert(target);
                    return true;
                }
                false
            }
            // An actor with no explicit memberships holds the default
            // tier implicitly; promotion from it materializes the entry.
            None if source == GroupTier::Default => {
                tables
                    .global
                    .entry(actor)
                    .or_default()
                    .insert(target);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_CHAIN: &[&str] = &[];

    #[test]
    fn test_default_tier_when_unassigned() {
        let memberships = Memberships::new();
        let actor = Uuid::now_v7();

        let tiers = memberships.groups_for(actor, NO_CHAIN);
        assert_eq!(tiers.len(), 1);
        assert!(tiers.contains(&GroupTier::Default));
        assert_eq!(memberships.highest_tier(actor, NO_CHAIN), GroupTier::Default);
    }

    #[test]
    fn test_assign_and_unassign() {
        let memberships = Memberships::new();
        let actor = Uuid::now_v7();

        assert!(memberships.assign(actor, GroupTier::Guest));
        assert!(!memberships.assign(actor, GroupTier::Guest));
        assert!(memberships.groups_for(actor, NO_CHAIN).contains(&GroupTier::Guest));

        assert!(memberships.unassign(actor, GroupTier::Guest));
        assert!(!memberships.unassign(actor, GroupTier::Guest));
        // Back to the implicit default.
        assert!(memberships.groups_for(actor, NO_CHAIN).contains(&GroupTier::Default));
    }

    #[test]
    fn test_zone_scoped_membership_needs_chain() {
        let memberships = Memberships::new();
        let actor = Uuid::now_v7();
        memberships.assign_in("spawn", actor, GroupTier::ZoneAdmin);

        assert!(!memberships
            .groups_for(actor, NO_CHAIN)
            .contains(&GroupTier::ZoneAdmin));
        assert!(memberships
            .groups_for(actor, &["spawn", "__global__"])
            .contains(&GroupTier::ZoneAdmin));
        assert_eq!(
            memberships.highest_tier(actor, &["spawn"]),
            GroupTier::ZoneAdmin
        );

        memberships.clear_zone("spawn");
        assert!(!memberships
            .groups_for(actor, &["spawn"])
            .contains(&GroupTier::ZoneAdmin));
    }

    #[test]
    fn test_highest_tier_unions_scopes() {
        let memberships = Memberships::new();
        let actor = Uuid::now_v7();
        memberships.assign(actor, GroupTier::Guest);
        memberships.assign_in("spawn", actor, GroupTier::Op);

        assert_eq!(memberships.highest_tier(actor, NO_CHAIN), GroupTier::Guest);
        assert_eq!(memberships.highest_tier(actor, &["spawn"]), GroupTier::Op);
    }

    #[test]
    fn test_promote_is_idempotent() {
        let memberships = Memberships::new();
        let actor = Uuid::now_v7();
        memberships.assign(actor, GroupTier::Guest);

        assert!(memberships.promote(actor, None, GroupTier::Guest, GroupTier::Default));
        assert!(!memberships.promote(actor, None, GroupTier::Guest, GroupTier::Default));

        let tiers = memberships.groups_for(actor, NO_CHAIN);
        assert!(tiers.contains(&GroupTier::Default));
        assert!(!tiers.contains(&GroupTier::Guest));
    }

    #[test]
    fn test_promote_from_implicit_default() {
        let memberships = Memberships::new();
        let actor = Uuid::now_v7();

        assert!(memberships.promote(actor, None, GroupTier::Default, GroupTier::ZoneAdmin));
        assert!(memberships
            .groups_for(actor, NO_CHAIN)
            .contains(&GroupTier::ZoneAdmin));
    }

    #[test]
    fn test_promote_prefers_zone_scope() {
        let memberships = Memberships::new();
        let actor = Uuid::now_v7();
        memberships.assign(actor, GroupTier::Guest);
        memberships.assign_in("spawn", actor, GroupTier::Guest);

        assert!(memberships.promote(actor, Some("spawn"), GroupTier::Guest, GroupTier::Default));
        // Zone-scoped source consumed first; global guest remains.
        assert!(memberships.groups_for(actor, NO_CHAIN).contains(&GroupTier::Guest));
        assert!(memberships
            .groups_for(actor, &["spawn"])
            .contains(&GroupTier::Default));
    }
}
