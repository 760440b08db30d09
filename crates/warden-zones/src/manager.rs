//! # Zone manager
//!
//! Process-wide registry of all live zones. Zones live in a single indexed
//! table (name -> [`Zone`]) behind a read/write lock; parent links are
//! names resolved through the table on each traversal. Reads (resolution
//! queries) never block each other; writes (administrative edits) take the
//! lock exclusively, briefly, and never across persistence I/O.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use warden_rbac::PermNode;

use crate::bounds::{Point, ZoneBounds};
use crate::error::{ZoneError, ZoneResult};
use crate::zone::{Override, Subject, Zone, ZoneKind};

/// Name of the always-present root zone.
pub const GLOBAL_ZONE: &str = "__global__";

/// The reserved name of the world zone for `world`.
pub fn world_zone_name(world: &str) -> String {
    format!("__world_{world}__")
}

/// Owns the set of live zones and answers structural queries about them.
///
/// # Examples
///
/// ```
/// use warden_zones::{ZoneManager, GLOBAL_ZONE};
///
/// let manager = ZoneManager::new();
/// let world = manager.define_world("overworld").unwrap();
/// manager.create_zone("spawn", &world, None, None).unwrap();
///
/// assert_eq!(
///     manager.ancestor_chain("spawn"),
///     vec!["spawn".to_string(), world, GLOBAL_ZONE.to_string()]
/// );
/// ```
#[derive(Debug)]
pub struct ZoneManager {
    zones: RwLock<HashMap<String, Zone>>,
}

impl ZoneManager {
    /// Create a manager holding only the global zone.
    pub fn new() -> Self {
        let mut zones = HashMap::new();
        zones.insert(GLOBAL_ZONE.to_string(), Zone::global(GLOBAL_ZONE));
        Self {
            zones: RwLock::new(zones),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Zone>> {
        self.zones.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Zone>> {
        self.zones.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a custom zone under `parent`.
    ///
    /// The zone's world defaults to the parent's world when `world` is
    /// `None`. Fails with [`ZoneError::Cycle`] if the parent chain already
    /// contains `name`, and with [`ZoneError::DuplicateZone`] if the name
    /// is taken; on any error the zone table is unchanged.
    pub fn create_zone(
        &self,
        name: &str,
        parent: &str,
        world: Option<&str>,
        bounds: Option<ZoneBounds>,
    ) -> ZoneResult<Zone> {
        validate_name(name)?;
        let mut zones = self.write();
        if !zones.contains_key(parent) {
            return Err(ZoneError::ZoneNotFound(parent.to_string()));
        }
        if chain_contains(&zones, parent, name) {
            return Err(ZoneError::Cycle(name.to_string()));
        }
        if zones.contains_key(name) {
            return Err(ZoneError::DuplicateZone(name.to_string()));
        }
        let world = world
            .map(str::to_string)
            .or_else(|| zones.get(parent).and_then(|p| p.world.clone()));
        let zone = Zone::new(name, parent, world, bounds);
        zones.insert(name.to_string(), zone.clone());
        Ok(zone)
    }

    /// Ensure the world zone for `world` exists and return its name.
    ///
    /// Called when a world loads; idempotent.
    pub fn define_world(&self, world: &str) -> ZoneResult<String> {
        if world.is_empty() {
            return Err(ZoneError::InvalidName(world.to_string()));
        }
        let name = world_zone_name(world);
        let mut zones = self.write();
        zones
            .entry(name.clone())
            .or_insert_with(|| Zone::world_zone(&name, GLOBAL_ZONE, world));
        Ok(name)
    }

    /// Drop the world zone for `world` when the world unloads.
    ///
    /// Custom descendants stay in the table; their ancestor chains fall
    /// through to the global zone until the world returns.
    pub fn undefine_world(&self, world: &str) -> bool {
        let name = world_zone_name(world);
        let mut zones = self.write();
        match zones.get(&name) {
            Some(zone) if zone.is_world_zone() => {
                zones.remove(&name);
                true
            }
            _ => false,
        }
    }

    /// Delete a custom zone.
    ///
    /// The global zone and live world zones are protected; they disappear
    /// only through [`ZoneManager::undefine_world`] or process exit.
    pub fn delete_zone(&self, name: &str) -> ZoneResult<Zone> {
        let mut zones = self.write();
        let zone = zones
            .remove(name)
            .ok_or_else(|| ZoneError::ZoneNotFound(name.to_string()))?;
        if zone.kind != ZoneKind::Custom {
            zones.insert(name.to_string(), zone);
            return Err(ZoneError::ProtectedZone(name.to_string()));
        }
        Ok(zone)
    }

    /// Re-parent a custom zone.
    pub fn set_parent(&self, name: &str, parent: &str) -> ZoneResult<()> {
        let mut zones = self.write();
        match zones.get(name) {
            None => return Err(ZoneError::ZoneNotFound(name.to_string())),
            Some(zone) if zone.kind != ZoneKind::Custom => {
                return Err(ZoneError::ProtectedZone(name.to_string()))
            }
            Some(_) => {}
        }
        if !zones.contains_key(parent) {
            return Err(ZoneError::ZoneNotFound(parent.to_string()));
        }
        if chain_contains(&zones, parent, name) {
            return Err(ZoneError::Cycle(name.to_string()));
        }
        if let Some(zone) = zones.get_mut(name) {
            zone.parent = Some(parent.to_string());
        }
        Ok(())
    }

    /// Insert a zone reconstructed from a persisted record.
    ///
    /// The record's parent must already be present (load parents before
    /// children); reserved names are rejected and the kind is forced to
    /// `Custom` regardless of what the record claims.
    pub fn adopt(&self, mut zone: Zone) -> ZoneResult<()> {
        validate_name(&zone.name)?;
        let parent = zone
            .parent
            .clone()
            .ok_or_else(|| ZoneError::InvalidName(zone.name.clone()))?;
        let mut zones = self.write();
        if zones.contains_key(&zone.name) {
            return Err(ZoneError::DuplicateZone(zone.name));
        }
        if !zones.contains_key(&parent) {
            return Err(ZoneError::ZoneNotFound(parent));
        }
        zone.kind = ZoneKind::Custom;
        zones.insert(zone.name.clone(), zone);
        Ok(())
    }

    /// A snapshot of the named zone.
    pub fn get(&self, name: &str) -> Option<Zone> {
        self.read().get(name).cloned()
    }

    /// Whether a zone with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// A snapshot of the world zone for `world`, if that world is defined.
    pub fn world_zone(&self, world: &str) -> Option<Zone> {
        self.get(&world_zone_name(world))
    }

    /// Snapshots of every custom zone, the only durable records.
    pub fn custom_zones(&self) -> Vec<Zone> {
        self.read()
            .values()
            .filter(|z| z.kind == ZoneKind::Custom)
            .cloned()
            .collect()
    }

    /// All zone names, unordered.
    pub fn zone_names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// The number of live zones, global included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether only the global zone exists.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// The zone's ancestor chain, starting at the zone itself and ending
    /// at the global zone.
    ///
    /// Unknown zones and broken parent links degrade to the global zone
    /// rather than failing: resolution queries must not error.
    pub fn ancestor_chain(&self, name: &str) -> Vec<String> {
        let zones = self.read();
        chain_names(&zones, name)
    }

    /// Run `f` over the zone's ancestor chain under a single read lock.
    ///
    /// The chain is ordered most specific first, global last. Used by the
    /// resolver to avoid cloning override tables on the query path.
    pub fn with_chain<R>(&self, name: &str, f: impl FnOnce(&[&Zone]) -> R) -> R {
        let zones = self.read();
        let chain = chain_names(&zones, name);
        let refs: Vec<&Zone> = chain.iter().filter_map(|n| zones.get(n)).collect();
        f(&refs)
    }

    /// The zones applying at a point of a world, most specific first.
    ///
    /// Selects the custom zones of `world` whose bounds contain `point`
    /// (or that have no bounds), their ancestors, the world zone, and the
    /// global zone. Ordering: depth descending (a child always precedes
    /// its parent), bounded zones before unbounded at equal depth, then
    /// most recently created first. The global zone is always last.
    pub fn resolve_zones_for(&self, world: &str, point: &Point) -> Vec<Zone> {
        let zones = self.read();
        let mut selected: HashSet<String> = HashSet::new();
        selected.insert(GLOBAL_ZONE.to_string());
        let world_name = world_zone_name(world);
        if zones.contains_key(&world_name) {
            selected.insert(world_name);
        }
        for zone in zones.values() {
            if zone.kind == ZoneKind::Custom
                && zone.world.as_deref() == Some(world)
                && zone.applies_at(point)
            {
                for ancestor in chain_names(&zones, &zone.name) {
                    selected.insert(ancestor);
                }
            }
        }

        let mut result: Vec<Zone> = selected
            .into_iter()
            .filter_map(|n| zones.get(&n).cloned())
            .collect();
        result.sort_by(|a, b| {
            let depth_a = chain_names(&zones, &a.name).len();
            let depth_b = chain_names(&zones, &b.name).len();
            depth_b
                .cmp(&depth_a)
                .then_with(|| b.bounds.is_some().cmp(&a.bounds.is_some()))
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.name.cmp(&b.name))
        });
        result
    }

    /// Record an override in a zone.
    pub fn set_override(
        &self,
        zone: &str,
        subject: Subject,
        node: &PermNode,
        state: Override,
    ) -> ZoneResult<()> {
        let mut zones = self.write();
        let entry = zones
            .get_mut(zone)
            .ok_or_else(|| ZoneError::ZoneNotFound(zone.to_string()))?;
        entry.set_override(subject, node, state);
        Ok(())
    }

    /// Clear an override in a zone. Returns whether one existed.
    pub fn clear_override(
        &self,
        zone: &str,
        subject: Subject,
        node: &PermNode,
    ) -> ZoneResult<bool> {
        let mut zones = self.write();
        let entry = zones
            .get_mut(zone)
            .ok_or_else(|| ZoneError::ZoneNotFound(zone.to_string()))?;
        Ok(entry.clear_override(subject, node))
    }

    /// Record a stored value in a zone.
    pub fn set_value(
        &self,
        zone: &str,
        subject: Subject,
        node: &PermNode,
        value: impl Into<String>,
    ) -> ZoneResult<()> {
        let mut zones = self.write();
        let entry = zones
            .get_mut(zone)
            .ok_or_else(|| ZoneError::ZoneNotFound(zone.to_string()))?;
        entry.set_value(subject, node, value);
        Ok(())
    }

    /// Clear a stored value in a zone. Returns whether one existed.
    pub fn clear_value(&self, zone: &str, subject: Subject, node: &PermNode) -> ZoneResult<bool> {
        let mut zones = self.write();
        let entry = zones
            .get_mut(zone)
            .ok_or_else(|| ZoneError::ZoneNotFound(zone.to_string()))?;
        Ok(entry.clear_value(subject, node))
    }
}

impl Default for ZoneManager {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_name(name: &str) -> ZoneResult<()> {
    if name.is_empty()
        || name.starts_with("__")
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ZoneError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Whether `needle` appears in the parent chain starting at `from`
/// (inclusive).
fn chain_contains(zones: &HashMap<String, Zone>, from: &str, needle: &str) -> bool {
    let mut current = Some(from.to_string());
    let mut visited = HashSet::new();
    while let Some(name) = current {
        if name == needle {
            return true;
        }
        if !visited.insert(name.clone()) {
            break;
        }
        current = zones.get(&name).and_then(|z| z.parent.clone());
    }
    false
}

/// The ancestor chain for `name`: the zone itself, its parents in order,
/// ending at the global zone. Broken links degrade to the global zone.
fn chain_names(zones: &HashMap<String, Zone>, name: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(name.to_string());
    while let Some(n) = current {
        // A dead link (deleted or undefined parent) ends the chain here.
        if !zones.contains_key(&n) || !visited.insert(n.clone()) {
            break;
        }
        current = zones.get(&n).and_then(|z| z.parent.clone());
        chain.push(n);
    }
    if chain.last().map(String::as_str) != Some(GLOBAL_ZONE) {
        chain.push(GLOBAL_ZONE.to_string());
    }
    chain
}
