//! Auto-promotion.
//!
//! A promotion rule attaches to a zone: actors holding the rule's source
//! tier accumulate presence time while inside the zone, and crossing the
//! threshold moves them to the target tier. Accumulated time pauses while
//! an actor is absent and is wiped by promotion. Each zone's rule and its
//! accumulated seconds form one durable record, so restarts neither drop
//! rules nor reset progress.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use warden_rbac::GroupTier;
use warden_zones::{Point, ZoneManager};

use crate::memberships::Memberships;

/// Auto-promotion error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromotionError {
    /// The rule names a zone that does not exist.
    #[error("no zone for promotion rule: {0}")]
    UnknownZone(String),

    /// The rule is self-contradictory.
    #[error("invalid promotion rule: {0}")]
    InvalidRule(String),
}

/// Result type for promotion configuration.
pub type PromotionResult<T> = Result<T, PromotionError>;

/// A per-zone promotion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRule {
    /// Tier an actor must hold for presence to count.
    pub source: GroupTier,
    /// Tier granted when the threshold is crossed.
    pub target: GroupTier,
    /// Accumulated in-zone seconds required.
    pub threshold_secs: u64,
}

/// One zone's durable promotion record: the attached rule, if any, and
/// each actor's accumulated in-zone seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRecord {
    #[serde(default)]
    pub rule: Option<PromotionRule>,
    #[serde(default)]
    pub progress: HashMap<Uuid, u64>,
}

/// An actor's position snapshot, fed to the promoter each tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub actor: Uuid,
    pub world: String,
    pub point: Point,
}

/// Supplies the set of currently present actors.
#[async_trait]
pub trait PresenceSource: Send + Sync {
    /// Snapshot every actor currently in a world, with positions.
    async fn present_actors(&self) -> Vec<Presence>;
}

#[derive(Debug, Default)]
struct PromoterState {
    rules: HashMap<String, PromotionRule>,
    /// zone -> actor -> accumulated seconds
    ledger: HashMap<String, HashMap<Uuid, u64>>,
}

/// Accumulates presence time against promotion rules and applies
/// promotions when thresholds are crossed.
#[derive(Debug)]
pub struct AutoPromoter {
    state: RwLock<PromoterState>,
    zones: Arc<ZoneManager>,
    memberships: Arc<Memberships>,
}

impl AutoPromoter {
    pub fn new(zones: Arc<ZoneManager>, memberships: Arc<Memberships>) -> Self {
        Self {
            state: RwLock::new(PromoterState::default()),
            zones,
            memberships,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, PromoterState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PromoterState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach a promotion rule to a zone, replacing any existing rule.
    pub fn set_rule(&self, zone: &str, rule: PromotionRule) -> PromotionResult<()> {
        if rule.source == rule.target {
            return Err(PromotionError::InvalidRule(format!(
                "source and target are both {}",
                rule.source
            )));
        }
        if rule.threshold_secs == 0 {
            return Err(PromotionError::InvalidRule(
                "threshold must be positive".to_string(),
            ));
        }
        if !self.zones.contains(zone) {
            return Err(PromotionError::UnknownZone(zone.to_string()));
        }
        self.write().rules.insert(zone.to_string(), rule);
        Ok(())
    }

    /// Detach a zone's rule. Accumulated time for the zone is kept so a
    /// re-attached rule resumes where it stopped.
    pub fn remove_rule(&self, zone: &str) -> bool {
        self.write().rules.remove(zone).is_some()
    }

    /// The rule attached to a zone, if any.
    pub fn rule_for(&self, zone: &str) -> Option<PromotionRule> {
        self.read().rules.get(zone).copied()
    }

    /// Snapshot of all rules.
    pub fn rules(&self) -> HashMap<String, PromotionRule> {
        self.read().rules.clone()
    }

    /// Accumulated seconds for an actor in a zone.
    pub fn accumulated(&self, zone: &str, actor: Uuid) -> u64 {
        self.read()
            .ledger
            .get(zone)
            .and_then(|table| table.get(&actor))
            .copied()
            .unwrap_or(0)
    }

    /// Snapshot every zone's promotion state for persistence: one record
    /// per zone carrying its rule and accumulated progress.
    pub fn export_records(&self) -> HashMap<String, PromotionRecord> {
        let state = self.read();
        let mut records: HashMap<String, PromotionRecord> = HashMap::new();
        for (zone, rule) in &state.rules {
            records.entry(zone.clone()).or_default().rule = Some(*rule);
        }
        for (zone, progress) in &state.ledger {
            records.entry(zone.clone()).or_default().progress = progress.clone();
        }
        records
    }

    /// Restore one zone's record, as loaded from the store.
    pub fn restore_record(&self, zone: &str, record: PromotionRecord) {
        let mut state = self.write();
        if let Some(rule) = record.rule {
            state.rules.insert(zone.to_string(), rule);
        }
        if !record.progress.is_empty() {
            state.ledger.insert(zone.to_string(), record.progress);
        }
    }

    /// Drop all promotion state for a zone. Called when the zone is
    /// deleted.
    pub fn clear_zone(&self, zone: &str) {
        let mut state = self.write();
        state.rules.remove(zone);
        state.ledger.remove(zone);
    }

    /// Advance every rule by one tick.
    ///
    /// For each rule, actors present inside the rule's zone and holding
    /// the source tier accumulate `elapsed`; crossing the threshold
    /// promotes them and wipes their accumulator. Absent actors keep
    /// their accumulated time. A rule whose zone has disappeared is
    /// skipped with a warning, not removed.
    pub fn tick(&self, presences: &[Presence], elapsed: Duration) {
        let rules = self.rules();
        let elapsed_secs = elapsed.as_secs();

        for (zone_name, rule) in rules {
            let Some(zone) = self.zones.get(&zone_name) else {
                warn!(zone = %zone_name, "promotion rule references missing zone");
                continue;
            };

            let chain = self.zones.ancestor_chain(&zone_name);
            for presence in presences {
                if zone.world.as_deref() != Some(presence.world.as_str())
                    && !zone.is_global()
                {
                    continue;
                }
                if !zone.applies_at(&presence.point) {
                    continue;
                }
                if !self
                    .memberships
                    .groups_for(presence.actor, &chain)
                    .contains(&rule.source)
                {
                    continue;
                }

                let total = {
                    let mut state = self.write();
                    let slot = state
                        .ledger
                        .entry(zone_name.clone())
                        .or_default()
                        .entry(presence.actor)
                        .or_insert(0);
                    *slot += elapsed_secs;
                    *slot
                };

                if total >= rule.threshold_secs {
                    if self.memberships.promote(
                        presence.actor,
                        Some(&zone_name),
                        rule.source,
                        rule.target,
                    ) {
                        info!(
                            actor = %presence.actor,
                            zone = %zone_name,
                            source = %rule.source,
                            target = %rule.target,
                            "auto-promoted actor"
                        );
                        // Progress is spent only by a promotion that
                        // actually applied.
                        let mut state = self.write();
                        if let Some(table) = state.ledger.get_mut(&zone_name) {
                            table.remove(&presence.actor);
                            if table.is_empty() {
                                state.ledger.remove(&zone_name);
                            }
                        }
                    } else {
                        debug!(
                            actor = %presence.actor,
                            zone = %zone_name,
                            "promotion threshold crossed but source tier not directly held"
                        );
                    }
                }
            }
        }
    }
}

/// Background promoter task configuration.
#[derive(Debug, Clone, Copy)]
pub struct PromoterConfig {
    /// Time between presence polls.
    pub interval: Duration,
}

impl Default for PromoterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// Handle to a running promoter task.
///
/// Dropping the handle without calling [`PromoterHandle::stop`] detaches
/// the task; it keeps running until the runtime shuts down.
#[derive(Debug)]
pub struct PromoterHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PromoterHandle {
    /// Signal the task to stop and wait for it to finish its current tick.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the background promotion task.
///
/// The task polls `source` every `config.interval`, feeds the snapshot to
/// [`AutoPromoter::tick`], and exits promptly when stopped through the
/// returned handle.
pub fn spawn_promoter(
    promoter: Arc<AutoPromoter>,
    source: Arc<dyn PresenceSource>,
    config: PromoterConfig,
) -> PromoterHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);
        // The first tick of a tokio interval fires immediately; skip it so
        // no presence time is credited before a full interval has passed.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = stop_rx.changed() => {
                    if *stop_rx.borrow() {
                        debug!("promoter task stopping");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let presences = source.present_actors().await;
                    promoter.tick(&presences, config.interval);
                }
            }
        }
    });

    PromoterHandle { stop_tx, task }
}
