//! Engine lifecycle and persistence glue.
//!
//! The engine owns the shared handles (registry, zones, memberships,
//! promoter, store) and sequences startup and shutdown: load zone records,
//! load the promotion ledger, run the promoter; on shutdown, stop the
//! promoter, then write zones and ledger back. Only custom zones are
//! persisted; the global and world zones are rebuilt from live state.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use warden_rbac::PermissionRegistry;
use warden_store::{RecordKind, RecordStore, StoreError};
use warden_zones::{Zone, ZoneError, ZoneManager};

use crate::memberships::Memberships;
use crate::promote::{
    spawn_promoter, AutoPromoter, PresenceSource, PromoterConfig, PromoterHandle, PromotionError,
    PromotionRecord,
};
use crate::resolver::PermissionResolver;

/// Engine error types.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Persistence backend failure
    #[error(transparent)]
    Persistence(#[from] StoreError),

    /// Zone administration failure
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// Promotion rule configuration failure
    #[error(transparent)]
    Promotion(#[from] PromotionError),

    /// A node string failed to parse
    #[error("invalid permission node: {0}")]
    InvalidNode(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// What zone loading found in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneLoadReport {
    /// Zones adopted into the live table.
    pub loaded: usize,
    /// Records skipped: corrupt, orphaned, or conflicting.
    pub skipped: usize,
}

/// Owns the live permission state and its persistence.
pub struct PermissionEngine {
    registry: Arc<PermissionRegistry>,
    zones: Arc<ZoneManager>,
    memberships: Arc<Memberships>,
    promoter: Arc<AutoPromoter>,
    store: Arc<dyn RecordStore>,
}

impl std::fmt::Debug for PermissionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionEngine")
            .field("zones", &self.zones.len())
            .finish()
    }
}

impl PermissionEngine {
    /// Create an engine with a frozen registry and a persistence backend.
    pub fn new(registry: PermissionRegistry, store: Arc<dyn RecordStore>) -> Self {
        let registry = Arc::new(registry);
        let zones = Arc::new(ZoneManager::new());
        let memberships = Arc::new(Memberships::new());
        let promoter = Arc::new(AutoPromoter::new(zones.clone(), memberships.clone()));
        Self {
            registry,
            zones,
            memberships,
            promoter,
            store,
        }
    }

    /// The frozen permission registry.
    pub fn registry(&self) -> &Arc<PermissionRegistry> {
        &self.registry
    }

    /// The live zone table.
    pub fn zones(&self) -> &Arc<ZoneManager> {
        &self.zones
    }

    /// The membership table.
    pub fn memberships(&self) -> &Arc<Memberships> {
        &self.memberships
    }

    /// The auto-promoter.
    pub fn promoter(&self) -> &Arc<AutoPromoter> {
        &self.promoter
    }

    /// A resolver over this engine's shared state.
    pub fn resolver(&self) -> PermissionResolver {
        PermissionResolver::new(
            self.registry.clone(),
            self.zones.clone(),
            self.memberships.clone(),
        )
    }

    /// Delete a custom zone and every trace of it: its persisted record,
    /// zone-scoped memberships, and promotion state.
    pub async fn delete_zone(&self, name: &str) -> EngineResult<()> {
        self.zones.delete_zone(name)?;
        self.memberships.clear_zone(name);
        self.promoter.clear_zone(name);
        self.store.delete(RecordKind::Zone, name).await?;
        self.store.delete(RecordKind::PromotionLedger, name).await?;
        Ok(())
    }

    /// Load persisted custom zones into the live table.
    ///
    /// Records are adopted parents-first over multiple passes so children
    /// can reference custom parents in any file order. Corrupt records
    /// and orphans whose parent never appears are skipped with a warning;
    /// loading never aborts startup. World zones referenced as parents
    /// must have been defined before calling this.
    pub async fn load_zones(&self) -> EngineResult<ZoneLoadReport> {
        let records = self.store.load_all(RecordKind::Zone).await?;
        let mut report = ZoneLoadReport::default();

        let mut pending: Vec<(String, Zone)> = Vec::new();
        for (key, value) in records {
            match serde_json::from_value::<Zone>(value) {
                Ok(zone) => pending.push((key, zone)),
                Err(e) => {
                    warn!(key, error = %e, "skipping malformed zone record");
                    report.skipped += 1;
                }
            }
        }

        // Each pass adopts every zone whose parent is already live;
        // progress stalls only when the remainder is orphaned.
        loop {
            let mut next = Vec::new();
            let mut progressed = false;
            for (key, zone) in pending {
                match self.zones.adopt(zone.clone()) {
                    Ok(()) => {
                        report.loaded += 1;
                        progressed = true;
                    }
                    // Parent not live yet; retry next pass.
                    Err(ZoneError::ZoneNotFound(_)) => next.push((key, zone)),
                    Err(e) => {
                        warn!(key, error = %e, "skipping zone record");
                        report.skipped += 1;
                    }
                }
            }
            if !progressed || next.is_empty() {
                for (key, zone) in &next {
                    warn!(
                        key,
                        parent = zone.parent.as_deref().unwrap_or(""),
                        "skipping orphaned zone record"
                    );
                }
                report.skipped += next.len();
                break;
            }
            pending = next;
        }

        info!(loaded = report.loaded, skipped = report.skipped, "zones loaded");
        Ok(report)
    }

    /// Persist every custom zone. Global and world zones are never
    /// written.
    pub async fn save_zones(&self) -> EngineResult<usize> {
        let zones = self.zones.custom_zones();
        let count = zones.len();
        for zone in zones {
            let record = serde_json::to_value(&zone).map_err(StoreError::from)?;
            self.store.save(RecordKind::Zone, &zone.name, &record).await?;
        }
        info!(count, "zones saved");
        Ok(count)
    }

    /// Load persisted promotion records: each zone's rule and its
    /// accumulated progress.
    pub async fn load_promotions(&self) -> EngineResult<usize> {
        let records = self.store.load_all(RecordKind::PromotionLedger).await?;
        let mut loaded = 0;
        for (key, value) in records {
            match serde_json::from_value::<PromotionRecord>(value) {
                Ok(record) => {
                    self.promoter.restore_record(&key, record);
                    loaded += 1;
                }
                Err(e) => {
                    warn!(key, error = %e, "skipping malformed promotion record");
                }
            }
        }
        Ok(loaded)
    }

    /// Persist promotion state, one record per zone carrying its rule and
    /// progress.
    pub async fn save_promotions(&self) -> EngineResult<usize> {
        let records = self.promoter.export_records();
        let count = records.len();
        for (zone, record) in records {
            let value = serde_json::to_value(&record).map_err(StoreError::from)?;
            self.store
                .save(RecordKind::PromotionLedger, &zone, &value)
                .await?;
        }
        Ok(count)
    }

    /// Persist one zone's promotion record immediately, deleting the
    /// stored record when the zone no longer has a rule or progress.
    pub async fn save_promotion_record(&self, zone: &str) -> EngineResult<()> {
        let mut records = self.promoter.export_records();
        match records.remove(zone) {
            Some(record) => {
                let value = serde_json::to_value(&record).map_err(StoreError::from)?;
                self.store
                    .save(RecordKind::PromotionLedger, zone, &value)
                    .await?;
            }
            None => {
                self.store.delete(RecordKind::PromotionLedger, zone).await?;
            }
        }
        Ok(())
    }

    /// Bring the engine up: load persisted state, then start the
    /// promoter task.
    pub async fn startup(
        &self,
        source: Arc<dyn PresenceSource>,
        config: PromoterConfig,
    ) -> EngineResult<(ZoneLoadReport, PromoterHandle)> {
        let report = self.load_zones().await?;
        self.load_promotions().await?;
        let handle = spawn_promoter(self.promoter.clone(), source, config);
        Ok((report, handle))
    }

    /// Take the engine down cleanly: stop the promoter first so no tick
    /// runs concurrently with the final save, then persist zones and the
    /// ledger.
    pub async fn shutdown(&self, handle: PromoterHandle) -> EngineResult<()> {
        handle.stop().await;
        self.save_zones().await?;
        self.save_promotions().await?;
        info!("engine shut down");
        Ok(())
    }
}
