//! # Warden Engine
//!
//! The resolution core: actor group memberships, the chain-walking
//! permission resolver, time-based auto-promotion, and the engine facade
//! that ties registry, zones, and persistence together across startup and
//! shutdown.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden_engine::{PermissionEngine, PromoterConfig};
//! use warden_rbac::{GroupTier, PermNode, RegistryBuilder};
//! use warden_store::JsonFileStore;
//!
//! # use warden_engine::{Presence, PresenceSource};
//! # use async_trait::async_trait;
//! # struct Server;
//! # #[async_trait]
//! # impl PresenceSource for Server {
//! #     async fn present_actors(&self) -> Vec<Presence> { Vec::new() }
//! # }
//! # async fn example() -> warden_engine::EngineResult<()> {
//! let mut builder = RegistryBuilder::new();
//! builder
//!     .register(PermNode::parse("build.place").unwrap(), GroupTier::Default)
//!     .unwrap();
//!
//! let store = Arc::new(JsonFileStore::new("data/warden"));
//! let engine = PermissionEngine::new(builder.build(), store);
//! engine.zones().define_world("overworld")?;
//!
//! let (report, handle) = engine
//!     .startup(Arc::new(Server), PromoterConfig::default())
//!     .await?;
//! println!("loaded {} zones", report.loaded);
//!
//! // ... serve queries through engine.resolver() ...
//!
//! engine.shutdown(handle).await?;
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod engine;
pub mod memberships;
pub mod promote;
pub mod resolver;

pub use admin::{AdminCommand, AdminResponse};
pub use engine::{EngineError, EngineResult, PermissionEngine, ZoneLoadReport};
pub use memberships::Memberships;
pub use promote::{
    spawn_promoter, AutoPromoter, Presence, PresenceSource, PromoterConfig, PromoterHandle,
    PromotionError, PromotionRecord, PromotionResult, PromotionRule,
};
pub use resolver::PermissionResolver;
