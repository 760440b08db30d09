//! # Warden Zones
//!
//! Hierarchical permission zones: the global root zone, a world zone per
//! loaded world, and administrator-created custom zones with optional
//! spatial bounds. The [`ZoneManager`] owns the live zone table and
//! answers the structural queries the resolver needs.
//!
//! ## Usage
//!
//! ```rust
//! use warden_rbac::{GroupTier, PermNode};
//! use warden_zones::{Override, Point, Subject, ZoneBounds, ZoneManager};
//!
//! let manager = ZoneManager::new();
//! let world = manager.define_world("overworld").unwrap();
//!
//! let bounds = ZoneBounds::new(Point::new(0, 0, 0), Point::new(100, 255, 100));
//! manager.create_zone("spawn", &world, None, Some(bounds)).unwrap();
//!
//! let node = PermNode::parse("build.place").unwrap();
//! manager
//!     .set_override("spawn", Subject::Group(GroupTier::Guest), &node, Override::Deny)
//!     .unwrap();
//!
//! let stack = manager.resolve_zones_for("overworld", &Point::new(50, 64, 50));
//! assert_eq!(stack[0].name, "spawn");
//! ```

pub mod bounds;
pub mod error;
pub mod manager;
pub mod zone;

pub use bounds::{Point, ZoneBounds};
pub use error::{ZoneError, ZoneResult};
pub use manager::{world_zone_name, ZoneManager, GLOBAL_ZONE};
pub use zone::{Override, Subject, Zone, ZoneKind};
