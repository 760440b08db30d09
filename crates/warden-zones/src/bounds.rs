//! Spatial bounds for zones.
//!
//! A zone's bounds are an axis-aligned box in block coordinates. The core
//! only ever asks "does this box contain this point"; geometry beyond that
//! belongs to the caller.

use serde::{Deserialize, Serialize};

/// A block position within a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Point {
    /// Create a point from block coordinates.
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

/// An axis-aligned, inclusive bounding box.
///
/// # Examples
///
/// ```
/// use warden_zones::{Point, ZoneBounds};
///
/// let bounds = ZoneBounds::new(Point::new(0, 0, 0), Point::new(15, 255, 15));
/// assert!(bounds.contains(&Point::new(8, 64, 8)));
/// assert!(!bounds.contains(&Point::new(16, 64, 8)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneBounds {
    pub min: Point,
    pub max: Point,
}

impl ZoneBounds {
    /// Create bounds from two corner points, normalizing min/max per axis.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Whether the box contains the point (inclusive on all faces).
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}
