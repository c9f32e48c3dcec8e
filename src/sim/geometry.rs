//! Static table bounds and movable rectangular obstacles
//!
//! Both are axis-aligned rectangles centered on a point:
//! - the table is centered on the origin and never changes
//! - an obstacle (paddle) has a center the external layer may move between steps

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Coordinate axis. A wall "on" an axis is perpendicular to it:
/// `Axis::X` covers the left and right rails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Component of `v` along this axis
    #[inline]
    pub fn of(self, v: DVec2) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    /// Unit vector along this axis
    #[inline]
    pub fn unit(self) -> DVec2 {
        match self {
            Axis::X => DVec2::X,
            Axis::Y => DVec2::Y,
        }
    }

    #[inline]
    pub fn with(self, mut v: DVec2, value: f64) -> DVec2 {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
        }
        v
    }

    pub const BOTH: [Axis; 2] = [Axis::X, Axis::Y];
}

/// The playing surface: rails at ±half_width and ±half_height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub half_width: f64,
    pub half_height: f64,
}

impl Table {
    /// Panics on non-positive extents.
    pub fn new(half_width: f64, half_height: f64) -> Self {
        assert!(
            half_width > 0.0 && half_height > 0.0,
            "table half-extents must be positive, got {} x {}",
            half_width,
            half_height
        );
        Self {
            half_width,
            half_height,
        }
    }

    #[inline]
    pub fn half_extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.half_width,
            Axis::Y => self.half_height,
        }
    }

    /// Whether a disc at `pos` lies entirely inside the rails
    pub fn contains_disc(&self, pos: DVec2, radius: f64) -> bool {
        pos.x.abs() + radius <= self.half_width && pos.y.abs() + radius <= self.half_height
    }

    /// Nearest in-bounds center for a disc of `radius`
    pub fn clamp_disc(&self, pos: DVec2, radius: f64) -> DVec2 {
        let lim_x = (self.half_width - radius).max(0.0);
        let lim_y = (self.half_height - radius).max(0.0);
        DVec2::new(pos.x.clamp(-lim_x, lim_x), pos.y.clamp(-lim_y, lim_y))
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new(crate::consts::TABLE_HALF_WIDTH, crate::consts::TABLE_HALF_HEIGHT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

/// A movable rectangle (e.g. a paddle)
///
/// The center is owned by the external input layer. Moving it bumps
/// `version`, which invalidates every prediction made against the old spot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    center: DVec2,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    version: u64,
}

impl Obstacle {
    /// Panics on non-positive size.
    pub fn new(id: ObstacleId, center: DVec2, width: f64, height: f64) -> Self {
        assert!(
            width > 0.0 && height > 0.0,
            "obstacle {:?}: size must be positive, got {} x {}",
            id,
            width,
            height
        );
        Self {
            id,
            center,
            width,
            height,
            version: 0,
        }
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        self.center
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_center(&mut self, center: DVec2) {
        self.center = center;
        self.version += 1;
    }

    #[inline]
    pub fn half_extents(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Lower-left corner
    #[inline]
    pub fn min(&self) -> DVec2 {
        self.center - self.half_extents()
    }

    /// Upper-right corner
    #[inline]
    pub fn max(&self) -> DVec2 {
        self.center + self.half_extents()
    }

    /// Whether `point` lies in the rectangle grown by `pad` on every side
    pub fn contains_padded(&self, point: DVec2, pad: f64) -> bool {
        let lo = self.min() - DVec2::splat(pad);
        let hi = self.max() + DVec2::splat(pad);
        point.x >= lo.x && point.x <= hi.x && point.y >= lo.y && point.y <= hi.y
    }

    pub fn contains_point(&self, point: DVec2) -> bool {
        self.contains_padded(point, 0.0)
    }

    /// Per-axis distance from the rectangle's edges to `point`
    /// (negative along an axis the point is inside of)
    pub fn gaps(&self, point: DVec2) -> DVec2 {
        (point - self.center).abs() - self.half_extents()
    }
}
