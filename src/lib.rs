//! Pool Physics - event-driven 2D disc collision core
//!
//! Core modules:
//! - `sim`: Prediction, event scheduling, integration and collision response
//! - `settings`: Physical constants, JSON-loadable and validated
//! - `snapshot`: Immutable per-disc instances for an external renderer
//! - `scenario`: Deterministic table setups (rack, seeded spread)

pub mod scenario;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use settings::{Settings, SettingsError};
pub use sim::{Body, BodyId, Driver, Obstacle, ObstacleId, ProcessedEvent, Table};

use glam::DVec2;

/// Default table and ball constants (pixel units, 1 ft = 100 px)
pub mod consts {
    /// Heartbeat rate (redraws per simulated second)
    pub const HEARTBEAT_HZ: f64 = 60.0;

    /// Table is 900 x 450 px; the core works in half-extents around the origin
    pub const TABLE_HALF_WIDTH: f64 = 450.0;
    pub const TABLE_HALF_HEIGHT: f64 = 225.0;
    pub const PX_PER_M: f64 = 30.48;

    /// Ball defaults
    pub const BALL_RADIUS: f64 = 12.0;
    pub const BALL_MASS: f64 = 0.17; // kg
    /// Gap between racked balls, on top of the diameter
    pub const RACK_GAP: f64 = 3.75;

    pub const GRAVITY: f64 = 9.8;
    pub const SLIDING_FRICTION: f64 = 0.2;
    pub const BALL_BALL_RESTITUTION: f64 = 0.96;
    pub const BALL_RAIL_RESTITUTION: f64 = 0.75;

    /// Below this speed (px/s) a ball is snapped to rest
    pub const MIN_SPEED: f64 = 0.1;
    /// Hardest possible break shot (px/s)
    pub const MAX_CUE_SPEED: f64 = 11.623 * PX_PER_M;
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction(theta: f64) -> DVec2 {
    DVec2::new(theta.cos(), theta.sin())
}

/// Kinetic energy of a mass moving with `vel`
#[inline]
pub fn kinetic_energy(mass: f64, vel: DVec2) -> f64 {
    0.5 * mass * vel.length_squared()
}
