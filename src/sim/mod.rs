//! Event-driven simulation module
//!
//! Contacts are predicted in closed form and resolved in time order:
//! - Straight-line motion between events
//! - Friction only at heartbeat ticks, followed by re-prediction
//! - Stale predictions are detected by version counters, never searched for
//! - No rendering or platform dependencies

pub mod body;
pub mod driver;
pub mod event;
pub mod geometry;
pub mod integrator;
pub mod predict;
pub mod resolve;

pub use body::{Appearance, Body, BodyId};
pub use driver::{Driver, DriverPhase, DriverStats, ProcessedEvent};
pub use event::{Event, EventKind, EventQueue, Participant};
pub use geometry::{Axis, Obstacle, ObstacleId, Table};
pub use integrator::{advance, apply_friction};
pub use predict::{rect_contact, time_to_hit_body, time_to_hit_rect, time_to_hit_wall};
pub use resolve::{
    contact_face, resolve_body_body, resolve_body_obstacle, resolve_body_obstacle_face,
    resolve_body_wall, separate_overlap,
};
