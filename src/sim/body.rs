//! Disc bodies and their version counters

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Stable identity of a disc on the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// How the renderer should draw a disc. The physics never looks at this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Appearance {
    /// White cue ball
    Cue,
    /// Solid-coloured numbered ball (1-8)
    Solid { number: u8 },
    /// Striped numbered ball (9-15)
    Striped { number: u8 },
    /// Unnumbered disc with an explicit colour
    Plain { rgb: [u8; 3] },
    #[default]
    Unmarked,
}

impl Appearance {
    /// Pool appearance for a ball number, 0 meaning the cue ball
    pub fn for_number(number: u8) -> Self {
        match number {
            0 => Appearance::Cue,
            1..=8 => Appearance::Solid { number },
            _ => Appearance::Striped { number },
        }
    }

    /// Compact tag for GPU upload
    pub fn tag(&self) -> u32 {
        match self {
            Appearance::Cue => 0,
            Appearance::Solid { number } | Appearance::Striped { number } => *number as u32,
            Appearance::Plain { .. } => 0x100,
            Appearance::Unmarked => 0x200,
        }
    }
}

/// A rigid disc
///
/// Radius and mass are fixed at construction. Every write to position or
/// velocity other than straight-line advance bumps `version`, which is what
/// invalidates previously scheduled events for this body.
#[derive(Debug, Clone, Serialize)]
pub struct Body {
    id: BodyId,
    pub(crate) pos: DVec2,
    pub(crate) vel: DVec2,
    radius: f64,
    mass: f64,
    version: u64,
    pub appearance: Appearance,
}

impl Body {
    /// Create a body. Panics on a non-positive radius or mass.
    pub fn new(id: BodyId, pos: DVec2, vel: DVec2, radius: f64, mass: f64) -> Self {
        assert!(
            radius.is_finite() && radius > 0.0,
            "body {:?}: radius must be positive, got {}",
            id,
            radius
        );
        assert!(
            mass.is_finite() && mass > 0.0,
            "body {:?}: mass must be positive, got {}",
            id,
            mass
        );
        Self {
            id,
            pos,
            vel,
            radius,
            mass,
            version: 0,
            appearance: Appearance::default(),
        }
    }

    pub fn with_appearance(mut self, appearance: Appearance) -> Self {
        self.appearance = appearance;
        self
    }

    #[inline]
    pub fn id(&self) -> BodyId {
        self.id
    }

    #[inline]
    pub fn pos(&self) -> DVec2 {
        self.pos
    }

    #[inline]
    pub fn vel(&self) -> DVec2 {
        self.vel
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn speed(&self) -> f64 {
        self.vel.length()
    }

    /// True while the body has any velocity at all
    pub fn is_moving(&self) -> bool {
        self.vel != DVec2::ZERO
    }

    pub fn momentum(&self) -> DVec2 {
        self.vel * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        crate::kinetic_energy(self.mass, self.vel)
    }

    /// Where the body will be after `dt` of uninterrupted motion
    pub fn position_at(&self, dt: f64) -> DVec2 {
        self.pos + self.vel * dt
    }

    pub fn distance_to(&self, other: &Body) -> f64 {
        self.pos.distance(other.pos)
    }

    /// Overwrite velocity (cue strike, impulse)
    pub fn set_velocity(&mut self, vel: DVec2) {
        self.vel = vel;
        self.bump_version();
    }

    /// Teleport the body (re-spot after a scratch, de-penetration)
    pub fn set_position(&mut self, pos: DVec2) {
        self.pos = pos;
        self.bump_version();
    }

    /// Re-spot with a new pose in one write
    pub fn place(&mut self, pos: DVec2, vel: DVec2) {
        self.pos = pos;
        self.vel = vel;
        self.bump_version();
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}
