//! Renderer-facing snapshot types
//!
//! Plain `Pod` instances that can be copied straight into a GPU buffer. A
//! snapshot is taken after a step and never refers back to the driver.

use bytemuck::{Pod, Zeroable};

use crate::sim::{Body, Driver, Obstacle};

/// One disc, ready for instanced drawing
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DiscInstance {
    pub center: [f32; 2],
    pub velocity: [f32; 2],
    pub radius: f32,
    /// `Appearance::tag` of the body
    pub tag: u32,
}

impl DiscInstance {
    pub fn from_body(body: &Body) -> Self {
        let pos = body.pos().as_vec2();
        let vel = body.vel().as_vec2();
        Self {
            center: pos.to_array(),
            velocity: vel.to_array(),
            radius: body.radius() as f32,
            tag: body.appearance.tag(),
        }
    }
}

/// One rectangle obstacle
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RectInstance {
    pub center: [f32; 2],
    pub half_extents: [f32; 2],
}

impl RectInstance {
    pub fn from_obstacle(rect: &Obstacle) -> Self {
        Self {
            center: rect.center().as_vec2().to_array(),
            half_extents: rect.half_extents().as_vec2().to_array(),
        }
    }
}

/// Everything a frame needs
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub time: f64,
    pub discs: Vec<DiscInstance>,
    pub rects: Vec<RectInstance>,
}

impl Snapshot {
    pub fn capture(driver: &Driver) -> Self {
        Self {
            time: driver.time(),
            discs: driver.bodies().iter().map(DiscInstance::from_body).collect(),
            rects: driver
                .obstacles()
                .iter()
                .map(RectInstance::from_obstacle)
                .collect(),
        }
    }

    /// Raw bytes of the disc instances
    pub fn disc_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.discs)
    }

    pub fn rect_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.rects)
    }
}
