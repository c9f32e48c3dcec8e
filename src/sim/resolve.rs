//! Collision response
//!
//! Impulse exchange between discs, rail and obstacle bounces, and the
//! symmetric overlap correction used by the fixed-step fallback. None of
//! these fail: degenerate input is a no-op and leftover overlap is clamped.

use super::body::Body;
use super::geometry::{Axis, Obstacle, Table};

/// Gap difference below which a contact counts as a corner hit
const CORNER_TOLERANCE: f64 = 1e-9;

/// Exchange a normal impulse between two touching discs
///
/// J = -(1 + e)·vn / (1/mA + 1/mB) along the line of centers. Tangential
/// velocity is untouched. Returns false for coincident centers or a pair
/// already separating.
pub fn resolve_body_body(a: &mut Body, b: &mut Body, restitution: f64) -> bool {
    let dr = b.pos() - a.pos();
    let dist = dr.length();
    if dist == 0.0 {
        log::warn!("Coincident centers for {:?} and {:?}", a.id(), b.id());
        return false;
    }
    let n = dr / dist;

    let vn = (b.vel() - a.vel()).dot(n);
    if vn > 0.0 {
        return false;
    }

    let impulse = -(1.0 + restitution) * vn / (1.0 / a.mass() + 1.0 / b.mass());
    a.set_velocity(a.vel() - impulse * n / a.mass());
    b.set_velocity(b.vel() + impulse * n / b.mass());
    true
}

/// Bounce off the table rails perpendicular to `axis`
///
/// The normal component is scaled by -e; the other component is copied
/// through unchanged. The position is clamped back inside the rails.
pub fn resolve_body_wall(body: &mut Body, axis: Axis, table: &Table, restitution: f64) {
    let limit = (table.half_extent(axis) - body.radius()).max(0.0);
    let p = axis.of(body.pos);
    body.pos = axis.with(body.pos, p.clamp(-limit, limit));

    let v = axis.of(body.vel());
    body.set_velocity(axis.with(body.vel(), -restitution * v));
}

/// Face of `rect` a disc is in contact with
///
/// The axis with the larger gap between disc center and rectangle edge. At a
/// corner, where the gaps tie, the axis the disc is moving into wins.
pub fn contact_face(body: &Body, rect: &Obstacle) -> Axis {
    let gaps = rect.gaps(body.pos());
    if (gaps.x - gaps.y).abs() <= CORNER_TOLERANCE {
        let approaching = |axis: Axis| {
            let offset = axis.of(body.pos() - rect.center());
            offset * axis.of(body.vel()) < 0.0
        };
        if approaching(Axis::Y) && !approaching(Axis::X) {
            return Axis::Y;
        }
        return Axis::X;
    }
    if gaps.x > gaps.y { Axis::X } else { Axis::Y }
}

/// Bounce off whichever obstacle face the disc is touching
pub fn resolve_body_obstacle(body: &mut Body, rect: &Obstacle, restitution: f64) -> bool {
    let face = contact_face(body, rect);
    resolve_body_obstacle_face(body, rect, face, restitution)
}

/// Bounce off the obstacle face perpendicular to `face`
///
/// Velocity into that face is reflected and scaled by -e, and the disc is
/// pushed back out to touching distance. Returns whether anything changed.
pub fn resolve_body_obstacle_face(
    body: &mut Body,
    rect: &Obstacle,
    face: Axis,
    restitution: f64,
) -> bool {
    let offset = face.of(body.pos() - rect.center());
    let side = if offset != 0.0 {
        offset.signum()
    } else {
        // Center exactly on the midline: treat as entering against the velocity
        -face.of(body.vel()).signum()
    };

    let mut changed = false;
    let v = face.of(body.vel());
    if v * side < 0.0 {
        body.vel = face.with(body.vel, -restitution * v);
        changed = true;
    }

    let touching = face.of(rect.half_extents()) + body.radius();
    if offset.abs() < touching {
        let target = face.of(rect.center()) + side * touching;
        body.pos = face.with(body.pos, target);
        changed = true;
    }

    if changed {
        body.bump_version();
    }
    changed
}

/// Push two interpenetrating discs apart, half the depth each
///
/// Returns the penetration depth that was removed (0 if not overlapping
/// or the centers coincide).
pub fn separate_overlap(a: &mut Body, b: &mut Body) -> f64 {
    let dr = b.pos() - a.pos();
    let dist = dr.length();
    let depth = (a.radius() + b.radius()) - dist;
    if depth <= 0.0 || dist == 0.0 {
        return 0.0;
    }

    let n = dr / dist;
    let half = n * (depth / 2.0);
    a.set_position(a.pos() - half);
    b.set_position(b.pos() + half);
    depth
}
