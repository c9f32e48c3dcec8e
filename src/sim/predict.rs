//! Closed-form contact time prediction
//!
//! Every predictor assumes straight-line motion from now until the returned
//! time. `None` means the contact never happens under that assumption, which
//! covers all the degenerate inputs (parallel, separating, zero relative
//! velocity) without any error path.

use super::body::Body;
use super::geometry::{Axis, Obstacle};

/// Slack when checking that a predicted crossing lands on a rectangle face
const FACE_TOLERANCE: f64 = 1e-9;

/// Time until two discs become tangent
///
/// Solves |dr + dv t| = rA + rB for the smaller root. Pairs that are
/// separating, moving in parallel, or already touching while moving apart
/// return `None` so the caller can never spin on a zero-time contact.
/// A pair already in contact and still closing returns `Some(0.0)`; the
/// impulse makes it separate, so that also happens at most once.
pub fn time_to_hit_body(a: &Body, b: &Body) -> Option<f64> {
    if a.id() == b.id() {
        return None;
    }

    let dr = b.pos() - a.pos();
    let dv = b.vel() - a.vel();
    let dvdr = dr.dot(dv);
    if dvdr >= 0.0 {
        return None;
    }

    let dvdv = dv.dot(dv);
    if dvdv == 0.0 {
        return None;
    }

    let drdr = dr.dot(dr);
    let sigma = a.radius() + b.radius();
    if drdr <= sigma * sigma {
        return Some(0.0);
    }

    let d = dvdr * dvdr - dvdv * (drdr - sigma * sigma);
    if d < 0.0 {
        return None;
    }

    let t = -(dvdr + d.sqrt()) / dvdv;
    if t > 0.0 { Some(t) } else { None }
}

/// Time until a disc touches the table rail it is heading toward on `axis`
///
/// A disc already touching (or numerically past) that rail gets `Some(0.0)`:
/// the bounce flips the component, so the following prediction targets the
/// opposite rail and a zero-time event is only ever produced once.
pub fn time_to_hit_wall(body: &Body, axis: Axis, half_extent: f64) -> Option<f64> {
    let v = axis.of(body.vel());
    if v == 0.0 {
        return None;
    }

    let p = axis.of(body.pos());
    let rail = if v > 0.0 {
        half_extent - body.radius()
    } else {
        -half_extent + body.radius()
    };
    let t = (rail - p) / v;
    Some(t.max(0.0))
}

/// Time until a disc touches an axis-aligned rectangle
pub fn time_to_hit_rect(body: &Body, rect: &Obstacle) -> Option<f64> {
    rect_contact(body, rect).map(|(t, _)| t)
}

/// Time and face axis of the next disc/rectangle contact
///
/// Slab test on the rectangle grown by the disc radius. Each axis offers at
/// most one entry time; the earliest one whose crossing point actually lies on
/// the grown rectangle wins, and its axis names the face that is struck.
pub fn rect_contact(body: &Body, rect: &Obstacle) -> Option<(f64, Axis)> {
    let r = body.radius();
    let pos = body.pos();
    let vel = body.vel();
    let lo = rect.min();
    let hi = rect.max();

    let mut candidates: Vec<(f64, Axis)> = Axis::BOTH
        .into_iter()
        .filter_map(|axis| {
            let v = axis.of(vel);
            let p = axis.of(pos);
            let near_lo = axis.of(lo) - r;
            let near_hi = axis.of(hi) + r;

            if v > 0.0 && p <= near_lo {
                Some(((near_lo - p) / v, axis))
            } else if v < 0.0 && p >= near_hi {
                Some(((near_hi - p) / v, axis))
            } else {
                None
            }
        })
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    candidates.into_iter().find(|&(t, _)| {
        let at = body.position_at(t);
        rect.contains_padded(at, r + FACE_TOLERANCE)
    })
}
