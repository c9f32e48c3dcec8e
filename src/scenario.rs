//! Table setups
//!
//! Deterministic starting positions: the standard 15-ball rack with a cue
//! ball, and a seeded random spread for bouncing-ball runs.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::RACK_GAP;
use crate::settings::Settings;
use crate::sim::{Appearance, Body, BodyId};

/// Ball numbers per rack row, apex first
pub const RACK_ROWS: [&[u8]; 5] = [
    &[1],
    &[2, 3],
    &[4, 5, 6],
    &[7, 8, 9, 10],
    &[11, 12, 13, 14, 15],
];

/// Id of the cue ball in a racked setup
pub const CUE_BALL: BodyId = BodyId(0);

/// Rejection-sampling attempts per disc before giving up on it
const PLACEMENT_ATTEMPTS: usize = 1000;

/// Cue ball on the left spot, 15 balls racked on the right spot
///
/// Ball n gets `BodyId(n)`; the cue ball is `CUE_BALL`. Everything starts
/// at rest.
pub fn rack(settings: &Settings) -> Vec<Body> {
    let r = settings.ball_radius;
    let m = settings.ball_mass;
    let spacing = 2.0 * r + RACK_GAP;
    let x_spacing = spacing * 3f64.sqrt() / 2.0;

    let mut bodies = Vec::with_capacity(16);
    bodies.push(
        Body::new(
            CUE_BALL,
            DVec2::new(-settings.table_half_width / 2.0, 0.0),
            DVec2::ZERO,
            r,
            m,
        )
        .with_appearance(Appearance::Cue),
    );

    let mut x = settings.table_half_width / 2.0;
    for row in RACK_ROWS {
        let mut y = -(row.len() as f64 - 1.0) * spacing / 2.0;
        for &number in row {
            bodies.push(
                Body::new(BodyId(number as u32), DVec2::new(x, y), DVec2::ZERO, r, m)
                    .with_appearance(Appearance::for_number(number)),
            );
            y += spacing;
        }
        x += x_spacing;
    }

    log::info!("Racked {} balls", bodies.len());
    bodies
}

/// `count` non-overlapping discs at random spots with random velocities
///
/// Each velocity component is uniform in `[-max_speed, max_speed]`. The same
/// seed always gives the same layout. If the table is too crowded to fit a
/// disc, it is left out and a warning is logged.
pub fn random_spread(seed: u64, count: usize, max_speed: f64, settings: &Settings) -> Vec<Body> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let r = settings.ball_radius;
    let lim = DVec2::new(
        settings.table_half_width - r,
        settings.table_half_height - r,
    );

    let mut bodies: Vec<Body> = Vec::with_capacity(count);
    for i in 0..count {
        let spot = (0..PLACEMENT_ATTEMPTS)
            .map(|_| {
                DVec2::new(
                    rng.random_range(-lim.x..=lim.x),
                    rng.random_range(-lim.y..=lim.y),
                )
            })
            .find(|p| bodies.iter().all(|b| b.pos().distance(*p) >= 2.0 * r));

        let Some(pos) = spot else {
            log::warn!("No room for disc {} of {}, skipping", i, count);
            continue;
        };

        let vel = if max_speed > 0.0 {
            DVec2::new(
                rng.random_range(-max_speed..=max_speed),
                rng.random_range(-max_speed..=max_speed),
            )
        } else {
            DVec2::ZERO
        };
        bodies.push(Body::new(
            BodyId(i as u32),
            pos,
            vel,
            r,
            settings.ball_mass,
        ));
    }

    log::info!("Spread {} discs (seed {})", bodies.len(), seed);
    bodies
}
