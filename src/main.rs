//! Pool Physics headless runner
//!
//! Racks the balls, breaks, and runs the event-driven driver until every
//! ball is at rest. Pass a settings JSON path as the first argument to
//! override the default table. `RUST_LOG=debug` shows each collision.

use pool_physics::scenario::{self, CUE_BALL};
use pool_physics::snapshot::Snapshot;
use pool_physics::{Driver, ProcessedEvent, Settings};

fn main() {
    env_logger::init();
    log::info!("Pool Physics starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => {
            let loaded = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|json| Settings::from_json(&json).map_err(|e| e.to_string()));
            match loaded {
                Ok(s) => s,
                Err(e) => {
                    log::error!("Failed to load settings from {}: {}", path, e);
                    std::process::exit(1);
                }
            }
        }
        None => Settings::default(),
    };

    let bodies = scenario::rack(&settings);
    let mut driver = Driver::new(settings, bodies);

    // Full-power break, slightly off-center to spread the rack
    driver.shoot(CUE_BALL, 0.01, 100.0);

    let collisions = driver.run_until_stopped(120.0);
    for event in &collisions {
        match *event {
            ProcessedEvent::BodyBody { time, a, b } => {
                log::debug!("{:8.4}s  ball {} / ball {}", time, a.0, b.0)
            }
            ProcessedEvent::BodyWall { time, body, axis } => {
                log::debug!("{:8.4}s  ball {} / {:?} rail", time, body.0, axis)
            }
            ProcessedEvent::BodyObstacle {
                time,
                body,
                obstacle,
            } => log::debug!("{:8.4}s  ball {} / obstacle {}", time, body.0, obstacle.0),
            ProcessedEvent::Heartbeat { .. } => {}
        }
    }

    let stats = driver.stats();
    println!(
        "Settled at t={:.3}s after {} collisions ({} ball, {} rail), {} stale predictions skipped",
        driver.time(),
        collisions.len(),
        stats.body_body,
        stats.body_wall,
        stats.stale_discarded
    );

    let snapshot = Snapshot::capture(&driver);
    for disc in &snapshot.discs {
        println!(
            "  tag {:>3}  at ({:8.2}, {:8.2})",
            disc.tag, disc.center[0], disc.center[1]
        );
    }
}
