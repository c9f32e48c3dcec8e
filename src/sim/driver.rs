//! Event-driven simulation driver
//!
//! Owns the bodies, obstacles and event queue. Each step pops the earliest
//! valid event, advances every body to its time, resolves it and re-predicts
//! only the bodies whose velocity changed.

use glam::DVec2;
use serde::Serialize;

use super::body::{Appearance, Body, BodyId};
use super::event::{Event, EventKind, EventQueue, Participant};
use super::geometry::{Axis, Obstacle, ObstacleId, Table};
use super::integrator::{advance, apply_friction};
use super::predict::{rect_contact, time_to_hit_body, time_to_hit_wall};
use super::resolve::{
    contact_face, resolve_body_body, resolve_body_obstacle_face, resolve_body_wall,
    separate_overlap,
};
use crate::settings::Settings;

/// Where the driver is in its predict/resolve cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriverPhase {
    /// Nothing predicted yet (fresh, or after a fixed step)
    Idle,
    /// Events pending
    Scheduled,
    /// Inside an event's resolution
    Resolving,
}

/// Notification handed to the game layer for each event acted upon
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ProcessedEvent {
    BodyBody { time: f64, a: BodyId, b: BodyId },
    BodyWall { time: f64, body: BodyId, axis: Axis },
    BodyObstacle {
        time: f64,
        body: BodyId,
        obstacle: ObstacleId,
    },
    /// Redraw tick; `moving` bodies still in motion afterwards
    Heartbeat { time: f64, moving: usize },
}

impl ProcessedEvent {
    pub fn time(&self) -> f64 {
        match *self {
            ProcessedEvent::BodyBody { time, .. }
            | ProcessedEvent::BodyWall { time, .. }
            | ProcessedEvent::BodyObstacle { time, .. }
            | ProcessedEvent::Heartbeat { time, .. } => time,
        }
    }

    pub fn is_collision(&self) -> bool {
        !matches!(self, ProcessedEvent::Heartbeat { .. })
    }

    /// Whether `id` took part in this event
    pub fn involves(&self, id: BodyId) -> bool {
        match *self {
            ProcessedEvent::BodyBody { a, b, .. } => a == id || b == id,
            ProcessedEvent::BodyWall { body, .. } | ProcessedEvent::BodyObstacle { body, .. } => {
                body == id
            }
            ProcessedEvent::Heartbeat { .. } => false,
        }
    }
}

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    pub events_processed: u64,
    pub stale_discarded: u64,
    pub body_body: u64,
    pub body_wall: u64,
    pub body_obstacle: u64,
    pub heartbeats: u64,
    pub fixed_steps: u64,
}

/// The simulation core
#[derive(Debug)]
pub struct Driver {
    settings: Settings,
    table: Table,
    /// Sorted by id
    bodies: Vec<Body>,
    /// Sorted by id
    obstacles: Vec<Obstacle>,
    queue: EventQueue,
    time: f64,
    /// When friction was last applied
    last_friction: f64,
    phase: DriverPhase,
    stats: DriverStats,
    next_body_id: u32,
    next_obstacle_id: u32,
}

impl Driver {
    /// Create a driver over `bodies`. Panics on invalid settings or
    /// duplicate body ids.
    pub fn new(settings: Settings, mut bodies: Vec<Body>) -> Self {
        if let Err(e) = settings.validate() {
            panic!("invalid physics settings: {}", e);
        }

        bodies.sort_by_key(|b| b.id());
        for pair in bodies.windows(2) {
            assert!(
                pair[0].id() != pair[1].id(),
                "duplicate body id {:?}",
                pair[0].id()
            );
        }
        let next_body_id = bodies.last().map(|b| b.id().0 + 1).unwrap_or(0);

        Self {
            table: settings.table(),
            settings,
            bodies,
            obstacles: Vec::new(),
            queue: EventQueue::new(),
            time: 0.0,
            last_friction: 0.0,
            phase: DriverPhase::Idle,
            stats: DriverStats::default(),
            next_body_id,
            next_obstacle_id: 0,
        }
    }

    // === Queries ===

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.body_index(id).map(|i| &self.bodies[i])
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn obstacle(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacle_index(id).map(|i| &self.obstacles[i])
    }

    /// Current simulation time (seconds)
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    /// Queued events, stale ones included
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> DriverStats {
        DriverStats {
            stale_discarded: self.queue.stale_discarded(),
            ..self.stats
        }
    }

    /// True once every body is at rest
    pub fn all_stopped(&self) -> bool {
        self.bodies.iter().all(|b| !b.is_moving())
    }

    fn body_index(&self, id: BodyId) -> Option<usize> {
        self.bodies.binary_search_by_key(&id, |b| b.id()).ok()
    }

    fn obstacle_index(&self, id: ObstacleId) -> Option<usize> {
        self.obstacles.binary_search_by_key(&id, |o| o.id).ok()
    }

    // === Scheduling ===

    /// Seed predictions for every body plus a heartbeat at the current time
    pub fn start(&mut self) {
        self.queue.clear();
        let all: Vec<usize> = (0..self.bodies.len()).collect();
        self.predict(&all);
        self.queue.push(Event::heartbeat(self.time));
        self.last_friction = self.time;
        self.phase = DriverPhase::Scheduled;
        log::info!(
            "Driver started at t={:.4} with {} bodies, {} obstacles, {} events",
            self.time,
            self.bodies.len(),
            self.obstacles.len(),
            self.queue.len()
        );
    }

    fn ensure_started(&mut self) {
        if self.phase == DriverPhase::Idle {
            self.start();
        }
    }

    /// Queue future contacts for the bodies at `changed` (indices into
    /// `bodies`). A pair where both sides changed is predicted once.
    fn predict(&mut self, changed: &[usize]) {
        let mut changed = changed.to_vec();
        changed.sort_unstable();
        changed.dedup();

        let now = self.time;
        let before = self.queue.len();
        for &i in &changed {
            let body = &self.bodies[i];
            let stamp = (body.id(), body.version());

            for axis in Axis::BOTH {
                if let Some(dt) = time_to_hit_wall(body, axis, self.table.half_extent(axis)) {
                    self.queue.push(Event::body_wall(now + dt, stamp, axis));
                }
            }

            for rect in &self.obstacles {
                if let Some((dt, face)) = rect_contact(body, rect) {
                    self.queue.push(Event::body_obstacle(
                        now + dt,
                        stamp,
                        (rect.id, rect.version()),
                        face,
                    ));
                }
            }

            for (j, other) in self.bodies.iter().enumerate() {
                if j == i || (j < i && changed.binary_search(&j).is_ok()) {
                    continue;
                }
                if let Some(dt) = time_to_hit_body(body, other) {
                    self.queue.push(Event::body_body(
                        now + dt,
                        stamp,
                        (other.id(), other.version()),
                    ));
                }
            }
        }
        log::trace!(
            "Predicted {} events for {} bodies",
            self.queue.len() - before,
            changed.len()
        );
    }

    /// Re-predict every body against one obstacle
    fn predict_obstacle(&mut self, k: usize) {
        let rect = &self.obstacles[k];
        for body in &self.bodies {
            if let Some((dt, face)) = rect_contact(body, rect) {
                self.queue.push(Event::body_obstacle(
                    self.time + dt,
                    (body.id(), body.version()),
                    (rect.id, rect.version()),
                    face,
                ));
            }
        }
    }

    fn version_of(bodies: &[Body], obstacles: &[Obstacle], p: Participant) -> Option<u64> {
        match p {
            Participant::Body(id) => bodies
                .binary_search_by_key(&id, |b| b.id())
                .ok()
                .map(|i| bodies[i].version()),
            Participant::Obstacle(id) => obstacles
                .binary_search_by_key(&id, |o| o.id)
                .ok()
                .map(|i| obstacles[i].version()),
        }
    }

    // === Event processing ===

    /// Process the next valid event, whenever it is
    pub fn step(&mut self) -> Option<ProcessedEvent> {
        self.step_before(f64::INFINITY)
    }

    /// Process the next valid event if it is due no later than `limit`
    fn step_before(&mut self, limit: f64) -> Option<ProcessedEvent> {
        self.ensure_started();

        let bodies = &self.bodies;
        let obstacles = &self.obstacles;
        let event = self
            .queue
            .pop_valid_before(limit, |p| Self::version_of(bodies, obstacles, p))?;

        self.phase = DriverPhase::Resolving;
        self.sync_to(event.time);
        let processed = self.resolve(event.kind);
        self.phase = DriverPhase::Scheduled;
        self.stats.events_processed += 1;
        Some(processed)
    }

    /// Straight-line advance of every body to `time`
    fn sync_to(&mut self, time: f64) {
        let dt = (time - self.time).max(0.0);
        if dt > 0.0 {
            for body in &mut self.bodies {
                advance(body, dt);
            }
        }
        self.time = self.time.max(time);
    }

    fn resolve(&mut self, kind: EventKind) -> ProcessedEvent {
        let time = self.time;
        match kind {
            EventKind::BodyBody { a, b } => {
                // Both ids were just validated against the live set
                if let (Some(i), Some(j)) = (self.body_index(a), self.body_index(b)) {
                    let (ba, bb) = pair_mut(&mut self.bodies, i, j);
                    if resolve_body_body(ba, bb, self.settings.ball_restitution) {
                        self.predict(&[i, j]);
                    }
                    log::debug!("t={:.4} {:?} hit {:?}", time, a, b);
                }
                self.stats.body_body += 1;
                ProcessedEvent::BodyBody { time, a, b }
            }
            EventKind::BodyWall { body, axis } => {
                if let Some(i) = self.body_index(body) {
                    resolve_body_wall(
                        &mut self.bodies[i],
                        axis,
                        &self.table,
                        self.settings.rail_restitution,
                    );
                    self.predict(&[i]);
                    log::debug!("t={:.4} {:?} hit {:?} rail", time, body, axis);
                }
                self.stats.body_wall += 1;
                ProcessedEvent::BodyWall { time, body, axis }
            }
            EventKind::BodyObstacle {
                body,
                obstacle,
                face,
            } => {
                if let (Some(i), Some(k)) = (self.body_index(body), self.obstacle_index(obstacle)) {
                    if bounce_off_obstacle(
                        &mut self.bodies[i],
                        &self.obstacles[k],
                        face,
                        &self.table,
                        self.settings.rail_restitution,
                    ) {
                        self.predict(&[i]);
                    }
                    log::debug!("t={:.4} {:?} hit {:?}", time, body, obstacle);
                }
                self.stats.body_obstacle += 1;
                ProcessedEvent::BodyObstacle {
                    time,
                    body,
                    obstacle,
                }
            }
            EventKind::Heartbeat => {
                let slowed = self.settle_friction();
                self.predict(&slowed);
                self.queue
                    .push(Event::heartbeat(time + self.settings.heartbeat_period()));

                self.stats.heartbeats += 1;
                let moving = self.bodies.iter().filter(|b| b.is_moving()).count();
                ProcessedEvent::Heartbeat { time, moving }
            }
        }
    }

    /// Charge friction for the time since it was last applied
    ///
    /// Returns the indices of bodies whose velocity changed. Runs at every
    /// heartbeat and before any external write, so a body given a new
    /// velocity mid-interval is only slowed for the time it actually moved.
    fn settle_friction(&mut self) -> Vec<usize> {
        let elapsed = self.time - self.last_friction;
        self.last_friction = self.time;

        let mut slowed = Vec::new();
        for (i, body) in self.bodies.iter_mut().enumerate() {
            if apply_friction(body, elapsed, &self.settings) {
                slowed.push(i);
            }
        }
        slowed
    }

    /// Settle friction ahead of an external write
    fn before_write(&mut self) {
        let slowed = self.settle_friction();
        if self.phase != DriverPhase::Idle {
            self.predict(&slowed);
        }
    }

    /// Process every event due at or before `t`, then advance to `t`
    pub fn run_until(&mut self, t: f64) -> Vec<ProcessedEvent> {
        let mut processed = Vec::new();
        while let Some(event) = self.step_before(t) {
            processed.push(event);
        }
        self.sync_to(t);
        processed
    }

    /// Process events up to and including the next heartbeat
    ///
    /// The returned list ends with that heartbeat. Bodies are then in the
    /// state a renderer should draw for this frame.
    pub fn next_frame(&mut self) -> Vec<ProcessedEvent> {
        let mut processed = Vec::new();
        while let Some(event) = self.step() {
            let done = matches!(event, ProcessedEvent::Heartbeat { .. });
            processed.push(event);
            if done {
                break;
            }
        }
        processed
    }

    /// Run frames until every body is at rest or `max_time` is reached.
    /// Returns every collision processed along the way.
    pub fn run_until_stopped(&mut self, max_time: f64) -> Vec<ProcessedEvent> {
        let mut collisions = Vec::new();
        while self.time < max_time {
            let frame = self.next_frame();
            if frame.is_empty() {
                break;
            }
            collisions.extend(frame.into_iter().filter(|e| e.is_collision()));
            if self.all_stopped() {
                break;
            }
        }
        collisions
    }

    // === External writes ===

    /// Give a body a new velocity, capped at the maximum cue speed
    pub fn strike(&mut self, id: BodyId, velocity: DVec2) -> bool {
        let Some(i) = self.body_index(id) else {
            log::warn!("strike: unknown body {:?}", id);
            return false;
        };
        let max = self.settings.max_cue_speed;
        let velocity = if velocity.length() > max {
            velocity.normalize() * max
        } else {
            velocity
        };
        self.before_write();
        self.bodies[i].set_velocity(velocity);
        self.after_write(i);
        true
    }

    /// Cue shot: `angle` in radians, `power` as a percentage of the maximum
    /// cue speed (clamped to 0..=100)
    pub fn shoot(&mut self, id: BodyId, angle: f64, power: f64) -> bool {
        let speed = power.clamp(0.0, 100.0) / 100.0 * self.settings.max_cue_speed;
        self.strike(id, crate::direction(angle) * speed)
    }

    /// Re-spot a body (e.g. after a scratch)
    pub fn reset_body(&mut self, id: BodyId, pos: DVec2, vel: DVec2) -> bool {
        let Some(i) = self.body_index(id) else {
            log::warn!("reset_body: unknown body {:?}", id);
            return false;
        };
        let pos = self.table.clamp_disc(pos, self.bodies[i].radius());
        self.before_write();
        self.bodies[i].place(pos, vel);
        self.after_write(i);
        true
    }

    fn after_write(&mut self, i: usize) {
        if self.phase != DriverPhase::Idle {
            self.predict(&[i]);
        }
    }

    /// Add a ball with the default radius and mass
    pub fn spawn_ball(&mut self, pos: DVec2, vel: DVec2, appearance: Appearance) -> BodyId {
        let id = BodyId(self.next_body_id);
        let body = Body::new(
            id,
            pos,
            vel,
            self.settings.ball_radius,
            self.settings.ball_mass,
        )
        .with_appearance(appearance);
        self.add_body(body);
        id
    }

    /// Add an explicitly built body. Returns false if the id is taken.
    pub fn add_body(&mut self, body: Body) -> bool {
        let at = match self.bodies.binary_search_by_key(&body.id(), |b| b.id()) {
            Ok(_) => {
                log::warn!("add_body: id {:?} already present", body.id());
                return false;
            }
            Err(at) => at,
        };
        self.next_body_id = self.next_body_id.max(body.id().0 + 1);
        self.before_write();
        self.bodies.insert(at, body);
        self.after_write(at);
        true
    }

    /// Take a body off the table (e.g. pocketed). Its queued events go stale.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let Some(i) = self.body_index(id) else {
            log::warn!("remove_body: unknown body {:?}", id);
            return None;
        };
        log::debug!("Removed {:?} at t={:.4}", id, self.time);
        Some(self.bodies.remove(i))
    }

    pub fn add_obstacle(&mut self, center: DVec2, width: f64, height: f64) -> ObstacleId {
        let id = ObstacleId(self.next_obstacle_id);
        self.next_obstacle_id += 1;
        self.obstacles.push(Obstacle::new(id, center, width, height));
        if self.phase != DriverPhase::Idle {
            let k = self.obstacles.len() - 1;
            self.predict_obstacle(k);
        }
        id
    }

    /// Move an obstacle between steps
    ///
    /// Any body the obstacle now overlaps is pushed out of it at once.
    pub fn move_obstacle(&mut self, id: ObstacleId, center: DVec2) -> bool {
        let Some(k) = self.obstacle_index(id) else {
            log::warn!("move_obstacle: unknown obstacle {:?}", id);
            return false;
        };
        self.before_write();
        self.obstacles[k].set_center(center);

        let mut pushed = Vec::new();
        for (i, body) in self.bodies.iter_mut().enumerate() {
            let rect = &self.obstacles[k];
            let gaps = rect.gaps(body.pos());
            if gaps.x < body.radius() && gaps.y < body.radius() {
                let face = contact_face(body, rect);
                let e = self.settings.rail_restitution;
                bounce_off_obstacle(body, rect, face, &self.table, e);
                pushed.push(i);
            }
        }

        if self.phase != DriverPhase::Idle {
            self.predict(&pushed);
            self.predict_obstacle(k);
        }
        true
    }

    pub fn remove_obstacle(&mut self, id: ObstacleId) -> Option<Obstacle> {
        let Some(k) = self.obstacle_index(id) else {
            log::warn!("remove_obstacle: unknown obstacle {:?}", id);
            return None;
        };
        Some(self.obstacles.remove(k))
    }

    // === Fixed-step fallback ===

    /// Advance by a fixed `dt` with discrete overlap detection
    ///
    /// Coarse path for callers that cannot use events: friction, move, rail
    /// and obstacle bounces, then pairwise impulse plus overlap correction.
    /// The event queue is dropped; the next event-driven call reseeds it.
    pub fn step_fixed(&mut self, dt: f64) -> Vec<ProcessedEvent> {
        self.settle_friction();
        let mut processed = Vec::new();
        self.time += dt;
        let time = self.time;

        for body in &mut self.bodies {
            apply_friction(body, dt, &self.settings);
            advance(body, dt);

            for axis in Axis::BOTH {
                let limit = self.table.half_extent(axis) - body.radius();
                let p = axis.of(body.pos());
                let v = axis.of(body.vel());
                if (p > limit && v > 0.0) || (p < -limit && v < 0.0) {
                    resolve_body_wall(body, axis, &self.table, self.settings.rail_restitution);
                    processed.push(ProcessedEvent::BodyWall {
                        time,
                        body: body.id(),
                        axis,
                    });
                } else if p.abs() > limit {
                    body.pos = self.table.clamp_disc(body.pos, body.radius());
                }
            }

            for rect in &self.obstacles {
                let gaps = rect.gaps(body.pos());
                if gaps.x >= body.radius() || gaps.y >= body.radius() {
                    continue;
                }
                let face = contact_face(body, rect);
                let e = self.settings.rail_restitution;
                if bounce_off_obstacle(body, rect, face, &self.table, e) {
                    processed.push(ProcessedEvent::BodyObstacle {
                        time,
                        body: body.id(),
                        obstacle: rect.id,
                    });
                }
            }
        }

        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = pair_mut(&mut self.bodies, i, j);
                if a.distance_to(b) < a.radius() + b.radius() {
                    resolve_body_body(a, b, self.settings.ball_restitution);
                    separate_overlap(a, b);
                    processed.push(ProcessedEvent::BodyBody {
                        time,
                        a: a.id(),
                        b: b.id(),
                    });
                }
            }
        }

        for event in &processed {
            match event {
                ProcessedEvent::BodyBody { .. } => self.stats.body_body += 1,
                ProcessedEvent::BodyWall { .. } => self.stats.body_wall += 1,
                ProcessedEvent::BodyObstacle { .. } => self.stats.body_obstacle += 1,
                ProcessedEvent::Heartbeat { .. } => {}
            }
        }
        self.stats.fixed_steps += 1;
        self.last_friction = time;
        self.queue.clear();
        self.phase = DriverPhase::Idle;
        processed
    }
}

/// Obstacle bounce that never leaves the disc past a rail
///
/// A push-out toward the table edge is clamped back inside the rails within
/// the same version bump.
fn bounce_off_obstacle(
    body: &mut Body,
    rect: &Obstacle,
    face: Axis,
    table: &Table,
    restitution: f64,
) -> bool {
    let changed = resolve_body_obstacle_face(body, rect, face, restitution);
    if changed {
        body.pos = table.clamp_disc(body.pos, body.radius());
    }
    changed
}

/// Two distinct mutable bodies out of one slice
fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    assert!(i != j, "pair_mut needs two distinct indices");
    if i < j {
        let (lo, hi) = bodies.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = bodies.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disc(id: u32, x: f64, y: f64, vx: f64, vy: f64, r: f64) -> Body {
        Body::new(BodyId(id), DVec2::new(x, y), DVec2::new(vx, vy), r, 1.0)
    }

    fn elastic_box(half_width: f64, half_height: f64) -> Settings {
        Settings {
            table_half_width: half_width,
            table_half_height: half_height,
            ..Settings::elastic()
        }
    }

    #[test]
    fn test_head_on_exchange_at_1_8s() {
        let bodies = vec![
            disc(0, -10.0, 0.0, 5.0, 0.0, 1.0),
            disc(1, 10.0, 0.0, -5.0, 0.0, 1.0),
        ];
        let mut driver = Driver::new(elastic_box(100.0, 100.0), bodies);
        assert_eq!(driver.phase(), DriverPhase::Idle);

        let events = driver.run_until(2.0);
        assert_eq!(driver.phase(), DriverPhase::Scheduled);

        let hit = events
            .iter()
            .find(|e| matches!(e, ProcessedEvent::BodyBody { .. }))
            .expect("the pair must collide");
        assert!((hit.time() - 1.8).abs() < 1e-9);

        let a = driver.body(BodyId(0)).unwrap();
        let b = driver.body(BodyId(1)).unwrap();
        assert!((a.vel() - DVec2::new(-5.0, 0.0)).length() < 1e-9);
        assert!((b.vel() - DVec2::new(5.0, 0.0)).length() < 1e-9);
        // Bounced back for 0.2 s from the contact points at x = -1 and x = 1
        assert!((a.pos().x + 2.0).abs() < 1e-9);
        assert!((b.pos().x - 2.0).abs() < 1e-9);
        assert!((driver.time() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_touching_wall_resolves_once() {
        let bodies = vec![disc(0, 95.0, 0.0, 10.0, 0.0, 5.0)];
        let mut driver = Driver::new(elastic_box(100.0, 100.0), bodies);

        let events = driver.run_until(1.0);
        let wall_hits: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, ProcessedEvent::BodyWall { .. }))
            .collect();
        assert_eq!(wall_hits.len(), 1);
        assert_eq!(wall_hits[0].time(), 0.0);

        let b = driver.body(BodyId(0)).unwrap();
        assert_eq!(b.vel(), DVec2::new(-10.0, 0.0));
        assert!((b.pos().x - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_rail_bounce_round_trip() {
        // Crosses 190 px at 100 px/s to the far rail and back in 3.8 s
        let bodies = vec![disc(0, 0.0, 0.0, 100.0, 0.0, 5.0)];
        let mut driver = Driver::new(elastic_box(100.0, 50.0), bodies);

        let events = driver.run_until(3.0);
        let times: Vec<f64> = events
            .iter()
            .filter(|e| e.is_collision())
            .map(|e| e.time())
            .collect();
        assert_eq!(times.len(), 2);
        assert!((times[0] - 0.95).abs() < 1e-9);
        assert!((times[1] - 2.85).abs() < 1e-9);
    }

    #[test]
    fn test_events_are_in_time_order() {
        let bodies = vec![
            disc(0, -50.0, 10.0, 80.0, 15.0, 5.0),
            disc(1, 40.0, -5.0, -60.0, 30.0, 5.0),
            disc(2, 0.0, 30.0, 10.0, -70.0, 5.0),
            disc(3, 60.0, 40.0, -20.0, -20.0, 5.0),
        ];
        let mut driver = Driver::new(elastic_box(100.0, 60.0), bodies);
        let events = driver.run_until(10.0);

        assert!(events.len() > 10);
        for pair in events.windows(2) {
            assert!(pair[0].time() <= pair[1].time());
        }
        // Nobody escapes the table
        for b in driver.bodies() {
            assert!(driver.table().contains_disc(b.pos(), b.radius() - 1e-6));
        }
    }

    #[test]
    fn test_elastic_gas_conserves_energy() {
        let bodies = vec![
            disc(0, -50.0, 10.0, 80.0, 15.0, 5.0),
            disc(1, 40.0, -5.0, -60.0, 30.0, 5.0),
            disc(2, 0.0, 30.0, 10.0, -70.0, 5.0),
        ];
        let mut driver = Driver::new(elastic_box(100.0, 60.0), bodies);
        let ke = |d: &Driver| d.bodies().iter().map(|b| b.kinetic_energy()).sum::<f64>();
        let before = ke(&driver);
        driver.run_until(20.0);
        assert!((ke(&driver) - before).abs() < 1e-6 * before);
    }

    #[test]
    fn test_heartbeat_keeps_queue_alive() {
        let mut driver = Driver::new(Settings::default(), Vec::new());
        let frame = driver.next_frame();
        assert_eq!(frame.len(), 1);
        assert!(matches!(frame[0], ProcessedEvent::Heartbeat { time, moving: 0 } if time == 0.0));

        let frame = driver.next_frame();
        assert!((frame[0].time() - 1.0 / 60.0).abs() < 1e-12);
        assert_eq!(driver.pending_events(), 1);
        assert_eq!(driver.stats().heartbeats, 2);
    }

    #[test]
    fn test_friction_brings_everything_to_rest() {
        let settings = Settings::default();
        let mut driver = Driver::new(settings, Vec::new());
        let cue = driver.spawn_ball(DVec2::new(-200.0, 0.0), DVec2::ZERO, Appearance::Cue);
        driver.spawn_ball(DVec2::new(100.0, 5.0), DVec2::ZERO, Appearance::for_number(1));

        assert!(driver.strike(cue, DVec2::new(150.0, 0.0)));
        let collisions = driver.run_until_stopped(60.0);

        assert!(driver.all_stopped());
        assert!(
            collisions
                .iter()
                .any(|e| matches!(e, ProcessedEvent::BodyBody { .. }))
        );
        for b in driver.bodies() {
            assert!(driver.table().contains_disc(b.pos(), b.radius() - 1e-6));
        }
    }

    #[test]
    fn test_stale_events_are_counted() {
        // The rail prediction for body 0 goes stale once it hits body 1
        let bodies = vec![
            disc(0, -50.0, 0.0, 10.0, 0.0, 5.0),
            disc(1, 0.0, 0.0, 0.0, 0.0, 5.0),
        ];
        let mut driver = Driver::new(elastic_box(100.0, 50.0), bodies);
        driver.run_until(20.0);
        assert!(driver.stats().stale_discarded >= 1);
        assert!(driver.stats().body_body >= 1);
    }

    #[test]
    fn test_strike_is_capped() {
        let mut driver = Driver::new(Settings::default(), Vec::new());
        let id = driver.spawn_ball(DVec2::ZERO, DVec2::ZERO, Appearance::Cue);
        driver.strike(id, DVec2::new(1.0e6, 0.0));
        let max = driver.settings().max_cue_speed;
        assert!((driver.body(id).unwrap().speed() - max).abs() < 1e-9);
        assert!(!driver.strike(BodyId(99), DVec2::X));
    }

    #[test]
    fn test_shoot_power_percentage() {
        let mut driver = Driver::new(Settings::default(), Vec::new());
        let id = driver.spawn_ball(DVec2::ZERO, DVec2::ZERO, Appearance::Cue);
        driver.shoot(id, std::f64::consts::FRAC_PI_2, 50.0);
        let v = driver.body(id).unwrap().vel();
        let half = driver.settings().max_cue_speed / 2.0;
        assert!(v.x.abs() < 1e-9);
        assert!((v.y - half).abs() < 1e-9);
    }

    #[test]
    fn test_removed_body_events_go_stale() {
        let bodies = vec![
            disc(0, -10.0, 0.0, 5.0, 0.0, 1.0),
            disc(1, 10.0, 0.0, -5.0, 0.0, 1.0),
        ];
        let mut driver = Driver::new(elastic_box(100.0, 100.0), bodies);
        driver.start();
        let gone = driver.remove_body(BodyId(1)).unwrap();
        assert_eq!(gone.id(), BodyId(1));

        let events = driver.run_until(3.0);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, ProcessedEvent::BodyBody { .. }))
        );
        assert!(driver.body(BodyId(1)).is_none());
    }

    #[test]
    fn test_reset_body_reschedules() {
        let bodies = vec![disc(0, 0.0, 0.0, 0.0, 0.0, 5.0)];
        let mut driver = Driver::new(elastic_box(100.0, 50.0), bodies);
        driver.start();
        assert!(driver.reset_body(BodyId(0), DVec2::new(50.0, 0.0), DVec2::new(10.0, 0.0)));

        let events = driver.run_until(5.0);
        let hit = events.iter().find(|e| e.is_collision()).unwrap();
        assert!((hit.time() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_paddle_bounce() {
        let bodies = vec![disc(0, 0.0, 0.0, 10.0, 0.0, 5.0)];
        let mut driver = Driver::new(elastic_box(100.0, 100.0), bodies);
        let paddle = driver.add_obstacle(DVec2::new(50.0, 0.0), 20.0, 120.0);

        let events = driver.run_until(4.0);
        let hit = events
            .iter()
            .find(|e| matches!(e, ProcessedEvent::BodyObstacle { .. }))
            .unwrap();
        assert!((hit.time() - 3.5).abs() < 1e-9);
        assert!(hit.involves(BodyId(0)));
        assert_eq!(driver.body(BodyId(0)).unwrap().vel(), DVec2::new(-10.0, 0.0));
        assert!(driver.obstacle(paddle).is_some());
    }

    #[test]
    fn test_moved_paddle_invalidates_prediction() {
        let bodies = vec![disc(0, 0.0, 0.0, 10.0, 0.0, 5.0)];
        let mut driver = Driver::new(elastic_box(100.0, 100.0), bodies);
        let paddle = driver.add_obstacle(DVec2::new(50.0, 0.0), 20.0, 20.0);
        driver.run_until(1.0);

        // Slide the paddle out of the ball's path; the rail is then reached at t=9.5
        assert!(driver.move_obstacle(paddle, DVec2::new(50.0, 80.0)));
        let events = driver.run_until(10.0);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, ProcessedEvent::BodyObstacle { .. }))
        );
        assert!(
            events
                .iter()
                .any(|e| matches!(e, ProcessedEvent::BodyWall { axis: Axis::X, .. }))
        );
    }

    #[test]
    fn test_paddle_moved_onto_ball_pushes_it_out() {
        let bodies = vec![disc(0, 0.0, 0.0, 0.0, 0.0, 5.0)];
        let mut driver = Driver::new(elastic_box(100.0, 100.0), bodies);
        let paddle = driver.add_obstacle(DVec2::new(50.0, 0.0), 20.0, 20.0);
        driver.move_obstacle(paddle, DVec2::new(12.0, 0.0));

        let b = driver.body(BodyId(0)).unwrap();
        assert!((b.pos().x - -3.0).abs() < 1e-12);
    }

    #[test]
    fn test_paddle_push_out_stays_inside_rails() {
        // Pushing toward +x would put the center at 100, past the rail limit of 95
        let bodies = vec![disc(0, 90.0, 0.0, 0.0, 0.0, 5.0)];
        let mut driver = Driver::new(elastic_box(100.0, 100.0), bodies);
        let paddle = driver.add_obstacle(DVec2::new(0.0, 50.0), 20.0, 20.0);
        driver.start();
        driver.move_obstacle(paddle, DVec2::new(85.0, 0.0));

        let b = driver.body(BodyId(0)).unwrap();
        assert_eq!(b.pos(), DVec2::new(95.0, 0.0));
        assert!(driver.table().contains_disc(b.pos(), b.radius()));
    }

    #[test]
    fn test_fixed_step_push_out_stays_inside_rails() {
        let bodies = vec![disc(0, 90.0, 0.0, 0.0, 0.0, 5.0)];
        let mut driver = Driver::new(elastic_box(100.0, 100.0), bodies);
        driver.add_obstacle(DVec2::new(85.0, 0.0), 20.0, 20.0);

        let events = driver.step_fixed(1.0 / 60.0);
        assert_eq!(events.len(), 1);
        let b = driver.body(BodyId(0)).unwrap();
        assert!(driver.table().contains_disc(b.pos(), b.radius()));
    }

    #[test]
    fn test_corner_graze_bounces_off_top_face() {
        // Falls straight down along the padded left edge onto the top-left corner
        let bodies = vec![disc(0, -11.0, 40.0, 0.0, -10.0, 1.0)];
        let mut driver = Driver::new(elastic_box(100.0, 100.0), bodies);
        driver.add_obstacle(DVec2::ZERO, 20.0, 20.0);

        let events = driver.run_until(3.5);
        let hit = events
            .iter()
            .find(|e| matches!(e, ProcessedEvent::BodyObstacle { .. }))
            .unwrap();
        assert!((hit.time() - 2.9).abs() < 1e-9);

        let b = driver.body(BodyId(0)).unwrap();
        assert_eq!(b.vel(), DVec2::new(0.0, 10.0));
        assert!((b.pos().y - 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_strike_mid_interval_pays_only_its_own_friction() {
        let settings = Settings::default();
        let decel = settings.friction_deceleration();
        let mut driver = Driver::new(settings, Vec::new());
        let id = driver.spawn_ball(DVec2::ZERO, DVec2::ZERO, Appearance::Cue);

        // Heartbeat at t=0 is processed, the next one is due at 1/60
        driver.run_until(0.5 / 60.0);
        assert!(driver.strike(id, DVec2::new(100.0, 0.0)));
        driver.run_until(1.0 / 60.0);
        assert_eq!(driver.stats().heartbeats, 2);

        let drop = 100.0 - driver.body(id).unwrap().speed();
        assert!((drop - decel * (0.5 / 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_step_separates_overlap() {
        let bodies = vec![
            disc(0, -0.5, 0.0, 1.0, 0.0, 1.0),
            disc(1, 0.5, 0.0, -1.0, 0.0, 1.0),
        ];
        let mut driver = Driver::new(elastic_box(100.0, 100.0), bodies);
        driver.start();

        let events = driver.step_fixed(1.0e-6);
        assert_eq!(events.len(), 1);
        assert_eq!(driver.phase(), DriverPhase::Idle);
        assert_eq!(driver.pending_events(), 0);

        let a = driver.body(BodyId(0)).unwrap();
        let b = driver.body(BodyId(1)).unwrap();
        assert!((a.distance_to(b) - 2.0).abs() < 1e-9);
        assert!(a.vel().x < 0.0 && b.vel().x > 0.0);
    }

    #[test]
    fn test_fixed_step_bounces_off_rail() {
        let bodies = vec![disc(0, 94.0, 0.0, 100.0, 3.0, 5.0)];
        let settings = Settings {
            rail_restitution: 0.5,
            ..elastic_box(100.0, 100.0)
        };
        let mut driver = Driver::new(settings, bodies);
        let events = driver.step_fixed(0.1);

        assert_eq!(events.len(), 1);
        let b = driver.body(BodyId(0)).unwrap();
        assert_eq!(b.vel(), DVec2::new(-50.0, 3.0));
        assert_eq!(b.pos().x, 95.0);
    }

    #[test]
    #[should_panic(expected = "duplicate body id")]
    fn test_duplicate_ids_panic() {
        let bodies = vec![disc(3, 0.0, 0.0, 0.0, 0.0, 1.0), disc(3, 9.0, 0.0, 0.0, 0.0, 1.0)];
        Driver::new(Settings::default(), bodies);
    }

    #[test]
    fn test_spawned_ids_follow_existing() {
        let bodies = vec![disc(7, 0.0, 0.0, 0.0, 0.0, 1.0)];
        let mut driver = Driver::new(Settings::default(), bodies);
        let id = driver.spawn_ball(DVec2::new(50.0, 0.0), DVec2::ZERO, Appearance::Unmarked);
        assert_eq!(id, BodyId(8));
        assert!(!driver.add_body(disc(7, 1.0, 1.0, 0.0, 0.0, 1.0)));
    }
}
