//! Time-ordered contact events with lazy invalidation
//!
//! An event records the version of every participant at prediction time.
//! When any participant has been written since, the event is stale and is
//! dropped on pop instead of being searched for and removed eagerly.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use super::body::BodyId;
use super::geometry::{Axis, ObstacleId};

/// Something an event depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Participant {
    Body(BodyId),
    Obstacle(ObstacleId),
}

/// A participant together with its version when the event was predicted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub participant: Participant,
    pub version: u64,
}

/// What happens when an event fires
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Redraw/friction tick with no participants
    Heartbeat,
    BodyBody { a: BodyId, b: BodyId },
    BodyWall { body: BodyId, axis: Axis },
    /// `face` is the axis of the slab the disc was predicted to cross
    BodyObstacle {
        body: BodyId,
        obstacle: ObstacleId,
        face: Axis,
    },
}

/// A scheduled event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub time: f64,
    pub kind: EventKind,
    stamps: Vec<Stamp>,
}

impl Event {
    pub fn heartbeat(time: f64) -> Self {
        Self {
            time,
            kind: EventKind::Heartbeat,
            stamps: Vec::new(),
        }
    }

    pub fn body_body(time: f64, a: (BodyId, u64), b: (BodyId, u64)) -> Self {
        Self {
            time,
            kind: EventKind::BodyBody { a: a.0, b: b.0 },
            stamps: vec![
                Stamp {
                    participant: Participant::Body(a.0),
                    version: a.1,
                },
                Stamp {
                    participant: Participant::Body(b.0),
                    version: b.1,
                },
            ],
        }
    }

    pub fn body_wall(time: f64, body: (BodyId, u64), axis: Axis) -> Self {
        Self {
            time,
            kind: EventKind::BodyWall { body: body.0, axis },
            stamps: vec![Stamp {
                participant: Participant::Body(body.0),
                version: body.1,
            }],
        }
    }

    pub fn body_obstacle(
        time: f64,
        body: (BodyId, u64),
        obstacle: (ObstacleId, u64),
        face: Axis,
    ) -> Self {
        Self {
            time,
            kind: EventKind::BodyObstacle {
                body: body.0,
                obstacle: obstacle.0,
                face,
            },
            stamps: vec![
                Stamp {
                    participant: Participant::Body(body.0),
                    version: body.1,
                },
                Stamp {
                    participant: Participant::Obstacle(obstacle.0),
                    version: obstacle.1,
                },
            ],
        }
    }

    pub fn stamps(&self) -> &[Stamp] {
        &self.stamps
    }

    pub fn is_heartbeat(&self) -> bool {
        matches!(self.kind, EventKind::Heartbeat)
    }

    /// An event is valid while every participant still exists at the
    /// version it was predicted against. `current` looks up live versions.
    pub fn is_valid<F>(&self, current: F) -> bool
    where
        F: Fn(Participant) -> Option<u64>,
    {
        self.stamps
            .iter()
            .all(|s| current(s.participant) == Some(s.version))
    }
}

/// Heap entry. Ordered so the earliest time (then earliest insertion) pops first.
#[derive(Debug)]
struct Queued {
    seq: u64,
    event: Event,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .event
            .time
            .total_cmp(&self.event.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-priority queue of events
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Queued>,
    next_seq: u64,
    stale_discarded: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Queued { seq, event });
    }

    /// Earliest event, valid or not
    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|q| q.event)
    }

    /// Earliest event that is still valid; stale ones are dropped on the way
    pub fn pop_valid<F>(&mut self, current: F) -> Option<Event>
    where
        F: Fn(Participant) -> Option<u64>,
    {
        self.pop_valid_before(f64::INFINITY, current)
    }

    /// Like `pop_valid`, but leaves anything later than `limit` queued
    pub fn pop_valid_before<F>(&mut self, limit: f64, current: F) -> Option<Event>
    where
        F: Fn(Participant) -> Option<u64>,
    {
        while let Some(time) = self.peek_time() {
            if time > limit {
                return None;
            }
            let event = self.pop()?;
            if event.is_valid(&current) {
                return Some(event);
            }
            self.stale_discarded += 1;
            log::trace!("Discarded stale {:?} at t={:.6}", event.kind, event.time);
        }
        None
    }

    /// Time of the earliest queued event (possibly stale)
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|q| q.event.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Total stale events dropped by `pop_valid`
    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }
}
