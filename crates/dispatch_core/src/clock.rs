//! Simulation time: a millisecond-scale timeline driven by a scheduled-event heap.
//!
//! All timestamps and `clock.now()` are in **simulation milliseconds**. The
//! timeline advances by popping the next scheduled event; events that share a
//! timestamp are ordered by `EventKind`, which encodes the within-tick phase
//! order (shift activation, then order release, then the dispatch pass, then
//! route completion).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};

/// One second in simulation milliseconds.
pub const ONE_SEC_MS: u64 = 1000;
/// One minute in simulation milliseconds.
pub const ONE_MIN_MS: u64 = 60 * ONE_SEC_MS;
/// One hour in simulation milliseconds.
pub const ONE_HOUR_MS: u64 = 60 * ONE_MIN_MS;

/// Declaration order doubles as the same-timestamp tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    SimulationStarted,
    ActivateCourier,
    ReleaseOrder,
    DispatchRun,
    CompleteRoute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject {
    Courier(Entity),
    Order(Entity),
}

/// Simulation event. `timestamp` is in **milliseconds** (simulation time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by timestamp; same timestamp ordered by kind for determinism.
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

/// Simulation clock: time in **milliseconds**, advances to the next scheduled event.
#[derive(Debug, Clone, Default, Resource)]
pub struct SimulationClock {
    /// Current simulation time in ms (updated when an event is popped).
    now: u64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    /// Current simulation time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Current simulation time in minutes (now / 60_000).
    pub fn now_mins(&self) -> u64 {
        self.now / ONE_MIN_MS
    }

    /// Schedule an event at a specific simulation timestamp (ms).
    pub fn schedule_at(&mut self, at_ms: u64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule(Event {
            timestamp: at_ms,
            kind,
            subject,
        });
    }

    /// Schedule an event at `now + delta_ms` (relative, in ms).
    pub fn schedule_in(&mut self, delta_ms: u64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule_at(self.now.saturating_add(delta_ms), kind, subject);
    }

    /// Schedule an event in **delta_mins** minutes from now.
    pub fn schedule_in_mins(
        &mut self,
        delta_mins: u64,
        kind: EventKind,
        subject: Option<EventSubject>,
    ) {
        self.schedule_in(delta_mins.saturating_mul(ONE_MIN_MS), kind, subject);
    }

    /// Schedule a full event (timestamp must be in ms, >= now).
    pub fn schedule(&mut self, event: Event) {
        debug_assert!(
            event.timestamp >= self.now,
            "event timestamp must be >= current time"
        );
        self.events.push(event);
    }

    /// Pop the next event (earliest timestamp; same-ms order by kind). Advances `now` to that timestamp.
    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    /// Timestamp of the next scheduled event without popping it.
    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|event| event.timestamp)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events still in the queue (for tests and scenario validation).
    pub fn pending_event_count(&self) -> usize {
        self.events.len()
    }
}
