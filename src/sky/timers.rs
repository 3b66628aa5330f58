//! Wall-clock timeouts owned by the sky layer
//!
//! Everything that fires "later" (the pick cooldown, particle cleanup, the
//! debounced resize) is registered here instead of being held by a closure,
//! so teardown can cancel all of it in one place.

use std::mem::discriminant;

use super::particles::BurstId;

/// What to do when a timeout fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerEvent {
    /// Picking becomes possible again
    InteractionCooldown,
    /// Remove a finished particle burst
    ParticleCleanup(BurstId),
    /// Apply a debounced viewport change
    Resize { width: f32, height: f32, pixel_ratio: f32 },
}

/// Insertion order, breaks ties between equal due times
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timeout {
    id: TimerId,
    due_ms: f64,
    event: TimerEvent,
}

/// Pending timeouts, fired in due order
#[derive(Debug, Default)]
pub struct Timers {
    next_id: u64,
    pending: Vec<Timeout>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `event` once `now_ms >= due_ms`
    pub fn schedule(&mut self, due_ms: f64, event: TimerEvent) {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Timeout { id, due_ms, event });
    }

    /// Like `schedule`, but any pending timeout of the same kind is dropped
    /// first (trailing-edge debounce).
    pub fn debounce(&mut self, due_ms: f64, event: TimerEvent) {
        let kind = discriminant(&event);
        self.pending.retain(|t| discriminant(&t.event) != kind);
        self.schedule(due_ms, event);
    }

    /// Remove and return every event due at `now_ms`, earliest first
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<TimerEvent> {
        let mut due: Vec<Timeout> = Vec::new();
        self.pending.retain(|t| {
            if t.due_ms <= now_ms {
                due.push(t.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.id.cmp(&b.id)));
        due.into_iter().map(|t| t.event).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Cancel everything
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
