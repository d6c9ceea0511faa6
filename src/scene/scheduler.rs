//! Time-ordered deferred event queue.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::num::NonZeroU64;

/// Identifier of a scheduled event. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(NonZeroU64);

impl EventId {
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

struct Pending<E> {
    due: f64,
    id: EventId,
    payload: E,
}

impl<E> PartialEq for Pending<E> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<E> Eq for Pending<E> {}

impl<E> PartialOrd for Pending<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Pending<E> {
    // Reversed so the max-heap pops the earliest event, then the lowest id.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Single-threaded scheduler firing payloads once simulated time reaches their due time.
pub struct EventScheduler<E> {
    now: f64,
    next_id: NonZeroU64,
    queue: BinaryHeap<Pending<E>>,
    live: HashSet<EventId>,
}

impl<E> Default for EventScheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventScheduler<E> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_id: NonZeroU64::MIN,
            queue: BinaryHeap::new(),
            live: HashSet::new(),
        }
    }

    /// Current scheduler time in seconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_pending(&self, id: EventId) -> bool {
        self.live.contains(&id)
    }

    /// Schedule `payload` to fire `delay` seconds from now. Negative delays fire on the next advance.
    pub fn post(&mut self, delay: f64, payload: E) -> EventId {
        let id = EventId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.queue.push(Pending {
            due: self.now + delay.max(0.0),
            id,
            payload,
        });
        self.live.insert(id);
        id
    }

    /// Cancel a pending event. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: EventId) -> bool {
        self.live.remove(&id)
    }

    /// Move time forward to `time` and return every live event due by then, in due order.
    pub fn advance_to(&mut self, time: f64) -> Vec<(EventId, E)> {
        if time > self.now {
            self.now = time;
        }
        let mut fired = Vec::new();
        while self.queue.peek().is_some_and(|p| p.due <= self.now) {
            let Some(pending) = self.queue.pop() else {
                break;
            };
            if self.live.remove(&pending.id) {
                fired.push((pending.id, pending.payload));
            }
        }
        fired
    }

    /// Move time forward by `delta` seconds.
    pub fn advance(&mut self, delta: f64) -> Vec<(EventId, E)> {
        self.advance_to(self.now + delta)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.live.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_fire_in_due_order() {
        let mut scheduler = EventScheduler::new();
        scheduler.post(2.0, "late");
        scheduler.post(1.0, "early");
        scheduler.post(1.0, "early-second");

        assert!(scheduler.advance(0.5).is_empty());
        let fired: Vec<_> = scheduler.advance(1.0).into_iter().map(|(_, e)| e).collect();
        assert_eq!(fired, vec!["early", "early-second"]);
        let fired: Vec<_> = scheduler.advance(1.0).into_iter().map(|(_, e)| e).collect();
        assert_eq!(fired, vec!["late"]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = EventScheduler::new();
        let id = scheduler.post(1.0, 7);
        assert!(scheduler.is_pending(id));
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.advance(5.0).is_empty());
    }

    #[test]
    fn test_ids_are_unique_and_nonzero() {
        let mut scheduler = EventScheduler::new();
        let a = scheduler.post(0.0, ());
        let b = scheduler.post(0.0, ());
        assert_ne!(a, b);
        assert!(a.get() > 0);
    }

    #[test]
    fn test_exact_due_time_fires() {
        let mut scheduler = EventScheduler::new();
        scheduler.advance_to(3.0);
        scheduler.post(2.0, ());
        assert_eq!(scheduler.advance_to(5.0).len(), 1);
    }
}
