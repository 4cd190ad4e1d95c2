use std::collections::VecDeque;
use crate::core::{BodyHandle, ContactPoint};

/// What changed for a pair of bodies between two substeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEventType {
    /// The pair touches now and did not last substep
    Begin,

    /// The pair touched last substep and no longer does
    End,

    /// A trigger body started overlapping another body
    Trigger,
}

/// A change in contact state of a body pair, in slot order (`body_a` < `body_b`)
#[derive(Debug, Clone)]
pub struct CollisionEvent {
    pub event_type: CollisionEventType,
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,

    /// Contact points at the moment of the event; empty for `End`
    pub contacts: Vec<ContactPoint>,
}

impl CollisionEvent {
    pub fn involves_body(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == body
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEventType {
    Added,
    Removed,
    Sleep,
    Awake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyEvent {
    pub event_type: BodyEventType,
    pub body: BodyHandle,
}

/// Events kept per kind when the host never drains the queue
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Pushes to the back, dropping from the front once `capacity` is reached
fn push_bounded<T>(queue: &mut VecDeque<T>, item: T, capacity: usize) {
    if capacity == 0 {
        return;
    }
    while queue.len() >= capacity {
        queue.pop_front();
    }
    queue.push_back(item);
}

/// FIFO of events produced by registration and stepping, drained by the host.
///
/// Each kind of event is bounded by `capacity`; when full, the oldest
/// event of that kind is dropped to make room.
#[derive(Debug)]
pub struct EventQueue {
    collision_events: VecDeque<CollisionEvent>,
    body_events: VecDeque<BodyEvent>,
    capacity: usize,
    dropped: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            collision_events: VecDeque::new(),
            body_events: VecDeque::new(),
            capacity,
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the bound, dropping the oldest events that no longer fit
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        let excess = self.collision_events.len().saturating_sub(capacity);
        self.collision_events.drain(..excess);
        self.dropped += excess;
        let excess = self.body_events.len().saturating_sub(capacity);
        self.body_events.drain(..excess);
        self.dropped += excess;
    }

    /// Events discarded because the queue was full
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    pub fn add_collision_event(&mut self, event: CollisionEvent) {
        if self.collision_events.len() >= self.capacity {
            self.dropped += 1;
        }
        push_bounded(&mut self.collision_events, event, self.capacity);
    }

    pub fn add_body_event(&mut self, event_type: BodyEventType, body: BodyHandle) {
        if self.body_events.len() >= self.capacity {
            self.dropped += 1;
        }
        push_bounded(&mut self.body_events, BodyEvent { event_type, body }, self.capacity);
    }

    /// Pops the oldest collision event
    pub fn next_collision_event(&mut self) -> Option<CollisionEvent> {
        self.collision_events.pop_front()
    }

    /// Pops the oldest body event
    pub fn next_body_event(&mut self) -> Option<BodyEvent> {
        self.body_events.pop_front()
    }

    pub fn collision_events(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.collision_events.iter()
    }

    pub fn body_events(&self) -> impl Iterator<Item = &BodyEvent> {
        self.body_events.iter()
    }

    pub fn len(&self) -> usize {
        self.collision_events.len() + self.body_events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collision_events.is_empty() && self.body_events.is_empty()
    }

    pub fn clear(&mut self) {
        self.collision_events.clear();
        self.body_events.clear();
        self.dropped = 0;
    }

    /// Moves every queued event into a fresh queue with the same capacity, leaving this one empty
    pub fn take(&mut self) -> EventQueue {
        std::mem::replace(self, Self::with_capacity(self.capacity))
    }

    pub fn get_collision_events_of_type(
        &self,
        event_type: CollisionEventType,
    ) -> Vec<&CollisionEvent> {
        self.collision_events()
            .filter(|event| event.event_type == event_type)
            .collect()
    }

    /// Collision events in which `body` took part, on either side
    pub fn get_collision_events_for_body(&self, body: BodyHandle) -> Vec<&CollisionEvent> {
        self.collision_events()
            .filter(|event| event.involves_body(body))
            .collect()
    }

    pub fn get_body_events_of_type(&self, event_type: BodyEventType) -> Vec<&BodyEvent> {
        self.body_events()
            .filter(|event| event.event_type == event_type)
            .collect()
    }

    pub fn get_body_events_for_body(&self, body: BodyHandle) -> Vec<&BodyEvent> {
        self.body_events().filter(|event| event.body == body).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ArenaHandle;

    #[test]
    fn take_leaves_queue_empty() {
        let a = BodyHandle::from_parts(0, 0);
        let b = BodyHandle::from_parts(1, 0);
        let mut queue = EventQueue::new();
        queue.add_body_event(BodyEventType::Added, a);
        queue.add_collision_event(CollisionEvent {
            event_type: CollisionEventType::Begin,
            body_a: a,
            body_b: b,
            contacts: Vec::new(),
        });

        let mut taken = queue.take();
        assert!(queue.is_empty());
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.get_collision_events_for_body(b).len(), 1);
        assert_eq!(taken.next_body_event().map(|event| event.body), Some(a));
        assert!(taken.next_body_event().is_none());
        assert_eq!(queue.capacity(), DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn full_queue_drops_oldest_events() {
        let mut queue = EventQueue::with_capacity(3);
        for slot in 0..5 {
            queue.add_body_event(BodyEventType::Awake, BodyHandle::from_parts(slot, 0));
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dropped_count(), 2);
        let slots: Vec<BodyHandle> = queue.body_events().map(|event| event.body).collect();
        assert_eq!(slots[0], BodyHandle::from_parts(2, 0));
        assert_eq!(slots[2], BodyHandle::from_parts(4, 0));

        queue.set_capacity(1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dropped_count(), 4);
        let newest = queue.next_body_event().map(|event| event.body);
        assert_eq!(newest, Some(BodyHandle::from_parts(4, 0)));
    }
}
