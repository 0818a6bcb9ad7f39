//! Simulation clock with a queue of pending events.
//!
//! Events are ordered by `(time, id)` where `id` grows with every scheduled event, so events
//! sharing a timestamp are delivered in the order they were scheduled and runs with the same seed
//! replay identically. Cancellation is lazy: cancelled ids are remembered and skipped when they
//! reach the head of the heap.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use log::trace;

use crate::core::common::EventId;
use crate::core::error::SimulationError;
use crate::core::events::{Event, EventData};

struct QueuedEvent {
    event: Event,
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so the earliest (time, id) must compare as the greatest.
        other
            .event
            .time
            .total_cmp(&self.event.time)
            .then(other.event.id.cmp(&self.event.id))
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.event.time == other.event.time && self.event.id == other.event.id
    }
}

impl Eq for QueuedEvent {}

#[derive(Default)]
pub struct EventQueue {
    clock: f64,
    next_id: EventId,
    heap: BinaryHeap<QueuedEvent>,
    pending: HashSet<EventId>,
    canceled: HashSet<EventId>,
    processed: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Default::default()
    }

    /// Current simulated time.
    pub fn now(&self) -> f64 {
        self.clock
    }

    /// Schedules `data` at absolute time `at_time` and returns the event id.
    pub fn schedule(&mut self, data: EventData, at_time: f64) -> Result<EventId, SimulationError> {
        if at_time < self.clock || at_time.is_nan() {
            return Err(SimulationError::InvalidSchedule {
                at: at_time,
                now: self.clock,
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        trace!("[{:.3}] scheduled event {} at {:.3}: {:?}", self.clock, id, at_time, data);
        self.heap.push(QueuedEvent {
            event: Event {
                id,
                time: at_time,
                data,
            },
        });
        self.pending.insert(id);
        Ok(id)
    }

    pub fn schedule_after(
        &mut self,
        data: EventData,
        delay: f64,
    ) -> Result<EventId, SimulationError> {
        self.schedule(data, self.clock + delay)
    }

    /// Cancels a pending event. Returns false if the event already fired or was cancelled.
    pub fn cancel(&mut self, event_id: EventId) -> bool {
        if self.pending.remove(&event_id) {
            self.canceled.insert(event_id);
            trace!("[{:.3}] canceled event {}", self.clock, event_id);
            return true;
        }
        false
    }

    /// Pops the earliest pending event and moves the clock to its time.
    pub fn advance(&mut self) -> Result<Event, SimulationError> {
        while let Some(QueuedEvent { event }) = self.heap.pop() {
            if self.canceled.remove(&event.id) {
                continue;
            }
            self.pending.remove(&event.id);
            debug_assert!(event.time >= self.clock, "clock moved backward");
            self.clock = event.time;
            self.processed += 1;
            return Ok(event);
        }
        Err(SimulationError::EmptyQueue)
    }

    /// Time of the earliest pending event, dropping cancelled events from the head.
    pub fn peek_time(&mut self) -> Option<f64> {
        while let Some(head) = self.heap.peek() {
            if !self.canceled.contains(&head.event.id) {
                return Some(head.event.time);
            }
            if let Some(QueuedEvent { event }) = self.heap.pop() {
                self.canceled.remove(&event.id);
            }
        }
        None
    }

    pub fn is_pending(&self, event_id: EventId) -> bool {
        self.pending.contains(&event_id)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of events delivered by `advance`.
    pub fn processed_count(&self) -> u64 {
        self.processed
    }
}
