//! Sorted event storage with cursor-based dispatch.
//!
//! Events are kept sorted by `(time, id)`. A cursor marks the first event at
//! or after the playhead, so `dispatch_in_range` only scans forward from it.
//! Insertion keeps the order with a binary search; events with an identical
//! `(time, id)` stay in insertion order.
//!
//! The store counts passes. A seek or a lap wrap starts a new pass, and an
//! event fires at most once per pass. Realigning the cursor after an insert
//! stays in the current pass, so events at the playhead that already fired
//! are stepped over while a newly added one at the same time still fires.

use tracing::trace;

use super::event::{Callback, Event};
use super::EPS;

/// Result of a single `dispatch_in_range` call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dispatch {
    /// Events consumed inside the interval (with or without a handler).
    pub fired: usize,
    /// Time of the event after which dispatch was halted, if it was.
    pub halted_at: Option<f64>,
}

/// Time-sorted events with a read cursor.
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
    cursor: usize,
    pass: u64,
}

impl EventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single event, maintaining sorted order.
    ///
    /// The cursor is not touched; call [`realign`](Self::realign) afterwards.
    pub fn insert(&mut self, event: Event) {
        let pos = self
            .events
            .partition_point(|e| e.order(&event).is_le());
        self.events.insert(pos, event);
    }

    /// Append a batch of events and sort once. Same order as inserting them
    /// one by one.
    pub fn insert_batch(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
        // Stable: appended duplicates land after the existing ones.
        self.events.sort_by(|a, b| a.order(b));
    }

    /// Point the cursor at the first event with `time >= current_time - EPS`,
    /// staying in the current pass.
    pub fn realign(&mut self, current_time: f64) {
        self.cursor = self
            .events
            .iter()
            .position(|e| e.time() >= current_time - EPS)
            .unwrap_or(self.events.len());
    }

    /// Start a new pass and point the cursor at the first event with
    /// `time >= current_time - EPS`.
    pub fn rebuild_index(&mut self, current_time: f64) {
        self.pass += 1;
        self.realign(current_time);
    }

    /// Start a new pass with the cursor at the head of the sequence.
    pub fn reset_cursor(&mut self) {
        self.pass += 1;
        self.cursor = 0;
    }

    /// Fire every event in `[start, end]` (both inclusive, within `EPS`).
    ///
    /// Events before `start`, and events that already fired in this pass, are
    /// skipped without firing. The first event past `end` is left unconsumed.
    /// After each fired event `should_halt` is polled; returning `true` stops
    /// the scan right there.
    pub fn dispatch_in_range(
        &mut self,
        start: f64,
        end: f64,
        global: &mut Option<Callback>,
        mut should_halt: impl FnMut() -> bool,
    ) -> Dispatch {
        let mut outcome = Dispatch::default();

        while let Some(event) = self.events.get_mut(self.cursor) {
            let time = event.time();
            if time < start - EPS {
                self.cursor += 1;
                continue;
            }
            if time > end + EPS {
                break;
            }
            if event.fired_in(self.pass) {
                self.cursor += 1;
                continue;
            }

            let handled = event.fire(self.pass, global.as_mut());
            trace!(time, id = %event.id(), handled, "fired event");
            self.cursor += 1;
            outcome.fired += 1;

            if should_halt() {
                outcome.halted_at = Some(time);
                break;
            }
        }
        outcome
    }

    /// Peek at the next unconsumed event without advancing the cursor.
    pub fn peek_next(&self) -> Option<&Event> {
        self.events.get(self.cursor)
    }

    /// Event at `index` in store order.
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// All events in store order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Time of the last event, which is the maximum since the store is sorted.
    pub fn last_time(&self) -> Option<f64> {
        self.events.last().map(Event::time)
    }

    /// Index of the next event to dispatch.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events at or after the cursor.
    pub fn remaining(&self) -> usize {
        self.events.len().saturating_sub(self.cursor)
    }

    /// Remove all events and start a new pass at the head.
    pub fn clear(&mut self) {
        self.events.clear();
        self.pass += 1;
        self.cursor = 0;
    }
}
