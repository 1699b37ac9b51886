//! Playhead-driven event dispatch.
//!
//! A [`Timeline`] owns a sorted [`EventStore`], a [`Playhead`] and an optional
//! global callback. Each [`Timeline::update`] advances virtual time and fires,
//! in store order, every event whose time falls inside the elapsed interval.
//! In loop mode the interval is split at the loop boundary, and the cursor
//! restarts at the head of the sequence on every lap.
//!
//! Everything runs synchronously on the caller's thread. Callbacks that need
//! to modify the timeline go through a [`Remote`].

pub mod event;
pub mod playhead;
pub mod remote;
pub mod store;

pub use event::{Callback, Event, EventId};
pub use playhead::{Advance, PlayState, Playhead, Span};
pub use remote::{Command, Remote};
pub use store::{Dispatch, EventStore};

use tracing::debug;

/// Absolute tolerance, in seconds, for every boundary comparison.
pub const EPS: f64 = 1e-9;

/// A single independent timeline instance.
pub struct Timeline {
    store: EventStore,
    playhead: Playhead,
    global: Option<Callback>,
    remote: Remote,
}

impl Timeline {
    /// Create an empty, paused, non-looping timeline at time zero.
    pub fn new() -> Self {
        Self {
            store: EventStore::new(),
            playhead: Playhead::new(),
            global: None,
            remote: Remote::new(),
        }
    }

    /// A handle for queuing commands from inside callbacks.
    pub fn remote(&self) -> Remote {
        self.remote.clone()
    }

    /// Insert an event and recompute the cursor from the playhead. Allowed
    /// while playing.
    ///
    /// A new event at or after the playhead fires when the playhead reaches
    /// it. Events at the playhead that already fired are not fired again.
    pub fn add(&mut self, event: Event) {
        self.store.insert(event);
        self.store.realign(self.playhead.current_time());
    }

    /// Insert an event with no params and no dedicated callback.
    pub fn add_event(&mut self, time: f64, id: impl Into<EventId>) {
        self.add(Event::new(time, id));
    }

    /// Insert an event with params and no dedicated callback.
    pub fn add_event_with_params(
        &mut self,
        time: f64,
        id: impl Into<EventId>,
        params: Vec<f64>,
    ) {
        self.add(Event::new(time, id).with_params(params));
    }

    /// Insert an event with params and a dedicated callback.
    pub fn add_event_with_callback(
        &mut self,
        time: f64,
        id: impl Into<EventId>,
        params: Vec<f64>,
        callback: impl FnMut(EventId, &[f64]) + 'static,
    ) {
        self.add(
            Event::new(time, id)
                .with_params(params)
                .with_callback(callback),
        );
    }

    /// Insert a batch of events, sorting once. Equivalent to adding them one by one.
    pub fn add_batch(&mut self, events: impl IntoIterator<Item = Event>) {
        self.store.insert_batch(events);
        self.store.realign(self.playhead.current_time());
    }

    /// Number of stored events.
    pub fn count(&self) -> usize {
        self.store.len()
    }

    /// Number of stored events, same as [`count`](Self::count).
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the timeline has no events.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Event at `index` in store order.
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.store.get(index)
    }

    /// All events in store order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.store.iter()
    }

    /// The next event eligible for dispatch.
    pub fn peek_next(&self) -> Option<&Event> {
        self.store.peek_next()
    }

    /// Events at or after the cursor.
    pub fn remaining(&self) -> usize {
        self.store.remaining()
    }

    /// Index of the next event to dispatch.
    pub fn cursor(&self) -> usize {
        self.store.cursor()
    }

    /// Remove every event and reset time and cursor to zero.
    ///
    /// Play, loop, duration and the global callback are left as they are.
    pub fn clear(&mut self) {
        debug!(events = self.store.len(), "clearing timeline");
        self.store.clear();
        self.playhead.set_current_time(0.0);
    }

    /// Start or resume playback from the current time.
    pub fn play(&mut self) {
        self.playhead.play();
    }

    /// Halt playback, keeping the current time.
    pub fn pause(&mut self) {
        self.playhead.pause();
    }

    /// Pause and reset.
    pub fn stop(&mut self) {
        self.pause();
        self.reset();
    }

    /// Move the playhead to zero and rebuild the cursor.
    pub fn reset(&mut self) {
        self.set_current_time(0.0);
    }

    /// Enable or disable looping. Time is left as it is.
    pub fn set_loop(&mut self, enable: bool) {
        self.playhead.set_loop(enable);
    }

    /// Whether playback is running.
    pub fn is_playing(&self) -> bool {
        self.playhead.is_playing()
    }

    /// Whether loop mode is on.
    pub fn is_loop(&self) -> bool {
        self.playhead.is_loop()
    }

    /// Seek. The time is taken as-is (no clamping) and the cursor is rebuilt
    /// from scratch, so it may move backward.
    pub fn set_current_time(&mut self, time: f64) {
        debug!(time, "seek");
        self.playhead.set_current_time(time);
        self.store.rebuild_index(time);
    }

    /// Current playhead time in seconds.
    pub fn current_time(&self) -> f64 {
        self.playhead.current_time()
    }

    /// Override the timeline length. Non-positive values fall back to the
    /// time of the last event.
    pub fn set_duration(&mut self, duration: f64) {
        self.playhead.set_duration(duration);
    }

    /// Effective duration: the override if set, else the last event time, else zero.
    pub fn duration(&self) -> f64 {
        self.playhead.effective_duration(self.store.last_time())
    }

    /// The raw duration override as last set.
    pub fn duration_override(&self) -> f64 {
        self.playhead.duration_override()
    }

    /// Fallback handler for events without a dedicated callback.
    pub fn set_global_callback(&mut self, callback: impl FnMut(EventId, &[f64]) + 'static) {
        self.global = Some(Box::new(callback));
    }

    /// Remove the fallback handler.
    pub fn clear_global_callback(&mut self) {
        self.global = None;
    }

    /// Apply every command queued on the [`Remote`], in posting order.
    pub fn apply_pending(&mut self) {
        while let Some(command) = self.remote.take_next() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Add(event) => self.add(event),
            Command::Clear => self.clear(),
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::Stop => self.stop(),
            Command::Reset => self.reset(),
            Command::SetLoop(enable) => self.set_loop(enable),
            Command::Seek(time) => self.set_current_time(time),
            Command::SetDuration(duration) => self.set_duration(duration),
        }
    }

    /// Advance the playhead by `delta` seconds, firing every event due.
    ///
    /// No-op while paused, with an empty store, or for `delta <= 0`.
    pub fn update(&mut self, delta: f64) {
        self.apply_pending();

        if !self.playhead.is_playing() || self.store.is_empty() || delta <= 0.0 {
            return;
        }

        let prev = self.playhead.current_time();
        let dur = self.duration();

        if dur < 0.0 {
            debug!(dur, "negative duration, advancing without dispatch");
            self.playhead.set_current_time(prev + delta);
            return;
        }

        let mut advance = self.playhead.advance(delta, dur);
        let remote = self.remote.clone();
        for span in advance.by_ref() {
            let outcome =
                self.store
                    .dispatch_in_range(span.start, span.end, &mut self.global, || {
                        remote.interrupted()
                    });

            if let Some(time) = outcome.halted_at {
                debug!(time, "dispatch halted by callback");
                self.playhead.set_current_time(time);
                self.apply_pending();
                return;
            }

            if span.wraps {
                debug!(dur, "lap wrap");
                self.store.reset_cursor();
            }
        }

        if let Some(time) = advance.landing() {
            self.playhead.set_current_time(time);
        }
        self.apply_pending();
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// A timeline whose global callback records every fired id.
    fn recording_timeline() -> (Timeline, Rc<RefCell<Vec<i32>>>) {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        let mut tl = Timeline::new();
        tl.set_global_callback(move |id, _| sink.borrow_mut().push(id.0));
        (tl, fired)
    }

    #[test]
    fn creation() {
        let tl = Timeline::new();
        assert!(!tl.is_playing());
        assert!(!tl.is_loop());
        assert_eq!(tl.current_time(), 0.0);
        assert_eq!(tl.count(), 0);
        assert_eq!(tl.duration(), 0.0);
    }

    #[test]
    fn paused_update_is_noop() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(0.5, 1);
        tl.update(1.0);
        assert!(fired.borrow().is_empty());
        assert_eq!(tl.current_time(), 0.0);
    }

    #[test]
    fn empty_store_update_is_noop() {
        let (mut tl, _) = recording_timeline();
        tl.play();
        tl.update(1.0);
        assert_eq!(tl.current_time(), 0.0);
    }

    #[test]
    fn non_positive_delta_is_noop() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(0.0, 1);
        tl.play();
        tl.update(0.0);
        tl.update(-1.0);
        assert!(fired.borrow().is_empty());
        assert_eq!(tl.current_time(), 0.0);
    }

    #[test]
    fn event_on_interval_end_fires_once() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(1.0, 1);
        tl.add_event(2.0, 2);
        tl.play();

        tl.update(1.0);
        assert_eq!(*fired.borrow(), vec![1]);
        tl.update(0.5);
        assert_eq!(*fired.borrow(), vec![1]);
        assert_approx_eq!(tl.current_time(), 1.5);
    }

    #[test]
    fn adding_at_playhead_fires_new_events_only() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(1.0, 1);
        tl.add_event(5.0, 5);
        tl.play();
        tl.update(1.0);
        assert_eq!(*fired.borrow(), vec![1]);

        tl.add_event(1.0, 0);
        tl.add_event(1.0, 2);
        tl.add_event(1.5, 3);
        assert_eq!(tl.cursor(), 0);
        tl.update(1.0);
        assert_eq!(*fired.borrow(), vec![1, 0, 2, 3]);
    }

    #[test]
    fn event_added_at_playhead_before_a_fired_one_still_fires() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(1.0, 5);
        tl.add_event(3.0, 9);
        tl.play();
        tl.update(1.0);
        assert_eq!(*fired.borrow(), vec![5]);

        tl.add_event(1.0, 1);
        assert_eq!(tl.cursor(), 0);
        assert_eq!(tl.peek_next().map(Event::id), Some(EventId(1)));

        tl.update(0.5);
        assert_eq!(*fired.borrow(), vec![5, 1]);
    }

    #[test]
    fn batch_added_at_playhead_fires_on_next_update() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(1.0, 5);
        tl.play();
        tl.update(1.0);

        tl.add_batch(vec![Event::new(1.0, 2), Event::new(0.5, 0), Event::new(1.25, 7)]);
        tl.update(0.5);
        assert_eq!(*fired.borrow(), vec![5, 2, 7]);
    }

    #[test]
    fn adding_before_play_with_negative_times() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(-1.0, 1);
        tl.add_event(0.0, 2);
        tl.play();
        tl.update(0.5);
        assert_eq!(*fired.borrow(), vec![2]);
    }

    #[test]
    fn non_loop_clamps_at_duration() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(1.0, 1);
        tl.add_event(2.0, 2);
        tl.play();

        tl.update(10.0);
        assert_eq!(*fired.borrow(), vec![1, 2]);
        assert_eq!(tl.current_time(), 2.0);
        assert!(tl.is_playing(), "reaching the end does not auto-pause");

        tl.update(1.0);
        assert_eq!(*fired.borrow(), vec![1, 2]);
        assert_eq!(tl.current_time(), 2.0);
    }

    #[test]
    fn loop_fires_every_lap() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(0.5, 1);
        tl.set_duration(1.0);
        tl.set_loop(true);
        tl.play();

        tl.update(3.25);
        assert_eq!(*fired.borrow(), vec![1, 1, 1]);
        assert_approx_eq!(tl.current_time(), 0.25);
    }

    #[test]
    fn loop_landing_exactly_on_boundary_starts_next_lap() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(0.0, 0);
        tl.add_event(0.5, 1);
        tl.set_duration(1.0);
        tl.set_loop(true);
        tl.play();

        tl.update(1.0);
        assert_eq!(*fired.borrow(), vec![0, 1]);
        assert_eq!(tl.current_time(), 0.0);
        assert_eq!(tl.cursor(), 0);

        tl.update(0.6);
        assert_eq!(*fired.borrow(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn seek_rebuilds_cursor_backward() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(1.0, 1);
        tl.add_event(2.0, 2);
        tl.play();
        tl.update(2.0);
        assert_eq!(tl.remaining(), 0);

        tl.set_current_time(1.0);
        assert_eq!(tl.cursor(), 0);
        tl.set_current_time(1.0);
        assert_eq!(tl.cursor(), 0);

        tl.update(0.5);
        assert_eq!(*fired.borrow(), vec![1, 2, 1]);
    }

    #[test]
    fn negative_seek_is_accepted() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(0.0, 1);
        tl.set_current_time(-2.0);
        assert_eq!(tl.current_time(), -2.0);
        tl.play();
        tl.update(1.0);
        assert!(fired.borrow().is_empty());
        tl.update(1.0);
        assert_eq!(*fired.borrow(), vec![1]);
    }

    #[test]
    fn negative_duration_advances_without_dispatch() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(-3.0, 1);
        tl.set_current_time(-4.0);
        tl.play();
        assert_eq!(tl.duration(), -3.0);

        tl.update(2.0);
        assert!(fired.borrow().is_empty());
        assert_eq!(tl.current_time(), -2.0);
    }

    #[test]
    fn clear_resets_time_and_keeps_flags() {
        let (mut tl, _) = recording_timeline();
        tl.add_event(1.0, 1);
        tl.set_loop(true);
        tl.set_duration(5.0);
        tl.play();
        tl.update(0.5);

        tl.clear();
        assert_eq!(tl.count(), 0);
        assert_eq!(tl.current_time(), 0.0);
        assert_eq!(tl.cursor(), 0);
        assert!(tl.is_playing());
        assert!(tl.is_loop());
        assert_eq!(tl.duration(), 5.0);
    }

    #[test]
    fn stop_pauses_and_rewinds() {
        let (mut tl, _) = recording_timeline();
        tl.add_event(1.0, 1);
        tl.play();
        tl.update(1.5);

        tl.stop();
        assert!(!tl.is_playing());
        assert_eq!(tl.current_time(), 0.0);
        assert_eq!(tl.remaining(), 1);
    }

    #[test]
    fn set_loop_does_not_reset_time() {
        let (mut tl, _) = recording_timeline();
        tl.add_event(1.0, 1);
        tl.play();
        tl.update(0.5);
        tl.set_loop(true);
        assert_approx_eq!(tl.current_time(), 0.5);
    }

    #[test]
    fn duration_falls_back_to_last_event() {
        let mut tl = Timeline::new();
        tl.add_event(4.5, 200);
        tl.add_event(1.0, 100);
        assert_eq!(tl.duration(), 4.5);
        tl.set_duration(3.0);
        assert_eq!(tl.duration(), 3.0);
        assert_eq!(tl.duration_override(), 3.0);
        tl.set_duration(0.0);
        assert_eq!(tl.duration(), 4.5);
    }

    #[test]
    fn apply_pending_outside_update() {
        let mut tl = Timeline::new();
        let remote = tl.remote();
        remote.add(Event::new(1.0, 1));
        remote.post(Command::SetLoop(true));
        remote.post(Command::Play);
        assert_eq!(tl.count(), 0);

        tl.apply_pending();
        assert_eq!(tl.count(), 1);
        assert!(tl.is_loop());
        assert!(tl.is_playing());
        assert_eq!(remote.pending(), 0);
    }

    #[test]
    fn clear_global_callback_fires_into_the_void() {
        let (mut tl, fired) = recording_timeline();
        tl.add_event(0.5, 1);
        tl.clear_global_callback();
        tl.play();
        tl.update(1.0);
        assert!(fired.borrow().is_empty());
        assert_eq!(tl.remaining(), 0);
    }
}
