//! Playhead state — play/pause, loop mode, current time and duration override.
//!
//! The playhead does not touch events. [`Playhead::advance`] turns a time step
//! into the sequence of inclusive [`Span`]s the dispatcher has to walk,
//! splitting at the loop boundary as many times as the step requires.

use super::EPS;

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Paused,
    Playing,
}

/// Virtual playhead: current time, flags, and the explicit duration override.
#[derive(Debug, Clone, Default)]
pub struct Playhead {
    state: PlayState,
    looping: bool,
    current_time: f64,
    /// Non-positive means unset.
    duration: f64,
}

impl Playhead {
    /// Create a paused, non-looping playhead at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playback.
    pub fn play(&mut self) {
        self.state = PlayState::Playing;
    }

    /// Halt playback at the current time.
    pub fn pause(&mut self) {
        self.state = PlayState::Paused;
    }

    /// Current play state.
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Whether playback is running.
    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Enable or disable looping.
    pub fn set_loop(&mut self, enable: bool) {
        self.looping = enable;
    }

    /// Whether loop mode is on.
    pub fn is_loop(&self) -> bool {
        self.looping
    }

    /// Current time in seconds.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Set the current time as-is. No clamping.
    pub fn set_current_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Store an explicit duration. Non-positive values mean "unset".
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    /// The raw override as last set.
    pub fn duration_override(&self) -> f64 {
        self.duration
    }

    /// Resolve the timeline length: the override if positive, else the time of
    /// the last event, else zero.
    pub fn effective_duration(&self, last_event_time: Option<f64>) -> f64 {
        if self.duration > 0.0 {
            return self.duration;
        }
        last_event_time.unwrap_or(0.0)
    }

    /// Plan an advance of `delta` seconds over a timeline of length `duration`.
    pub fn advance(&self, delta: f64, duration: f64) -> Advance {
        Advance {
            local_prev: self.current_time,
            remaining: delta,
            duration,
            looping: self.looping,
            landing: None,
            done: false,
        }
    }
}

/// One inclusive interval to dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: f64,
    pub end: f64,
    /// The interval ends a lap: the cursor restarts at the sequence head afterwards.
    pub wraps: bool,
}

/// Lazily yields the spans of a single advance.
///
/// Once exhausted, [`Advance::landing`] holds the new playhead time, or `None`
/// if the playhead stays where it was.
#[derive(Debug, Clone)]
pub struct Advance {
    local_prev: f64,
    remaining: f64,
    duration: f64,
    looping: bool,
    landing: Option<f64>,
    done: bool,
}

impl Advance {
    /// Where the playhead lands after all spans have been walked.
    pub fn landing(&self) -> Option<f64> {
        self.landing
    }

    fn next_clamped(&mut self) -> Option<Span> {
        self.done = true;
        let next = self.local_prev + self.remaining;
        let end = next.min(self.duration);
        self.landing = Some(end);
        (end > self.local_prev - EPS).then_some(Span {
            start: self.local_prev,
            end,
            wraps: false,
        })
    }

    fn next_looped(&mut self) -> Option<Span> {
        if self.remaining <= EPS {
            self.done = true;
            return None;
        }

        let dur = self.duration;
        let start = self.local_prev;
        let local_end = start + self.remaining;

        if local_end < dur + EPS {
            self.remaining = 0.0;
            self.done = true;
            // Landing within EPS past the boundary still starts a new lap.
            let (landing, wraps) = if dur < EPS {
                (local_end, true)
            } else if local_end >= dur {
                (local_end % dur, true)
            } else {
                (local_end, false)
            };
            self.landing = Some(landing);
            return Some(Span {
                start,
                end: local_end,
                wraps,
            });
        }

        // Zero-length laps cannot be iterated.
        if dur < EPS {
            self.remaining = 0.0;
            self.done = true;
        } else {
            self.remaining = local_end - dur;
        }
        self.local_prev = 0.0;
        Some(Span {
            start,
            end: dur,
            wraps: true,
        })
    }
}

impl Iterator for Advance {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        if self.done {
            return None;
        }
        if self.looping {
            self.next_looped()
        } else {
            self.next_clamped()
        }
    }
}
