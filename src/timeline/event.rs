//! Event data model — a timestamped trigger carrying an id and a numeric payload.
//!
//! An [`Event`] is immutable once built. It may carry a dedicated [`Callback`]
//! which takes precedence over the timeline's global handler when it fires.

use std::cmp::Ordering;
use std::fmt;

/// Caller-defined event identifier. Not required to be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EventId(pub i32);

impl From<i32> for EventId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A handler invoked synchronously when an event fires.
///
/// Receives the event's id and its parameter list.
pub type Callback = Box<dyn FnMut(EventId, &[f64])>;

/// A single event on the timeline.
pub struct Event {
    time: f64,
    id: EventId,
    params: Vec<f64>,
    callback: Option<Callback>,
    /// Store pass in which this event last fired.
    fired_in: Option<u64>,
}

impl Event {
    /// Create an event firing at `time` seconds with no params and no dedicated callback.
    pub fn new(time: f64, id: impl Into<EventId>) -> Self {
        Self {
            time,
            id: id.into(),
            params: Vec::new(),
            callback: None,
            fired_in: None,
        }
    }

    /// Attach a parameter payload.
    pub fn with_params(mut self, params: Vec<f64>) -> Self {
        self.params = params;
        self
    }

    /// Attach a dedicated callback that overrides the global handler.
    pub fn with_callback(mut self, callback: impl FnMut(EventId, &[f64]) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Firing time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Caller-defined identifier.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Numeric payload passed to the handler.
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Whether this event has a dedicated callback.
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Store order: time ascending, then id ascending.
    pub(crate) fn order(&self, other: &Event) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Whether this event already fired during store pass `pass`.
    pub(crate) fn fired_in(&self, pass: u64) -> bool {
        self.fired_in == Some(pass)
    }

    /// Invoke the dedicated callback, else `global`, else nothing, and mark
    /// the event as fired in `pass`.
    ///
    /// Returns `true` if a handler ran.
    pub(crate) fn fire(&mut self, pass: u64, global: Option<&mut Callback>) -> bool {
        self.fired_in = Some(pass);
        match (self.callback.as_mut(), global) {
            (Some(callback), _) => {
                callback(self.id, &self.params);
                true
            }
            (None, Some(global)) => {
                global(self.id, &self.params);
                true
            }
            (None, None) => false,
        }
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("time", &self.time)
            .field("id", &self.id)
            .field("params", &self.params)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
