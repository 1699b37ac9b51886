//! Deferred commands for callbacks that need to steer their own timeline.
//!
//! A callback runs while the [`Timeline`](super::Timeline) is mutably borrowed,
//! so it cannot call back into it. It can hold a [`Remote`] instead: commands
//! posted there are queued and applied by the timeline in posting order.
//!
//! Application points:
//! - at the start of every `update`, and when it returns;
//! - on [`Timeline::apply_pending`](super::Timeline::apply_pending).
//!
//! Interrupting commands ([`Command::interrupts`]) posted from a callback stop
//! dispatch right after that callback returns. Events added from a callback
//! are never dispatched by the `update` that fired it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::event::Event;

/// A deferred timeline operation.
#[derive(Debug)]
pub enum Command {
    /// Insert an event.
    Add(Event),
    /// Empty the store and reset time.
    Clear,
    Play,
    Pause,
    /// Pause and reset time.
    Stop,
    /// Reset time to zero.
    Reset,
    SetLoop(bool),
    /// Jump to a time in seconds.
    Seek(f64),
    SetDuration(f64),
}

impl Command {
    /// Whether this command halts an in-flight dispatch.
    pub fn interrupts(&self) -> bool {
        matches!(
            self,
            Command::Clear | Command::Pause | Command::Stop | Command::Reset | Command::Seek(_)
        )
    }
}

/// Cloneable, single-threaded handle queuing [`Command`]s for one timeline.
#[derive(Debug, Clone, Default)]
pub struct Remote {
    queue: Rc<RefCell<VecDeque<Command>>>,
}

impl Remote {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a command.
    pub fn post(&self, command: Command) {
        self.queue.borrow_mut().push_back(command);
    }

    /// Queue an event insertion.
    pub fn add(&self, event: Event) {
        self.post(Command::Add(event));
    }

    /// Queue [`Command::Clear`].
    pub fn clear(&self) {
        self.post(Command::Clear);
    }

    /// Queue [`Command::Pause`].
    pub fn pause(&self) {
        self.post(Command::Pause);
    }

    /// Queue [`Command::Stop`].
    pub fn stop(&self) {
        self.post(Command::Stop);
    }

    /// Queue [`Command::Seek`].
    pub fn seek(&self, time: f64) {
        self.post(Command::Seek(time));
    }

    /// Number of commands waiting to be applied.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Whether any queued command halts dispatch.
    pub(crate) fn interrupted(&self) -> bool {
        self.queue.borrow().iter().any(Command::interrupts)
    }

    pub(crate) fn take_next(&self) -> Option<Command> {
        self.queue.borrow_mut().pop_front()
    }
}
