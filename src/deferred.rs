use crate::clock::Millis;

/// A single cancelable deferred task carrying a payload.
///
/// Arming again supersedes whatever was pending, so at most one task is ever
/// outstanding. The owner polls with the current instant and takes the
/// payload once it is due.
#[derive(Debug, Clone, PartialEq)]
pub struct Deferred<T> {
    slot: Option<(Millis, T)>,
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> Deferred<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `payload` for `due_at`, dropping any earlier schedule.
    pub fn arm(&mut self, due_at: Millis, payload: T) {
        self.slot = Some((due_at, payload));
    }

    /// Drops the pending task, returning its payload if there was one.
    pub fn cancel(&mut self) -> Option<T> {
        self.slot.take().map(|(_, payload)| payload)
    }

    /// Takes the payload if its deadline has been reached.
    pub fn take_due(&mut self, now: Millis) -> Option<T> {
        if matches!(self.due_at(), Some(due_at) if due_at <= now) {
            self.cancel()
        } else {
            None
        }
    }

    pub fn due_at(&self) -> Option<Millis> {
        self.slot.as_ref().map(|(due_at, _)| *due_at)
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    pub fn peek(&self) -> Option<&T> {
        self.slot.as_ref().map(|(_, payload)| payload)
    }
}
