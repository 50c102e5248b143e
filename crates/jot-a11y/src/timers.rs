//! Cancellable deferred action
//!
//! Time is a `Duration` since the runtime's epoch. A `Deferred` holds at most
//! one scheduled payload; scheduling again supersedes the previous one.

use std::time::Duration;

/// Single-slot deferred task
#[derive(Debug, Clone)]
pub struct Deferred<T> {
    slot: Option<(Duration, T)>,
}

impl<T> Deferred<T> {
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// Schedule `payload` at `due`, returning the superseded payload
    pub fn schedule(&mut self, due: Duration, payload: T) -> Option<T> {
        self.slot.replace((due, payload)).map(|(_, p)| p)
    }

    /// Drop the pending payload, if any
    pub fn cancel(&mut self) -> Option<T> {
        self.slot.take().map(|(_, p)| p)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.slot.as_ref().map(|(due, _)| *due)
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// Take the payload if its deadline has passed
    pub fn take_due(&mut self, now: Duration) -> Option<T> {
        match &self.slot {
            Some((due, _)) if *due <= now => self.slot.take().map(|(_, p)| p),
            _ => None,
        }
    }
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_fires_once_at_deadline() {
        let mut d = Deferred::new();
        d.schedule(MS * 100, "focus");
        assert_eq!(d.take_due(MS * 99), None);
        assert_eq!(d.take_due(MS * 100), Some("focus"));
        assert_eq!(d.take_due(MS * 200), None);
    }

    #[test]
    fn test_schedule_supersedes() {
        let mut d = Deferred::new();
        assert_eq!(d.schedule(MS * 100, 1), None);
        assert_eq!(d.schedule(MS * 150, 2), Some(1));
        assert_eq!(d.deadline(), Some(MS * 150));
        assert_eq!(d.take_due(MS * 120), None);
        assert_eq!(d.take_due(MS * 150), Some(2));
    }

    #[test]
    fn test_cancel() {
        let mut d = Deferred::new();
        d.schedule(MS, ());
        assert!(d.is_pending());
        assert_eq!(d.cancel(), Some(()));
        assert!(!d.is_pending());
        assert_eq!(d.take_due(MS * 10), None);
    }
}
