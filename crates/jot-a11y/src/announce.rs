//! Announcement channel
//!
//! Text notifications for assistive technology. The focus core only emits
//! them; presenting them (e.g. through a live region) belongs to the host.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Announcements kept before the oldest polite one is dropped
pub const DEFAULT_CAPACITY: usize = 64;

/// Live region politeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Politeness {
    #[default]
    Polite,
    Assertive,
}

/// Queued announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub message: String,
    pub politeness: Politeness,
    /// Order of emission
    pub sequence: u64,
}

/// Sink for announcements
pub trait Announcer {
    fn announce(&mut self, message: &str, politeness: Politeness);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnnouncer;

impl Announcer for NullAnnouncer {
    fn announce(&mut self, _message: &str, _politeness: Politeness) {}
}

/// Bounded in-process announcement queue
#[derive(Debug)]
pub struct AnnouncementQueue {
    pending: VecDeque<Announcement>,
    capacity: usize,
    next_sequence: u64,
}

impl AnnouncementQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { pending: VecDeque::new(), capacity: capacity.max(1), next_sequence: 0 }
    }

    /// Next announcement, assertive ones first
    pub fn next(&mut self) -> Option<Announcement> {
        let idx = self.pending.iter()
            .position(|a| a.politeness == Politeness::Assertive)
            .unwrap_or(0);
        self.pending.remove(idx)
    }

    /// Drain in delivery order
    pub fn drain(&mut self) -> Vec<Announcement> {
        std::iter::from_fn(|| self.next()).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    fn evict(&mut self) {
        // Oldest polite message goes first; assertive ones only when nothing else is left
        let idx = self.pending.iter()
            .position(|a| a.politeness == Politeness::Polite)
            .unwrap_or(0);
        if let Some(dropped) = self.pending.remove(idx) {
            tracing::debug!("announcement queue full, dropped {:?}", dropped.message);
        }
    }
}

impl Default for AnnouncementQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Announcer for AnnouncementQueue {
    fn announce(&mut self, message: &str, politeness: Politeness) {
        if message.is_empty() {
            return;
        }
        if self.pending.len() >= self.capacity {
            self.evict();
        }
        self.next_sequence += 1;
        tracing::trace!("announce ({:?}): {}", politeness, message);
        self.pending.push_back(Announcement {
            message: message.to_string(),
            politeness,
            sequence: self.next_sequence,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertive_first() {
        let mut q = AnnouncementQueue::new();
        q.announce("2 new items added", Politeness::Polite);
        q.announce("Could not save entry", Politeness::Assertive);
        q.announce("Content updated", Politeness::Polite);

        let order: Vec<_> = q.drain().into_iter().map(|a| a.message).collect();
        assert_eq!(order, vec!["Could not save entry", "2 new items added", "Content updated"]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_capacity_drops_oldest_polite() {
        let mut q = AnnouncementQueue::with_capacity(2);
        q.announce("urgent", Politeness::Assertive);
        q.announce("first", Politeness::Polite);
        q.announce("second", Politeness::Polite);

        assert_eq!(q.len(), 2);
        let order: Vec<_> = q.drain().into_iter().map(|a| a.message).collect();
        assert_eq!(order, vec!["urgent", "second"]);
    }

    #[test]
    fn test_empty_message_ignored() {
        let mut q = AnnouncementQueue::new();
        q.announce("", Politeness::Polite);
        assert!(q.is_empty());
        assert_eq!(q.next(), None);
    }

    #[test]
    fn test_politeness_serde() {
        assert_eq!(serde_json::to_string(&Politeness::Assertive).unwrap(), "\"assertive\"");
    }
}
