//! Focus restoration stack
//!
//! LIFO record of "focus was here" snapshots. Entries are only removed by
//! `restore` (one at a time) or `clear`. Callers are expected to nest
//! save/restore pairs; the stack itself does not enforce that, it only logs
//! the symptoms (popping an empty stack, growing past a warning depth).

use std::cell::RefCell;
use std::rc::Rc;

use jot_dom::NodeId;

use crate::FocusHost;

/// Stack depth past which a leak warning is logged
pub const DEFAULT_WARN_DEPTH: usize = 32;

/// Shared handle to a restoration stack
pub type SharedHistory = Rc<RefCell<FocusHistory>>;

/// Result of popping the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Focus moved back to the saved element
    Restored(NodeId),
    /// Saved element has left the document; focus unchanged
    Detached(NodeId),
    /// Saved element is attached but refused focus
    Refused(NodeId),
    /// Nothing was focused when the entry was saved
    NothingSaved,
    /// Stack was empty
    Empty,
}

impl RestoreOutcome {
    pub fn succeeded(self) -> bool {
        matches!(self, RestoreOutcome::Restored(_))
    }
}

/// LIFO focus history
#[derive(Debug)]
pub struct FocusHistory {
    entries: Vec<Option<NodeId>>,
    warn_depth: usize,
    warned: bool,
}

impl FocusHistory {
    pub fn new() -> Self {
        Self::with_warn_depth(DEFAULT_WARN_DEPTH)
    }

    pub fn with_warn_depth(warn_depth: usize) -> Self {
        Self { entries: Vec::new(), warn_depth: warn_depth.max(1), warned: false }
    }

    pub fn set_warn_depth(&mut self, warn_depth: usize) {
        self.warn_depth = warn_depth.max(1);
    }

    /// Push an explicit entry (`None` is the nothing-focused sentinel)
    pub fn push(&mut self, entry: Option<NodeId>) {
        self.entries.push(entry);
        if self.entries.len() > self.warn_depth {
            if !self.warned {
                tracing::warn!(
                    "focus history grew to {} entries; unpaired save/restore?",
                    self.entries.len()
                );
                self.warned = true;
            }
        } else {
            self.warned = false;
        }
    }

    /// Record whatever currently holds focus
    pub fn save<H: FocusHost + ?Sized>(&mut self, host: &H) {
        let focused = host.active_element();
        tracing::trace!("save focus {:?} (depth {})", focused, self.entries.len() + 1);
        self.push(focused);
    }

    /// Pop the most recent entry without touching focus
    pub fn pop(&mut self) -> Option<Option<NodeId>> {
        let entry = self.entries.pop();
        if entry.is_none() {
            tracing::warn!("focus history popped while empty");
        }
        if self.entries.len() <= self.warn_depth {
            self.warned = false;
        }
        entry
    }

    /// Pop the most recent entry and move focus back to it if it is still
    /// attached. The entry is consumed either way.
    pub fn restore<H: FocusHost + ?Sized>(&mut self, host: &mut H) -> RestoreOutcome {
        let outcome = match self.pop() {
            None => RestoreOutcome::Empty,
            Some(None) => RestoreOutcome::NothingSaved,
            Some(Some(node)) if !host.is_attached(node) => RestoreOutcome::Detached(node),
            Some(Some(node)) => {
                if host.focus(node) {
                    RestoreOutcome::Restored(node)
                } else {
                    RestoreOutcome::Refused(node)
                }
            }
        };
        tracing::debug!("restore focus: {:?}", outcome);
        outcome
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.warned = false;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry
    pub fn peek(&self) -> Option<Option<NodeId>> {
        self.entries.last().copied()
    }
}

impl Default for FocusHistory {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static GLOBAL: SharedHistory = Rc::new(RefCell::new(FocusHistory::new()));
}

/// Process-wide restoration stack of the current thread
pub fn global() -> SharedHistory {
    GLOBAL.with(Rc::clone)
}

/// Push the focused element onto the global stack
pub fn save<H: FocusHost + ?Sized>(host: &H) {
    GLOBAL.with(|h| h.borrow_mut().save(host));
}

/// Pop the global stack and restore focus
pub fn restore<H: FocusHost + ?Sized>(host: &mut H) -> RestoreOutcome {
    GLOBAL.with(|h| h.borrow_mut().restore(host))
}

pub fn clear() {
    GLOBAL.with(|h| h.borrow_mut().clear());
}

pub fn history_length() -> usize {
    GLOBAL.with(|h| h.borrow().len())
}
