//! Jot Accessibility
//!
//! Focus management for the Jot journal: which element owns input focus,
//! how focus comes back when a transient surface closes, and how composite
//! widgets stay keyboard navigable.
//!
//! Features:
//! - Focusable-set query over a live document tree
//! - Process-wide focus restoration stack
//! - Focus traps for dialogs
//! - Dynamic content observer with deferred, cancellable auto-focus
//! - Roving tabindex for toolbars and menus
//! - Announcement channel for screen readers
//!
//! Everything here talks to the document through [`FocusHost`], so the
//! controllers never hold a borrow of the tree between events.

pub mod host;
pub mod tabbable;
pub mod history;
pub mod trap;
pub mod content;
pub mod roving;
pub mod announce;
pub mod timers;

use jot_dom::NodeId;

pub use host::FocusHost;
pub use tabbable::{tabbable, focusable, first_tabbable, last_tabbable, is_tabbable};
pub use history::{FocusHistory, RestoreOutcome, SharedHistory};
pub use trap::{FocusTrap, TrapOptions, TrapState};
pub use content::{ChangeCallback, ChangeKind, ContentChange, ContentObserver, ContentObserverOptions};
pub use roving::{Arrow, KeyPolicy, Orientation, RovingTabindex};
pub use announce::{Announcement, AnnouncementQueue, Announcer, NullAnnouncer, Politeness};
pub use timers::Deferred;

/// Outcome of offering a keydown to a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// The controller moved focus (or swallowed the key); default suppressed
    Handled,
    /// Not for this controller; default action may proceed
    Ignored,
}

impl KeyDisposition {
    pub fn is_handled(self) -> bool {
        self == KeyDisposition::Handled
    }
}

/// Accessibility error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum A11yError {
    #[error("Container {0} is not attached to the document")]
    DetachedContainer(NodeId),

    #[error("Container {0} is not an element")]
    NotAnElement(NodeId),
}
