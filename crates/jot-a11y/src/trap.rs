//! Focus trap
//!
//! Constrains Tab / Shift+Tab to a container while active and hands focus
//! back to whatever held it before activation. Tab order is recomputed on
//! every key so content inserted after activation is reachable.
//!
//! Only one trap should be primary at a time. Nested dialogs deactivate and
//! activate in LIFO order; a mismatch shows up as a warning on deactivation.

use jot_dom::{Key, KeyboardEvent, ListenerId, ListenerReach, NodeId};

use crate::history::{self, RestoreOutcome, SharedHistory};
use crate::host::validate_container;
use crate::tabbable::tabbable;
use crate::{A11yError, FocusHost, KeyDisposition};

/// Trap lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrapState {
    #[default]
    Inactive,
    Active,
}

/// Trap behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrapOptions {
    /// Escape deactivates (restoring focus) and is swallowed
    pub escape_deactivates: bool,
}

/// Focus trap bound to one container
#[derive(Debug)]
pub struct FocusTrap {
    container: NodeId,
    state: TrapState,
    options: TrapOptions,
    listener: Option<ListenerId>,
    history: SharedHistory,
    depth_at_activation: usize,
}

impl FocusTrap {
    /// Trap over `container` using the process-wide restoration stack
    pub fn new<H: FocusHost + ?Sized>(host: &H, container: NodeId) -> Result<Self, A11yError> {
        Self::with_options(host, container, TrapOptions::default(), history::global())
    }

    pub fn with_options<H: FocusHost + ?Sized>(
        host: &H,
        container: NodeId,
        options: TrapOptions,
        history: SharedHistory,
    ) -> Result<Self, A11yError> {
        validate_container(host, container)?;
        Ok(Self {
            container,
            state: TrapState::Inactive,
            options,
            listener: None,
            history,
            depth_at_activation: 0,
        })
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn state(&self) -> TrapState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TrapState::Active
    }

    pub fn options(&self) -> TrapOptions {
        self.options
    }

    /// Key listener installed while active
    pub fn listener(&self) -> Option<ListenerId> {
        self.listener
    }

    /// Start trapping. Saves the current focus, installs the key listener and
    /// optionally focuses the first tabbable element. Calling it again while
    /// active does nothing.
    pub fn activate<H: FocusHost + ?Sized>(&mut self, host: &mut H, focus_first: bool) {
        if self.is_active() {
            return;
        }

        {
            let mut history = self.history.borrow_mut();
            history.save(&*host);
            self.depth_at_activation = history.len();
        }
        // Document reach: the trap must also see Tab pressed while focus sits
        // outside the container.
        self.listener = Some(host.add_key_listener(self.container, ListenerReach::Document));
        self.state = TrapState::Active;

        if focus_first {
            match tabbable(&*host, self.container).first() {
                Some(&first) => {
                    host.focus(first);
                }
                None => tracing::debug!("trap {} has nothing tabbable yet", self.container),
            }
        }
        tracing::debug!("trap {} activated", self.container);
    }

    /// Stop trapping. The entry saved at activation is always popped; with
    /// `restore` set the saved element is refocused if still attached.
    pub fn deactivate<H: FocusHost + ?Sized>(&mut self, host: &mut H, restore: bool) -> Option<RestoreOutcome> {
        if !self.is_active() {
            return None;
        }

        if let Some(listener) = self.listener.take() {
            host.remove_key_listener(listener);
        }
        self.state = TrapState::Inactive;

        let mut history = self.history.borrow_mut();
        if history.len() != self.depth_at_activation {
            tracing::warn!(
                "trap {} deactivated at history depth {} (activated at {}); traps not nested LIFO",
                self.container,
                history.len(),
                self.depth_at_activation
            );
        }
        tracing::debug!("trap {} deactivated", self.container);

        if restore {
            Some(history.restore(host))
        } else {
            history.pop();
            None
        }
    }

    /// Offer a keydown to the trap
    pub fn handle_key<H: FocusHost + ?Sized>(&mut self, host: &mut H, event: &mut KeyboardEvent) -> KeyDisposition {
        if !self.is_active() {
            return KeyDisposition::Ignored;
        }

        if event.key == Key::Escape && self.options.escape_deactivates {
            event.prevent_default();
            self.deactivate(host, true);
            return KeyDisposition::Handled;
        }

        if !event.is_tab() {
            return KeyDisposition::Ignored;
        }

        // A removed container must not swallow Tab for the whole document
        if !host.is_attached(self.container) {
            tracing::warn!("trap {} is active but its container is detached", self.container);
            return KeyDisposition::Ignored;
        }

        let order = tabbable(&*host, self.container);
        let (Some(&first), Some(&last)) = (order.first(), order.last()) else {
            event.prevent_default();
            return KeyDisposition::Handled;
        };

        let current = host.active_element();
        let target = match current {
            Some(c) if !order.contains(&c) => Some(first),
            None => Some(first),
            Some(c) if event.modifiers.shift && c == first => Some(last),
            Some(c) if !event.modifiers.shift && c == last => Some(first),
            Some(_) => None,
        };

        match target {
            Some(t) => {
                event.prevent_default();
                host.focus(t);
                tracing::trace!("trap {} wrapped focus to {}", self.container, t);
                KeyDisposition::Handled
            }
            None => KeyDisposition::Ignored,
        }
    }
}

impl Drop for FocusTrap {
    fn drop(&mut self) {
        if self.is_active() {
            tracing::warn!("trap {} dropped while active; its key listener is leaked", self.container);
        }
    }
}
