//! Roving tabindex
//!
//! A composite widget (toolbar, menu, tab list) exposes one Tab stop. The
//! current item carries `tabindex=0`, every other item `tabindex=-1`; arrow
//! keys move the stop and focus together. Items are recomputed on each key,
//! so wraparound is taken modulo the live item count.

use jot_dom::{Key, KeyboardEvent, ListenerId, ListenerReach, NodeId};
use serde::{Deserialize, Serialize};

use crate::host::validate_container;
use crate::tabbable::focusable;
use crate::{A11yError, FocusHost, KeyDisposition};

/// Arrow key identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    Up,
    Down,
    Left,
    Right,
}

impl Arrow {
    pub fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::ArrowUp => Some(Arrow::Up),
            Key::ArrowDown => Some(Arrow::Down),
            Key::ArrowLeft => Some(Arrow::Left),
            Key::ArrowRight => Some(Arrow::Right),
            _ => None,
        }
    }
}

/// Widget layout axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
    Both,
}

/// Arrows that move the tab stop forward and backward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPolicy {
    pub advance: &'static [Arrow],
    pub retreat: &'static [Arrow],
}

impl Orientation {
    pub const fn policy(self) -> KeyPolicy {
        match self {
            Orientation::Horizontal => KeyPolicy { advance: &[Arrow::Right], retreat: &[Arrow::Left] },
            Orientation::Vertical => KeyPolicy { advance: &[Arrow::Down], retreat: &[Arrow::Up] },
            Orientation::Both => KeyPolicy {
                advance: &[Arrow::Right, Arrow::Down],
                retreat: &[Arrow::Left, Arrow::Up],
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Next,
    Prev,
    First,
    Last,
}

impl KeyPolicy {
    fn step(&self, key: &Key) -> Option<Step> {
        match key {
            Key::Home => return Some(Step::First),
            Key::End => return Some(Step::Last),
            _ => {}
        }
        let arrow = Arrow::from_key(key)?;
        if self.advance.contains(&arrow) {
            Some(Step::Next)
        } else if self.retreat.contains(&arrow) {
            Some(Step::Prev)
        } else {
            None
        }
    }
}

impl Step {
    fn apply(self, from: usize, len: usize) -> usize {
        match self {
            Step::Next => (from + 1) % len,
            Step::Prev => (from + len - 1) % len,
            Step::First => 0,
            Step::Last => len - 1,
        }
    }
}

/// Single-tab-stop controller for a composite widget
#[derive(Debug)]
pub struct RovingTabindex {
    container: NodeId,
    orientation: Orientation,
    index: usize,
    listener: Option<ListenerId>,
}

impl RovingTabindex {
    /// Take over `container`'s items and install the arrow-key listener
    pub fn mount<H: FocusHost + ?Sized>(host: &mut H, container: NodeId, orientation: Orientation) -> Result<Self, A11yError> {
        validate_container(&*host, container)?;

        let items = focusable(&*host, container);
        let focused = host.active_element();
        let index = focused
            .and_then(|f| items.iter().position(|&i| i == f))
            .or_else(|| items.iter().position(|&i| host.element(i).is_some_and(|e| e.tab_index() == Some(0))))
            .unwrap_or(0);

        let listener = host.add_key_listener(container, ListenerReach::Subtree);
        let mut roving = Self { container, orientation, index, listener: Some(listener) };
        roving.apply_tab_stops(host, &items);
        tracing::debug!("roving {} mounted with {} items ({:?})", container, items.len(), orientation);
        Ok(roving)
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn listener(&self) -> Option<ListenerId> {
        self.listener
    }

    pub fn is_mounted(&self) -> bool {
        self.listener.is_some()
    }

    /// Live items in document order
    pub fn items<H: FocusHost + ?Sized>(&self, host: &H) -> Vec<NodeId> {
        focusable(host, self.container)
    }

    /// Item holding the tab stop
    pub fn current<H: FocusHost + ?Sized>(&self, host: &H) -> Option<NodeId> {
        self.items(host).get(self.index).copied()
    }

    /// Re-establish the single tab stop after items changed. Follows focus
    /// when an item was focused by other means.
    pub fn refresh<H: FocusHost + ?Sized>(&mut self, host: &mut H) {
        if !self.is_mounted() {
            return;
        }
        let items = self.items(&*host);
        if items.is_empty() {
            self.index = 0;
            return;
        }
        if let Some(pos) = host.active_element().and_then(|f| items.iter().position(|&i| i == f)) {
            self.index = pos;
        }
        self.index = self.index.min(items.len() - 1);
        self.apply_tab_stops(host, &items);
    }

    /// Move the tab stop and focus to item `index` (clamped)
    pub fn focus_index<H: FocusHost + ?Sized>(&mut self, host: &mut H, index: usize) -> Option<NodeId> {
        let items = self.items(&*host);
        let last = items.len().checked_sub(1)?;
        self.index = index.min(last);
        self.apply_tab_stops(host, &items);
        let target = items[self.index];
        host.focus(target);
        Some(target)
    }

    /// Arrow / Home / End navigation
    pub fn handle_key<H: FocusHost + ?Sized>(&mut self, host: &mut H, event: &mut KeyboardEvent) -> KeyDisposition {
        if !self.is_mounted() || event.modifiers.has_command_modifier() {
            return KeyDisposition::Ignored;
        }
        let Some(step) = self.orientation.policy().step(&event.key) else {
            return KeyDisposition::Ignored;
        };

        let items = self.items(&*host);
        if items.is_empty() {
            return KeyDisposition::Ignored;
        }
        let from = host.active_element()
            .and_then(|f| items.iter().position(|&i| i == f))
            .unwrap_or(self.index.min(items.len() - 1));

        self.index = step.apply(from, items.len());
        self.apply_tab_stops(host, &items);
        let target = items[self.index];
        host.focus(target);
        event.prevent_default();
        tracing::trace!("roving {} moved to {} ({:?})", self.container, self.index, step);
        KeyDisposition::Handled
    }

    /// Remove the key listener. Tab stops are left as they are.
    pub fn cleanup<H: FocusHost + ?Sized>(&mut self, host: &mut H) {
        if let Some(listener) = self.listener.take() {
            host.remove_key_listener(listener);
            tracing::debug!("roving {} unmounted", self.container);
        }
    }

    fn apply_tab_stops<H: FocusHost + ?Sized>(&self, host: &mut H, items: &[NodeId]) {
        for (i, &item) in items.iter().enumerate() {
            let value = if i == self.index { 0 } else { -1 };
            let current = host.element(item).and_then(|e| e.tab_index());
            if current != Some(value) {
                host.set_tab_index(item, value);
            }
        }
    }
}
