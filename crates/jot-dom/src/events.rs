//! Keyboard events and scoped key listeners
//!
//! Listeners are registered against a scope element. Dispatch order for a
//! target is: subtree listeners from the innermost scope outwards, then
//! document-reach listeners, most recently registered first.

use crate::{DomTree, NodeId};

/// Key identity as reported by `KeyboardEvent.key`
///
/// Only the keys focus handling distinguishes get their own variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Tab,
    Escape,
    Enter,
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    /// Single printable character
    Character(char),
    /// Anything else, verbatim
    Other(String),
}

impl Key {
    pub fn parse(value: &str) -> Self {
        let named = match value {
            "Tab" => Some(Key::Tab),
            "Escape" | "Esc" => Some(Key::Escape),
            "Enter" => Some(Key::Enter),
            " " | "Spacebar" => Some(Key::Space),
            "ArrowUp" | "Up" => Some(Key::ArrowUp),
            "ArrowDown" | "Down" => Some(Key::ArrowDown),
            "ArrowLeft" | "Left" => Some(Key::ArrowLeft),
            "ArrowRight" | "Right" => Some(Key::ArrowRight),
            "Home" => Some(Key::Home),
            "End" => Some(Key::End),
            _ => None,
        };
        named.unwrap_or_else(|| {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Character(c),
                _ => Key::Other(value.to_string()),
            }
        })
    }
}

/// Modifier state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyModifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }

    /// Any modifier other than Shift
    pub fn has_command_modifier(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// Keydown event
#[derive(Debug, Clone)]
pub struct KeyboardEvent {
    pub key: Key,
    pub modifiers: KeyModifiers,
    pub repeat: bool,
    default_prevented: bool,
}

impl KeyboardEvent {
    pub fn new(key: Key) -> Self {
        Self { key, modifiers: KeyModifiers::none(), repeat: false, default_prevented: false }
    }

    pub fn with_modifiers(key: Key, modifiers: KeyModifiers) -> Self {
        Self { key, modifiers, repeat: false, default_prevented: false }
    }

    /// Tab keydown
    pub fn tab() -> Self {
        Self::new(Key::Tab)
    }

    /// Shift+Tab keydown
    pub fn shift_tab() -> Self {
        Self::with_modifiers(Key::Tab, KeyModifiers::shift())
    }

    /// Plain or shifted Tab without command modifiers
    pub fn is_tab(&self) -> bool {
        self.key == Key::Tab && !self.modifiers.has_command_modifier()
    }

    /// Suppress the default action
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Key listener handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Which events a listener receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerReach {
    /// Only events whose target lies inside the scope
    Subtree,
    /// Every keydown in the document, on behalf of the scope
    Document,
}

#[derive(Debug, Clone)]
struct KeyListener {
    id: ListenerId,
    scope: NodeId,
    reach: ListenerReach,
}

/// Registered key listeners of a document
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<KeyListener>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, scope: NodeId, reach: ListenerReach) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push(KeyListener { id, scope, reach });
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        before != self.listeners.len()
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Listeners that receive a keydown aimed at `target`, in dispatch order
    pub fn listeners_for(&self, tree: &DomTree, target: Option<NodeId>) -> Vec<ListenerId> {
        let mut scoped: Vec<(usize, usize, ListenerId)> = match target {
            Some(t) => self.listeners.iter()
                .enumerate()
                .filter(|(_, l)| l.reach == ListenerReach::Subtree && tree.contains(l.scope, t))
                .map(|(order, l)| (tree.depth(l.scope), order, l.id))
                .collect(),
            None => Vec::new(),
        };
        // Innermost scope first; same scope keeps registration order
        scoped.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let document = self.listeners.iter()
            .rev()
            .filter(|l| l.reach == ListenerReach::Document && tree.is_live(l.scope))
            .map(|l| l.id);

        scoped.into_iter().map(|(_, _, id)| id).chain(document).collect()
    }
}
