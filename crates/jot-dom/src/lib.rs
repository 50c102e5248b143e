//! Jot DOM - Document tree
//!
//! Arena-backed document tree used by the focus runtime.
//!
//! Features:
//! - Generational node handles (stale handles never alias recycled slots)
//! - Focus state with attachment checks
//! - Batched child-list mutation observers
//! - Scoped keyboard listener registry

mod generation;
mod geometry;
mod node;
mod tree;
mod document;
pub mod events;
pub mod observer;

use std::fmt;

pub use generation::Generation;
pub use geometry::Rect;
pub use node::{Node, NodeData, ElementData, Attribute, Display, Visibility};
pub use tree::{DomTree, Children};
pub use document::Document;
pub use events::{Key, KeyModifiers, KeyboardEvent, ListenerId, ListenerReach, ListenerRegistry};
pub use observer::{MutationBatch, MutationObservers, MutationRecord, ObserverOptions, SubscriptionId};

/// Node identifier (arena index + slot generation)
///
/// Identity-stable: a handle keeps naming the same node for as long as that
/// node exists. Once the slot is freed and reused, the generation differs and
/// the old handle resolves to nothing.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: Generation,
}

impl NodeId {
    /// Document node ID
    pub const ROOT: NodeId = NodeId { index: 0, generation: Generation::INITIAL };

    pub(crate) const fn new(index: u32, generation: Generation) -> Self {
        Self { index, generation }
    }

    /// Arena slot index
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation this handle was minted for
    #[inline]
    pub fn generation(self) -> Generation {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation.value())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation.value())
    }
}

/// DOM error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Stale or unknown node {0}")]
    StaleNode(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0} cannot have children")]
    NotAContainer(NodeId),

    #[error("Inserting {child} into {parent} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Node {reference} is not a child of {parent}")]
    NotAChild { parent: NodeId, reference: NodeId },

    #[error("The document node cannot be removed")]
    RootRemoval,
}
