//! Document - High-level document API
//!
//! Wraps the arena tree with the pieces the focus runtime talks to: the
//! focused element, mutation observers and key listeners. Structural writes go
//! through the document so every observer sees them.

use crate::{
    DomError, DomTree, ElementData, ListenerId, ListenerReach, ListenerRegistry, MutationBatch,
    MutationObservers, MutationRecord, NodeId, ObserverOptions, Rect, SubscriptionId,
};
use crate::node::{Display, Visibility};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    tree: DomTree,
    html_element: NodeId,
    body_element: NodeId,
    focused: Option<NodeId>,
    observers: MutationObservers,
    listeners: ListenerRegistry,
}

impl Document {
    /// Create a document with `<html><body></body></html>`
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let body = tree.create_element("body");
        let root = tree.root();
        tree.link(root, html, None);
        tree.link(html, body, None);

        Self {
            tree,
            html_element: html,
            body_element: body,
            focused: None,
            observers: MutationObservers::new(),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Document node
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    // ------------------------------------------------------------------
    // Node creation and inspection
    // ------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.tree.create_text(content)
    }

    /// Element data of a live element
    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        self.tree.get(node)?.as_element()
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut ElementData, DomError> {
        let n = self.tree.get_mut(node).ok_or(DomError::StaleNode(node))?;
        n.as_element_mut().ok_or(DomError::NotAnElement(node))
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.get_attr(name)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(node)?.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        Ok(self.element_mut(node)?.remove_attr(name))
    }

    pub fn set_display(&mut self, node: NodeId, display: Display) -> Result<(), DomError> {
        self.element_mut(node)?.display = display;
        Ok(())
    }

    pub fn set_visibility(&mut self, node: NodeId, visibility: Visibility) -> Result<(), DomError> {
        self.element_mut(node)?.visibility = visibility;
        Ok(())
    }

    pub fn set_bounds(&mut self, node: NodeId, bounds: Rect) -> Result<(), DomError> {
        self.element_mut(node)?.bounds = Some(bounds);
        Ok(())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent(node)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.children(node).collect()
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.tree.contains(ancestor, node)
    }

    /// Node is connected to this document
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.tree.is_attached(node)
    }

    // ------------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------------

    /// Append `child` to `parent`, queueing child-list records
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (append when `None`)
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<(), DomError> {
        let old_position = self.position_of(child);
        let was_focused_inside = self.focus_within(child);

        self.tree.insert_before(parent, child, reference)?;

        if let Some((old_parent, prev, next)) = old_position {
            self.observers.enqueue(&self.tree, MutationRecord::removed(old_parent, child, prev, next));
        }
        if let Some((_, prev, next)) = self.position_of(child) {
            self.observers.enqueue(&self.tree, MutationRecord::added(parent, child, prev, next));
        }
        if was_focused_inside && !self.tree.is_attached(child) {
            self.drop_focus();
        }
        tracing::trace!("inserted {} into {}", child, parent);
        Ok(())
    }

    /// Detach `node` from its parent. The handle stays live but unattached.
    pub fn remove_child(&mut self, node: NodeId) -> Result<(), DomError> {
        let position = self.position_of(node);
        let was_focused_inside = self.focus_within(node);

        self.tree.detach(node)?;

        if let Some((parent, prev, next)) = position {
            self.observers.enqueue(&self.tree, MutationRecord::removed(parent, node, prev, next));
        }
        if was_focused_inside {
            self.drop_focus();
        }
        tracing::trace!("removed {}", node);
        Ok(())
    }

    /// Remove a subtree and free its nodes; old handles stop resolving
    pub fn destroy(&mut self, node: NodeId) -> Result<(), DomError> {
        self.remove_child(node)?;
        self.tree.destroy(node)?;
        Ok(())
    }

    fn position_of(&self, node: NodeId) -> Option<(NodeId, Option<NodeId>, Option<NodeId>)> {
        let n = self.tree.get(node)?;
        Some((n.parent?, n.prev_sibling, n.next_sibling))
    }

    fn focus_within(&self, node: NodeId) -> bool {
        self.focused.is_some_and(|f| self.tree.contains(node, f))
    }

    fn drop_focus(&mut self) {
        if let Some(old) = self.focused.take() {
            tracing::debug!("focused element {} left the document", old);
        }
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// Currently focused element, if it is still attached
    pub fn active_element(&self) -> Option<NodeId> {
        self.focused.filter(|&f| self.tree.is_attached(f))
    }

    /// Move focus to `node`. Fails (returns false) for detached nodes,
    /// non-elements, disabled controls and elements that are neither
    /// interactive nor carry a `tabindex`.
    pub fn focus(&mut self, node: NodeId) -> bool {
        if !self.tree.is_attached(node) {
            return false;
        }
        let Some(element) = self.element(node) else {
            return false;
        };
        if element.is_disabled() {
            return false;
        }
        if !element.is_inherently_focusable() && element.tab_index().is_none() {
            return false;
        }
        if self.focused != Some(node) {
            tracing::trace!("focus {} -> {}", self.focused.map(|f| f.to_string()).unwrap_or_else(|| "none".into()), node);
        }
        self.focused = Some(node);
        true
    }

    /// Clear focus
    pub fn blur(&mut self) {
        self.focused = None;
    }

    // ------------------------------------------------------------------
    // Mutation observers
    // ------------------------------------------------------------------

    pub fn observe(&mut self, target: NodeId, options: ObserverOptions) -> SubscriptionId {
        self.observers.observe(target, options)
    }

    pub fn disconnect(&mut self, id: SubscriptionId) -> bool {
        self.observers.disconnect(id)
    }

    pub fn is_observing(&self, id: SubscriptionId) -> bool {
        self.observers.is_observing(id)
    }

    pub fn has_pending_mutations(&self) -> bool {
        self.observers.has_pending()
    }

    /// Deliver queued records, one batch per subscription
    pub fn take_batches(&mut self) -> Vec<MutationBatch> {
        self.observers.take_batches()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ------------------------------------------------------------------
    // Key listeners
    // ------------------------------------------------------------------

    pub fn add_key_listener(&mut self, scope: NodeId, reach: ListenerReach) -> ListenerId {
        self.listeners.add(scope, reach)
    }

    pub fn remove_key_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn has_key_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains(id)
    }

    pub fn key_listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners for a keydown on the focused element, in dispatch order
    pub fn key_listeners_for_focus(&self) -> Vec<ListenerId> {
        self.listeners.listeners_for(&self.tree, self.active_element())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
