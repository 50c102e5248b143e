//! Document capabilities the focus core relies on
//!
//! The core never owns the tree. It asks the host who is focused, moves
//! focus, checks attachment, subscribes to structural changes and registers
//! key listeners; the rest is read-only inspection for the focusable query
//! plus `tabindex` writes for roving widgets.

use jot_dom::{Document, ElementData, ListenerId, ListenerReach, NodeId, ObserverOptions, SubscriptionId};

use crate::A11yError;

/// Live document tree as seen by focus controllers
pub trait FocusHost {
    /// Element currently holding focus
    fn active_element(&self) -> Option<NodeId>;

    /// Move focus; false when the element refuses it
    fn focus(&mut self, node: NodeId) -> bool;

    /// Handle still names a node connected to the document
    fn is_attached(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Inclusive containment
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    fn element(&self, node: NodeId) -> Option<&ElementData>;

    fn set_tab_index(&mut self, node: NodeId, value: i32) -> bool;

    /// Subscribe to child-list changes under `target`
    fn observe_children(&mut self, target: NodeId) -> SubscriptionId;

    fn disconnect(&mut self, subscription: SubscriptionId);

    fn add_key_listener(&mut self, scope: NodeId, reach: ListenerReach) -> ListenerId;

    fn remove_key_listener(&mut self, listener: ListenerId);
}

/// Controllers only bind to attached elements
pub fn validate_container<H: FocusHost + ?Sized>(host: &H, container: NodeId) -> Result<(), A11yError> {
    if !host.is_attached(container) {
        return Err(A11yError::DetachedContainer(container));
    }
    if host.element(container).is_none() {
        return Err(A11yError::NotAnElement(container));
    }
    Ok(())
}

impl FocusHost for Document {
    fn active_element(&self) -> Option<NodeId> {
        Document::active_element(self)
    }

    fn focus(&mut self, node: NodeId) -> bool {
        Document::focus(self, node)
    }

    fn is_attached(&self, node: NodeId) -> bool {
        Document::is_attached(self, node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        Document::parent(self, node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        Document::children(self, node)
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        Document::contains(self, ancestor, node)
    }

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        Document::element(self, node)
    }

    fn set_tab_index(&mut self, node: NodeId, value: i32) -> bool {
        self.set_attribute(node, "tabindex", &value.to_string()).is_ok()
    }

    fn observe_children(&mut self, target: NodeId) -> SubscriptionId {
        self.observe(target, ObserverOptions::subtree())
    }

    fn disconnect(&mut self, subscription: SubscriptionId) {
        Document::disconnect(self, subscription);
    }

    fn add_key_listener(&mut self, scope: NodeId, reach: ListenerReach) -> ListenerId {
        Document::add_key_listener(self, scope, reach)
    }

    fn remove_key_listener(&mut self, listener: ListenerId) {
        Document::remove_key_listener(self, listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_container() {
        let mut doc = Document::new();
        let body = doc.body();
        let dialog = doc.create_element("div");
        assert_eq!(validate_container(&doc, dialog), Err(A11yError::DetachedContainer(dialog)));

        doc.append_child(body, dialog).unwrap();
        assert_eq!(validate_container(&doc, dialog), Ok(()));

        let root = doc.root();
        assert_eq!(validate_container(&doc, root), Err(A11yError::NotAnElement(root)));
    }

    #[test]
    fn test_set_tab_index_writes_attribute() {
        let mut doc = Document::new();
        let body = doc.body();
        let b = doc.create_element("button");
        doc.append_child(body, b).unwrap();

        assert!(FocusHost::set_tab_index(&mut doc, b, -1));
        assert_eq!(doc.attribute(b, "tabindex"), Some("-1"));

        let text = doc.create_text("note");
        assert!(!FocusHost::set_tab_index(&mut doc, text, 0));
    }
}
