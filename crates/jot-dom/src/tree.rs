//! DOM Tree (arena-based allocation)
//!
//! Slots are recycled through a free list; each reuse bumps the slot
//! generation so handles to the previous occupant stop resolving.

use crate::{DomError, Generation, Node, NodeId};

#[derive(Debug)]
struct Slot {
    generation: Generation,
    node: Option<Node>,
}

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            slots: vec![Slot { generation: Generation::INITIAL, node: Some(Node::document()) }],
            free: Vec::new(),
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    /// Handle still names a live node (attached or not)
    #[inline]
    pub fn is_live(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// A tree always holds its document node
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: Generation::INITIAL, node: Some(node) });
        NodeId::new(index, Generation::INITIAL)
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content))
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// Iterate the children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).and_then(|n| n.first_child),
        }
    }

    /// Descendants of `id` in pre-order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        while let Some(current) = stack.pop() {
            out.push(current);
            let start = stack.len();
            stack.extend(self.children(current));
            stack[start..].reverse();
        }
        out
    }

    /// Inclusive containment, like `Node.contains`
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return self.is_live(id);
            }
            current = self.parent(id);
        }
        false
    }

    /// Node is connected to the document node
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_live(id) && self.contains(self.root(), id)
    }

    /// Distance from the top of the node's tree
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(p) = current {
            depth += 1;
            current = self.parent(p);
        }
        depth
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    /// Returns the previous parent if the node moved.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<Option<NodeId>, DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (append when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<Option<NodeId>, DomError> {
        let parent_node = self.get(parent).ok_or(DomError::StaleNode(parent))?;
        if !parent_node.can_have_children() {
            return Err(DomError::NotAContainer(parent));
        }
        if !self.is_live(child) {
            return Err(DomError::StaleNode(child));
        }
        if child == self.root() {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild { parent, reference: r });
            }
            if r == child {
                return Ok(Some(parent));
            }
        }
        Ok(self.link(parent, child, reference))
    }

    /// Splice `child` into `parent` without validation. Callers guarantee
    /// both nodes are live, `parent` can hold children and no cycle forms.
    pub(crate) fn link(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Option<NodeId> {
        let old_parent = self.unlink(child);

        let prev = match reference {
            Some(r) => self.get(r).and_then(|n| n.prev_sibling),
            None => self.get(parent).and_then(|n| n.last_child),
        };

        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }
        match prev {
            Some(p) => {
                if let Some(n) = self.get_mut(p) {
                    n.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(n) = self.get_mut(parent) {
                    n.first_child = Some(child);
                }
            }
        }
        match reference {
            Some(r) => {
                if let Some(n) = self.get_mut(r) {
                    n.prev_sibling = Some(child);
                }
            }
            None => {
                if let Some(n) = self.get_mut(parent) {
                    n.last_child = Some(child);
                }
            }
        }
        old_parent
    }

    /// Detach a node from its parent. Returns the former parent.
    pub fn detach(&mut self, id: NodeId) -> Result<Option<NodeId>, DomError> {
        if id == self.root() {
            return Err(DomError::RootRemoval);
        }
        if !self.is_live(id) {
            return Err(DomError::StaleNode(id));
        }
        Ok(self.unlink(id))
    }

    fn unlink(&mut self, id: NodeId) -> Option<NodeId> {
        let (parent, prev, next) = {
            let node = self.get(id)?;
            (node.parent?, node.prev_sibling, node.next_sibling)
        };
        match prev {
            Some(p) => {
                if let Some(n) = self.get_mut(p) {
                    n.next_sibling = next;
                }
            }
            None => {
                if let Some(n) = self.get_mut(parent) {
                    n.first_child = next;
                }
            }
        }
        match next {
            Some(n) => {
                if let Some(node) = self.get_mut(n) {
                    node.prev_sibling = prev;
                }
            }
            None => {
                if let Some(node) = self.get_mut(parent) {
                    node.last_child = prev;
                }
            }
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
        Some(parent)
    }

    /// Detach a subtree and free every slot in it
    pub fn destroy(&mut self, id: NodeId) -> Result<Option<NodeId>, DomError> {
        let parent = self.detach(id)?;
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for node in doomed {
            let slot = &mut self.slots[node.index() as usize];
            slot.node = None;
            slot.generation = slot.generation.next();
            self.free.push(node.index());
        }
        Ok(parent)
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Child iterator
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_children_order() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        tree.append_child(tree.root(), a).unwrap();
        tree.append_child(tree.root(), c).unwrap();
        tree.insert_before(tree.root(), b, Some(c)).unwrap();

        let kids: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(kids, vec![a, b, c]);
    }

    #[test]
    fn test_descendants_preorder() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        let leaf = tree.create_element("span");
        let tail = tree.create_element("p");
        tree.append_child(tree.root(), outer).unwrap();
        tree.append_child(outer, inner).unwrap();
        tree.append_child(inner, leaf).unwrap();
        tree.append_child(outer, tail).unwrap();

        assert_eq!(tree.descendants(tree.root()), vec![outer, inner, leaf, tail]);
        assert_eq!(tree.depth(leaf), 3);
    }

    #[test]
    fn test_detach_keeps_handle_live() {
        let mut tree = DomTree::new();
        let a = tree.create_element("div");
        tree.append_child(tree.root(), a).unwrap();
        assert!(tree.is_attached(a));

        assert_eq!(tree.detach(a).unwrap(), Some(tree.root()));
        assert!(tree.is_live(a));
        assert!(!tree.is_attached(a));
        assert_eq!(tree.children(tree.root()).count(), 0);
    }

    #[test]
    fn test_destroy_invalidates_recycled_slot() {
        let mut tree = DomTree::new();
        let a = tree.create_element("div");
        tree.append_child(tree.root(), a).unwrap();
        tree.destroy(a).unwrap();
        assert!(!tree.is_live(a));

        let b = tree.create_element("span");
        assert_eq!(b.index(), a.index());
        assert_ne!(a, b);
        assert!(tree.get(a).is_none());
        assert!(tree.get(b).is_some());
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        tree.append_child(outer, inner).unwrap();
        assert_eq!(
            tree.append_child(inner, outer),
            Err(DomError::HierarchyRequest { parent: inner, child: outer })
        );
        assert!(tree.append_child(outer, outer).is_err());
    }

    #[test]
    fn test_text_cannot_have_children() {
        let mut tree = DomTree::new();
        let text = tree.create_text("entry");
        let span = tree.create_element("span");
        assert_eq!(tree.append_child(text, span), Err(DomError::NotAContainer(text)));
    }

    #[test]
    fn test_root_removal_rejected() {
        let mut tree = DomTree::new();
        assert_eq!(tree.detach(NodeId::ROOT), Err(DomError::RootRemoval));
    }
}
