//! Mutation observers
//!
//! Child-list mutations are queued per subscription and handed out together by
//! [`MutationObservers::take_batches`], so several writes from one logical
//! update reach the observer as a single batch.

use crate::{DomTree, NodeId};

/// Subscription handle returned by `observe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Mutation observer options
#[derive(Debug, Clone, Copy)]
pub struct ObserverOptions {
    pub child_list: bool,
    pub subtree: bool,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self { child_list: true, subtree: false }
    }
}

impl ObserverOptions {
    /// Child-list changes anywhere under the target
    pub fn subtree() -> Self {
        Self { child_list: true, subtree: true }
    }
}

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Node whose child list changed
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

impl MutationRecord {
    pub fn added(target: NodeId, node: NodeId, previous_sibling: Option<NodeId>, next_sibling: Option<NodeId>) -> Self {
        Self { target, added_nodes: vec![node], removed_nodes: Vec::new(), previous_sibling, next_sibling }
    }

    pub fn removed(target: NodeId, node: NodeId, previous_sibling: Option<NodeId>, next_sibling: Option<NodeId>) -> Self {
        Self { target, added_nodes: Vec::new(), removed_nodes: vec![node], previous_sibling, next_sibling }
    }
}

/// Records coalesced for one subscription
#[derive(Debug, Clone)]
pub struct MutationBatch {
    pub subscription: SubscriptionId,
    pub records: Vec<MutationRecord>,
}

#[derive(Debug)]
struct Registration {
    id: SubscriptionId,
    target: NodeId,
    options: ObserverOptions,
    pending: Vec<MutationRecord>,
}

/// All mutation subscriptions of a document
#[derive(Debug, Default)]
pub struct MutationObservers {
    next_id: u64,
    registrations: Vec<Registration>,
}

impl MutationObservers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing `target`
    pub fn observe(&mut self, target: NodeId, options: ObserverOptions) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.registrations.push(Registration { id, target, options, pending: Vec::new() });
        tracing::trace!("observe {} as subscription {}", target, id.0);
        id
    }

    /// Stop observing. Undelivered records are discarded.
    pub fn disconnect(&mut self, id: SubscriptionId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        before != self.registrations.len()
    }

    pub fn is_observing(&self, id: SubscriptionId) -> bool {
        self.registrations.iter().any(|r| r.id == id)
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Queue a record for every subscription interested in its target
    pub fn enqueue(&mut self, tree: &DomTree, record: MutationRecord) {
        for reg in &mut self.registrations {
            if !reg.options.child_list {
                continue;
            }
            let interested = reg.target == record.target
                || (reg.options.subtree && tree.contains(reg.target, record.target));
            if interested {
                reg.pending.push(record.clone());
            }
        }
    }

    /// Any undelivered records
    pub fn has_pending(&self) -> bool {
        self.registrations.iter().any(|r| !r.pending.is_empty())
    }

    /// Drain every non-empty queue, one batch per subscription
    pub fn take_batches(&mut self) -> Vec<MutationBatch> {
        self.registrations.iter_mut()
            .filter(|r| !r.pending.is_empty())
            .map(|r| MutationBatch { subscription: r.id, records: std::mem::take(&mut r.pending) })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_coalesce_into_one_batch() {
        let mut tree = DomTree::new();
        let list = tree.create_element("ul");
        tree.append_child(tree.root(), list).unwrap();
        let a = tree.create_element("li");
        let b = tree.create_element("li");

        let mut observers = MutationObservers::new();
        let id = observers.observe(list, ObserverOptions::default());
        observers.enqueue(&tree, MutationRecord::added(list, a, None, None));
        observers.enqueue(&tree, MutationRecord::added(list, b, Some(a), None));

        let batches = observers.take_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].subscription, id);
        assert_eq!(batches[0].records.len(), 2);
        assert!(!observers.has_pending());
    }

    #[test]
    fn test_subtree_option() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("section");
        let inner = tree.create_element("div");
        tree.append_child(tree.root(), outer).unwrap();
        tree.append_child(outer, inner).unwrap();
        let leaf = tree.create_element("button");

        let mut observers = MutationObservers::new();
        let direct = observers.observe(outer, ObserverOptions::default());
        let deep = observers.observe(outer, ObserverOptions::subtree());
        observers.enqueue(&tree, MutationRecord::added(inner, leaf, None, None));

        let batches = observers.take_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].subscription, deep);
        assert!(observers.is_observing(direct));
    }

    #[test]
    fn test_disconnect_discards_pending() {
        let mut tree = DomTree::new();
        let list = tree.create_element("ul");
        let item = tree.create_element("li");
        tree.append_child(tree.root(), list).unwrap();

        let mut observers = MutationObservers::new();
        let id = observers.observe(list, ObserverOptions::default());
        observers.enqueue(&tree, MutationRecord::added(list, item, None, None));
        assert!(observers.disconnect(id));
        assert!(!observers.disconnect(id));
        assert!(observers.take_batches().is_empty());
    }
}
