//! Dynamic content observer
//!
//! Watches a container's child list. Each delivered batch is classified once,
//! handed to the caller's callback, optionally announced, and may schedule a
//! deferred focus move to the first newly inserted tabbable element. The
//! deferred move is a single cancellable slot: a newer batch or teardown
//! cancels it before it can fire.

use std::fmt;
use std::time::Duration;

use jot_dom::{MutationRecord, NodeId, SubscriptionId};

use crate::announce::{Announcer, Politeness};
use crate::host::validate_container;
use crate::tabbable::{is_tabbable, tabbable};
use crate::timers::Deferred;
use crate::{A11yError, FocusHost};

/// Default layout settle time before auto-focus
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Shape of one mutation batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    /// Both additions and removals, or neither
    Updated,
}

/// Classified batch as seen by callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub kind: ChangeKind,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl ContentChange {
    pub fn classify(records: &[MutationRecord]) -> Self {
        let added: Vec<NodeId> = records.iter().flat_map(|r| r.added_nodes.iter().copied()).collect();
        let removed: Vec<NodeId> = records.iter().flat_map(|r| r.removed_nodes.iter().copied()).collect();
        let kind = match (added.is_empty(), removed.is_empty()) {
            (false, true) => ChangeKind::Added,
            (true, false) => ChangeKind::Removed,
            _ => ChangeKind::Updated,
        };
        Self { kind, added, removed }
    }

    fn message(&self) -> String {
        match self.kind {
            ChangeKind::Added => plural(self.added.len(), "new item added", "new items added"),
            ChangeKind::Removed => plural(self.removed.len(), "item removed", "items removed"),
            ChangeKind::Updated => "Content updated".to_string(),
        }
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 { format!("1 {one}") } else { format!("{n} {many}") }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentObserverOptions {
    /// Move focus to newly inserted tabbable content
    pub auto_focus: bool,
    pub settle_delay: Duration,
    /// Emit a change announcement per batch
    pub announce: bool,
}

impl Default for ContentObserverOptions {
    fn default() -> Self {
        Self { auto_focus: false, settle_delay: DEFAULT_SETTLE_DELAY, announce: false }
    }
}

pub type ChangeCallback = Box<dyn FnMut(&ContentChange)>;

/// Observer bound to one container
pub struct ContentObserver {
    container: NodeId,
    subscription: Option<SubscriptionId>,
    options: ContentObserverOptions,
    /// Container has rendered content at least once
    rendered: bool,
    error_state: bool,
    pending: Deferred<NodeId>,
    on_change: Option<ChangeCallback>,
}

impl ContentObserver {
    pub fn attach<H: FocusHost + ?Sized>(
        host: &mut H,
        container: NodeId,
        options: ContentObserverOptions,
    ) -> Result<Self, A11yError> {
        validate_container(&*host, container)?;
        let rendered = !host.children(container).is_empty();
        let subscription = host.observe_children(container);
        tracing::debug!("observing {} (auto_focus: {})", container, options.auto_focus);
        Ok(Self {
            container,
            subscription: Some(subscription),
            options,
            rendered,
            error_state: false,
            pending: Deferred::new(),
            on_change: None,
        })
    }

    /// Callback invoked with every classified batch
    pub fn on_change(mut self, callback: impl FnMut(&ContentChange) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    pub fn options(&self) -> ContentObserverOptions {
        self.options
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Announcements become assertive while set
    pub fn set_error_state(&mut self, error: bool) {
        self.error_state = error;
    }

    pub fn is_error_state(&self) -> bool {
        self.error_state
    }

    /// Deadline of the scheduled focus move
    pub fn pending_deadline(&self) -> Option<Duration> {
        self.pending.deadline()
    }

    /// Process one delivered batch at time `now`. Returns `None` once the
    /// observer has been cleaned up.
    pub fn handle_batch<H: FocusHost + ?Sized>(
        &mut self,
        host: &H,
        records: &[MutationRecord],
        now: Duration,
        announcer: &mut dyn Announcer,
    ) -> Option<ChangeKind> {
        self.subscription?;

        let change = ContentChange::classify(records);
        tracing::trace!(
            "{}: {:?} (+{} -{})",
            self.container,
            change.kind,
            change.added.len(),
            change.removed.len()
        );

        if let Some(callback) = self.on_change.as_mut() {
            callback(&change);
        }

        if self.pending.cancel().is_some() {
            tracing::debug!("{}: pending auto-focus superseded", self.container);
        }

        if self.options.auto_focus && self.rendered {
            if let Some(target) = self.first_added_tabbable(host, &change.added) {
                let due = now + self.options.settle_delay;
                self.pending.schedule(due, target);
                tracing::debug!("{}: auto-focus {} scheduled at {:?}", self.container, target, due);
            }
        }
        if !change.added.is_empty() {
            self.rendered = true;
        }

        if self.options.announce {
            let politeness = if self.error_state { Politeness::Assertive } else { Politeness::Polite };
            announcer.announce(&change.message(), politeness);
        }

        Some(change.kind)
    }

    fn first_added_tabbable<H: FocusHost + ?Sized>(&self, host: &H, added: &[NodeId]) -> Option<NodeId> {
        if added.is_empty() {
            return None;
        }
        tabbable(host, self.container)
            .into_iter()
            .find(|&n| added.iter().any(|&a| host.contains(a, n)))
    }

    /// Fire the deferred focus move if due. The target is re-checked first:
    /// it must still be attached and tabbable inside an attached container.
    pub fn poll<H: FocusHost + ?Sized>(&mut self, host: &mut H, now: Duration) -> Option<NodeId> {
        let target = self.pending.take_due(now)?;
        if !host.is_attached(self.container) || !is_tabbable(&*host, self.container, target) {
            tracing::debug!("{}: auto-focus target {} no longer reachable", self.container, target);
            return None;
        }
        host.focus(target).then_some(target)
    }

    /// Disconnect the subscription, then cancel the pending focus move
    pub fn cleanup<H: FocusHost + ?Sized>(&mut self, host: &mut H) {
        if let Some(subscription) = self.subscription.take() {
            host.disconnect(subscription);
            tracing::debug!("stopped observing {}", self.container);
        }
        self.pending.cancel();
        self.on_change = None;
    }
}

impl Drop for ContentObserver {
    fn drop(&mut self) {
        self.pending.cancel();
    }
}

impl fmt::Debug for ContentObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentObserver")
            .field("container", &self.container)
            .field("subscription", &self.subscription)
            .field("options", &self.options)
            .field("rendered", &self.rendered)
            .field("error_state", &self.error_state)
            .field("pending", &self.pending)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnnouncementQueue;
    use jot_dom::Document;
    use std::cell::RefCell;
    use std::rc::Rc;

    const MS: Duration = Duration::from_millis(1);

    fn setup(initial: usize) -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let body = doc.body();
        let list = doc.create_element("div");
        doc.append_child(body, list).unwrap();
        let items = (0..initial).map(|_| add_button(&mut doc, list)).collect();
        (doc, list, items)
    }

    fn add_button(doc: &mut Document, parent: NodeId) -> NodeId {
        let b = doc.create_element("button");
        doc.append_child(parent, b).unwrap();
        b
    }

    fn deliver(doc: &mut Document, observer: &mut ContentObserver, now: Duration, q: &mut AnnouncementQueue) -> Option<ChangeKind> {
        let batches = doc.take_batches();
        let batch = batches.into_iter().find(|b| Some(b.subscription) == observer.subscription())?;
        observer.handle_batch(&*doc, &batch.records, now, q)
    }

    fn auto_focus() -> ContentObserverOptions {
        ContentObserverOptions { auto_focus: true, ..Default::default() }
    }

    #[test]
    fn test_classify() {
        let a = ContentChange::classify(&[MutationRecord::added(NodeId::ROOT, NodeId::ROOT, None, None)]);
        assert_eq!(a.kind, ChangeKind::Added);
        let r = ContentChange::classify(&[MutationRecord::removed(NodeId::ROOT, NodeId::ROOT, None, None)]);
        assert_eq!(r.kind, ChangeKind::Removed);
        assert_eq!(ContentChange::classify(&[]).kind, ChangeKind::Updated);
        let both = ContentChange::classify(&[
            MutationRecord::added(NodeId::ROOT, NodeId::ROOT, None, None),
            MutationRecord::removed(NodeId::ROOT, NodeId::ROOT, None, None),
        ]);
        assert_eq!(both.kind, ChangeKind::Updated);
    }

    #[test]
    fn test_auto_focus_after_settle_delay() {
        let (mut doc, list, items) = setup(1);
        doc.focus(items[0]);
        let mut q = AnnouncementQueue::new();
        let mut observer = ContentObserver::attach(&mut doc, list, auto_focus()).unwrap();

        let b = add_button(&mut doc, list);
        let c = add_button(&mut doc, list);
        assert_eq!(deliver(&mut doc, &mut observer, MS * 10, &mut q), Some(ChangeKind::Added));
        assert_eq!(observer.pending_deadline(), Some(MS * 110));

        assert_eq!(observer.poll(&mut doc, MS * 109), None);
        assert_eq!(doc.active_element(), Some(items[0]));
        assert_eq!(observer.poll(&mut doc, MS * 110), Some(b));
        assert_eq!(doc.active_element(), Some(b));
        assert_ne!(doc.active_element(), Some(c));
    }

    #[test]
    fn test_cleanup_cancels_pending_focus() {
        let (mut doc, list, items) = setup(1);
        doc.focus(items[0]);
        let mut q = AnnouncementQueue::new();
        let mut observer = ContentObserver::attach(&mut doc, list, auto_focus()).unwrap();

        add_button(&mut doc, list);
        add_button(&mut doc, list);
        deliver(&mut doc, &mut observer, MS * 0, &mut q);
        observer.cleanup(&mut doc);

        assert_eq!(observer.poll(&mut doc, MS * 500), None);
        assert_eq!(doc.active_element(), Some(items[0]));
        assert_eq!(doc.observer_count(), 0);

        // Later batches are ignored entirely
        add_button(&mut doc, list);
        assert!(doc.take_batches().is_empty());
        assert_eq!(observer.handle_batch(&doc, &[], MS * 600, &mut q), None);
    }

    #[test]
    fn test_newer_batch_supersedes() {
        let (mut doc, list, _) = setup(1);
        let mut q = AnnouncementQueue::new();
        let mut observer = ContentObserver::attach(&mut doc, list, auto_focus()).unwrap();

        let first = add_button(&mut doc, list);
        deliver(&mut doc, &mut observer, MS * 0, &mut q);
        let second = add_button(&mut doc, list);
        deliver(&mut doc, &mut observer, MS * 50, &mut q);

        assert_eq!(observer.poll(&mut doc, MS * 100), None);
        assert_eq!(observer.poll(&mut doc, MS * 150), Some(second));
        assert_ne!(doc.active_element(), Some(first));

        // A removal-only batch cancels without rescheduling
        add_button(&mut doc, list);
        deliver(&mut doc, &mut observer, MS * 200, &mut q);
        doc.remove_child(first).unwrap();
        assert_eq!(deliver(&mut doc, &mut observer, MS * 210, &mut q), Some(ChangeKind::Removed));
        assert_eq!(observer.pending_deadline(), None);
    }

    #[test]
    fn test_first_render_never_auto_focuses() {
        let (mut doc, list, _) = setup(0);
        let mut q = AnnouncementQueue::new();
        let mut observer = ContentObserver::attach(&mut doc, list, auto_focus()).unwrap();

        add_button(&mut doc, list);
        deliver(&mut doc, &mut observer, MS * 0, &mut q);
        assert_eq!(observer.pending_deadline(), None);

        let later = add_button(&mut doc, list);
        deliver(&mut doc, &mut observer, MS * 10, &mut q);
        assert_eq!(observer.poll(&mut doc, MS * 110), Some(later));
    }

    #[test]
    fn test_target_removed_before_delay() {
        let (mut doc, list, items) = setup(1);
        doc.focus(items[0]);
        let mut q = AnnouncementQueue::new();
        let mut observer = ContentObserver::attach(&mut doc, list, auto_focus()).unwrap();

        let b = add_button(&mut doc, list);
        deliver(&mut doc, &mut observer, MS * 0, &mut q);
        doc.set_attribute(b, "disabled", "").unwrap();
        assert_eq!(observer.poll(&mut doc, MS * 100), None);
        assert_eq!(doc.active_element(), Some(items[0]));
    }

    #[test]
    fn test_nested_focusable_in_added_subtree() {
        let (mut doc, list, _) = setup(1);
        let mut q = AnnouncementQueue::new();
        let mut observer = ContentObserver::attach(&mut doc, list, auto_focus()).unwrap();

        let card = doc.create_element("article");
        let edit = doc.create_element("button");
        doc.append_child(card, edit).unwrap();
        doc.append_child(list, card).unwrap();
        deliver(&mut doc, &mut observer, MS * 0, &mut q);
        assert_eq!(observer.poll(&mut doc, MS * 100), Some(edit));
    }

    #[test]
    fn test_callback_and_announcements() {
        let (mut doc, list, items) = setup(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let options = ContentObserverOptions { announce: true, ..Default::default() };
        let mut observer = ContentObserver::attach(&mut doc, list, options)
            .unwrap()
            .on_change(move |change| sink.borrow_mut().push(change.clone()));
        let mut q = AnnouncementQueue::new();

        let a = add_button(&mut doc, list);
        add_button(&mut doc, list);
        deliver(&mut doc, &mut observer, MS * 0, &mut q);
        observer.set_error_state(true);
        doc.remove_child(items[0]).unwrap();
        deliver(&mut doc, &mut observer, MS * 0, &mut q);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].kind, ChangeKind::Added);
        assert_eq!(seen[0].added[0], a);
        assert_eq!(seen[1].removed, vec![items[0]]);

        let first = q.next().unwrap();
        assert_eq!(first.message, "1 item removed");
        assert_eq!(first.politeness, Politeness::Assertive);
        let second = q.next().unwrap();
        assert_eq!(second.message, "2 new items added");
        assert_eq!(second.politeness, Politeness::Polite);
    }

    #[test]
    fn test_attach_requires_attached_container() {
        let mut doc = Document::new();
        let list = doc.create_element("div");
        let err = ContentObserver::attach(&mut doc, list, ContentObserverOptions::default()).unwrap_err();
        assert_eq!(err, A11yError::DetachedContainer(list));
    }
}
