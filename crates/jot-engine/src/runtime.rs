//! Focus runtime - owns the document and routes events to controllers

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use jot_a11y::history::{self, RestoreOutcome, SharedHistory};
use jot_a11y::{
    Announcement, AnnouncementQueue, ContentChange, ContentObserver, ContentObserverOptions,
    FocusTrap, KeyDisposition, Orientation, RovingTabindex, TrapOptions, TrapState, tabbable,
};
use jot_dom::{Document, KeyboardEvent, ListenerId, NodeId};

use crate::{Clock, Config, EngineError, SystemClock};

macro_rules! controller_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

controller_id!(TrapId, "trap");
controller_id!(RovingId, "roving");
controller_id!(ObserverId, "observer");

/// Owner of a key listener
#[derive(Debug, Clone, Copy)]
enum KeyTarget {
    Trap(TrapId),
    Roving(RovingId),
}

/// Event loop for the focus core
pub struct FocusRuntime<C: Clock = SystemClock> {
    document: Document,
    config: Config,
    clock: C,
    history: SharedHistory,
    announcements: AnnouncementQueue,
    traps: BTreeMap<TrapId, FocusTrap>,
    rovings: BTreeMap<RovingId, RovingTabindex>,
    observers: BTreeMap<ObserverId, ContentObserver>,
    next_id: u64,
}

impl FocusRuntime<SystemClock> {
    /// Runtime on the wall clock
    pub fn new(config: Config) -> Result<Self, EngineError> {
        Self::with_clock(config, SystemClock::new())
    }

    /// Sleep until each pending auto-focus is due and fire it. Returns the
    /// elements that received focus, once nothing is scheduled.
    pub async fn run_timers(&mut self) -> Vec<NodeId> {
        let mut focused = Vec::new();
        while let Some(deadline) = self.next_deadline() {
            let now = self.clock.now();
            if deadline > now {
                smol::Timer::after(deadline - now).await;
            }
            focused.extend(self.tick());
        }
        focused
    }
}

impl<C: Clock> FocusRuntime<C> {
    pub fn with_clock(config: Config, clock: C) -> Result<Self, EngineError> {
        config.validate()?;
        let history = history::global();
        history.borrow_mut().set_warn_depth(config.history_warn_depth);
        tracing::info!("Jot focus runtime {} initialized", crate::VERSION);

        Ok(Self {
            document: Document::new(),
            config,
            clock,
            history,
            announcements: AnnouncementQueue::new(),
            traps: BTreeMap::new(),
            rovings: BTreeMap::new(),
            observers: BTreeMap::new(),
            next_id: 0,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Restoration stack shared by every trap of this runtime
    pub fn history(&self) -> SharedHistory {
        self.history.clone()
    }

    pub fn announcements(&mut self) -> &mut AnnouncementQueue {
        &mut self.announcements
    }

    /// Drain pending announcements in delivery order
    pub fn take_announcements(&mut self) -> Vec<Announcement> {
        self.announcements.drain()
    }

    fn next_raw_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // ------------------------------------------------------------------
    // Focus traps
    // ------------------------------------------------------------------

    pub fn create_trap(&mut self, container: NodeId) -> Result<TrapId, EngineError> {
        self.create_trap_with(container, TrapOptions::default())
    }

    pub fn create_trap_with(&mut self, container: NodeId, options: TrapOptions) -> Result<TrapId, EngineError> {
        let trap = FocusTrap::with_options(&self.document, container, options, self.history.clone())?;
        let id = TrapId(self.next_raw_id());
        self.traps.insert(id, trap);
        tracing::debug!("{} created over {}", id, container);
        Ok(id)
    }

    pub fn activate_trap(&mut self, id: TrapId, focus_first: bool) -> Result<(), EngineError> {
        let trap = self.traps.get_mut(&id).ok_or_else(|| EngineError::UnknownController(id.to_string()))?;
        trap.activate(&mut self.document, focus_first);
        Ok(())
    }

    pub fn deactivate_trap(&mut self, id: TrapId, restore: bool) -> Result<Option<RestoreOutcome>, EngineError> {
        let trap = self.traps.get_mut(&id).ok_or_else(|| EngineError::UnknownController(id.to_string()))?;
        Ok(trap.deactivate(&mut self.document, restore))
    }

    pub fn trap_state(&self, id: TrapId) -> Result<TrapState, EngineError> {
        self.traps.get(&id)
            .map(FocusTrap::state)
            .ok_or_else(|| EngineError::UnknownController(id.to_string()))
    }

    /// Deactivate (optionally restoring focus) and forget the trap
    pub fn remove_trap(&mut self, id: TrapId, restore: bool) -> Result<Option<RestoreOutcome>, EngineError> {
        let mut trap = self.traps.remove(&id).ok_or_else(|| EngineError::UnknownController(id.to_string()))?;
        Ok(trap.deactivate(&mut self.document, restore))
    }

    // ------------------------------------------------------------------
    // Roving tabindex
    // ------------------------------------------------------------------

    /// Mount a roving controller; `None` uses the configured orientation
    pub fn mount_roving(&mut self, container: NodeId, orientation: Option<Orientation>) -> Result<RovingId, EngineError> {
        let orientation = orientation.unwrap_or(self.config.default_orientation);
        let roving = RovingTabindex::mount(&mut self.document, container, orientation)?;
        let id = RovingId(self.next_raw_id());
        self.rovings.insert(id, roving);
        Ok(id)
    }

    pub fn roving(&self, id: RovingId) -> Result<&RovingTabindex, EngineError> {
        self.rovings.get(&id).ok_or_else(|| EngineError::UnknownController(id.to_string()))
    }

    pub fn unmount_roving(&mut self, id: RovingId) -> Result<(), EngineError> {
        let mut roving = self.rovings.remove(&id).ok_or_else(|| EngineError::UnknownController(id.to_string()))?;
        roving.cleanup(&mut self.document);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Content observers
    // ------------------------------------------------------------------

    /// Observer options derived from the configuration
    pub fn content_options(&self, auto_focus: bool) -> ContentObserverOptions {
        ContentObserverOptions {
            auto_focus,
            settle_delay: self.config.settle_delay(),
            announce: self.config.announce_changes,
        }
    }

    pub fn observe_content(&mut self, container: NodeId, auto_focus: bool) -> Result<ObserverId, EngineError> {
        let options = self.content_options(auto_focus);
        let observer = ContentObserver::attach(&mut self.document, container, options)?;
        Ok(self.insert_observer(observer))
    }

    pub fn observe_content_with(
        &mut self,
        container: NodeId,
        options: ContentObserverOptions,
        on_change: impl FnMut(&ContentChange) + 'static,
    ) -> Result<ObserverId, EngineError> {
        let observer = ContentObserver::attach(&mut self.document, container, options)?.on_change(on_change);
        Ok(self.insert_observer(observer))
    }

    fn insert_observer(&mut self, observer: ContentObserver) -> ObserverId {
        let id = ObserverId(self.next_raw_id());
        self.observers.insert(id, observer);
        id
    }

    pub fn set_observer_error_state(&mut self, id: ObserverId, error: bool) -> Result<(), EngineError> {
        let observer = self.observers.get_mut(&id).ok_or_else(|| EngineError::UnknownController(id.to_string()))?;
        observer.set_error_state(error);
        Ok(())
    }

    /// Disconnect the observer and cancel its pending focus move
    pub fn cleanup_observer(&mut self, id: ObserverId) -> Result<(), EngineError> {
        let mut observer = self.observers.remove(&id).ok_or_else(|| EngineError::UnknownController(id.to_string()))?;
        observer.cleanup(&mut self.document);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Event routing
    // ------------------------------------------------------------------

    fn key_target(&self, listener: ListenerId) -> Option<KeyTarget> {
        self.traps.iter()
            .find(|(_, t)| t.listener() == Some(listener))
            .map(|(&id, _)| KeyTarget::Trap(id))
            .or_else(|| {
                self.rovings.iter()
                    .find(|(_, r)| r.listener() == Some(listener))
                    .map(|(&id, _)| KeyTarget::Roving(id))
            })
    }

    /// Deliver a keydown. Controllers listening for the focused element see it
    /// first; when none handles it, Tab and Shift+Tab move through the
    /// document's tab order, wrapping at the ends.
    pub fn dispatch_key(&mut self, event: &mut KeyboardEvent) -> KeyDisposition {
        for listener in self.document.key_listeners_for_focus() {
            let disposition = match self.key_target(listener) {
                Some(KeyTarget::Trap(id)) => match self.traps.get_mut(&id) {
                    Some(trap) => trap.handle_key(&mut self.document, event),
                    None => KeyDisposition::Ignored,
                },
                Some(KeyTarget::Roving(id)) => match self.rovings.get_mut(&id) {
                    Some(roving) => roving.handle_key(&mut self.document, event),
                    None => KeyDisposition::Ignored,
                },
                None => KeyDisposition::Ignored,
            };
            if disposition.is_handled() {
                return disposition;
            }
        }

        if event.is_tab() && !event.is_default_prevented() {
            self.sequential_navigation(event.modifiers.shift);
        }
        KeyDisposition::Ignored
    }

    fn sequential_navigation(&mut self, backwards: bool) {
        let order = tabbable(&self.document, self.document.body());
        if order.is_empty() {
            return;
        }
        let len = order.len();
        let current = self.document.active_element().and_then(|f| order.iter().position(|&n| n == f));
        let next = match (current, backwards) {
            (Some(i), false) => (i + 1) % len,
            (Some(i), true) => (i + len - 1) % len,
            (None, false) => 0,
            (None, true) => len - 1,
        };
        self.document.focus(order[next]);
    }

    /// Deliver queued mutation batches to their observers, then re-establish
    /// roving tab stops. Returns the number of batches delivered.
    pub fn flush_mutations(&mut self) -> usize {
        let batches = self.document.take_batches();
        let now = self.clock.now();
        let mut delivered = 0;

        for batch in &batches {
            let Some(observer) = self.observers.values_mut().find(|o| o.subscription() == Some(batch.subscription)) else {
                continue;
            };
            if observer.handle_batch(&self.document, &batch.records, now, &mut self.announcements).is_some() {
                delivered += 1;
            }
        }

        for roving in self.rovings.values_mut() {
            roving.refresh(&mut self.document);
        }
        delivered
    }

    /// Fire every deferred focus move that is due
    pub fn tick(&mut self) -> Vec<NodeId> {
        let now = self.clock.now();
        self.observers.values_mut()
            .filter_map(|o| o.poll(&mut self.document, now))
            .collect()
    }

    /// Earliest scheduled focus move
    pub fn next_deadline(&self) -> Option<Duration> {
        self.observers.values().filter_map(|o| o.pending_deadline()).min()
    }
}

impl<C: Clock> fmt::Debug for FocusRuntime<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusRuntime")
            .field("config", &self.config)
            .field("traps", &self.traps.len())
            .field("rovings", &self.rovings.len())
            .field("observers", &self.observers.len())
            .field("history", &self.history.borrow().len())
            .finish()
    }
}
