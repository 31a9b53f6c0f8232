//! Dismiss notification fan-out.
//!
//! Every modal that reaches `Destroyed` through the dismissal path produces
//! one [`ModalDismissed`]. Observers either register a callback with
//! [`crate::ModalHostManager::listen`] or pull from a buffered
//! [`DismissStream`]. Delivery is synchronous on the owner thread and happens
//! after the manager released its internal state, so callbacks may call back
//! into the manager.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::{Rc, Weak},
};

use modal_ids::ModalId;

/// A modal finished dismissing and has been destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModalDismissed {
    /// Identity of the dismissed modal.
    pub id: ModalId,
}

/// Bounded queue of undelivered events for one stream.
struct EventBuffer {
    /// Pending events, oldest first.
    events: VecDeque<ModalDismissed>,
    /// Events dropped because the buffer was full.
    lost_count: u64,
    /// Maximum number of pending events.
    capacity: usize,
}

impl EventBuffer {
    /// Empty buffer with room for `capacity` events.
    fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            lost_count: 0,
            capacity,
        }
    }

    /// Append an event, evicting the oldest one when full.
    fn push(&mut self, event: ModalDismissed) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.lost_count = self.lost_count.saturating_add(1);
        }
        self.events.push_back(event);
    }
}

/// Shared state of one stream.
struct StreamInner {
    /// Undelivered events.
    buffer: RefCell<EventBuffer>,
    /// Set when the hub goes away.
    closed: Cell<bool>,
}

/// Pull-based subscription to dismiss notifications.
///
/// Dropping the stream unsubscribes it.
pub struct DismissStream {
    /// Buffer shared with the hub.
    inner: Rc<StreamInner>,
}

impl DismissStream {
    /// Next undelivered event, if any.
    pub fn try_next(&self) -> Option<ModalDismissed> {
        self.inner.buffer.borrow_mut().events.pop_front()
    }

    /// All undelivered events, oldest first.
    pub fn drain(&self) -> Vec<ModalDismissed> {
        self.inner.buffer.borrow_mut().events.drain(..).collect()
    }

    /// Number of undelivered events.
    pub fn len(&self) -> usize {
        self.inner.buffer.borrow().events.len()
    }

    /// True when no events are waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events dropped because this stream's buffer overflowed.
    pub fn lost_count(&self) -> u64 {
        self.inner.buffer.borrow().lost_count
    }

    /// True once the manager that fed this stream is gone.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }
}

impl fmt::Debug for DismissStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DismissStream")
            .field("pending", &self.len())
            .field("lost_count", &self.lost_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Registered callback.
struct ListenerSlot {
    /// Callback invoked for every event.
    callback: Box<dyn Fn(&ModalDismissed)>,
}

/// Guard for a callback registered with [`crate::ModalHostManager::listen`].
///
/// The callback stays registered while the guard is alive.
#[must_use = "dropping the listener unsubscribes it"]
pub struct Listener {
    /// Keeps the slot alive; the hub only holds a weak reference.
    _slot: Rc<ListenerSlot>,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").finish_non_exhaustive()
    }
}

/// Fan-out of dismiss notifications to streams and callbacks.
pub(crate) struct DismissHub {
    /// Per-stream buffer capacity.
    capacity: usize,
    /// Subscribed streams.
    streams: RefCell<Vec<Weak<StreamInner>>>,
    /// Registered callbacks.
    listeners: RefCell<Vec<Weak<ListenerSlot>>>,
    /// Total events published.
    published: Cell<u64>,
}

impl DismissHub {
    /// Create a hub whose streams buffer up to `capacity` events.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            streams: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            published: Cell::new(0),
        }
    }

    /// Open a new buffered stream.
    pub(crate) fn subscribe(&self) -> DismissStream {
        let inner = Rc::new(StreamInner {
            buffer: RefCell::new(EventBuffer::new(self.capacity)),
            closed: Cell::new(false),
        });
        self.streams.borrow_mut().push(Rc::downgrade(&inner));
        DismissStream { inner }
    }

    /// Register a callback.
    pub(crate) fn listen(&self, callback: Box<dyn Fn(&ModalDismissed)>) -> Listener {
        let slot = Rc::new(ListenerSlot { callback });
        self.listeners.borrow_mut().push(Rc::downgrade(&slot));
        Listener { _slot: slot }
    }

    /// Total events published so far.
    pub(crate) fn published(&self) -> u64 {
        self.published.get()
    }

    /// Deliver `event` to every live stream and callback.
    pub(crate) fn publish(&self, event: ModalDismissed) {
        self.published.set(self.published.get().saturating_add(1));
        {
            let mut streams = self.streams.borrow_mut();
            streams.retain(|weak| match weak.upgrade() {
                Some(stream) => {
                    stream.buffer.borrow_mut().push(event);
                    true
                }
                None => false,
            });
        }
        // Callbacks may register or drop listeners, so call them on a snapshot.
        let live: Vec<Rc<ListenerSlot>> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|weak| weak.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for slot in live {
            (slot.callback)(&event);
        }
    }
}

impl Drop for DismissHub {
    fn drop(&mut self) {
        for weak in self.streams.borrow().iter() {
            if let Some(stream) = weak.upgrade() {
                stream.closed.set(true);
            }
        }
    }
}
