//! One-shot completion tokens handed to interaction hooks.
//!
//! A [`Completion`] is minted for every present or dismiss transition and
//! carries a ticket identifying that exact transition. Signalling it reports
//! the native transition as finished. Tokens refer to the manager weakly, so
//! a token that outlives its manager, or whose instance was destroyed or
//! invalidated in the meantime, signals into nothing.

use std::{
    fmt,
    rc::{Rc, Weak},
};

use modal_ids::ModalId;
use tracing::trace;

/// Which transition a completion finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// `Presenting` → `Presented`.
    Present,
    /// `Dismissing` → `Destroyed`.
    Dismiss,
}

/// Identifies one in-flight transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket {
    /// Instance the transition belongs to.
    pub(crate) id: ModalId,
    /// Manager-wide sequence number; never reused.
    pub(crate) seq: u64,
    /// Transition being completed.
    pub(crate) kind: TransitionKind,
}

/// Receiver of completion signals, implemented by the manager core.
pub(crate) trait CompletionSink {
    /// The transition identified by `ticket` finished.
    fn complete(&self, ticket: Ticket);
    /// The token for `ticket` was dropped without being signalled.
    fn abandoned(&self, ticket: Ticket);
}

/// Completion signal for one native transition.
///
/// Must be signalled exactly once, on the owner thread, whether or not the
/// visual transition succeeded. [`Completion::signal`] consumes the token, so
/// a second signal cannot be expressed; the type is neither `Clone` nor
/// `Send`. A token dropped without signalling leaves its instance in the
/// transitional state and is logged as a warning.
pub struct Completion {
    /// Transition this token completes.
    ticket: Ticket,
    /// Manager core, if still alive.
    sink: Weak<dyn CompletionSink>,
    /// Set once `signal` ran.
    signalled: bool,
}

impl Completion {
    /// Mint a token for `ticket`.
    pub(crate) fn new(ticket: Ticket, sink: Weak<dyn CompletionSink>) -> Self {
        Self {
            ticket,
            sink,
            signalled: false,
        }
    }

    /// Identity of the modal this transition belongs to.
    pub fn id(&self) -> ModalId {
        self.ticket.id
    }

    /// Transition this token finishes.
    pub fn kind(&self) -> TransitionKind {
        self.ticket.kind
    }

    /// Report the native transition as finished.
    pub fn signal(mut self) {
        self.signalled = true;
        let ticket = self.ticket;
        match self.sink.upgrade() {
            Some(sink) => sink.complete(ticket),
            None => trace!(id = %ticket.id, "completion after manager teardown discarded"),
        }
    }

    /// A token whose manager is already gone; signalling it does nothing.
    pub fn detached(id: ModalId, kind: TransitionKind) -> Self {
        let sink: Weak<dyn CompletionSink> = Weak::<Detached>::new();
        Self::new(Ticket { id, seq: 0, kind }, sink)
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.signalled {
            return;
        }
        if let Some(sink) = self.sink.upgrade() {
            sink.abandoned(self.ticket);
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("id", &self.ticket.id)
            .field("kind", &self.ticket.kind)
            .field("seq", &self.ticket.seq)
            .finish_non_exhaustive()
    }
}

/// Placeholder sink type for detached tokens.
struct Detached;

impl CompletionSink for Detached {
    fn complete(&self, _ticket: Ticket) {}
    fn abandoned(&self, _ticket: Ticket) {}
}

/// Adapt a strong sink into the weak reference stored in tokens.
pub(crate) fn weak_sink<S: CompletionSink + 'static>(sink: &Rc<S>) -> Weak<dyn CompletionSink> {
    let weak: Weak<S> = Rc::downgrade(sink);
    weak
}
