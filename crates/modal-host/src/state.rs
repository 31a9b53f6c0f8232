//! Lifecycle states, request dispositions and caller-side handles.

use std::{
    cell::Cell,
    fmt::{Display, Formatter, Result as FmtResult},
    rc::Rc,
};

use modal_ids::ModalId;

/// Lifecycle state of one modal instance.
///
/// `Created` is initial and `Destroyed` is terminal; see
/// [`crate::ModalHostManager`] for the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalState {
    /// Container allocated, not yet shown.
    Created,
    /// Presentation hook invoked, waiting for its completion.
    Presenting,
    /// Visible and interactive.
    Presented,
    /// Dismissal hook invoked, waiting for its completion.
    Dismissing,
    /// Torn down and removed from the registry.
    Destroyed,
}

impl ModalState {
    /// True while a hook completion is outstanding.
    pub fn in_flight(self) -> bool {
        matches!(self, Self::Presenting | Self::Dismissing)
    }

    /// True until the instance is destroyed.
    pub fn is_live(self) -> bool {
        self != Self::Destroyed
    }
}

impl Display for ModalState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Created => "created",
            Self::Presenting => "presenting",
            Self::Presented => "presented",
            Self::Dismissing => "dismissing",
            Self::Destroyed => "destroyed",
        };
        f.write_str(s)
    }
}

/// Why a lifecycle request was absorbed without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No live instance has this identity.
    NotRegistered,
    /// A live instance already holds this identity.
    AlreadyRegistered,
    /// The instance is not in a state that accepts the request.
    WrongState(ModalState),
    /// The bridge has been invalidated.
    Invalidated,
}

impl Display for IgnoreReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::NotRegistered => f.write_str("not registered"),
            Self::AlreadyRegistered => f.write_str("already registered"),
            Self::WrongState(state) => write!(f, "instance is {state}"),
            Self::Invalidated => f.write_str("bridge invalidated"),
        }
    }
}

/// Outcome of a lifecycle request.
///
/// Ignored requests are part of normal operation: declarative reconciliation
/// legitimately issues redundant requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The request started (or completed) a transition.
    Applied,
    /// The request was a no-op.
    Ignored(IgnoreReason),
}

impl Disposition {
    /// True when the request had an effect.
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Caller-side view of one modal instance, returned by
/// [`crate::ModalHostManager::create`].
///
/// The handle keeps observing the instance's state after it leaves the
/// registry, so `Destroyed` remains visible to the caller.
#[derive(Debug, Clone)]
pub struct ModalHandle {
    /// Identity of the instance.
    id: ModalId,
    /// State cell shared with the registry entry.
    state: Rc<Cell<ModalState>>,
}

impl ModalHandle {
    /// Create a handle in the given state along with the shared state cell.
    pub(crate) fn new(id: ModalId, state: ModalState) -> (Self, Rc<Cell<ModalState>>) {
        let cell = Rc::new(Cell::new(state));
        (
            Self {
                id,
                state: cell.clone(),
            },
            cell,
        )
    }

    /// Build a handle observing an existing state cell.
    pub(crate) fn observe(id: ModalId, state: Rc<Cell<ModalState>>) -> Self {
        Self { id, state }
    }

    /// Identity of the instance.
    pub fn id(&self) -> ModalId {
        self.id
    }

    /// Current state of the instance.
    pub fn state(&self) -> ModalState {
        self.state.get()
    }

    /// True once the instance reached `Destroyed`.
    pub fn is_destroyed(&self) -> bool {
        !self.state().is_live()
    }
}
