//! Seam between the manager and the host toolkit.

use crate::{Completion, ModalProps};

/// Abstraction over the host toolkit's native modal primitives.
///
/// All methods run on the owner (UI) thread. `allocate_surface`, `mount`,
/// `apply_props`, `unmount` and `release` run while the
/// [`crate::ModalHostManager`] holds its internal state mutably borrowed:
/// calling a manager method from them panics with a `RefCell` borrow error.
/// Signalling a [`Completion`] from them is allowed; the completion is queued
/// and applied before the current request returns (or discarded, if the
/// request was an invalidation).
pub trait NativePlatform {
    /// Native presentation surface of one modal (a retained, cheaply clonable handle).
    type Surface: Clone;
    /// The host's top-level container that modals are presented from.
    type Top;
    /// Declarative content mounted as the modal's body.
    type Content;

    /// Allocate a new surface. Allocation failure is fatal and may panic.
    fn allocate_surface(&self, props: &ModalProps) -> Self::Surface;

    /// Mount `content` as the body of `surface`.
    fn mount(&self, surface: &Self::Surface, content: Self::Content);

    /// Apply updated props to a mounted surface.
    fn apply_props(&self, surface: &Self::Surface, props: &ModalProps);

    /// Unmount the content and detach `surface` from the presentation hierarchy.
    fn unmount(&self, surface: &Self::Surface);

    /// Release the native resources of `surface`.
    fn release(&self, surface: Self::Surface);

    /// The current top-level container.
    fn top_container(&self) -> Self::Top;

    /// Native modal presentation transition. Must signal `done` exactly once.
    fn present_modal(&self, top: &Self::Top, surface: &Self::Surface, animated: bool, done: Completion);

    /// Native modal dismissal transition. Must signal `done` exactly once.
    fn dismiss_modal(&self, top: &Self::Top, surface: &Self::Surface, animated: bool, done: Completion);
}
