//! In-memory platform adapter.
//!
//! [`HeadlessPlatform`] implements [`NativePlatform`] without a windowing
//! system. It records every native call, keeps a stack of visible surfaces,
//! and queues native transitions until the host pumps them with
//! [`HeadlessPlatform::complete_next`] or [`HeadlessPlatform::complete_all`],
//! which makes asynchronous and late completion deterministic. It backs
//! `modalctl` and the test suites.

use std::{
    cell::{Cell, RefCell},
    collections::{HashSet, VecDeque},
    fmt::{Display, Formatter, Result as FmtResult},
};

use modal_ids::ModalId;
use tracing::trace;

use crate::{Completion, ModalProps, NativePlatform, TransitionKind};

/// Identifier of a headless surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Raw identifier value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for SurfaceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "surface-{}", self.0)
    }
}

/// Container a modal is presented from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessTop {
    /// The application's root container.
    Root,
    /// The topmost visible modal surface.
    Surface(SurfaceId),
}

/// One recorded native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    /// Surface allocated with the given props.
    Allocate(SurfaceId, ModalProps),
    /// Content mounted into a surface.
    Mount(SurfaceId, String),
    /// Props applied to a mounted surface.
    ApplyProps(SurfaceId, ModalProps),
    /// Surface detached and content unmounted.
    Unmount(SurfaceId),
    /// Surface released.
    Release(SurfaceId),
    /// Native present transition started.
    Present {
        /// Target surface.
        surface: SurfaceId,
        /// Container presented from.
        top: HeadlessTop,
        /// Animation flag.
        animated: bool,
    },
    /// Native dismiss transition started.
    Dismiss {
        /// Target surface.
        surface: SurfaceId,
        /// Animation flag.
        animated: bool,
    },
}

/// A native transition waiting to be completed.
struct Queued {
    /// Surface being transitioned.
    surface: SurfaceId,
    /// Token to signal once the transition is pumped.
    done: Completion,
}

/// Mutable platform state.
#[derive(Default)]
struct Inner {
    /// Next surface identifier.
    next_surface: u64,
    /// Call log, oldest first.
    calls: Vec<NativeCall>,
    /// Transitions waiting for completion, oldest first.
    queue: VecDeque<Queued>,
    /// Presented surfaces, bottom to top.
    visible: Vec<SurfaceId>,
    /// Surfaces with mounted content.
    mounted: HashSet<SurfaceId>,
    /// Surfaces allocated and not yet released.
    live: HashSet<SurfaceId>,
}

/// Headless implementation of [`NativePlatform`].
#[derive(Default)]
pub struct HeadlessPlatform {
    /// Platform state.
    inner: RefCell<Inner>,
    /// Complete transitions synchronously inside `present_modal`/`dismiss_modal`.
    auto_complete: Cell<bool>,
}

impl HeadlessPlatform {
    /// Create a platform that queues transitions until pumped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a platform that completes every transition immediately.
    pub fn auto_completing() -> Self {
        let platform = Self::default();
        platform.auto_complete.set(true);
        platform
    }

    /// Toggle immediate completion for subsequent transitions.
    pub fn set_auto_complete(&self, on: bool) {
        self.auto_complete.set(on);
    }

    /// Copy of the call log.
    pub fn calls(&self) -> Vec<NativeCall> {
        self.inner.borrow().calls.clone()
    }

    /// Remove and return the call log.
    pub fn take_calls(&self) -> Vec<NativeCall> {
        self.inner.borrow_mut().calls.drain(..).collect()
    }

    /// Number of recorded native present transitions.
    pub fn present_calls(&self) -> usize {
        self.count_calls(|c| matches!(c, NativeCall::Present { .. }))
    }

    /// Number of recorded native dismiss transitions.
    pub fn dismiss_calls(&self) -> usize {
        self.count_calls(|c| matches!(c, NativeCall::Dismiss { .. }))
    }

    /// Count calls matching `pred`.
    fn count_calls(&self, pred: impl Fn(&NativeCall) -> bool) -> usize {
        self.inner.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    /// Queued transitions as `(modal, kind)`, oldest first.
    pub fn pending(&self) -> Vec<(ModalId, TransitionKind)> {
        self.inner
            .borrow()
            .queue
            .iter()
            .map(|q| (q.done.id(), q.done.kind()))
            .collect()
    }

    /// Visible surfaces, bottom to top.
    pub fn visible(&self) -> Vec<SurfaceId> {
        self.inner.borrow().visible.clone()
    }

    /// Number of allocated surfaces not yet released.
    pub fn live_surfaces(&self) -> usize {
        self.inner.borrow().live.len()
    }

    /// True while `surface` has content mounted.
    pub fn is_mounted(&self, surface: SurfaceId) -> bool {
        self.inner.borrow().mounted.contains(&surface)
    }

    /// Complete the oldest queued transition. Returns the modal it belonged to.
    pub fn complete_next(&self) -> Option<ModalId> {
        let queued = self.inner.borrow_mut().queue.pop_front()?;
        Some(self.finish(queued))
    }

    /// Complete the oldest queued transition of `id`.
    pub fn complete_for(&self, id: ModalId) -> bool {
        let queued = {
            let mut inner = self.inner.borrow_mut();
            let Some(idx) = inner.queue.iter().position(|q| q.done.id() == id) else {
                return false;
            };
            inner.queue.remove(idx)
        };
        match queued {
            Some(q) => {
                self.finish(q);
                true
            }
            None => false,
        }
    }

    /// Complete queued transitions until none are left, including ones queued
    /// by completions. Returns how many were completed.
    pub fn complete_all(&self) -> usize {
        let mut n = 0;
        while self.complete_next().is_some() {
            n += 1;
        }
        n
    }

    /// Remove the oldest queued completion of `id` without signalling it.
    pub fn take_completion(&self, id: ModalId) -> Option<Completion> {
        let mut inner = self.inner.borrow_mut();
        let idx = inner.queue.iter().position(|q| q.done.id() == id)?;
        inner.queue.remove(idx).map(|q| q.done)
    }

    /// Apply the visual effect of a finished transition, then signal it.
    fn finish(&self, queued: Queued) -> ModalId {
        let Queued { surface, done } = queued;
        let id = done.id();
        {
            let mut inner = self.inner.borrow_mut();
            match done.kind() {
                TransitionKind::Present => {
                    if inner.mounted.contains(&surface) && !inner.visible.contains(&surface) {
                        inner.visible.push(surface);
                    }
                }
                TransitionKind::Dismiss => inner.visible.retain(|s| *s != surface),
            }
        }
        trace!(%id, %surface, kind = ?done.kind(), "headless transition finished");
        done.signal();
        id
    }

    /// Record a transition and either queue it or finish it immediately.
    fn start(&self, call: NativeCall, surface: SurfaceId, done: Completion) {
        let queued = Queued { surface, done };
        {
            let mut inner = self.inner.borrow_mut();
            inner.calls.push(call);
            if !self.auto_complete.get() {
                inner.queue.push_back(queued);
                return;
            }
        }
        self.finish(queued);
    }
}

impl NativePlatform for HeadlessPlatform {
    type Surface = SurfaceId;
    type Top = HeadlessTop;
    type Content = String;

    fn allocate_surface(&self, props: &ModalProps) -> SurfaceId {
        let mut inner = self.inner.borrow_mut();
        inner.next_surface += 1;
        let surface = SurfaceId(inner.next_surface);
        inner.live.insert(surface);
        inner.calls.push(NativeCall::Allocate(surface, *props));
        surface
    }

    fn mount(&self, surface: &SurfaceId, content: String) {
        let mut inner = self.inner.borrow_mut();
        inner.mounted.insert(*surface);
        inner.calls.push(NativeCall::Mount(*surface, content));
    }

    fn apply_props(&self, surface: &SurfaceId, props: &ModalProps) {
        self.inner
            .borrow_mut()
            .calls
            .push(NativeCall::ApplyProps(*surface, *props));
    }

    fn unmount(&self, surface: &SurfaceId) {
        let mut inner = self.inner.borrow_mut();
        inner.mounted.remove(surface);
        inner.visible.retain(|s| s != surface);
        inner.calls.push(NativeCall::Unmount(*surface));
    }

    fn release(&self, surface: SurfaceId) {
        let mut inner = self.inner.borrow_mut();
        inner.live.remove(&surface);
        inner.calls.push(NativeCall::Release(surface));
    }

    fn top_container(&self) -> HeadlessTop {
        match self.inner.borrow().visible.last() {
            Some(s) => HeadlessTop::Surface(*s),
            None => HeadlessTop::Root,
        }
    }

    fn present_modal(
        &self,
        top: &HeadlessTop,
        surface: &SurfaceId,
        animated: bool,
        done: Completion,
    ) {
        let call = NativeCall::Present {
            surface: *surface,
            top: *top,
            animated,
        };
        self.start(call, *surface, done);
    }

    fn dismiss_modal(
        &self,
        _top: &HeadlessTop,
        surface: &SurfaceId,
        animated: bool,
        done: Completion,
    ) {
        let call = NativeCall::Dismiss {
            surface: *surface,
            animated,
        };
        self.start(call, *surface, done);
    }
}
