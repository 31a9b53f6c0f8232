//! Swappable presentation and dismissal strategies.

use std::{fmt, rc::Rc};

use crate::{Completion, NativePlatform};

/// Strategy that performs one native present or dismiss transition.
///
/// Receives the host's top-level container, the target surface (borrowed for
/// this call only), the animation flag and a [`Completion`] that must be
/// signalled exactly once when the transition is over. Any closure with a
/// matching signature is a hook.
pub trait InteractionHook<P: NativePlatform> {
    /// Perform the transition.
    fn invoke(&self, top: &P::Top, surface: &P::Surface, animated: bool, done: Completion);
}

impl<P, F> InteractionHook<P> for F
where
    P: NativePlatform,
    F: Fn(&P::Top, &P::Surface, bool, Completion),
{
    fn invoke(&self, top: &P::Top, surface: &P::Surface, animated: bool, done: Completion) {
        self(top, surface, animated, done);
    }
}

/// Shared reference to a registered hook.
pub(crate) type HookRef<P> = Rc<dyn InteractionHook<P>>;

/// Hook slots of one manager. An empty slot falls back to the platform's
/// native transition.
pub(crate) struct InteractionHooks<P: NativePlatform> {
    /// Replaces [`NativePlatform::present_modal`] when set.
    pub(crate) presentation: Option<HookRef<P>>,
    /// Replaces [`NativePlatform::dismiss_modal`] when set.
    pub(crate) dismissal: Option<HookRef<P>>,
}

impl<P: NativePlatform> Default for InteractionHooks<P> {
    fn default() -> Self {
        Self {
            presentation: None,
            dismissal: None,
        }
    }
}

impl<P: NativePlatform> fmt::Debug for InteractionHooks<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionHooks")
            .field("presentation", &self.presentation.is_some())
            .field("dismissal", &self.dismissal.is_some())
            .finish()
    }
}

/// Resolved strategy for one call: either a custom hook or the native default.
pub(crate) enum Strategy<P: NativePlatform> {
    /// Host-supplied hook.
    Custom(HookRef<P>),
    /// Platform default for presentation.
    NativePresent,
    /// Platform default for dismissal.
    NativeDismiss,
}

impl<P: NativePlatform> Strategy<P> {
    /// Run the strategy against `platform`.
    pub(crate) fn run(
        &self,
        platform: &P,
        top: &P::Top,
        surface: &P::Surface,
        animated: bool,
        done: Completion,
    ) {
        match self {
            Self::Custom(hook) => hook.invoke(top, surface, animated, done),
            Self::NativePresent => platform.present_modal(top, surface, animated, done),
            Self::NativeDismiss => platform.dismiss_modal(top, surface, animated, done),
        }
    }

    /// Short label for logs.
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Custom(_) => "custom",
            Self::NativePresent | Self::NativeDismiss => "native",
        }
    }
}

impl<P: NativePlatform> InteractionHooks<P> {
    /// Strategy for the next presentation.
    pub(crate) fn present_strategy(&self) -> Strategy<P> {
        match &self.presentation {
            Some(h) => Strategy::Custom(h.clone()),
            None => Strategy::NativePresent,
        }
    }

    /// Strategy for the next dismissal.
    pub(crate) fn dismiss_strategy(&self) -> Strategy<P> {
        match &self.dismissal {
            Some(h) => Strategy::Custom(h.clone()),
            None => Strategy::NativeDismiss,
        }
    }
}
