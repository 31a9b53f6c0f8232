//! Modal lifecycle manager.
//!
//! The manager owns the registry of live modal instances and drives each one
//! through its lifecycle:
//!
//! | From | Event | To |
//! |---|---|---|
//! | `Created` | [`ModalHostManager::request_present`] | `Presenting` |
//! | `Presenting` | completion | `Presented` |
//! | `Presented` | [`ModalHostManager::request_dismiss`] or [`ModalHostManager::notify_dismissed`] | `Dismissing` |
//! | `Dismissing` | completion | `Destroyed` (broadcasts [`ModalDismissed`]) |
//! | any live state | [`ModalHostManager::destroy`] or [`ModalHostManager::invalidate`] | `Destroyed` |
//!
//! # Invariants
//!
//! - At most one transition is in flight per instance; every other request
//!   is absorbed as a no-op and reported as [`Disposition::Ignored`].
//! - Hooks and platform transitions are invoked after the manager released
//!   its internal state, so they may signal their completion synchronously.
//!   Completions signalled from surface calls made under that state are
//!   applied before the request returns.
//! - A completion is applied only if its ticket is still the instance's
//!   pending ticket. Anything else (destroyed instance, invalidated bridge,
//!   reused identity) is discarded without effect.
//! - Teardown of the container happens before removal from the registry.
//! - Only the dismissal path broadcasts; `destroy` and `invalidate` are silent.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    fmt,
    rc::Rc,
};

use modal_ids::ModalId;
use tracing::{debug, info, trace, warn};

use crate::{
    Completion, HostConfig, InteractionHook, ModalProps, NativePlatform, TransitionKind,
    completion::{CompletionSink, Ticket, weak_sink},
    container::ModalHostContainer,
    events::{DismissHub, DismissStream, Listener, ModalDismissed},
    hooks::{InteractionHooks, Strategy},
    state::{Disposition, IgnoreReason, ModalHandle, ModalState},
};

/// Outstanding transition of one instance.
#[derive(Debug, Clone, Copy)]
struct Pending {
    /// Ticket sequence number the completion must carry.
    seq: u64,
}

/// Registry entry.
struct ModalInstance<P: NativePlatform> {
    /// Exclusively owned native container.
    container: ModalHostContainer<P>,
    /// State cell shared with [`ModalHandle`]s.
    state: Rc<Cell<ModalState>>,
    /// In-flight transition, if any.
    pending: Option<Pending>,
}

/// A hook call prepared under the core borrow and run after releasing it.
struct HookCall<P: NativePlatform> {
    /// Custom hook or native default.
    strategy: Strategy<P>,
    /// Clone of the target surface handle.
    surface: P::Surface,
    /// Resolved animation flag.
    animated: bool,
    /// Ticket for the completion token.
    ticket: Ticket,
}

/// Mutable manager state.
struct Core<P: NativePlatform> {
    /// Live instances by identity.
    registry: HashMap<ModalId, ModalInstance<P>>,
    /// Registered hooks.
    hooks: InteractionHooks<P>,
    /// Host configuration.
    config: HostConfig,
    /// Next ticket sequence number.
    next_seq: u64,
    /// Set by `invalidate`; terminal.
    invalidated: bool,
}

impl<P: NativePlatform> Core<P> {
    /// Validate a present/dismiss request and move the instance into its
    /// transitional state.
    fn begin(
        &mut self,
        id: ModalId,
        kind: TransitionKind,
        animated: Option<bool>,
    ) -> Result<HookCall<P>, IgnoreReason> {
        if self.invalidated {
            return Err(IgnoreReason::Invalidated);
        }
        let (from, to) = match kind {
            TransitionKind::Present => (ModalState::Created, ModalState::Presenting),
            TransitionKind::Dismiss => (ModalState::Presented, ModalState::Dismissing),
        };
        let inst = self
            .registry
            .get_mut(&id)
            .ok_or(IgnoreReason::NotRegistered)?;
        let state = inst.state.get();
        if state != from {
            return Err(IgnoreReason::WrongState(state));
        }
        let surface = inst
            .container
            .surface()
            .cloned()
            .ok_or(IgnoreReason::WrongState(state))?;
        let requested = animated.unwrap_or_else(|| inst.container.props().animated());
        let seq = self.next_seq;
        self.next_seq += 1;
        inst.pending = Some(Pending { seq });
        inst.state.set(to);
        let strategy = match kind {
            TransitionKind::Present => self.hooks.present_strategy(),
            TransitionKind::Dismiss => self.hooks.dismiss_strategy(),
        };
        Ok(HookCall {
            strategy,
            surface,
            animated: self.config.resolve_animated(requested),
            ticket: Ticket { id, seq, kind },
        })
    }

    /// Apply a completion. Returns the event to broadcast, if any.
    fn finish(&mut self, ticket: Ticket) -> Option<ModalDismissed> {
        let id = ticket.id;
        let Some(inst) = self.registry.get_mut(&id) else {
            trace!(%id, kind = ?ticket.kind, "completion for unregistered modal discarded");
            return None;
        };
        if inst.pending.map(|p| p.seq) != Some(ticket.seq) {
            trace!(%id, seq = ticket.seq, "stale completion discarded");
            return None;
        }
        inst.pending = None;
        match ticket.kind {
            TransitionKind::Present => {
                inst.state.set(ModalState::Presented);
                debug!(%id, "modal presented");
                None
            }
            TransitionKind::Dismiss => {
                self.destroy_instance(id);
                debug!(%id, "modal dismissed");
                Some(ModalDismissed { id })
            }
        }
    }

    /// Tear down and unregister one instance. Returns the state it was in,
    /// or `None` if it was not live.
    fn destroy_instance(&mut self, id: ModalId) -> Option<ModalState> {
        let inst = self.registry.get_mut(&id)?;
        let state = inst.state.get();
        inst.pending = None;
        inst.container.teardown();
        inst.state.set(ModalState::Destroyed);
        self.registry.remove(&id);
        Some(state)
    }

    /// True if `ticket` is still the pending ticket of its instance.
    fn is_pending(&self, ticket: Ticket) -> bool {
        self.registry
            .get(&ticket.id)
            .and_then(|inst| inst.pending)
            .is_some_and(|p| p.seq == ticket.seq)
    }
}

/// State shared between the manager and its completion tokens.
struct Shared<P: NativePlatform> {
    /// Platform adapter.
    platform: Rc<P>,
    /// Registry, hooks and configuration.
    core: RefCell<Core<P>>,
    /// Completions delivered while `core` was busy.
    mailbox: RefCell<VecDeque<Ticket>>,
    /// Dismiss notification fan-out.
    events: DismissHub,
}

impl<P: NativePlatform> Shared<P> {
    /// Apply queued completions until the mailbox is empty or the core is busy.
    ///
    /// Broadcasts happen with the core released.
    fn drain(&self) {
        loop {
            let Ok(mut core) = self.core.try_borrow_mut() else {
                return;
            };
            let Some(ticket) = self.mailbox.borrow_mut().pop_front() else {
                return;
            };
            let dismissed = core.finish(ticket);
            drop(core);
            if let Some(event) = dismissed {
                self.events.publish(event);
            }
        }
    }
}

impl<P: NativePlatform> CompletionSink for Shared<P> {
    fn complete(&self, ticket: Ticket) {
        self.mailbox.borrow_mut().push_back(ticket);
        self.drain();
    }

    fn abandoned(&self, ticket: Ticket) {
        let Ok(core) = self.core.try_borrow() else {
            return;
        };
        if core.is_pending(ticket) {
            warn!(
                id = %ticket.id,
                kind = ?ticket.kind,
                "completion dropped without signal; modal stays in transition"
            );
        }
    }
}

/// Owns all modal instances created through it and keeps their native
/// presentation in sync with the declarative tree.
///
/// The manager is single-threaded: it and its [`Completion`] tokens are
/// `!Send`, and every call, hook and completion happens on the owner thread.
/// Dropping the manager invalidates it.
pub struct ModalHostManager<P: NativePlatform + 'static> {
    /// Shared core; completion tokens hold it weakly.
    shared: Rc<Shared<P>>,
}

impl<P: NativePlatform + 'static> ModalHostManager<P> {
    /// Create a manager with the default configuration.
    pub fn new(platform: Rc<P>) -> Self {
        Self::with_config(platform, HostConfig::default())
    }

    /// Create a manager with `config`.
    pub fn with_config(platform: Rc<P>, config: HostConfig) -> Self {
        let events = DismissHub::new(config.event_capacity);
        let core = Core {
            registry: HashMap::new(),
            hooks: InteractionHooks::default(),
            config,
            next_seq: 1,
            invalidated: false,
        };
        Self {
            shared: Rc::new(Shared {
                platform,
                core: RefCell::new(core),
                mailbox: RefCell::new(VecDeque::new()),
                events,
            }),
        }
    }

    /// The platform adapter.
    pub fn platform(&self) -> &Rc<P> {
        &self.shared.platform
    }

    /// Copy of the active configuration.
    pub fn config(&self) -> HostConfig {
        self.shared.core.borrow().config.clone()
    }

    // --- Hook registration ---

    /// Replace the presentation strategy for all subsequent presentations.
    pub fn set_presentation_hook<H: InteractionHook<P> + 'static>(&self, hook: H) {
        self.shared.core.borrow_mut().hooks.presentation = Some(Rc::new(hook));
        debug!("custom presentation hook installed");
    }

    /// Replace the dismissal strategy for all subsequent dismissals.
    pub fn set_dismissal_hook<H: InteractionHook<P> + 'static>(&self, hook: H) {
        self.shared.core.borrow_mut().hooks.dismissal = Some(Rc::new(hook));
        debug!("custom dismissal hook installed");
    }

    /// Revert to the platform's native presentation. In-flight transitions are unaffected.
    pub fn clear_presentation_hook(&self) {
        self.shared.core.borrow_mut().hooks.presentation = None;
    }

    /// Revert to the platform's native dismissal. In-flight transitions are unaffected.
    pub fn clear_dismissal_hook(&self) {
        self.shared.core.borrow_mut().hooks.dismissal = None;
    }

    // --- Reconciler surface ---

    /// Create a modal instance for `id` with `content` mounted into a fresh surface.
    ///
    /// If `id` is already live the existing instance is kept, `content` is
    /// dropped, and the returned handle observes the existing instance. After
    /// invalidation no surface is allocated and the handle is `Destroyed`.
    pub fn create(&self, id: ModalId, content: P::Content, props: ModalProps) -> ModalHandle {
        let handle = self.register(id, content, props);
        self.shared.drain();
        handle
    }

    /// Registry half of [`ModalHostManager::create`], run under the core borrow.
    fn register(&self, id: ModalId, content: P::Content, props: ModalProps) -> ModalHandle {
        let mut core = self.shared.core.borrow_mut();
        if core.invalidated {
            warn!(%id, "create after invalidation ignored");
            return ModalHandle::new(id, ModalState::Destroyed).0;
        }
        if let Some(existing) = core.registry.get(&id) {
            warn!(%id, state = %existing.state.get(), "duplicate create ignored");
            return ModalHandle::observe(id, existing.state.clone());
        }
        let container = ModalHostContainer::create(self.shared.platform.clone(), content, props);
        let (handle, state) = ModalHandle::new(id, ModalState::Created);
        core.registry.insert(
            id,
            ModalInstance {
                container,
                state,
                pending: None,
            },
        );
        debug!(%id, ?props, "modal created");
        handle
    }

    /// [`ModalHostManager::create`] with the configured default props.
    pub fn create_default(&self, id: ModalId, content: P::Content) -> ModalHandle {
        let props = self.shared.core.borrow().config.default_props;
        self.create(id, content, props)
    }

    /// Start presenting a `Created` instance.
    pub fn request_present(&self, id: ModalId, animated: bool) -> Disposition {
        self.transition(id, TransitionKind::Present, Some(animated), "request_present")
    }

    /// Start dismissing a `Presented` instance.
    pub fn request_dismiss(&self, id: ModalId, animated: bool) -> Disposition {
        self.transition(id, TransitionKind::Dismiss, Some(animated), "request_dismiss")
    }

    /// [`ModalHostManager::request_present`], animated unless the instance's
    /// props say [`crate::AnimationType::None`].
    pub fn present(&self, id: ModalId) -> Disposition {
        self.transition(id, TransitionKind::Present, None, "present")
    }

    /// [`ModalHostManager::request_dismiss`], animated unless the instance's
    /// props say [`crate::AnimationType::None`].
    pub fn dismiss(&self, id: ModalId) -> Disposition {
        self.transition(id, TransitionKind::Dismiss, None, "dismiss")
    }

    /// An out-of-band dismissal (e.g. the user swiped the modal away).
    ///
    /// Runs the dismissal strategy without animation; deduplicated against a
    /// dismissal already in flight.
    pub fn notify_dismissed(&self, id: ModalId) -> Disposition {
        self.transition(id, TransitionKind::Dismiss, Some(false), "notify_dismissed")
    }

    /// Forward new props to a live instance.
    pub fn update_props(&self, id: ModalId, props: ModalProps) -> Disposition {
        let disposition = {
            let mut core = self.shared.core.borrow_mut();
            if core.invalidated {
                Disposition::Ignored(IgnoreReason::Invalidated)
            } else if let Some(inst) = core.registry.get_mut(&id) {
                inst.container.update_props(props);
                Disposition::Applied
            } else {
                Disposition::Ignored(IgnoreReason::NotRegistered)
            }
        };
        self.shared.drain();
        disposition
    }

    /// Declarative unmount: tear down `id` immediately, whatever its state.
    ///
    /// Pending completions for the instance are discarded and no dismiss
    /// notification is broadcast. Idempotent.
    pub fn destroy(&self, id: ModalId) -> Disposition {
        let destroyed = self.shared.core.borrow_mut().destroy_instance(id);
        self.shared.drain();
        if let Some(state) = destroyed {
            debug!(%id, %state, discarded_transition = state.in_flight(), "modal destroyed");
            Disposition::Applied
        } else {
            trace!(%id, "destroy of unregistered modal ignored");
            Disposition::Ignored(IgnoreReason::NotRegistered)
        }
    }

    /// Bridge shutdown: synchronously tear down every live instance.
    ///
    /// Bypasses hooks, discards pending completions and broadcasts nothing.
    /// Every later request is ignored. Returns the number of instances torn
    /// down; calling it again returns 0.
    pub fn invalidate(&self) -> usize {
        let (count, in_flight) = {
            let mut core = self.shared.core.borrow_mut();
            if core.invalidated {
                return 0;
            }
            core.invalidated = true;
            let mut ids: Vec<ModalId> = core.registry.keys().copied().collect();
            ids.sort();
            let in_flight = ids
                .iter()
                .filter_map(|id| core.destroy_instance(*id))
                .filter(|state| state.in_flight())
                .count();
            (ids.len(), in_flight)
        };
        self.shared.mailbox.borrow_mut().clear();
        info!(count, in_flight, "bridge invalidated; modals torn down");
        count
    }

    // --- Notifications ---

    /// Register a callback for dismiss notifications.
    pub fn listen<F: Fn(&ModalDismissed) + 'static>(&self, callback: F) -> Listener {
        self.shared.events.listen(Box::new(callback))
    }

    /// Open a buffered stream of dismiss notifications.
    pub fn subscribe(&self) -> DismissStream {
        self.shared.events.subscribe()
    }

    /// Total dismiss notifications broadcast so far.
    pub fn dismissed_count(&self) -> u64 {
        self.shared.events.published()
    }

    // --- Queries ---

    /// State of a live instance; `None` once destroyed or never created.
    pub fn state(&self, id: ModalId) -> Option<ModalState> {
        self.shared
            .core
            .borrow()
            .registry
            .get(&id)
            .map(|inst| inst.state.get())
    }

    /// True while `id` is live.
    pub fn contains(&self, id: ModalId) -> bool {
        self.shared.core.borrow().registry.contains_key(&id)
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.shared.core.borrow().registry.len()
    }

    /// True when no instance is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live identities in ascending order.
    pub fn ids(&self) -> Vec<ModalId> {
        let mut ids: Vec<ModalId> = self.shared.core.borrow().registry.keys().copied().collect();
        ids.sort();
        ids
    }

    /// True once [`ModalHostManager::invalidate`] ran.
    pub fn is_invalidated(&self) -> bool {
        self.shared.core.borrow().invalidated
    }

    /// Validate, enter the transitional state, then run the strategy with the core released.
    fn transition(
        &self,
        id: ModalId,
        kind: TransitionKind,
        animated: Option<bool>,
        op: &'static str,
    ) -> Disposition {
        let prepared = self.shared.core.borrow_mut().begin(id, kind, animated);
        let disposition = match prepared {
            Ok(call) => {
                debug!(
                    %id,
                    op,
                    strategy = call.strategy.label(),
                    animated = call.animated,
                    "modal transition started"
                );
                self.run_hook(call);
                Disposition::Applied
            }
            Err(reason) => {
                debug!(%id, op, %reason, "request ignored");
                Disposition::Ignored(reason)
            }
        };
        self.shared.drain();
        disposition
    }

    /// Invoke the strategy of a prepared call.
    fn run_hook(&self, call: HookCall<P>) {
        let HookCall {
            strategy,
            surface,
            animated,
            ticket,
        } = call;
        let platform = &self.shared.platform;
        let top = platform.top_container();
        let done = Completion::new(ticket, weak_sink(&self.shared));
        strategy.run(platform, &top, &surface, animated, done);
    }
}

impl<P: NativePlatform + 'static> Drop for ModalHostManager<P> {
    fn drop(&mut self) {
        self.invalidate();
    }
}

impl<P: NativePlatform + 'static> fmt::Debug for ModalHostManager<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.shared.core.borrow();
        f.debug_struct("ModalHostManager")
            .field("live", &core.registry.len())
            .field("hooks", &core.hooks)
            .field("invalidated", &core.invalidated)
            .finish_non_exhaustive()
    }
}
