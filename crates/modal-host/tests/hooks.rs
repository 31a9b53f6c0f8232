use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use modal_host::{
    Completion, Disposition, HeadlessPlatform, HeadlessTop, IgnoreReason, ModalHostManager,
    ModalId, ModalProps, ModalState, NativeCall, SurfaceId, TransitionKind,
};

fn setup() -> (Rc<HeadlessPlatform>, ModalHostManager<HeadlessPlatform>) {
    let platform = Rc::new(HeadlessPlatform::new());
    let mgr = ModalHostManager::new(platform.clone());
    (platform, mgr)
}

fn id(tag: u64) -> ModalId {
    ModalId::new(tag)
}

/// Completions captured by a stashing hook, with the arguments it saw.
#[derive(Default)]
struct Stash {
    tokens: RefCell<Vec<Completion>>,
    seen: RefCell<Vec<(HeadlessTop, SurfaceId, bool)>>,
}

impl Stash {
    fn release_all(&self) {
        let tokens: Vec<Completion> = self.tokens.borrow_mut().drain(..).collect();
        for done in tokens {
            done.signal();
        }
    }
}

fn stashing(stash: &Rc<Stash>) -> impl Fn(&HeadlessTop, &SurfaceId, bool, Completion) + 'static {
    let stash = stash.clone();
    move |top: &HeadlessTop, surface: &SurfaceId, animated: bool, done: Completion| {
        stash.seen.borrow_mut().push((*top, *surface, animated));
        stash.tokens.borrow_mut().push(done);
    }
}

#[test]
fn custom_presentation_replaces_native() {
    let (platform, mgr) = setup();
    let stash = Rc::new(Stash::default());
    mgr.set_presentation_hook(stashing(&stash));

    let m = mgr.create(id(1), "m".into(), ModalProps::default());
    assert_eq!(mgr.request_present(id(1), true), Disposition::Applied);
    assert_eq!(m.state(), ModalState::Presenting);
    assert_eq!(platform.present_calls(), 0);
    assert_eq!(stash.seen.borrow().len(), 1);
    assert_eq!(stash.seen.borrow()[0].0, HeadlessTop::Root);
    assert!(stash.seen.borrow()[0].2);

    stash.release_all();
    assert_eq!(m.state(), ModalState::Presented);
}

#[test]
fn clearing_a_hook_affects_only_later_transitions() {
    let (platform, mgr) = setup();
    let stash = Rc::new(Stash::default());
    mgr.set_presentation_hook(stashing(&stash));

    mgr.create(id(1), "a".into(), ModalProps::default());
    mgr.create(id(2), "b".into(), ModalProps::default());
    mgr.request_present(id(1), true);
    mgr.clear_presentation_hook();
    mgr.request_present(id(2), true);

    assert_eq!(stash.tokens.borrow().len(), 1);
    assert_eq!(platform.present_calls(), 1);
    assert_eq!(platform.pending(), vec![(id(2), TransitionKind::Present)]);

    // The in-flight custom transition still completes through its own token.
    stash.release_all();
    platform.complete_all();
    assert_eq!(mgr.state(id(1)), Some(ModalState::Presented));
    assert_eq!(mgr.state(id(2)), Some(ModalState::Presented));
}

#[test]
fn presentation_and_dismissal_hooks_are_independent() {
    let (platform, mgr) = setup();
    let stash = Rc::new(Stash::default());
    mgr.set_dismissal_hook(stashing(&stash));
    let stream = mgr.subscribe();

    mgr.create(id(1), "m".into(), ModalProps::default());
    mgr.request_present(id(1), false);
    assert!(stash.tokens.borrow().is_empty());
    platform.complete_all();

    mgr.request_dismiss(id(1), true);
    assert_eq!(platform.dismiss_calls(), 0);
    assert_eq!(mgr.state(id(1)), Some(ModalState::Dismissing));
    assert!(stream.is_empty());

    stash.release_all();
    assert_eq!(mgr.state(id(1)), None);
    assert_eq!(stream.drain().len(), 1);
}

#[test]
fn synchronous_hook_completes_inline() {
    let (_platform, mgr) = setup();
    let calls = Rc::new(Cell::new(0));
    let seen = calls.clone();
    mgr.set_presentation_hook(
        move |_top: &HeadlessTop, _surface: &SurfaceId, _animated: bool, done: Completion| {
            seen.set(seen.get() + 1);
            done.signal();
        },
    );
    let m = mgr.create(id(1), "m".into(), ModalProps::default());
    mgr.request_present(id(1), true);
    assert_eq!(m.state(), ModalState::Presented);
    assert_eq!(
        mgr.request_present(id(1), true),
        Disposition::Ignored(IgnoreReason::WrongState(ModalState::Presented))
    );
    assert_eq!(calls.get(), 1);
}

#[test]
fn hook_can_query_the_manager() {
    let platform = Rc::new(HeadlessPlatform::new());
    let mgr = Rc::new(ModalHostManager::new(platform.clone()));
    let observed = Rc::new(RefCell::new(Vec::new()));

    let weak = Rc::downgrade(&mgr);
    let log = observed.clone();
    mgr.set_presentation_hook(
        move |_top: &HeadlessTop, _surface: &SurfaceId, _animated: bool, done: Completion| {
            if let Some(mgr) = weak.upgrade() {
                log.borrow_mut().push(mgr.state(done.id()));
            }
            done.signal();
        },
    );

    mgr.create(id(7), "m".into(), ModalProps::default());
    mgr.request_present(id(7), true);
    assert_eq!(*observed.borrow(), vec![Some(ModalState::Presenting)]);
    assert_eq!(mgr.state(id(7)), Some(ModalState::Presented));
}

#[test]
fn stacked_modal_presents_from_topmost_surface() {
    let (platform, mgr) = setup();
    mgr.create(id(1), "base".into(), ModalProps::default());
    mgr.request_present(id(1), true);
    platform.complete_all();
    let base = platform.visible()[0];

    mgr.create(id(2), "over".into(), ModalProps::default());
    platform.take_calls();
    mgr.request_present(id(2), true);
    let calls = platform.calls();
    assert!(matches!(
        calls.as_slice(),
        [NativeCall::Present { top: HeadlessTop::Surface(s), animated: true, .. }] if *s == base
    ));

    platform.complete_all();
    assert_eq!(platform.visible().len(), 2);
}

#[test]
fn never_completing_hook_leaves_instance_in_transition() {
    let logs = logging::capture::capture("modal_host=debug");
    let (platform, mgr) = setup();
    mgr.set_presentation_hook(
        |_top: &HeadlessTop, _surface: &SurfaceId, _animated: bool, done: Completion| {
            drop(done);
        },
    );
    let m = mgr.create(id(1), "m".into(), ModalProps::default());
    mgr.request_present(id(1), true);

    assert_eq!(m.state(), ModalState::Presenting);
    assert!(logs.contains("completion dropped without signal"));
    assert_eq!(
        mgr.request_dismiss(id(1), true),
        Disposition::Ignored(IgnoreReason::WrongState(ModalState::Presenting))
    );

    assert_eq!(mgr.destroy(id(1)), Disposition::Applied);
    assert!(m.is_destroyed());
    assert_eq!(platform.live_surfaces(), 0);
}
