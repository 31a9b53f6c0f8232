use std::{cell::Cell, rc::Rc};

use modal_host::{
    Completion, Disposition, HeadlessPlatform, HeadlessTop, IgnoreReason, ModalHostManager,
    ModalId, ModalProps, ModalState, SurfaceId,
};

fn setup() -> (Rc<HeadlessPlatform>, ModalHostManager<HeadlessPlatform>) {
    let platform = Rc::new(HeadlessPlatform::new());
    let mgr = ModalHostManager::new(platform.clone());
    (platform, mgr)
}

fn id(tag: u64) -> ModalId {
    ModalId::new(tag)
}

#[test]
fn invalidation_destroys_every_state() {
    let (platform, mgr) = setup();
    let stream = mgr.subscribe();
    let handles: Vec<_> = (1..=4)
        .map(|tag| mgr.create(id(tag), format!("m{tag}"), ModalProps::default()))
        .collect();

    // 2: presenting; 3: presented; 4: dismissing
    for tag in 2..=4 {
        mgr.request_present(id(tag), true);
    }
    assert!(platform.complete_for(id(3)));
    assert!(platform.complete_for(id(4)));
    mgr.request_dismiss(id(4), true);
    let before: Vec<ModalState> = handles.iter().map(|h| h.state()).collect();
    assert_eq!(
        before,
        vec![
            ModalState::Created,
            ModalState::Presenting,
            ModalState::Presented,
            ModalState::Dismissing,
        ]
    );

    assert_eq!(mgr.invalidate(), 4);
    assert!(handles.iter().all(|h| h.is_destroyed()));
    assert!(mgr.is_empty());
    assert_eq!(platform.live_surfaces(), 0);
    assert!(platform.visible().is_empty());

    // The native work already started still finishes, into nothing.
    assert_eq!(platform.complete_all(), 2);
    assert!(handles.iter().all(|h| h.is_destroyed()));
    assert!(stream.is_empty());
    assert_eq!(mgr.dismissed_count(), 0);
}

#[test]
fn invalidation_before_completion_emits_nothing() {
    let (platform, mgr) = setup();
    let stream = mgr.subscribe();
    let m1 = mgr.create(id(1), "m1".into(), ModalProps::default());
    let m2 = mgr.create(id(2), "m2".into(), ModalProps::default());
    mgr.request_present(id(1), true);
    mgr.request_present(id(2), true);

    mgr.invalidate();
    platform.complete_all();

    assert!(m1.is_destroyed());
    assert!(m2.is_destroyed());
    assert!(stream.is_empty());
}

#[test]
fn invalidate_is_idempotent() {
    let (_platform, mgr) = setup();
    mgr.create(id(1), "m".into(), ModalProps::default());
    assert_eq!(mgr.invalidate(), 1);
    assert_eq!(mgr.invalidate(), 0);
    assert!(mgr.is_invalidated());
}

#[test]
fn requests_after_invalidation_are_ignored() {
    let (platform, mgr) = setup();
    mgr.invalidate();

    let handle = mgr.create(id(1), "m".into(), ModalProps::default());
    assert!(handle.is_destroyed());
    assert_eq!(platform.live_surfaces(), 0);
    assert!(platform.calls().is_empty());
    assert_eq!(
        mgr.request_present(id(1), true),
        Disposition::Ignored(IgnoreReason::Invalidated)
    );
    assert_eq!(
        mgr.update_props(id(1), ModalProps::default()),
        Disposition::Ignored(IgnoreReason::Invalidated)
    );
    assert_eq!(
        mgr.destroy(id(1)),
        Disposition::Ignored(IgnoreReason::NotRegistered)
    );
}

#[test]
fn invalidation_bypasses_hooks() {
    let (platform, mgr) = setup();
    let hook_calls = Rc::new(Cell::new(0));
    let counter = hook_calls.clone();
    mgr.set_dismissal_hook(
        move |_top: &HeadlessTop, _surface: &SurfaceId, _animated: bool, done: Completion| {
            counter.set(counter.get() + 1);
            done.signal();
        },
    );
    mgr.create(id(1), "m".into(), ModalProps::default());
    mgr.request_present(id(1), true);
    platform.complete_all();

    mgr.invalidate();
    assert_eq!(hook_calls.get(), 0);
    assert_eq!(platform.dismiss_calls(), 0);
}

#[test]
fn held_completion_is_inert_after_invalidation() {
    let logs = logging::capture::capture("modal_host=trace");
    let (platform, mgr) = setup();
    let m = mgr.create(id(1), "m".into(), ModalProps::default());
    mgr.request_present(id(1), true);
    let first = platform.take_completion(id(1)).expect("queued completion");
    mgr.invalidate();

    first.signal();
    assert!(m.is_destroyed());
    assert_eq!(mgr.dismissed_count(), 0);
    assert_eq!(logs.count_level("WARN"), 0);
}

#[test]
fn dropped_manager_tears_down_and_closes_streams() {
    let platform = Rc::new(HeadlessPlatform::new());
    let mgr = ModalHostManager::new(platform.clone());
    let stream = mgr.subscribe();
    let m = mgr.create(id(1), "m".into(), ModalProps::default());
    mgr.request_present(id(1), true);

    drop(mgr);
    assert!(m.is_destroyed());
    assert_eq!(platform.live_surfaces(), 0);
    assert!(stream.is_closed());
    assert_eq!(platform.complete_all(), 1);
}

#[test]
fn invalidation_reports_discarded_transitions() {
    let logs = logging::capture::capture("modal_host=info");
    let (platform, mgr) = setup();
    mgr.create(id(1), "idle".into(), ModalProps::default());
    mgr.create(id(2), "busy".into(), ModalProps::default());
    mgr.request_present(id(2), true);

    assert_eq!(mgr.invalidate(), 2);
    assert!(logs.contains("count=2"));
    assert!(logs.contains("in_flight=1"));
    assert_eq!(platform.pending().len(), 1);
}
