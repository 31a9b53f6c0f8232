//! Step scripts for the `run` subcommand.
//!
//! A script is a RON list of [`Step`]s executed in order against a
//! [`ModalHostManager`] backed by a [`HeadlessPlatform`]. Native transitions
//! queue until a `Complete`/`CompleteAll` step pumps them, so races between
//! requests and completions can be written down explicitly.

use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    fmt::{Display, Formatter, Result as FmtResult},
    rc::Rc,
};

use modal_host::{
    Completion, Disposition, DismissStream, HeadlessPlatform, HeadlessTop, HostConfig,
    ModalHandle, ModalHostManager, ModalProps, ModalState, SurfaceId,
};
use modal_ids::ModalId;
use ron::{Options, error::SpannedError};
use serde::Deserialize;
use tracing::debug;

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum Step {
    /// Create a modal with the configured default props.
    Create(u64),
    /// Create a modal with explicit props.
    CreateWith(u64, ModalProps),
    /// Request presentation with the given animation flag.
    Present(u64, bool),
    /// Request dismissal with the given animation flag.
    Dismiss(u64, bool),
    /// Request presentation, animated unless the modal's props say `none`.
    Show(u64),
    /// Request dismissal, animated unless the modal's props say `none`.
    Hide(u64),
    /// Out-of-band dismissal, as if the user swiped the modal away.
    UserDismiss(u64),
    /// Finish the oldest outstanding transition.
    Complete,
    /// Finish every outstanding transition.
    CompleteAll,
    /// Declaratively unmount a modal.
    Destroy(u64),
    /// Shut the bridge down.
    Invalidate,
    /// Install (`true`) or clear (`false`) custom hooks that hold completions
    /// until the next `Complete` step.
    CustomHooks(bool),
}

/// Parse a RON step list.
pub fn parse(text: &str) -> Result<Vec<Step>, SpannedError> {
    Options::default().from_str(text)
}

/// What a step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A create call; carries the state the returned handle observes.
    Created(ModalState),
    /// A lifecycle request and its disposition.
    Request(Disposition),
    /// Number of transitions completed.
    Completed(usize),
    /// Number of modals torn down by invalidation.
    Invalidated(usize),
    /// Custom hooks installed or cleared.
    Hooks(bool),
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Created(state) => write!(f, "handle {state}"),
            Self::Request(Disposition::Applied) => f.write_str("applied"),
            Self::Request(Disposition::Ignored(reason)) => write!(f, "ignored ({reason})"),
            Self::Completed(n) => write!(f, "completed {n}"),
            Self::Invalidated(n) => write!(f, "invalidated {n}"),
            Self::Hooks(true) => f.write_str("custom hooks on"),
            Self::Hooks(false) => f.write_str("custom hooks off"),
        }
    }
}

/// Result of executing one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// The step that ran.
    pub step: Step,
    /// What it did.
    pub outcome: Outcome,
    /// State of every modal the script has touched, by identity.
    pub states: Vec<(ModalId, ModalState)>,
    /// Dismiss notifications broadcast during the step.
    pub dismissed: Vec<ModalId>,
}

impl Display for StepReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:?} -> {}", self.step, self.outcome)?;
        if !self.states.is_empty() {
            f.write_str(" |")?;
            for (id, state) in &self.states {
                write!(f, " {id}={state}")?;
            }
        }
        for id in &self.dismissed {
            write!(f, " | dismissed {id}")?;
        }
        Ok(())
    }
}

/// Completions held back by the scripted custom hooks.
type Held = Rc<RefCell<VecDeque<Completion>>>;

/// Executes steps against a headless manager.
pub struct Runner {
    /// Headless platform shared with the manager.
    platform: Rc<HeadlessPlatform>,
    /// Manager under test.
    manager: ModalHostManager<HeadlessPlatform>,
    /// Dismiss notifications.
    stream: DismissStream,
    /// Completions held by custom hooks, oldest first.
    held: Held,
    /// Handles of every modal created so far.
    handles: BTreeMap<ModalId, ModalHandle>,
    /// Total dismiss notifications observed.
    dismissed_total: usize,
}

impl Runner {
    /// Create a runner over a fresh headless platform.
    pub fn new(config: HostConfig) -> Self {
        let platform = Rc::new(HeadlessPlatform::new());
        let manager = ModalHostManager::with_config(platform.clone(), config);
        let stream = manager.subscribe();
        Self {
            platform,
            manager,
            stream,
            held: Rc::default(),
            handles: BTreeMap::new(),
            dismissed_total: 0,
        }
    }

    /// Total dismiss notifications observed so far.
    pub fn dismissed_total(&self) -> usize {
        self.dismissed_total
    }

    /// Execute every step, collecting reports.
    pub fn run_all(&mut self, steps: &[Step]) -> Vec<StepReport> {
        steps.iter().map(|s| self.step(s)).collect()
    }

    /// Execute one step.
    pub fn step(&mut self, step: &Step) -> StepReport {
        debug!(?step, "script step");
        let outcome = match *step {
            Step::Create(tag) => {
                let id = ModalId::new(tag);
                let handle = self.manager.create_default(id, format!("modal {id}"));
                self.track(handle)
            }
            Step::CreateWith(tag, props) => {
                let id = ModalId::new(tag);
                let handle = self.manager.create(id, format!("modal {id}"), props);
                self.track(handle)
            }
            Step::Present(tag, animated) => {
                Outcome::Request(self.manager.request_present(ModalId::new(tag), animated))
            }
            Step::Dismiss(tag, animated) => {
                Outcome::Request(self.manager.request_dismiss(ModalId::new(tag), animated))
            }
            Step::Show(tag) => Outcome::Request(self.manager.present(ModalId::new(tag))),
            Step::Hide(tag) => Outcome::Request(self.manager.dismiss(ModalId::new(tag))),
            Step::UserDismiss(tag) => {
                Outcome::Request(self.manager.notify_dismissed(ModalId::new(tag)))
            }
            Step::Complete => Outcome::Completed(usize::from(self.complete_one())),
            Step::CompleteAll => {
                let mut n = 0;
                while self.complete_one() {
                    n += 1;
                }
                Outcome::Completed(n)
            }
            Step::Destroy(tag) => Outcome::Request(self.manager.destroy(ModalId::new(tag))),
            Step::Invalidate => Outcome::Invalidated(self.manager.invalidate()),
            Step::CustomHooks(on) => {
                self.set_custom_hooks(on);
                Outcome::Hooks(on)
            }
        };
        let dismissed: Vec<ModalId> = self.stream.drain().into_iter().map(|e| e.id).collect();
        self.dismissed_total += dismissed.len();
        StepReport {
            step: step.clone(),
            outcome,
            states: self
                .handles
                .iter()
                .map(|(id, handle)| (*id, handle.state()))
                .collect(),
            dismissed,
        }
    }

    /// Remember the latest handle for an identity.
    fn track(&mut self, handle: ModalHandle) -> Outcome {
        let state = handle.state();
        self.handles.insert(handle.id(), handle);
        Outcome::Created(state)
    }

    /// Finish the oldest held custom completion, else the oldest native one.
    fn complete_one(&self) -> bool {
        let held = self.held.borrow_mut().pop_front();
        match held {
            Some(done) => {
                done.signal();
                true
            }
            None => self.platform.complete_next().is_some(),
        }
    }

    /// Install or clear hooks that park their completions in `held`.
    fn set_custom_hooks(&self, on: bool) {
        if !on {
            self.manager.clear_presentation_hook();
            self.manager.clear_dismissal_hook();
            return;
        }
        self.manager.set_presentation_hook(holding(&self.held));
        self.manager.set_dismissal_hook(holding(&self.held));
    }
}

/// A hook that parks its completion for a later `Complete` step.
fn holding(held: &Held) -> impl Fn(&HeadlessTop, &SurfaceId, bool, Completion) + 'static {
    let held = held.clone();
    move |_top: &HeadlessTop, surface: &SurfaceId, animated: bool, done: Completion| {
        debug!(id = %done.id(), %surface, animated, "custom hook holding completion");
        held.borrow_mut().push_back(done);
    }
}

#[cfg(test)]
mod tests {
    use modal_host::{AnimationType, IgnoreReason, NativeCall};

    use super::*;

    fn run(text: &str) -> (Runner, Vec<StepReport>) {
        let steps = parse(text).expect("parse");
        let mut runner = Runner::new(HostConfig::default());
        let reports = runner.run_all(&steps);
        (runner, reports)
    }

    fn last_state(report: &StepReport, tag: u64) -> Option<ModalState> {
        report
            .states
            .iter()
            .find(|(id, _)| *id == ModalId::new(tag))
            .map(|(_, s)| *s)
    }

    #[test]
    fn parses_every_step_kind() {
        let steps = parse(
            "[Create(1), CreateWith(2, (animation: fade, transparent: true)), Present(1, true), \
             Dismiss(1, false), UserDismiss(2), Complete, CompleteAll, Destroy(1), Invalidate, \
             CustomHooks(true), Show(3), Hide(3)]",
        )
        .expect("parse");
        assert_eq!(steps.len(), 12);
        match &steps[1] {
            Step::CreateWith(2, props) => {
                assert_eq!(props.animation, AnimationType::Fade);
                assert!(props.transparent);
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_steps() {
        assert!(parse("[Create(1), Explode]").is_err());
    }

    #[test]
    fn present_then_dismiss_reports_one_notification() {
        let (runner, reports) = run(
            "[Create(1), Present(1, true), CompleteAll, Dismiss(1, true), CompleteAll]",
        );
        assert_eq!(last_state(&reports[1], 1), Some(ModalState::Presenting));
        assert_eq!(last_state(&reports[2], 1), Some(ModalState::Presented));
        assert!(reports[2].dismissed.is_empty());
        assert_eq!(last_state(&reports[4], 1), Some(ModalState::Destroyed));
        assert_eq!(reports[4].dismissed, vec![ModalId::new(1)]);
        assert_eq!(runner.dismissed_total(), 1);
    }

    #[test]
    fn invalidation_before_completion_is_silent() {
        let (runner, reports) = run(
            "[Create(1), Create(2), Present(1, true), Present(2, true), Invalidate, CompleteAll]",
        );
        assert_eq!(reports[4].outcome, Outcome::Invalidated(2));
        assert_eq!(last_state(&reports[5], 1), Some(ModalState::Destroyed));
        assert_eq!(last_state(&reports[5], 2), Some(ModalState::Destroyed));
        assert_eq!(runner.dismissed_total(), 0);
    }

    #[test]
    fn custom_hooks_hold_completions_until_pumped() {
        let (runner, reports) = run(
            "[CustomHooks(true), Create(1), Present(1, true), Present(1, true), Complete, \
             UserDismiss(1), Complete]",
        );
        assert_eq!(
            reports[3].outcome,
            Outcome::Request(Disposition::Ignored(IgnoreReason::WrongState(
                ModalState::Presenting
            )))
        );
        assert_eq!(reports[4].outcome, Outcome::Completed(1));
        assert_eq!(last_state(&reports[4], 1), Some(ModalState::Presented));
        assert_eq!(reports[6].dismissed, vec![ModalId::new(1)]);
        assert_eq!(runner.platform.present_calls(), 0);
        assert_eq!(runner.platform.dismiss_calls(), 0);
    }

    #[test]
    fn report_renders_states_and_notifications() {
        let (_runner, reports) = run("[Create(3), Present(3, false), CompleteAll]");
        assert_eq!(
            reports[2].to_string(),
            "CompleteAll -> completed 1 | #3=presented"
        );
        let (_runner, reports) = run("[Destroy(9)]");
        assert_eq!(reports[0].to_string(), "Destroy(9) -> ignored (not registered)");
    }

    #[test]
    fn bundled_scripts_parse() {
        for text in [
            include_str!("../scripts/present-dismiss.ron"),
            include_str!("../scripts/invalidate.ron"),
            include_str!("../scripts/custom-hooks.ron"),
        ] {
            parse(text).expect("bundled script parses");
        }
        let config = HostConfig::from_ron(include_str!("../scripts/host.ron")).expect("config");
        assert_eq!(config.animated, Some(false));
        assert_eq!(config.default_props.animation, AnimationType::None);
    }

    #[test]
    fn show_and_hide_animate_per_props() {
        let (runner, reports) = run(
            "[CreateWith(1, (animation: none)), Create(2), Show(1), Show(2), CompleteAll, \
             Hide(1), CompleteAll]",
        );
        let flags: Vec<bool> = runner
            .platform
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                NativeCall::Present { animated, .. } | NativeCall::Dismiss { animated, .. } => {
                    Some(animated)
                }
                _ => None,
            })
            .collect();
        assert_eq!(flags, vec![false, true, false]);
        assert_eq!(reports[6].dismissed, vec![ModalId::new(1)]);
    }

    #[test]
    fn configured_override_reaches_the_platform() {
        let config = HostConfig::from_ron("(animated: false)").expect("config");
        let mut runner = Runner::new(config);
        runner.run_all(&parse("[Create(1), Present(1, true)]").expect("parse"));
        assert!(matches!(
            runner.platform.calls().last(),
            Some(NativeCall::Present { animated: false, .. })
        ));
    }
}
