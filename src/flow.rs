//! Flow controller of the backup check.
//!
//! The surrounding UI sends [`Action`]s and gets back [`Effect`]s to carry out.
//! The only asynchronous step is the pause between filling the last blank and
//! showing the outcome: the controller asks the host to schedule it with an
//! [`AttemptTicket`], and the host hands that ticket back through
//! [`Action::TransitionDue`] once the delay ran out. Every new attempt gets a
//! new ticket generation, so a late callback from an abandoned attempt is
//! dropped instead of overriding the current one.

use std::time::Duration;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::challenge::{Challenge, ChipId};
use crate::config::FlowConfig;
use crate::error::{AssignError, FlowError};
use crate::evaluator::{evaluate, Outcome};
use crate::phrase::RecoveryPhrase;
use crate::random::{ChallengeRandom, RngChallenge};
use crate::tracker::Attempt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Validating,
    Succeeded,
    Failed,
}

/// Identifies the attempt a delayed transition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Assign { chip: ChipId, group: usize },
    Release { group: usize },
    TransitionDue(AttemptTicket),
    Retry,
    Replay,
    Proceed,
    Leave,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Assign { .. } => "assign",
            Action::Release { .. } => "release",
            Action::TransitionDue(_) => "transition",
            Action::Retry => "retry",
            Action::Replay => "replay",
            Action::Proceed => "proceed",
            Action::Leave => "leave",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Play the error cue (haptic or similar) right away.
    FailureFeedback,
    /// Call back with [`Action::TransitionDue`] after `delay`.
    ScheduleTransition { ticket: AttemptTicket, delay: Duration },
    Succeeded,
    Failed,
    /// The user confirmed the backup and left the flow.
    Exited,
}

/// Everything the controller owns about the running check.
#[derive(Debug, Clone)]
pub struct ValidationState {
    stage: Stage,
    attempt: Option<Attempt>,
    generation: u64,
    pending: Option<Outcome>,
}

impl ValidationState {
    fn new() -> Self {
        ValidationState {
            stage: Stage::Idle,
            attempt: None,
            generation: 0,
            pending: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn attempt(&self) -> Option<&Attempt> {
        self.attempt.as_ref()
    }

    pub fn ticket(&self) -> AttemptTicket {
        AttemptTicket {
            generation: self.generation,
        }
    }

    /// Verdict waiting for its delayed transition.
    pub fn pending(&self) -> Option<Outcome> {
        self.pending
    }

    fn replace_attempt(&mut self, attempt: Option<Attempt>) {
        self.attempt = attempt;
        self.pending = None;
        self.generation += 1;
    }
}

/// Receives the controller's effects.
pub trait FlowHost {
    fn schedule_transition(&mut self, ticket: AttemptTicket, delay: Duration);

    fn on_failure_feedback_requested(&mut self) {}

    fn on_succeeded(&mut self) {}

    fn on_failed(&mut self) {}

    fn on_exited(&mut self) {}
}

pub struct BackupCheck<R = RngChallenge<StdRng>> {
    config: FlowConfig,
    random: R,
    phrase: Option<RecoveryPhrase>,
    state: ValidationState,
}

impl BackupCheck {
    pub fn with_entropy(config: FlowConfig) -> Self {
        BackupCheck::new(config, RngChallenge::from_entropy())
    }
}

impl<R: ChallengeRandom> BackupCheck<R> {
    pub fn new(config: FlowConfig, random: R) -> Self {
        BackupCheck {
            config,
            random,
            phrase: None,
            state: ValidationState::new(),
        }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn state(&self) -> &ValidationState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    /// Drops whatever runs now and begins a fresh attempt on `phrase`.
    pub fn start_validation(&mut self, phrase: RecoveryPhrase) -> Result<Vec<Effect>, FlowError> {
        let phrase = if phrase.group_count() == self.config.group_count {
            phrase
        } else {
            RecoveryPhrase::new(phrase.words().to_vec(), self.config.group_count)?
        };
        self.phrase = Some(phrase);
        self.reset(Stage::Idle);
        self.send(Action::Start)
    }

    pub fn assign_chip(&mut self, chip: ChipId, group: usize) -> Result<Vec<Effect>, FlowError> {
        self.send(Action::Assign { chip, group })
    }

    pub fn release(&mut self, group: usize) -> Result<Vec<Effect>, FlowError> {
        self.send(Action::Release { group })
    }

    pub fn transition_due(&mut self, ticket: AttemptTicket) -> Result<Vec<Effect>, FlowError> {
        self.send(Action::TransitionDue(ticket))
    }

    pub fn retry(&mut self) -> Result<Vec<Effect>, FlowError> {
        self.send(Action::Retry)
    }

    pub fn replay(&mut self) -> Result<Vec<Effect>, FlowError> {
        self.send(Action::Replay)
    }

    pub fn proceed(&mut self) -> Result<Vec<Effect>, FlowError> {
        self.send(Action::Proceed)
    }

    pub fn leave(&mut self) -> Result<Vec<Effect>, FlowError> {
        self.send(Action::Leave)
    }

    /// Applies one action and returns the effects the host has to carry out.
    ///
    /// A rejected action leaves the state untouched.
    pub fn send(&mut self, action: Action) -> Result<Vec<Effect>, FlowError> {
        let result = self.transition(action);
        if let Err(err) = &result {
            warn!(action = action.name(), stage = ?self.state.stage, %err, "action rejected");
        }
        result
    }

    fn transition(&mut self, action: Action) -> Result<Vec<Effect>, FlowError> {
        let stage = self.state.stage;
        let not_allowed = || FlowError::NotAllowed {
            action: action.name(),
            stage,
        };

        match (action, stage) {
            (Action::Start, Stage::Idle) => {
                if self.state.attempt.is_none() {
                    let attempt = self.fresh_attempt()?;
                    self.state.replace_attempt(Some(attempt));
                }
                self.enter(Stage::Validating);
                Ok(Vec::new())
            }

            (Action::Assign { chip, group }, Stage::Validating) => {
                let attempt = self.state.attempt.as_mut().ok_or(FlowError::NoPhrase)?;
                attempt.assign(chip, group)?;
                if !attempt.is_complete() {
                    return Ok(Vec::new());
                }

                let outcome = evaluate(attempt);
                self.state.pending = Some(outcome);
                let mut effects = Vec::with_capacity(2);
                if outcome == Outcome::Failed {
                    effects.push(Effect::FailureFeedback);
                }
                effects.push(Effect::ScheduleTransition {
                    ticket: self.state.ticket(),
                    delay: self.config.outcome_delay(),
                });
                Ok(effects)
            }

            (Action::Release { group }, Stage::Validating) => {
                let attempt = self.state.attempt.as_mut().ok_or(FlowError::NoPhrase)?;
                if self.state.pending.is_some() {
                    return Err(AssignError::AttemptComplete.into());
                }
                attempt.release(group)?;
                Ok(Vec::new())
            }

            (Action::TransitionDue(ticket), _) => {
                if ticket != self.state.ticket() {
                    debug!(?ticket, current = ?self.state.ticket(), "stale transition dropped");
                    return Ok(Vec::new());
                }
                match self.state.pending.take() {
                    Some(Outcome::Succeeded) => {
                        self.enter(Stage::Succeeded);
                        Ok(vec![Effect::Succeeded])
                    }
                    Some(Outcome::Failed) => {
                        self.enter(Stage::Failed);
                        Ok(vec![Effect::Failed])
                    }
                    None => {
                        debug!(?ticket, "no verdict pending, transition dropped");
                        Ok(Vec::new())
                    }
                }
            }

            (Action::Retry, Stage::Failed | Stage::Validating) => {
                let attempt = self.fresh_attempt()?;
                self.state.replace_attempt(Some(attempt));
                self.enter(Stage::Validating);
                Ok(Vec::new())
            }

            (Action::Replay, Stage::Succeeded) => {
                let attempt = self.fresh_attempt()?;
                self.state.replace_attempt(Some(attempt));
                self.enter(Stage::Idle);
                Ok(Vec::new())
            }

            (Action::Proceed, Stage::Succeeded) => {
                self.reset(Stage::Idle);
                Ok(vec![Effect::Exited])
            }

            (Action::Leave, _) => {
                self.reset(Stage::Idle);
                Ok(Vec::new())
            }

            _ => Err(not_allowed()),
        }
    }

    fn fresh_attempt(&mut self) -> Result<Attempt, FlowError> {
        let phrase = self.phrase.clone().ok_or(FlowError::NoPhrase)?;
        let challenge = Challenge::build(phrase, &mut self.random);
        Ok(Attempt::new(challenge))
    }

    fn reset(&mut self, stage: Stage) {
        self.state.replace_attempt(None);
        self.enter(stage);
    }

    fn enter(&mut self, stage: Stage) {
        if self.state.stage != stage {
            info!(
                from = ?self.state.stage,
                to = ?stage,
                generation = self.state.generation,
                "backup check stage"
            );
        }
        self.state.stage = stage;
    }
}

/// Sends `action` and hands every resulting effect to `host`.
pub fn drive<R, H>(
    check: &mut BackupCheck<R>,
    host: &mut H,
    action: Action,
) -> Result<(), FlowError>
where
    R: ChallengeRandom,
    H: FlowHost + ?Sized,
{
    for effect in check.send(action)? {
        match effect {
            Effect::FailureFeedback => host.on_failure_feedback_requested(),
            Effect::ScheduleTransition { ticket, delay } => host.schedule_transition(ticket, delay),
            Effect::Succeeded => host.on_succeeded(),
            Effect::Failed => host.on_failed(),
            Effect::Exited => host.on_exited(),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::tests::{numbers, Scripted};

    // chips of the scripted layout: #0 twentyfour, #1 seven, #2 three, #3 sixteen
    const CORRECT: [(usize, usize); 4] = [(2, 0), (1, 1), (3, 2), (0, 3)];
    const SWAPPED: [(usize, usize); 4] = [(1, 0), (2, 1), (3, 2), (0, 3)];

    fn scripted(attempts: usize) -> Scripted {
        Scripted {
            missing: [2, 0, 3, 5].repeat(attempts),
            order: vec![3, 1, 0, 2],
        }
    }

    fn started(attempts: usize) -> BackupCheck<Scripted> {
        let mut check = BackupCheck::new(FlowConfig::default(), scripted(attempts));
        check.start_validation(numbers()).unwrap();
        check
    }

    fn place(check: &mut BackupCheck<Scripted>, placements: [(usize, usize); 4]) -> Vec<Effect> {
        let mut last = Vec::new();
        for (chip, group) in placements {
            last = check.assign_chip(ChipId(chip), group).unwrap();
        }
        last
    }

    #[test]
    fn success_after_delay() {
        let mut check = started(1);
        assert_eq!(check.stage(), Stage::Validating);

        let ticket = check.state().ticket();
        let effects = place(&mut check, CORRECT);
        assert_eq!(
            effects,
            [Effect::ScheduleTransition {
                ticket,
                delay: Duration::from_secs(1)
            }]
        );
        assert_eq!(check.stage(), Stage::Validating);
        assert_eq!(check.state().pending(), Some(Outcome::Succeeded));

        assert_eq!(check.transition_due(ticket).unwrap(), [Effect::Succeeded]);
        assert_eq!(check.stage(), Stage::Succeeded);
        assert_eq!(check.state().pending(), None);
    }

    #[test]
    fn failure_cues_feedback_first() {
        let mut check = started(1);
        let effects = place(&mut check, SWAPPED);
        assert_eq!(effects[0], Effect::FailureFeedback);
        assert!(matches!(effects[1], Effect::ScheduleTransition { .. }));

        let ticket = check.state().ticket();
        assert_eq!(check.transition_due(ticket).unwrap(), [Effect::Failed]);
        assert_eq!(check.stage(), Stage::Failed);
    }

    #[test]
    fn retry_gives_fresh_attempt() {
        let mut check = started(2);
        place(&mut check, SWAPPED);
        let old = check.state().ticket();
        check.transition_due(old).unwrap();

        check.retry().unwrap();
        assert_eq!(check.stage(), Stage::Validating);
        assert_ne!(check.state().ticket(), old);
        let attempt = check.state().attempt().unwrap();
        assert_eq!(attempt.validation_words().count(), 0);
        assert_eq!(attempt.unassigned_chips().count(), 4);
        assert_eq!(check.state().pending(), None);
    }

    #[test]
    fn stale_transition_is_dropped() {
        let mut check = started(2);
        place(&mut check, SWAPPED);
        let stale = check.state().ticket();

        // retry before the delay fired
        check.retry().unwrap();
        assert!(check.transition_due(stale).unwrap().is_empty());
        assert_eq!(check.stage(), Stage::Validating);
        assert_eq!(check.state().pending(), None);

        let effects = place(&mut check, CORRECT);
        let Effect::ScheduleTransition { ticket, .. } = effects[0] else {
            panic!("expected a scheduled transition, got {:?}", effects);
        };
        assert!(check.transition_due(stale).unwrap().is_empty());
        assert_eq!(check.transition_due(ticket).unwrap(), [Effect::Succeeded]);
    }

    #[test]
    fn replay_returns_to_idle_with_new_attempt() {
        let mut check = started(2);
        place(&mut check, CORRECT);
        check.transition_due(check.state().ticket()).unwrap();

        let before = check.state().ticket();
        check.replay().unwrap();
        assert_eq!(check.stage(), Stage::Idle);
        assert_ne!(check.state().ticket(), before);
        assert_eq!(check.state().attempt().unwrap().filled(), 0);

        let prepared = check.state().ticket();
        check.send(Action::Start).unwrap();
        assert_eq!(check.stage(), Stage::Validating);
        assert_eq!(check.state().ticket(), prepared);
    }

    #[test]
    fn proceed_exits() {
        let mut check = started(1);
        place(&mut check, CORRECT);
        check.transition_due(check.state().ticket()).unwrap();

        assert_eq!(check.proceed().unwrap(), [Effect::Exited]);
        assert_eq!(check.stage(), Stage::Idle);
        assert!(check.state().attempt().is_none());
    }

    #[test]
    fn leave_discards_progress() {
        let mut check = started(2);
        check.assign_chip(ChipId(2), 0).unwrap();
        let ticket = check.state().ticket();

        assert!(check.leave().unwrap().is_empty());
        assert_eq!(check.stage(), Stage::Idle);
        assert!(check.state().attempt().is_none());

        check.send(Action::Start).unwrap();
        assert_ne!(check.state().ticket(), ticket);
        assert_eq!(check.state().attempt().unwrap().filled(), 0);
    }

    #[test]
    fn leave_before_delay_drops_pending_verdict() {
        let mut check = started(2);
        place(&mut check, CORRECT);
        let stale = check.state().ticket();
        assert_eq!(check.state().pending(), Some(Outcome::Succeeded));

        assert!(check.leave().unwrap().is_empty());
        assert!(check.transition_due(stale).unwrap().is_empty());
        assert_eq!(check.stage(), Stage::Idle);

        check.send(Action::Start).unwrap();
        assert!(check.transition_due(stale).unwrap().is_empty());
        assert_eq!(check.stage(), Stage::Validating);
        assert_eq!(check.state().pending(), None);
        assert_ne!(check.state().ticket(), stale);
        assert_eq!(check.state().attempt().unwrap().filled(), 0);
    }

    #[test]
    fn actions_outside_their_stage_are_rejected() {
        let mut check = started(1);
        assert_eq!(
            check.proceed(),
            Err(FlowError::NotAllowed {
                action: "proceed",
                stage: Stage::Validating
            })
        );
        assert!(matches!(check.replay(), Err(FlowError::NotAllowed { .. })));
        assert!(matches!(check.send(Action::Start), Err(FlowError::NotAllowed { .. })));

        let mut idle = BackupCheck::new(FlowConfig::default(), scripted(1));
        assert_eq!(idle.send(Action::Start), Err(FlowError::NoPhrase));
        assert!(matches!(idle.assign_chip(ChipId(0), 0), Err(FlowError::NotAllowed { .. })));
    }

    #[test]
    fn no_release_once_complete() {
        let mut check = started(1);
        place(&mut check, CORRECT);
        assert_eq!(check.release(0), Err(FlowError::Assign(AssignError::AttemptComplete)));
        assert_eq!(
            check.assign_chip(ChipId(0), 0),
            Err(FlowError::Assign(AssignError::AttemptComplete))
        );
    }

    #[test]
    fn regroups_phrase_to_configured_count() {
        let config = FlowConfig {
            group_count: 3,
            outcome_delay_ms: 0,
        };
        let mut check = BackupCheck::new(config, RngChallenge::seeded(5));
        check.start_validation(numbers()).unwrap();
        let challenge = check.state().attempt().unwrap().challenge();
        assert_eq!(challenge.group_count(), 3);
        assert_eq!(challenge.chips().len(), 3);
    }

    #[derive(Default)]
    struct Recorder {
        scheduled: Vec<AttemptTicket>,
        feedback: usize,
        succeeded: usize,
        failed: usize,
    }

    impl FlowHost for Recorder {
        fn schedule_transition(&mut self, ticket: AttemptTicket, _delay: Duration) {
            self.scheduled.push(ticket);
        }

        fn on_failure_feedback_requested(&mut self) {
            self.feedback += 1;
        }

        fn on_succeeded(&mut self) {
            self.succeeded += 1;
        }

        fn on_failed(&mut self) {
            self.failed += 1;
        }
    }

    #[test]
    fn drive_routes_effects_to_host() {
        let mut check = started(2);
        let mut host = Recorder::default();
        for (chip, group) in SWAPPED {
            drive(&mut check, &mut host, Action::Assign { chip: ChipId(chip), group }).unwrap();
        }
        assert_eq!(host.feedback, 1);
        assert_eq!(host.scheduled.len(), 1);

        let first = host.scheduled[0];
        drive(&mut check, &mut host, Action::TransitionDue(first)).unwrap();
        assert_eq!(host.failed, 1);

        drive(&mut check, &mut host, Action::Retry).unwrap();
        for (chip, group) in CORRECT {
            drive(&mut check, &mut host, Action::Assign { chip: ChipId(chip), group }).unwrap();
        }
        let second = host.scheduled[1];
        drive(&mut check, &mut host, Action::TransitionDue(second)).unwrap();
        assert_eq!((host.feedback, host.succeeded, host.failed), (1, 1, 1));
    }
}
