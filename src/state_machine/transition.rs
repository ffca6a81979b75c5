//! Pure state transition function

use super::{Effect, Event, FormState, Phase, Status};
use crate::script::cursor::{self, Position};
use crate::script::{Script, Step};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: FormState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: FormState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition. The state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("form is {status}, not waiting for input")]
    NotAwaitingInput { status: Status },
    #[error("submission answers prompt {submitted}, current prompt is {current}")]
    StaleSubmission { submitted: u64, current: u64 },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same state, script and event this always produces the same
/// result. Callbacks are never invoked here; they are requested as effects.
pub fn transition(
    state: &FormState,
    script: &Script,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let prompts = state.prompts;
    match (&state.phase, event) {
        // ============================================================
        // Drive loop
        // ============================================================
        (Phase::Running, Event::Drive) => Ok(drive(state, script)),

        // ============================================================
        // Output
        // ============================================================
        (Phase::ResolvingText, Event::TextResolved { text }) => {
            let Some(Step::Output(output)) = script.step_at(&state.position) else {
                return Err(unexpected_step(state, "output"));
            };
            let settle = Effect::SettleOutput {
                wait: output.wait,
                hook: output.complete.clone(),
            };
            Ok(
                TransitionResult::new(FormState::at(
                    state.position.clone(),
                    Phase::Settling,
                    prompts,
                ))
                .with_effect(Effect::bot_message(text))
                .with_effect(settle),
            )
        }

        (Phase::Settling, Event::OutputSettled) => Ok(move_on(script, &state.position, prompts)),

        // ============================================================
        // Blocks
        // ============================================================
        (Phase::EvaluatingCondition, Event::ConditionEvaluated { holds: true }) => Ok(
            TransitionResult::new(FormState::at(
                state.position.descend(),
                Phase::Running,
                prompts,
            )),
        ),

        // A false condition is the block's exit, whether or not it ever ran
        (Phase::EvaluatingCondition, Event::ConditionEvaluated { holds: false }) => {
            let step = script.step_at(&state.position);
            let Some(Step::If(block) | Step::While(block)) = step else {
                return Err(unexpected_step(state, "block"));
            };
            let kind = step.map_or("block", Step::kind);
            let exit_hook = block.complete.as_ref().map(|hook| Effect::run_hook(hook, kind));
            let next = move_on(script, &state.position, prompts);
            Ok(TransitionResult::new(next.new_state)
                .with_effects(exit_hook)
                .with_effects(next.effects))
        }

        // ============================================================
        // User submission
        // ============================================================
        (Phase::AwaitingInput, Event::UserSubmit { turn, .. }) if turn != prompts => {
            Err(TransitionError::StaleSubmission {
                submitted: turn,
                current: prompts,
            })
        }

        (Phase::AwaitingInput, Event::UserSubmit { text, .. }) => {
            let Some(Step::Input(input)) = script.step_at(&state.position) else {
                return Err(unexpected_step(state, "input"));
            };
            Ok(TransitionResult::new(FormState::at(
                state.position.clone(),
                Phase::Validating { text: text.clone() },
                prompts,
            ))
            .with_effect(Effect::publish(Status::Active))
            .with_effect(Effect::user_message(text.clone()))
            .with_effect(Effect::Validate {
                rules: input.validation.clone(),
                text,
            }))
        }

        (phase, Event::UserSubmit { .. }) => Err(TransitionError::NotAwaitingInput {
            status: phase.status(),
        }),

        // ============================================================
        // Validation
        // ============================================================
        (Phase::Validating { text }, Event::ValidationPassed) => {
            let Some(Step::Input(input)) = script.step_at(&state.position) else {
                return Err(unexpected_step(state, "input"));
            };
            let store = Effect::StoreAnswer {
                name: input.name.clone(),
                value: text.clone(),
            };
            let hook = input.complete.as_ref().map(|hook| Effect::run_hook(hook, "input"));
            let next = move_on(script, &state.position, prompts);
            Ok(TransitionResult::new(next.new_state)
                .with_effect(store)
                .with_effects(hook)
                .with_effects(next.effects))
        }

        // Re-present the same input; the submission is discarded
        (Phase::Validating { .. }, Event::ValidationFailed { error_text }) => Ok(
            TransitionResult::new(FormState::at(
                state.position.clone(),
                Phase::Running,
                prompts,
            ))
            .with_effect(Effect::bot_message(error_text)),
        ),

        // ============================================================
        // Invalid transitions
        // ============================================================
        (phase, event) => Err(TransitionError::InvalidTransition(format!(
            "{} while {:?} at {}",
            event.name(),
            phase,
            state.position
        ))),
    }
}

/// Interpret the step at the current position
fn drive(state: &FormState, script: &Script) -> TransitionResult {
    let position = state.position.clone();
    let prompts = state.prompts;
    match script.step_at(&position) {
        None => TransitionResult::new(FormState::at(position, Phase::Completed, prompts))
            .with_effect(Effect::RunFormHook)
            .with_effect(Effect::publish(Status::Completed)),
        Some(Step::Output(output)) => {
            TransitionResult::new(FormState::at(position, Phase::ResolvingText, prompts))
                .with_effect(Effect::ResolveText {
                    text: output.text.clone(),
                })
        }
        Some(Step::Input(_)) => {
            TransitionResult::new(FormState::at(position, Phase::AwaitingInput, prompts + 1))
                .with_effect(Effect::publish(Status::Waiting))
        }
        Some(Step::If(block) | Step::While(block)) => {
            TransitionResult::new(FormState::at(position, Phase::EvaluatingCondition, prompts))
                .with_effect(Effect::EvaluateCondition {
                    condition: block.condition.clone(),
                })
        }
    }
}

/// Advance past a finished step, running the hooks of any `if` blocks
/// exhausted on the way
fn move_on(script: &Script, position: &Position, prompts: u64) -> TransitionResult {
    let advance = cursor::advance(script.steps(), position);
    let exit_hooks = advance.exited.iter().filter_map(|exited| {
        script
            .step_at(exited)
            .and_then(Step::completion_hook)
            .map(|hook| Effect::run_hook(hook, "if"))
    });
    let effects: Vec<Effect> = exit_hooks.collect();
    TransitionResult::new(FormState::at(advance.next, Phase::Running, prompts))
        .with_effects(effects)
}

fn unexpected_step(state: &FormState, expected: &str) -> TransitionError {
    TransitionError::InvalidTransition(format!(
        "expected {expected} step at {} while {:?}",
        state.position, state.phase
    ))
}
