//! Form runtime executor

use super::{FormError, FormEvent, FormView};
use crate::answers::{AnswerStore, ChatContext};
use crate::config::FormConfig;
use crate::script::{CallbackError, CallbackKind, Script};
use crate::state_machine::{transition, Effect, Event, FormState, Phase, Status};
use crate::transcript::Transcript;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// One form instance: script, cursor state, answers and transcript.
///
/// All operations take `&mut self`, so a single instance never has two
/// drive loops in flight. Independent instances share nothing.
pub struct FormRuntime {
    form_id: String,
    script: Arc<Script>,
    config: FormConfig,
    state: FormState,
    answers: Arc<AnswerStore>,
    transcript: Transcript,
    halted: bool,
    broadcast_tx: Option<broadcast::Sender<FormEvent>>,
    view_tx: Option<watch::Sender<FormView>>,
}

impl FormRuntime {
    pub fn new(script: impl Into<Arc<Script>>, config: FormConfig) -> Self {
        Self {
            form_id: uuid::Uuid::new_v4().to_string(),
            script: script.into(),
            config,
            state: FormState::new(),
            answers: Arc::default(),
            transcript: Transcript::new(),
            halted: false,
            broadcast_tx: None,
            view_tx: None,
        }
    }

    /// Forward incremental events to `tx`
    pub fn with_broadcast(mut self, tx: broadcast::Sender<FormEvent>) -> Self {
        self.broadcast_tx = Some(tx);
        self
    }

    /// Keep `tx` updated with a fresh [`FormView`] after every change
    pub fn with_view(mut self, tx: watch::Sender<FormView>) -> Self {
        tx.send_replace(self.view());
        self.view_tx = Some(tx);
        self
    }

    /// Run the drive loop from the first step until the form waits for
    /// input or completes
    pub async fn start(&mut self) -> Result<(), FormError> {
        tracing::info!(form_id = %self.form_id, steps = self.script.steps().len(), "Starting form");
        self.process_event(Event::Drive).await
    }

    /// Submit an answer to the prompt currently shown
    pub async fn submit(&mut self, text: impl Into<String>) -> Result<(), FormError> {
        let turn = self.state.prompts;
        self.submit_for_turn(text, turn).await
    }

    /// Submit an answer to a specific prompt. Answers to an earlier prompt
    /// are rejected without touching the form.
    pub async fn submit_for_turn(
        &mut self,
        text: impl Into<String>,
        turn: u64,
    ) -> Result<(), FormError> {
        self.process_event(Event::UserSubmit {
            text: text.into(),
            turn,
        })
        .await
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Read-only view of the answers collected so far
    pub fn context(&self) -> ChatContext {
        ChatContext::new(Arc::clone(&self.answers))
    }

    pub fn view(&self) -> FormView {
        FormView {
            form_id: self.form_id.clone(),
            status: self.status(),
            position: self.state.position.clone(),
            prompt: self.state.prompts,
            transcript: self.transcript.messages().to_vec(),
            answers: AnswerStore::clone(&self.answers),
            halted: self.halted,
        }
    }

    async fn process_event(&mut self, event: Event) -> Result<(), FormError> {
        if self.halted {
            return Err(FormError::Halted);
        }

        // Chained events are processed in a loop, not by recursion
        let mut pending = Some(event);

        while let Some(current_event) = pending.take() {
            let event_name = current_event.name();

            // Pure state transition
            let result = match transition(&self.state, &self.script, current_event) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(
                        form_id = %self.form_id,
                        event = event_name,
                        position = %self.state.position,
                        error = %e,
                        "Event rejected"
                    );
                    return Err(e.into());
                }
            };

            tracing::debug!(
                form_id = %self.form_id,
                event = event_name,
                from = ?self.state.phase,
                to = ?result.new_state.phase,
                position = %result.new_state.position,
                "Transition"
            );
            self.state = result.new_state;

            for effect in result.effects {
                match self.execute_effect(effect).await {
                    Ok(Some(generated)) => pending = Some(generated),
                    Ok(None) => {}
                    Err(e) => {
                        self.halt(&e);
                        return Err(e);
                    }
                }
            }

            // Nothing outstanding: keep interpreting steps
            if pending.is_none() && self.state.phase == Phase::Running {
                pending = Some(Event::Drive);
            }
        }

        Ok(())
    }

    async fn execute_effect(&mut self, effect: Effect) -> Result<Option<Event>, FormError> {
        match effect {
            Effect::ResolveText { text } => {
                let text = match text {
                    Some(text) => text
                        .resolve(&self.context())
                        .await
                        .map_err(|e| self.callback_error(CallbackKind::Text, e))?,
                    None => String::new(),
                };
                Ok(Some(Event::TextResolved { text }))
            }

            Effect::AppendMessage { sender, text } => {
                let message = self.transcript.append(sender, text);
                self.notify(FormEvent::Message { message });
                self.refresh_view();
                Ok(None)
            }

            Effect::SettleOutput { wait, hook } => {
                let ctx = self.context();
                let wait = self.config.scaled_wait(wait);
                let run_hook = async {
                    match &hook {
                        Some(hook) => hook.complete(&ctx).await,
                        None => Ok(()),
                    }
                };
                let timer = async {
                    if !wait.is_zero() {
                        tokio::time::sleep(wait).await;
                    }
                    Ok::<(), CallbackError>(())
                };
                tokio::try_join!(run_hook, timer)
                    .map_err(|e| self.callback_error(CallbackKind::Hook, e))?;
                Ok(Some(Event::OutputSettled))
            }

            Effect::EvaluateCondition { condition } => {
                let holds = condition
                    .check(&self.context())
                    .await
                    .map_err(|e| self.callback_error(CallbackKind::Condition, e))?;
                tracing::debug!(form_id = %self.form_id, position = %self.state.position, holds, "Condition evaluated");
                Ok(Some(Event::ConditionEvaluated { holds }))
            }

            Effect::Validate { rules, text } => {
                let ctx = self.context();
                for rule in &rules {
                    // Rules without a predicate never reject
                    let Some(predicate) = &rule.predicate else {
                        continue;
                    };
                    let accepted = predicate
                        .validate(&text, &ctx)
                        .await
                        .map_err(|e| self.callback_error(CallbackKind::Validation, e))?;
                    if !accepted {
                        let error_text = rule
                            .error_text
                            .resolve(&ctx)
                            .await
                            .map_err(|e| self.callback_error(CallbackKind::Text, e))?;
                        tracing::info!(form_id = %self.form_id, position = %self.state.position, "Submission failed validation");
                        return Ok(Some(Event::ValidationFailed { error_text }));
                    }
                }
                Ok(Some(Event::ValidationPassed))
            }

            Effect::StoreAnswer { name, value } => {
                tracing::info!(form_id = %self.form_id, name = %name, "Answer stored");
                Arc::make_mut(&mut self.answers).push(name.clone(), value.clone());
                self.notify(FormEvent::AnswerStored { name, value });
                self.refresh_view();
                Ok(None)
            }

            Effect::RunHook { hook, step } => {
                tracing::debug!(form_id = %self.form_id, step, "Running completion hook");
                hook.complete(&self.context())
                    .await
                    .map_err(|e| self.callback_error(CallbackKind::Hook, e))?;
                Ok(None)
            }

            Effect::RunFormHook => {
                if let Some(hook) = self.script.completion_hook().cloned() {
                    hook.complete(&self.context())
                        .await
                        .map_err(|e| self.callback_error(CallbackKind::Hook, e))?;
                }
                Ok(None)
            }

            Effect::PublishStatus { status } => {
                tracing::info!(form_id = %self.form_id, status = %status, position = %self.state.position, "Status changed");
                self.notify(FormEvent::StatusChanged { status });
                self.refresh_view();
                Ok(None)
            }
        }
    }

    fn callback_error(&self, kind: CallbackKind, source: CallbackError) -> FormError {
        FormError::Callback {
            kind,
            position: self.state.position.clone(),
            source,
        }
    }

    /// Freeze the instance after a callback failure
    fn halt(&mut self, error: &FormError) {
        tracing::error!(form_id = %self.form_id, position = %self.state.position, error = %error, "Form halted");
        self.halted = true;
        self.notify(FormEvent::Error {
            message: error.to_string(),
        });
        self.refresh_view();
    }

    fn notify(&self, event: FormEvent) {
        if let Some(tx) = &self.broadcast_tx {
            // No subscribers is fine
            let _ = tx.send(event);
        }
    }

    fn refresh_view(&self) {
        if let Some(tx) = &self.view_tx {
            tx.send_replace(self.view());
        }
    }
}
