//! Test helpers: recording callbacks and ready-made scripts
//!
//! These let runtime tests observe callback order without real I/O.

use crate::answers::ChatContext;
use crate::script::{
    CallbackError, CompletionHook, Condition, OutputStep, Script, Step, Text, Validator,
};
use crate::transcript::{Sender, Transcript};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Scripts
// ============================================================================

/// Ask for a name, pause for two seconds, then greet
pub fn name_script() -> Script {
    Script::new(vec![
        Step::output("Enter your name: "),
        Step::input("name"),
        OutputStep::silent().wait_ms(2000).into(),
        Step::output(Text::computed(|ctx: &ChatContext| {
            format!("Hello, {}!", ctx.first("name").unwrap_or_default())
        })),
    ])
    .expect("name script is valid")
}

/// Texts of the bot messages, in order
pub fn bot_texts(transcript: &Transcript) -> Vec<&str> {
    transcript
        .messages()
        .iter()
        .filter(|m| m.sender == Sender::Bot)
        .map(|m| m.text.as_str())
        .collect()
}

// ============================================================================
// Recording callbacks
// ============================================================================

/// Shared log that hooks append labels to
#[derive(Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hook that records `label` together with the answers it could see
    pub fn hook(&self, label: &str) -> RecordingHook {
        RecordingHook {
            label: label.to_string(),
            entries: Arc::clone(&self.entries),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

pub struct RecordingHook {
    label: String,
    entries: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl CompletionHook for RecordingHook {
    async fn complete(&self, ctx: &ChatContext) -> Result<(), CallbackError> {
        let seen = ctx.get("pet").map_or(0, <[String]>::len);
        self.entries
            .lock()
            .unwrap()
            .push(format!("{}:{seen}", self.label));
        Ok(())
    }
}

/// Condition that holds `times` times, then fails forever. Clones share
/// their counters.
#[derive(Clone)]
pub struct Countdown {
    remaining: Arc<AtomicUsize>,
    checks: Arc<AtomicUsize>,
}

impl Countdown {
    pub fn new(times: usize) -> Self {
        Self {
            remaining: Arc::new(AtomicUsize::new(times)),
            checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Condition for Countdown {
    async fn check(&self, _ctx: &ChatContext) -> Result<bool, CallbackError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let holds = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        Ok(holds)
    }
}

/// Validator that counts its calls and rejects blank text
#[derive(Clone, Default)]
pub struct NonEmpty {
    calls: Arc<AtomicUsize>,
}

impl NonEmpty {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Validator for NonEmpty {
    async fn validate(&self, value: &str, _ctx: &ChatContext) -> Result<bool, CallbackError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(!value.trim().is_empty())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormConfig;
    use crate::runtime::{FormError, FormRuntime};
    use crate::script::{Block, Deferred, InputStep, ValidationRule};
    use crate::state_machine::{Status, TransitionError};
    use std::time::Duration;

    fn instant(script: Script) -> FormRuntime {
        FormRuntime::new(script, FormConfig::instant())
    }

    fn never(_ctx: &ChatContext) -> bool {
        false
    }

    /// The greeting scenario end to end, with the real two second pause
    #[tokio::test(start_paused = true)]
    async fn test_name_scenario() {
        let mut form = FormRuntime::new(name_script(), FormConfig::default());
        form.start().await.unwrap();

        assert_eq!(form.transcript().len(), 1);
        assert_eq!(form.status(), Status::Waiting);

        let started = tokio::time::Instant::now();
        form.submit("Ada").await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(2000));
        let messages = form.transcript().messages();
        assert_eq!(messages[1].text, "Ada");
        assert_eq!(messages[1].sender, Sender::User);
        assert_eq!(bot_texts(form.transcript()), vec!["Enter your name: ", "", "Hello, Ada!"]);
        assert_eq!(form.status(), Status::Completed);
        assert_eq!(form.answers().get("name"), Some(&["Ada".to_string()][..]));
    }

    #[tokio::test]
    async fn test_loop_runs_exactly_n_times() {
        let countdown = Countdown::new(3);
        let script = Script::new(vec![
            Step::repeat_while(
                countdown.clone(),
                vec![Step::output("Another pet?"), Step::input("pet")],
            ),
            Step::output("Done"),
        ])
        .unwrap();
        let mut form = instant(script);
        form.start().await.unwrap();

        for pet in ["cat", "dog", "eel"] {
            assert_eq!(form.status(), Status::Waiting);
            form.submit(pet).await.unwrap();
        }

        assert_eq!(form.status(), Status::Completed);
        assert_eq!(countdown.checks(), 4);
        assert_eq!(
            bot_texts(form.transcript()),
            vec!["Another pet?", "Another pet?", "Another pet?", "Done"]
        );
        let ctx = form.context();
        assert_eq!(ctx.get("pet").map(<[String]>::len), Some(3));
        assert_eq!(ctx.first("pet"), Some("cat"));
        assert_eq!(ctx.last("pet"), Some("eel"));
    }

    #[tokio::test]
    async fn test_false_if_emits_nothing_from_children() {
        let script = Script::new(vec![
            Step::when(never, vec![Step::output("hidden"), Step::input("secret")]),
            Step::output("visible"),
        ])
        .unwrap();
        let mut form = instant(script);
        form.start().await.unwrap();

        assert_eq!(bot_texts(form.transcript()), vec!["visible"]);
        assert!(form.answers().is_empty());
        assert_eq!(form.status(), Status::Completed);
    }

    #[tokio::test]
    async fn test_failed_validation_reprompts() {
        let validator = NonEmpty::default();
        let script = Script::new(vec![
            InputStep::text("name")
                .validate(validator.clone(), "Name is required")
                .into(),
            Step::output("Thanks"),
        ])
        .unwrap();
        let mut form = instant(script);
        form.start().await.unwrap();

        form.submit("   ").await.unwrap();

        assert_eq!(form.status(), Status::Waiting);
        assert_eq!(bot_texts(form.transcript()), vec!["Name is required"]);
        assert!(form.answers().is_empty());
        assert_eq!(form.state().position.indices(), &[0]);

        form.submit("Ada").await.unwrap();
        assert_eq!(form.status(), Status::Completed);
        assert_eq!(validator.calls(), 2);
    }

    #[tokio::test]
    async fn test_first_failing_rule_wins() {
        let later = NonEmpty::default();
        let short = |value: &str, _ctx: &ChatContext| value.len() <= 3;
        let error = Text::computed(|ctx: &ChatContext| {
            format!("Too long, {} answers so far", ctx.get("code").map_or(0, <[String]>::len))
        });
        let script = Script::new(vec![InputStep::text("code")
            .rule(ValidationRule::without_predicate("never shown"))
            .validate(short, error)
            .validate(later.clone(), "unused")
            .into()])
        .unwrap();
        let mut form = instant(script);
        form.start().await.unwrap();

        form.submit("toolong").await.unwrap();

        assert_eq!(bot_texts(form.transcript()), vec!["Too long, 0 answers so far"]);
        assert_eq!(later.calls(), 0);
    }

    #[tokio::test]
    async fn test_submission_while_completed_has_no_effect() {
        let mut form = instant(name_script());
        form.start().await.unwrap();
        form.submit("Ada").await.unwrap();
        let before = form.view();

        let err = form.submit("again").await.unwrap_err();

        assert!(matches!(
            err,
            FormError::Rejected(TransitionError::NotAwaitingInput {
                status: Status::Completed
            })
        ));
        assert_eq!(form.transcript().len(), before.transcript.len());
        assert_eq!(form.answers(), &before.answers);
        assert_eq!(form.state().position, before.position);
    }

    #[tokio::test]
    async fn test_hooks_run_in_order() {
        let recorder = Recorder::new();
        let script = Script::new(vec![
            Step::While(
                Block::new(Countdown::new(2), vec![
                    InputStep::text("pet").on_complete(recorder.hook("input")).into(),
                    Step::If(
                        Block::new(|_: &ChatContext| true, vec![Step::output("noted")])
                            .on_complete(recorder.hook("if")),
                    ),
                ])
                .on_complete(recorder.hook("while")),
            ),
            OutputStep::new("bye").on_complete(recorder.hook("output")).into(),
        ])
        .unwrap()
        .with_complete(recorder.hook("form"));
        let mut form = instant(script);
        form.start().await.unwrap();
        form.submit("cat").await.unwrap();
        form.submit("dog").await.unwrap();

        assert_eq!(form.status(), Status::Completed);
        assert_eq!(
            recorder.entries(),
            vec!["input:1", "if:1", "input:2", "if:2", "while:2", "output:2", "form:2"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_hook_joins_with_wait() {
        let slow_hook = Deferred(|_ctx: ChatContext| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok::<(), CallbackError>(())
        });
        let script = Script::new(vec![
            OutputStep::new("Thinking...").wait_ms(2000).on_complete(slow_hook).into(),
            Step::output("done"),
        ])
        .unwrap();
        let mut form = FormRuntime::new(script, FormConfig::default());

        let started = tokio::time::Instant::now();
        form.start().await.unwrap();

        // Hook and timer run together, so the pause is the longer of the two
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(2000));
        assert!(elapsed < Duration::from_millis(2500));
        assert_eq!(form.status(), Status::Completed);
    }

    #[tokio::test]
    async fn test_async_condition_is_awaited() {
        let has_name = Deferred(|ctx: ChatContext| async move {
            tokio::task::yield_now().await;
            Ok::<bool, CallbackError>(ctx.first("name").is_some())
        });
        let script = Script::new(vec![
            Step::input("name"),
            Step::when(has_name, vec![Step::output("Welcome back")]),
        ])
        .unwrap();
        let mut form = instant(script);
        form.start().await.unwrap();
        form.submit("Ada").await.unwrap();

        assert_eq!(bot_texts(form.transcript()), vec!["Welcome back"]);
    }

    #[tokio::test]
    async fn test_condition_failure_freezes_form() {
        let broken = Deferred(|_ctx: ChatContext| async {
            Err::<bool, _>(CallbackError::new("lookup failed"))
        });
        let script = Script::new(vec![
            Step::input("name"),
            Step::when(broken, vec![Step::output("unreachable")]),
        ])
        .unwrap();
        let mut form = instant(script);
        form.start().await.unwrap();

        let err = form.submit("Ada").await.unwrap_err();
        assert_eq!(err.to_string(), "condition callback failed at [1]: lookup failed");
        assert!(form.is_halted());

        let transcript_len = form.transcript().len();
        assert!(matches!(form.submit("again").await, Err(FormError::Halted)));
        assert_eq!(form.transcript().len(), transcript_len);
    }

    #[tokio::test]
    async fn test_instances_are_isolated() {
        let mut first = instant(name_script());
        let mut second = instant(name_script());
        first.start().await.unwrap();
        second.start().await.unwrap();

        first.submit("Ada").await.unwrap();

        assert_eq!(first.status(), Status::Completed);
        assert_eq!(second.status(), Status::Waiting);
        assert!(second.answers().is_empty());
        assert_ne!(first.form_id(), second.form_id());
    }
}
