//! Step tree types
//!
//! A script is an ordered list of [`Step`]s. `If` and `While` blocks nest
//! further steps; every other step is a leaf.

use super::callback::{CallbackError, CompletionHook, Condition, TextProducer, Validator};
use super::cursor::{self, Position};
use super::validate::{self, ScriptError, StepDefinition};
use crate::answers::ChatContext;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Text
// ============================================================================

/// Text that is either fixed in the script or computed from the answers
#[derive(Clone)]
pub enum Text {
    Literal(String),
    Computed(Arc<dyn TextProducer>),
}

impl Text {
    pub fn computed(producer: impl TextProducer + 'static) -> Self {
        Text::Computed(Arc::new(producer))
    }

    pub async fn resolve(&self, ctx: &ChatContext) -> Result<String, CallbackError> {
        match self {
            Text::Literal(text) => Ok(text.clone()),
            Text::Computed(producer) => producer.produce(ctx).await,
        }
    }
}

impl Default for Text {
    fn default() -> Self {
        Text::Literal(String::new())
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Text::Literal(text.to_string())
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Text::Literal(text)
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Text::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Text::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

// ============================================================================
// Leaf steps
// ============================================================================

/// Bot output, optionally followed by an artificial pause
#[derive(Clone, Default)]
pub struct OutputStep {
    /// `None` emits a bot message with empty text
    pub text: Option<Text>,
    pub wait: Duration,
    pub complete: Option<Arc<dyn CompletionHook>>,
}

impl OutputStep {
    pub fn new(text: impl Into<Text>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// An output with no text of its own, used for pauses
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn wait_ms(mut self, millis: u64) -> Self {
        self.wait = Duration::from_millis(millis);
        self
    }

    pub fn on_complete(mut self, hook: impl CompletionHook + 'static) -> Self {
        self.complete = Some(Arc::new(hook));
        self
    }
}

/// Kind of answer an input step collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    #[default]
    Text,
}

/// One entry in an input's validation chain
#[derive(Clone)]
pub struct ValidationRule {
    /// Rules without a predicate never reject
    pub predicate: Option<Arc<dyn Validator>>,
    pub error_text: Text,
}

impl ValidationRule {
    pub fn new(predicate: impl Validator + 'static, error_text: impl Into<Text>) -> Self {
        Self {
            predicate: Some(Arc::new(predicate)),
            error_text: error_text.into(),
        }
    }

    pub fn without_predicate(error_text: impl Into<Text>) -> Self {
        Self {
            predicate: None,
            error_text: error_text.into(),
        }
    }
}

/// Prompt for one answer, stored under `name`
#[derive(Clone)]
pub struct InputStep {
    pub kind: InputKind,
    pub name: String,
    pub validation: Vec<ValidationRule>,
    pub complete: Option<Arc<dyn CompletionHook>>,
}

impl InputStep {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            kind: InputKind::Text,
            name: name.into(),
            validation: Vec::new(),
            complete: None,
        }
    }

    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    /// Shorthand for a rule with a predicate
    pub fn validate(
        self,
        predicate: impl Validator + 'static,
        error_text: impl Into<Text>,
    ) -> Self {
        self.rule(ValidationRule::new(predicate, error_text))
    }

    pub fn on_complete(mut self, hook: impl CompletionHook + 'static) -> Self {
        self.complete = Some(Arc::new(hook));
        self
    }
}

// ============================================================================
// Blocks
// ============================================================================

/// Shared shape of `if` and `while` blocks
#[derive(Clone)]
pub struct Block {
    pub condition: Arc<dyn Condition>,
    pub children: Vec<Step>,
    pub complete: Option<Arc<dyn CompletionHook>>,
}

impl Block {
    pub fn new(condition: impl Condition + 'static, children: Vec<Step>) -> Self {
        Self {
            condition: Arc::new(condition),
            children,
            complete: None,
        }
    }

    pub fn on_complete(mut self, hook: impl CompletionHook + 'static) -> Self {
        self.complete = Some(Arc::new(hook));
        self
    }
}

// ============================================================================
// Step
// ============================================================================

/// One node of the script tree
#[derive(Clone)]
pub enum Step {
    Output(OutputStep),
    Input(InputStep),
    If(Block),
    While(Block),
}

impl Step {
    pub fn output(text: impl Into<Text>) -> Self {
        Step::Output(OutputStep::new(text))
    }

    pub fn input(name: impl Into<String>) -> Self {
        Step::Input(InputStep::text(name))
    }

    pub fn when(condition: impl Condition + 'static, children: Vec<Step>) -> Self {
        Step::If(Block::new(condition, children))
    }

    pub fn repeat_while(condition: impl Condition + 'static, children: Vec<Step>) -> Self {
        Step::While(Block::new(condition, children))
    }

    /// Child steps for blocks, `None` for leaves
    pub fn children(&self) -> Option<&[Step]> {
        match self {
            Step::If(block) | Step::While(block) => Some(&block.children),
            Step::Output(_) | Step::Input(_) => None,
        }
    }

    pub fn completion_hook(&self) -> Option<&Arc<dyn CompletionHook>> {
        match self {
            Step::Output(step) => step.complete.as_ref(),
            Step::Input(step) => step.complete.as_ref(),
            Step::If(block) | Step::While(block) => block.complete.as_ref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Step::Output(_) => "output",
            Step::Input(_) => "input",
            Step::If(_) => "if",
            Step::While(_) => "while",
        }
    }
}

impl From<OutputStep> for Step {
    fn from(step: OutputStep) -> Self {
        Step::Output(step)
    }
}

impl From<InputStep> for Step {
    fn from(step: InputStep) -> Self {
        Step::Input(step)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Output(step) => f
                .debug_struct("Output")
                .field("text", &step.text)
                .field("wait", &step.wait)
                .finish_non_exhaustive(),
            Step::Input(step) => f
                .debug_struct("Input")
                .field("kind", &step.kind)
                .field("name", &step.name)
                .field("rules", &step.validation.len())
                .finish_non_exhaustive(),
            Step::If(block) => f
                .debug_struct("If")
                .field("children", &block.children)
                .finish_non_exhaustive(),
            Step::While(block) => f
                .debug_struct("While")
                .field("children", &block.children)
                .finish_non_exhaustive(),
        }
    }
}

// ============================================================================
// Script
// ============================================================================

/// A structurally valid, immutable step tree
#[derive(Clone)]
pub struct Script {
    steps: Vec<Step>,
    complete: Option<Arc<dyn CompletionHook>>,
}

impl Script {
    /// Check block shapes and wrap the tree
    pub fn new(steps: Vec<Step>) -> Result<Self, ScriptError> {
        validate::check_steps(&steps, &[])?;
        Ok(Self {
            steps,
            complete: None,
        })
    }

    /// Build a script from the authoring shape, rejecting nodes that do not
    /// populate exactly one of output/input/if/while
    pub fn from_definitions(definitions: Vec<StepDefinition>) -> Result<Self, ScriptError> {
        let steps = validate::compile_definitions(definitions, &[])?;
        Self::new(steps)
    }

    /// Hook run once when the conversation completes
    pub fn with_complete(mut self, hook: impl CompletionHook + 'static) -> Self {
        self.complete = Some(Arc::new(hook));
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn completion_hook(&self) -> Option<&Arc<dyn CompletionHook>> {
        self.complete.as_ref()
    }

    pub fn step_at(&self, position: &Position) -> Option<&Step> {
        cursor::lookup(&self.steps, position)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("steps", &self.steps)
            .field("complete", &self.complete.is_some())
            .finish()
    }
}
