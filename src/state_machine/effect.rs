//! Effects produced by state transitions

use crate::script::{CompletionHook, Condition, Text, ValidationRule};
use crate::state_machine::state::Status;
use crate::transcript::Sender;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Effects to be executed after a state transition, in order
#[derive(Clone)]
pub enum Effect {
    /// Produce the text of an output step. `None` yields an empty message.
    ResolveText { text: Option<Text> },

    /// Append a message to the transcript
    AppendMessage { sender: Sender, text: String },

    /// Run the output's completion hook and its wait timer concurrently,
    /// reporting once both have finished
    SettleOutput {
        wait: Duration,
        hook: Option<Arc<dyn CompletionHook>>,
    },

    /// Evaluate an `if`/`while` condition
    EvaluateCondition { condition: Arc<dyn Condition> },

    /// Run the validation chain over submitted text
    Validate {
        rules: Vec<ValidationRule>,
        text: String,
    },

    /// Append an accepted answer to the store
    StoreAnswer { name: String, value: String },

    /// Run a step completion hook
    RunHook {
        hook: Arc<dyn CompletionHook>,
        step: &'static str,
    },

    /// Run the form-level completion hook, if the script has one
    RunFormHook,

    /// Tell observers the status changed
    PublishStatus { status: Status },
}

impl Effect {
    pub fn bot_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::Bot,
            text: text.into(),
        }
    }

    pub fn user_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn publish(status: Status) -> Self {
        Effect::PublishStatus { status }
    }

    pub fn run_hook(hook: &Arc<dyn CompletionHook>, step: &'static str) -> Self {
        Effect::RunHook {
            hook: Arc::clone(hook),
            step,
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::ResolveText { text } => {
                f.debug_struct("ResolveText").field("text", text).finish()
            }
            Effect::AppendMessage { sender, text } => f
                .debug_struct("AppendMessage")
                .field("sender", sender)
                .field("text", text)
                .finish(),
            Effect::SettleOutput { wait, hook } => f
                .debug_struct("SettleOutput")
                .field("wait", wait)
                .field("hook", &hook.is_some())
                .finish(),
            Effect::EvaluateCondition { .. } => f.write_str("EvaluateCondition"),
            Effect::Validate { rules, text } => f
                .debug_struct("Validate")
                .field("rules", &rules.len())
                .field("text", text)
                .finish(),
            Effect::StoreAnswer { name, value } => f
                .debug_struct("StoreAnswer")
                .field("name", name)
                .field("value", value)
                .finish(),
            Effect::RunHook { step, .. } => f.debug_struct("RunHook").field("step", step).finish(),
            Effect::RunFormHook => f.write_str("RunFormHook"),
            Effect::PublishStatus { status } => f
                .debug_struct("PublishStatus")
                .field("status", status)
                .finish(),
        }
    }
}
