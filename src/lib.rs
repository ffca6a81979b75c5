//! Template-driven conversational forms
//!
//! A [`Script`] is a tree of output, input, `if` and `while` steps. A
//! [`FormRuntime`] walks it: it emits bot messages, pauses, evaluates
//! conditions against the answers collected so far, and suspends at every
//! input step until the user submits an answer that passes validation.
//!
//! ```ignore
//! let script = Script::new(vec![
//!     Step::output("Enter your name: "),
//!     Step::input("name"),
//!     Step::output(Text::computed(|ctx: &ChatContext| {
//!         format!("Hello, {}!", ctx.first("name").unwrap_or_default())
//!     })),
//! ])?;
//! let mut form = FormRuntime::new(script, FormConfig::from_env());
//! form.start().await?;
//! form.submit("Ada").await?;
//! ```

pub mod answers;
pub mod config;
pub mod runtime;
pub mod script;
pub mod state_machine;
pub mod transcript;

pub use answers::{AnswerStore, ChatContext};
pub use config::FormConfig;
pub use runtime::{ChatForm, FormError, FormEvent, FormRuntime, FormView};
pub use script::{
    CallbackError, Deferred, InputStep, OutputStep, Script, ScriptError, Step, Text,
};
pub use state_machine::Status;
pub use transcript::{Message, Sender, Transcript};
