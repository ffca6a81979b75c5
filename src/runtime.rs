//! Runtime for executing forms
//!
//! [`FormRuntime`] owns one form instance and carries out the effects the
//! state machine requests. [`ChatForm`] runs a runtime on its own tokio task
//! and exposes it through channels.

mod executor;
mod handle;

#[cfg(test)]
pub mod testing;

pub use executor::FormRuntime;
pub use handle::ChatForm;

use crate::answers::AnswerStore;
use crate::script::{CallbackError, CallbackKind, Position, ScriptError};
use crate::state_machine::{Status, TransitionError};
use crate::transcript::Message;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by a running form
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("{kind} callback failed at {position}: {source}")]
    Callback {
        kind: CallbackKind,
        position: Position,
        source: CallbackError,
    },

    #[error(transparent)]
    Rejected(#[from] TransitionError),

    #[error("form halted after a callback failure")]
    Halted,

    #[error("form task has stopped")]
    Closed,
}

/// Snapshot of everything an observer can see
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub form_id: String,
    pub status: Status,
    pub position: Position,
    /// Prompt number a submission must answer
    pub prompt: u64,
    pub transcript: Vec<Message>,
    pub answers: AnswerStore,
    /// Set once a callback has failed; the form accepts nothing further
    pub halted: bool,
}

/// Incremental notifications sent to subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormEvent {
    Message { message: Message },
    StatusChanged { status: Status },
    AnswerStored { name: String, value: String },
    Error { message: String },
}
