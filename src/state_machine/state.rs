//! Form state types

use crate::script::Position;
use serde::Serialize;
use std::fmt;

/// Externally visible lifecycle of a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Auto-advancing; submissions are rejected
    Active,
    /// Suspended at an input step
    Waiting,
    /// Terminal, the position addresses no step
    Completed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Active => "active",
            Status::Waiting => "waiting",
            Status::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// What the driver is doing at `position`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// About to interpret the step at the position
    Running,
    /// Output text is being produced
    ResolvingText,
    /// Output message appended; completion hook and wait are in flight
    Settling,
    /// `if`/`while` condition is being evaluated
    EvaluatingCondition,
    /// Suspended until the user submits an answer
    AwaitingInput,
    /// Submitted text is going through the validation chain
    Validating { text: String },
    Completed,
}

impl Phase {
    pub fn status(&self) -> Status {
        match self {
            Phase::AwaitingInput => Status::Waiting,
            Phase::Completed => Status::Completed,
            Phase::Running
            | Phase::ResolvingText
            | Phase::Settling
            | Phase::EvaluatingCondition
            | Phase::Validating { .. } => Status::Active,
        }
    }
}

/// Traversal state of one form instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormState {
    pub position: Position,
    pub phase: Phase,
    /// Number of times an input step has been presented. A submission must
    /// carry the current value to be accepted.
    pub prompts: u64,
}

impl FormState {
    pub fn new() -> Self {
        Self {
            position: Position::root(),
            phase: Phase::Running,
            prompts: 0,
        }
    }

    pub fn status(&self) -> Status {
        self.phase.status()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Completed)
    }

    pub(crate) fn at(position: Position, phase: Phase, prompts: u64) -> Self {
        Self {
            position,
            phase,
            prompts,
        }
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}
