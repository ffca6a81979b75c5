//! Events that drive a form forward

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Driver events
    /// Interpret the step at the current position
    Drive,

    // Output events
    TextResolved {
        text: String,
    },
    /// Completion hook and wait timer have both finished
    OutputSettled,

    // Block events
    ConditionEvaluated {
        holds: bool,
    },

    // User events
    UserSubmit {
        text: String,
        /// Prompt number this answer responds to
        turn: u64,
    },

    // Validation events
    ValidationPassed,
    ValidationFailed {
        error_text: String,
    },
}

impl Event {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Drive => "drive",
            Event::TextResolved { .. } => "text_resolved",
            Event::OutputSettled => "output_settled",
            Event::ConditionEvaluated { .. } => "condition_evaluated",
            Event::UserSubmit { .. } => "user_submit",
            Event::ValidationPassed => "validation_passed",
            Event::ValidationFailed { .. } => "validation_failed",
        }
    }
}
