//! Script model: the step tree, its callbacks and the cursor over it

mod callback;
pub mod cursor;
mod step;
mod validate;

pub use callback::{
    CallbackError, CallbackKind, CompletionHook, Condition, Deferred, TextProducer, Validator,
};
pub use cursor::{Advance, Position};
pub use step::{Block, InputKind, InputStep, OutputStep, Script, Step, Text, ValidationRule};
pub use validate::{BlockDefinition, ScriptError, StepDefinition};
