//! Form state machine
//!
//! Pure transitions over [`FormState`]; every callback, timer and message
//! append is requested as an [`Effect`] and carried out by the runtime.

mod effect;
mod event;
mod state;
mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{FormState, Phase, Status};
pub use transition::{transition, TransitionError, TransitionResult};
