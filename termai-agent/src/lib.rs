//! # termai agent
//!
//! The assistant orchestrates one conversational turn at a time:
//! 1. The user's text and the recent transcript go to the model
//! 2. If the reply carries a `<CMD>` span, the command is run (after
//!    confirmation, unless execution is set to `auto`)
//! 3. Whatever the command printed goes back to the model for interpretation
//! 4. The turn is recorded in the transcript and the loop waits for input
//!
//! Lines starting with `!` bypass the model loop and go to the built-in
//! commands registered from the enabled features.

mod agent;
pub mod commands;

pub use agent::{Assistant, LineOutcome, TurnOutcome, TurnState};
pub use commands::{Builtin, CommandRegistry};
