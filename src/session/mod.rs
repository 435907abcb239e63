//! Capture session — one bounded-duration recording at a time.
//!
//! [`SessionRunner`] accepts [`SessionCommand`]s over a tokio channel and
//! emits [`SessionEvent`]s; [`SessionState`] is the underlying state machine.

pub mod runner;
pub mod state;

pub use runner::{SessionCommand, SessionEvent, SessionRunner};
pub use state::SessionState;
