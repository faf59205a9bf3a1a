//! Session and event lifecycle.
//!
//! - [`SessionGate`]: login, registration, logout and restoring a stored
//!   credential; the single writer of the session state
//! - [`EventController`]: the display list of occurrences and every
//!   event-changing operation, gated on a [`SessionView`]
//! - [`OccurrenceExpander`]: records to occurrences, with a fallback when a
//!   series cannot be expanded

pub mod config;
pub mod controller;
pub mod error;
pub mod expander;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::{ControllerConfig, DEFAULT_OCCURRENCE_LIMIT};
pub use controller::{CatalogState, ClickAction, EventController};
pub use error::{ControllerError, ControllerResult, SessionError, SessionResult};
pub use expander::OccurrenceExpander;
pub use session::{SessionGate, SessionState, SessionView};
