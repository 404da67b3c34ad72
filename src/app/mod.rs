//! Application orchestration layer
//!
//! This module holds the interaction state machine and the session that
//! executes its effects against the platform collaborators.

pub mod controller;
pub mod state;

pub use controller::{AppError, Preflight, RunOutcome, Session, SessionStatus, preflight};
pub use state::{InputEvent, Key, Outcome, PointerButton};
