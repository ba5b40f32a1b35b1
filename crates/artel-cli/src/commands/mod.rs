//! CLI command implementations.

mod auth;

pub use auth::{login, logout, register, status, whoami};

use auth_engine::{AuthRepository, SessionMachine};
use std::sync::Arc;

/// Process-wide wiring of the session subsystem, built once in `main`
/// and passed down to every command.
pub struct App {
    pub repository: Arc<AuthRepository>,
    pub machine: SessionMachine,
}
