//! Authentication session subsystem for the Artel client.
//!
//! This crate provides:
//! - The backend wire contract (`ApiClient`, token and profile types)
//! - The credential repository orchestrating network and secure storage
//! - The session state machine with its serialized event queue and
//!   state stream
//! - The routing contract consumed by the presentation layer

mod client;
mod error;
mod repository;
mod route;
mod session;
mod types;

pub use client::ApiClient;
pub use error::{AuthError, AuthResult};
pub use repository::AuthRepository;
pub use route::{route_for, RouteTarget};
pub use session::{SessionEvent, SessionMachine, SessionState};
pub use types::{
    Account, BusinessProfile, IndividualProfile, Profile, RegisterProfile, RegisterRequest, Role,
    TokenPair, WorkerProfile,
};
