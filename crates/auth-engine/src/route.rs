//! Routing contract consumed by the presentation layer.
//!
//! The core never navigates; this module only states where a router
//! should take the user for a given session state and cached role.

use crate::session::SessionState;
use crate::types::Role;
use serde::{Deserialize, Serialize};

/// Navigation target derived from the session state stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    /// Home surface for worker accounts.
    WorkerHome,
    /// Home surface for business and individual accounts.
    ClientHome,
    /// Entry/login surface.
    Entry,
}

/// Map a session state and cached role to a navigation target.
///
/// Transient states produce no navigation. An authenticated session
/// without a cached role cannot pick a home surface and falls back to
/// the entry surface.
pub fn route_for(state: &SessionState, role: Option<Role>) -> Option<RouteTarget> {
    match state {
        SessionState::Unknown | SessionState::Loading => None,
        SessionState::Unauthenticated | SessionState::Error(_) => Some(RouteTarget::Entry),
        SessionState::Authenticated => Some(match role {
            Some(Role::Worker) => RouteTarget::WorkerHome,
            Some(Role::Business) | Some(Role::Individual) => RouteTarget::ClientHome,
            None => RouteTarget::Entry,
        }),
    }
}
