//! Credential repository: domain operations over the network client and
//! the secure store.

use crate::client::ApiClient;
use crate::error::{AuthError, AuthResult};
use crate::types::{Profile, RegisterRequest, Role};
use artel_storage::CredentialStore;
use tracing::{debug, info, warn};

/// Stateless mediator between the backend and the credential store.
///
/// Owns neither the durable session artifacts (the store does) nor the
/// transient session status (the state machine does). Never retries.
pub struct AuthRepository {
    api: ApiClient,
    store: CredentialStore,
}

/// Store contents captured before a mutating operation, for rollback.
struct StoredSession {
    access: Option<String>,
    refresh: Option<String>,
    user_type: Option<String>,
}

impl AuthRepository {
    pub fn new(api: ApiClient, store: CredentialStore) -> Self {
        Self { api, store }
    }

    /// Log in and persist the session artifacts.
    ///
    /// Tokens and the resolved role are committed together: when the
    /// profile fetch after the token grant fails, the token write is
    /// rolled back so the store is left exactly as it was before the
    /// call.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<()> {
        let prior = self.capture()?;

        let pair = self.api.login(email, password).await?;
        self.store.set_token_pair(&pair.access, &pair.refresh)?;

        match self.resolve_role(&pair.access).await {
            Ok(role) => {
                self.store.set_user_type(role.as_str())?;
                info!(role = %role, "Login succeeded");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Role resolution failed after login, rolling back tokens");
                self.restore(prior);
                Err(err)
            }
        }
    }

    /// Register a new account; behaves like `login` on success.
    ///
    /// When the profile fetch after the token grant fails, the role the
    /// backend just accepted in the payload is cached instead; the next
    /// successful profile fetch overwrites it from the server.
    pub async fn register(&self, payload: &RegisterRequest) -> AuthResult<()> {
        let pair = self.api.register(payload).await?;
        self.store.set_token_pair(&pair.access, &pair.refresh)?;

        let role = match self.resolve_role(&pair.access).await {
            Ok(role) => role,
            Err(err) => {
                debug!(
                    error = %err,
                    fallback = %payload.user_type,
                    "Profile fetch failed after registration, caching submitted role"
                );
                payload.user_type
            }
        };

        self.store.set_user_type(role.as_str())?;
        info!(role = %role, "Registration succeeded");
        Ok(())
    }

    /// Fetch the role-discriminated profile for the active session.
    pub async fn get_profile(&self) -> AuthResult<Profile> {
        let token = self
            .store
            .access_token()?
            .ok_or(AuthError::SessionAbsent)?;

        let account = self.api.me(&token).await?;
        Ok(account.profile)
    }

    /// Clear all stored session artifacts.
    ///
    /// Never fails observably: a store error while clearing is treated as
    /// already logged out.
    pub fn logout(&self) {
        match self.store.clear_all() {
            Ok(()) => info!("Logged out"),
            Err(err) => {
                warn!(error = %err, "Session clear failed during logout, treating as logged out");
            }
        }
    }

    /// Local liveness probe: an access token is present in the store.
    /// Does not validate token expiry or signature.
    pub fn is_logged_in(&self) -> AuthResult<bool> {
        Ok(self.store.has_session()?)
    }

    /// Read the cached role tag without a network call.
    pub fn current_role(&self) -> AuthResult<Option<Role>> {
        Ok(self.store.user_type()?.and_then(|tag| Role::parse(&tag)))
    }

    async fn resolve_role(&self, access_token: &str) -> AuthResult<Role> {
        let account = self.api.me(access_token).await?;
        Ok(account.role())
    }

    fn capture(&self) -> AuthResult<StoredSession> {
        Ok(StoredSession {
            access: self.store.access_token()?,
            refresh: self.store.refresh_token()?,
            user_type: self.store.user_type()?,
        })
    }

    /// Best-effort rollback to a captured store state; the original
    /// failure stays the reported error.
    fn restore(&self, prior: StoredSession) {
        let result = match (&prior.access, &prior.refresh) {
            (Some(access), Some(refresh)) => {
                self.store.set_token_pair(access, refresh).and_then(|()| {
                    match &prior.user_type {
                        Some(user_type) => self.store.set_user_type(user_type),
                        None => Ok(()),
                    }
                })
            }
            _ => self.store.clear_all(),
        };

        if let Err(err) = result {
            warn!(error = %err, "Session rollback failed");
        }
    }
}
