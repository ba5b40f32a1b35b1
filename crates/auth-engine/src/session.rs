//! Session state machine with a serialized event queue.

use crate::repository::AuthRepository;
use crate::types::RegisterRequest;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

/// Capacity of the event mailbox.
const EVENT_QUEUE_CAPACITY: usize = 32;

/// Session status published to the presentation layer.
///
/// Exactly one state holds at any instant. Created as `Unknown` at
/// process start and mutated only by the machine's worker; logout moves
/// the session to `Unauthenticated`, never back to `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Process started, no check performed yet.
    Unknown,
    /// An operation is in flight.
    Loading,
    /// A session is active.
    Authenticated,
    /// No session is active.
    Unauthenticated,
    /// The last operation failed; cleared by the next event.
    Error(String),
}

impl SessionState {
    /// Returns true if the user has an active session.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }

    /// Returns true for states that have not settled into an outcome.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionState::Unknown | SessionState::Loading)
    }
}

/// The closed set of events the machine accepts.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Probe the store for an existing session.
    CheckRequested,
    /// Log in with credentials.
    LoginRequested { email: String, password: String },
    /// Register a new account.
    RegisterRequested(RegisterRequest),
    /// End the current session.
    LogoutRequested,
}

/// Single source of truth for session status.
///
/// Events are pushed into an mpsc mailbox and drained by one worker
/// task, so each event is fully resolved (network round trip included)
/// before the next one starts. The current state is published through a
/// watch channel that presentation code subscribes to.
///
/// # Lifecycle
///
/// 1. Create with [`SessionMachine::new()`]
/// 2. Call [`SessionMachine::start()`] to spawn the worker
/// 3. Push events via [`SessionMachine::dispatch()`]
/// 4. Observe states via [`SessionMachine::subscribe()`]
pub struct SessionMachine {
    repository: Arc<AuthRepository>,
    sender: mpsc::Sender<SessionEvent>,
    /// Channel receiver (taken by the worker on start).
    receiver: Mutex<Option<mpsc::Receiver<SessionEvent>>>,
    state: watch::Sender<SessionState>,
}

impl SessionMachine {
    pub fn new(repository: Arc<AuthRepository>) -> Self {
        let (sender, receiver) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            repository,
            sender,
            receiver: Mutex::new(Some(receiver)),
            state,
        }
    }

    /// Starts the worker that drains the event mailbox.
    ///
    /// # Panics
    ///
    /// Panics if called more than once.
    pub fn start(&self) {
        let mut receiver = self
            .receiver
            .lock()
            .expect("lock poisoned")
            .take()
            .expect("SessionMachine already started");

        let repository = self.repository.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                process_event(&repository, &state, event).await;
            }
        });
    }

    /// Queue an event for processing.
    ///
    /// Events are applied strictly in arrival order; an event dispatched
    /// while another is in flight waits its turn.
    pub async fn dispatch(&self, event: SessionEvent) {
        if let Err(err) = self.sender.send(event).await {
            warn!(error = %err, "Session event dropped, worker is gone");
        }
    }

    /// Subscribe to the session state stream.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Read the state current at this instant.
    pub fn current_state(&self) -> SessionState {
        self.state.borrow().clone()
    }
}

/// Resolve one event against the current state.
async fn process_event(
    repository: &AuthRepository,
    state: &watch::Sender<SessionState>,
    event: SessionEvent,
) {
    match event {
        // Fast local probe; no Loading emitted.
        SessionEvent::CheckRequested => {
            let next = match repository.is_logged_in() {
                Ok(true) => SessionState::Authenticated,
                Ok(false) => SessionState::Unauthenticated,
                Err(err) => {
                    warn!(error = %err, "Session probe failed, treating as unauthenticated");
                    SessionState::Unauthenticated
                }
            };
            publish(state, next);
        }
        SessionEvent::LoginRequested { email, password } => {
            publish(state, SessionState::Loading);
            let next = match repository.login(&email, &password).await {
                Ok(()) => SessionState::Authenticated,
                Err(err) => SessionState::Error(err.to_string()),
            };
            publish(state, next);
        }
        SessionEvent::RegisterRequested(payload) => {
            publish(state, SessionState::Loading);
            let next = match repository.register(&payload).await {
                Ok(()) => SessionState::Authenticated,
                Err(err) => SessionState::Error(err.to_string()),
            };
            publish(state, next);
        }
        // Logout never fails observably.
        SessionEvent::LogoutRequested => {
            publish(state, SessionState::Loading);
            repository.logout();
            publish(state, SessionState::Unauthenticated);
        }
    }
}

fn publish(state: &watch::Sender<SessionState>, next: SessionState) {
    debug!(state = ?next, "Session state changed");
    state.send_replace(next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClient;
    use crate::types::{BusinessProfile, Role, WorkerProfile};
    use artel_storage::{CredentialStore, SecureStorage, StorageResult};
    use std::collections::HashMap;

    /// In-memory storage for testing.
    struct MemoryStorage {
        data: Mutex<HashMap<String, String>>,
    }

    impl MemoryStorage {
        fn new() -> Self {
            Self {
                data: Mutex::new(HashMap::new()),
            }
        }
    }

    impl SecureStorage for MemoryStorage {
        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.data
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        fn delete(&self, key: &str) -> StorageResult<bool> {
            Ok(self.data.lock().unwrap().remove(key).is_some())
        }
    }

    fn create_machine(base_url: String) -> (SessionMachine, Arc<AuthRepository>) {
        let store = CredentialStore::new(Box::new(MemoryStorage::new()));
        let repository = Arc::new(AuthRepository::new(
            ApiClient::new(base_url).unwrap(),
            store,
        ));
        (SessionMachine::new(repository.clone()), repository)
    }

    async fn wait_for_settled(receiver: &mut watch::Receiver<SessionState>) -> SessionState {
        receiver
            .wait_for(|state| !state.is_transient())
            .await
            .unwrap()
            .clone()
    }

    const WORKER_ME: &str = r#"{"id": 7, "email": "worker@example.com",
        "phone": "+77010000000", "user_type": "worker", "full_name": "Ivan Ivanov"}"#;

    const LOGIN_OK: &str = r#"{"access": "a1", "refresh": "r1"}"#;

    #[tokio::test]
    async fn test_initial_state_is_unknown() {
        let server = mockito::Server::new_async().await;
        let (machine, _) = create_machine(server.url());
        assert_eq!(machine.current_state(), SessionState::Unknown);
    }

    #[tokio::test]
    async fn test_check_with_empty_store_is_unauthenticated() {
        let server = mockito::Server::new_async().await;
        let (machine, _) = create_machine(server.url());
        machine.start();

        let mut states = machine.subscribe();
        machine.dispatch(SessionEvent::CheckRequested).await;

        assert_eq!(
            wait_for_settled(&mut states).await,
            SessionState::Unauthenticated
        );
    }

    #[tokio::test]
    async fn test_check_is_idempotent() {
        let server = mockito::Server::new_async().await;
        let (machine, _) = create_machine(server.url());
        machine.start();

        let mut states = machine.subscribe();
        machine.dispatch(SessionEvent::CheckRequested).await;
        let first = wait_for_settled(&mut states).await;

        machine.dispatch(SessionEvent::CheckRequested).await;
        // The state does not change, so probe the settled value directly.
        tokio::task::yield_now().await;
        let second = wait_for_settled(&mut states).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_worker_login_authenticates_and_caches_role() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/auth/login/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LOGIN_OK)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/auth/me/")
            .match_header("authorization", "Bearer a1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(WORKER_ME)
            .create_async()
            .await;

        let (machine, repository) = create_machine(server.url());
        machine.start();

        let mut states = machine.subscribe();
        machine
            .dispatch(SessionEvent::LoginRequested {
                email: "worker@example.com".to_string(),
                password: "pass".to_string(),
            })
            .await;

        assert_eq!(
            wait_for_settled(&mut states).await,
            SessionState::Authenticated
        );
        assert_eq!(repository.current_role().unwrap(), Some(Role::Worker));
    }

    #[tokio::test]
    async fn test_wrong_password_surfaces_backend_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/auth/login/")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail": "Login failed"}"#)
            .create_async()
            .await;

        let (machine, _) = create_machine(server.url());
        machine.start();

        let mut states = machine.subscribe();
        machine
            .dispatch(SessionEvent::LoginRequested {
                email: "worker@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await;

        assert_eq!(
            wait_for_settled(&mut states).await,
            SessionState::Error("Login failed".to_string())
        );
    }

    #[tokio::test]
    async fn test_rejected_registration_keeps_store_clean() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/auth/register/")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"bin": ["already exists"]}"#)
            .create_async()
            .await;

        let (machine, repository) = create_machine(server.url());
        machine.start();

        let payload = RegisterRequest::business(
            "office@acme.kz",
            "pass",
            "+77020000000",
            BusinessProfile {
                company_name: "Acme LLP".to_string(),
                bin: "123456789012".to_string(),
                inn: "987654321098".to_string(),
                legal_address: "Almaty, Abay 1".to_string(),
                contact_name: "Aigerim".to_string(),
                contact_number: "+77030000000".to_string(),
            },
        );

        let mut states = machine.subscribe();
        machine
            .dispatch(SessionEvent::RegisterRequested(payload))
            .await;

        assert_eq!(
            wait_for_settled(&mut states).await,
            SessionState::Error("bin: already exists".to_string())
        );
        assert!(!repository.is_logged_in().unwrap());
        assert_eq!(repository.current_role().unwrap(), None);
    }

    #[tokio::test]
    async fn test_successful_registration_authenticates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/auth/register/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LOGIN_OK)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/auth/me/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(WORKER_ME)
            .create_async()
            .await;

        let (machine, repository) = create_machine(server.url());
        machine.start();

        let payload = RegisterRequest::worker(
            "worker@example.com",
            "pass",
            "+77010000000",
            WorkerProfile {
                full_name: "Ivan Ivanov".to_string(),
            },
        );

        let mut states = machine.subscribe();
        machine
            .dispatch(SessionEvent::RegisterRequested(payload))
            .await;

        assert_eq!(
            wait_for_settled(&mut states).await,
            SessionState::Authenticated
        );
        assert_eq!(repository.current_role().unwrap(), Some(Role::Worker));
    }

    #[tokio::test]
    async fn test_logout_settles_unauthenticated_even_without_session() {
        let server = mockito::Server::new_async().await;
        let (machine, repository) = create_machine(server.url());
        machine.start();

        let mut states = machine.subscribe();
        machine.dispatch(SessionEvent::LogoutRequested).await;

        assert_eq!(
            wait_for_settled(&mut states).await,
            SessionState::Unauthenticated
        );
        assert!(!repository.is_logged_in().unwrap());
    }

    #[tokio::test]
    async fn test_error_state_is_not_sticky() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/auth/login/")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail": "Login failed"}"#)
            .create_async()
            .await;

        let (machine, _) = create_machine(server.url());
        machine.start();

        let mut states = machine.subscribe();
        machine
            .dispatch(SessionEvent::LoginRequested {
                email: "worker@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await;
        assert!(matches!(
            wait_for_settled(&mut states).await,
            SessionState::Error(_)
        ));

        machine.dispatch(SessionEvent::CheckRequested).await;
        states.changed().await.unwrap();
        assert_eq!(
            states.borrow_and_update().clone(),
            SessionState::Unauthenticated
        );
    }

    #[tokio::test]
    async fn test_queued_events_apply_in_arrival_order() {
        let mut server = mockito::Server::new_async().await;
        let login_mock = server
            .mock("POST", "/api/v1/auth/login/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LOGIN_OK)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/auth/me/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(WORKER_ME)
            .create_async()
            .await;

        let (machine, repository) = create_machine(server.url());

        // Queue both events before the worker starts so the logout is
        // already waiting while the login round trip is in flight.
        machine
            .dispatch(SessionEvent::LoginRequested {
                email: "worker@example.com".to_string(),
                password: "pass".to_string(),
            })
            .await;
        machine.dispatch(SessionEvent::LogoutRequested).await;

        let mut states = machine.subscribe();
        machine.start();

        let settled = states
            .wait_for(|state| *state == SessionState::Unauthenticated)
            .await
            .unwrap()
            .clone();

        assert_eq!(settled, SessionState::Unauthenticated);
        // The login completed first: its round trip happened and the
        // logout then cleared the session it had just written.
        login_mock.assert_async().await;
        assert!(!repository.is_logged_in().unwrap());
    }

    #[tokio::test]
    #[should_panic(expected = "SessionMachine already started")]
    async fn test_double_start_panics() {
        let server = mockito::Server::new_async().await;
        let (machine, _) = create_machine(server.url());
        machine.start();
        machine.start();
    }
}
