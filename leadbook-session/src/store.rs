//! The session store.
//!
//! Holds the authenticated user and token, mirrors them into a
//! [`SessionStorage`] backend, and publishes every change on a watch channel
//! (snapshots) and a broadcast channel (discrete events).

use crate::error::SessionResult;
use crate::storage::{SessionStorage, TOKEN_KEY, USER_KEY};
use async_trait::async_trait;
use leadbook_api::{AuthApi, AuthProvider, Gateway};
use leadbook_types::{AuthResponse, LoginRequest, RegisterRequest, User, UserPatch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 32;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Persisted state has not been read yet.
    Loading,
    Unauthenticated,
    Authenticated,
}

/// A point-in-time view of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub status: SessionStatus,
}

impl Session {
    fn loading() -> Self {
        Self {
            user: None,
            token: None,
            is_authenticated: false,
            is_loading: true,
            status: SessionStatus::Loading,
        }
    }

    fn signed_out() -> Self {
        Self {
            user: None,
            token: None,
            is_authenticated: false,
            is_loading: false,
            status: SessionStatus::Unauthenticated,
        }
    }

    fn signed_in(token: String, user: User) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            is_authenticated: true,
            is_loading: false,
            status: SessionStatus::Authenticated,
        }
    }
}

/// Discrete session transitions, for routers and caches.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Login or registration succeeded.
    LoggedIn(User),
    /// The user signed out.
    LoggedOut,
    /// The backend rejected the credential; the session was cleared.
    Expired,
    /// The current user's profile changed locally.
    UserUpdated(User),
}

/// State shared between the store and the gateway.
///
/// The gateway holds this through [`AuthProvider`]; it never holds the
/// gateway back.
struct SessionCore {
    storage: Arc<dyn SessionStorage>,
    state: watch::Sender<Session>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionCore {
    fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    fn persist(&self, token: &str, user: &User) -> SessionResult<()> {
        let user_json = serde_json::to_string(user)?;
        self.storage.set(TOKEN_KEY, token)?;
        if let Err(e) = self.storage.set(USER_KEY, &user_json) {
            // Keep the pair together.
            let _ = self.storage.remove(TOKEN_KEY);
            return Err(e.into());
        }
        Ok(())
    }

    /// Removes both keys. Failures are logged; the in-memory session is
    /// cleared regardless.
    fn clear_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("failed to clear persisted {key}: {e}");
            }
        }
    }

    fn set_state(&self, session: Session) {
        self.state.send_if_modified(|current| {
            if *current == session {
                return false;
            }
            *current = session;
            true
        });
    }

    fn publish(&self, event: SessionEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn establish(&self, auth: &AuthResponse) -> SessionResult<()> {
        self.persist(&auth.token, &auth.user)?;
        self.set_state(Session::signed_in(auth.token.clone(), auth.user.clone()));
        self.publish(SessionEvent::LoggedIn(auth.user.clone()));
        Ok(())
    }

    fn invalidate(&self) {
        self.clear_persisted();
        self.set_state(Session::signed_out());
        self.publish(SessionEvent::Expired);
    }
}

#[async_trait]
impl AuthProvider for SessionCore {
    async fn bearer_token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    async fn on_unauthorized(&self) {
        warn!("credential rejected by backend, clearing session");
        self.invalidate();
    }
}

/// Owns the authenticated session.
///
/// Construction installs the store as the gateway's [`AuthProvider`], so
/// every request carries the current token and any 401 clears the session.
pub struct SessionStore {
    core: Arc<SessionCore>,
    auth: AuthApi,
    bootstrapped: AtomicBool,
}

impl SessionStore {
    pub fn new(gateway: Arc<Gateway>, storage: Arc<dyn SessionStorage>) -> Self {
        let (state, _) = watch::channel(Session::loading());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let core = Arc::new(SessionCore {
            storage,
            state,
            events,
        });
        gateway.set_auth_provider(Arc::clone(&core) as Arc<dyn AuthProvider>);
        Self {
            core,
            auth: AuthApi::new(gateway),
            bootstrapped: AtomicBool::new(false),
        }
    }

    /// Restores the persisted session. Only the first call reads storage;
    /// later calls return the current snapshot.
    pub fn bootstrap(&self) -> Session {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            return self.snapshot();
        }

        let token = self.core.storage.get(TOKEN_KEY);
        let user = self.core.storage.get(USER_KEY);
        let session = match (token, user) {
            (Ok(Some(token)), Ok(Some(user_json))) => {
                match serde_json::from_str::<User>(&user_json) {
                    Ok(user) => {
                        info!("restored session for {}", user.email);
                        Session::signed_in(token, user)
                    }
                    Err(e) => {
                        warn!("persisted user is unreadable, clearing session: {e}");
                        self.core.clear_persisted();
                        Session::signed_out()
                    }
                }
            }
            (Ok(None), Ok(None)) => Session::signed_out(),
            (Err(e), _) | (_, Err(e)) => {
                warn!("persisted session is unreadable, clearing it: {e}");
                self.core.clear_persisted();
                Session::signed_out()
            }
            _ => {
                debug!("dropping half-persisted session");
                self.core.clear_persisted();
                Session::signed_out()
            }
        };

        self.core.set_state(session.clone());
        session
    }

    /// Signs in and persists the returned credential.
    ///
    /// On failure nothing changes, except that a 401 clears any existing
    /// session through the gateway.
    pub async fn login(&self, credentials: &LoginRequest) -> SessionResult<AuthResponse> {
        let auth = self.auth.login(credentials).await?;
        self.core.establish(&auth)?;
        info!("logged in as {}", auth.user.email);
        Ok(auth)
    }

    /// Creates an account and signs into it.
    pub async fn register(&self, data: &RegisterRequest) -> SessionResult<AuthResponse> {
        let auth = self.auth.register(data).await?;
        self.core.establish(&auth)?;
        info!("registered {}", auth.user.email);
        Ok(auth)
    }

    /// Clears the session locally. Never fails.
    pub fn logout(&self) {
        self.core.clear_persisted();
        self.core.set_state(Session::signed_out());
        self.core.publish(SessionEvent::LoggedOut);
        info!("logged out");
    }

    /// Merges `patch` into the current user and re-persists it.
    ///
    /// Returns the updated user, or `None` when nobody is signed in.
    pub fn update_user(&self, patch: UserPatch) -> SessionResult<Option<User>> {
        let current = self.snapshot();
        let (Some(token), Some(mut user)) = (current.token, current.user) else {
            debug!("update_user ignored without a session");
            return Ok(None);
        };

        user.apply(patch);
        self.core.persist(&token, &user)?;
        self.core.set_state(Session::signed_in(token, user.clone()));
        self.core.publish(SessionEvent::UserUpdated(user.clone()));
        Ok(Some(user))
    }

    /// Drops the session as if the backend had rejected the credential.
    pub fn invalidate(&self) {
        self.core.invalidate();
    }

    /// The provider this store installed on the gateway. Callers that
    /// replace it with their own should delegate to this one.
    pub fn auth_provider(&self) -> Arc<dyn AuthProvider> {
        Arc::clone(&self.core) as Arc<dyn AuthProvider>
    }

    pub fn snapshot(&self) -> Session {
        self.core.snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.core.state.borrow().is_authenticated
    }

    pub fn token(&self) -> Option<String> {
        self.core.state.borrow().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.core.state.borrow().user.clone()
    }

    /// Receives every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.core.state.subscribe()
    }

    /// Receives discrete transitions from now on.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.core.events.subscribe()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.snapshot();
        f.debug_struct("SessionStore")
            .field("status", &session.status)
            .field("user", &session.user.as_ref().map(|u| u.email.as_str()))
            .finish()
    }
}
