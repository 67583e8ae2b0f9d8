//! Authentication session store.
//!
//! Holds the bearer credentials and the current user's profile. Credentials
//! are written to durable storage twice: as the top-level `token`/`userId`
//! keys read by the HTTP wrapper and cart store, and as the `auth-storage`
//! slice restored on the next start.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::SecretString;
use storefront_sync_core::{Credentials, Email, UserId, UserProfile};
use tokio::task::JoinHandle;
use tracing::instrument;

use super::Snapshot;
use crate::api::{ApiClient, ProfileUpdate, RegistrationForm};
use crate::error::StoreError;
use crate::events::{self, SessionEvent, SessionEvents};
use crate::storage::{DurableStorage, SessionSlice};

/// Snapshot of the session.
///
/// Token and user id travel together in [`Credentials`], so the session is
/// authenticated exactly when both are present.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub credentials: Option<Credentials>,
    /// Loaded profile. Never set while unauthenticated.
    pub user: Option<UserProfile>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    /// Whether a token and user id are held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Current user id.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.credentials.as_ref().map(|c| &c.user_id)
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(Credentials::token)
    }

    fn restored(slice: SessionSlice) -> Self {
        let credentials = match slice {
            SessionSlice {
                token: Some(token),
                user_id: Some(user_id),
                is_authenticated: true,
            } if !token.is_empty() => Some(Credentials::new(user_id, token)),
            _ => None,
        };
        Self {
            credentials,
            ..Self::default()
        }
    }

    fn slice(&self) -> SessionSlice {
        SessionSlice {
            token: self.token().map(str::to_owned),
            user_id: self.user_id().cloned(),
            is_authenticated: self.is_authenticated(),
        }
    }
}

type LogoutHook = Box<dyn Fn() + Send + Sync>;

/// Callbacks run synchronously inside [`SessionStore::logout`].
#[derive(Clone, Default)]
struct LogoutHooks(Arc<RwLock<Vec<LogoutHook>>>);

impl LogoutHooks {
    fn push(&self, hook: LogoutHook) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }

    fn run(&self) {
        for hook in self.0.read().unwrap_or_else(PoisonError::into_inner).iter() {
            hook();
        }
    }
}

impl std::fmt::Debug for LogoutHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.0.read().unwrap_or_else(PoisonError::into_inner).len();
        f.debug_tuple("LogoutHooks").field(&count).finish()
    }
}

/// Login, registration and profile state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    api: ApiClient,
    state: Snapshot<SessionState>,
    on_logout: LogoutHooks,
}

impl SessionStore {
    /// Create the store, restoring credentials from the `auth-storage` slice.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let mut restored = SessionState::restored(api.storage().session_slice());
        if restored.is_authenticated() && api.storage().token().is_none() {
            // Evicted by a 401 before the slice was rewritten.
            tracing::debug!("Discarding persisted session without a stored token");
            restored = SessionState::default();
            api.storage().save_session_slice(&SessionSlice::default());
        }
        if restored.is_authenticated() {
            tracing::debug!(user_id = ?restored.user_id(), "Restored persisted session");
        }
        Self {
            api,
            state: Snapshot::new(restored),
            on_logout: LogoutHooks::default(),
        }
    }

    /// Copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.get()
    }

    /// Whether the session is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.read(SessionState::is_authenticated)
    }

    fn storage(&self) -> &DurableStorage {
        self.api.storage()
    }

    fn events(&self) -> &SessionEvents {
        self.api.events()
    }

    fn persist(&self) {
        let slice = self.state.read(SessionState::slice);
        self.storage().save_session_slice(&slice);
    }

    fn fail(&self, error: &StoreError) {
        let message = error.to_string();
        self.state.update(|s| {
            s.is_loading = false;
            s.error = Some(message);
        });
    }

    /// Log in and load the profile.
    ///
    /// Succeeds once the credentials are stored; a failed profile fetch
    /// afterwards leaves the session authenticated.
    ///
    /// # Errors
    ///
    /// Returns the remote failure, which is also recorded in `error`.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<(), StoreError> {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let credentials = match self.api.login(email, password).await {
            Ok(credentials) => credentials,
            Err(e) => {
                let e = StoreError::from(e);
                self.fail(&e);
                return Err(e);
            }
        };

        self.storage().set_credentials(&credentials);
        let user_id = credentials.user_id.clone();
        self.state.update(|s| {
            s.credentials = Some(credentials);
            s.is_loading = false;
        });
        self.persist();
        tracing::info!(user_id = %user_id, "Logged in");

        if let Err(e) = self.fetch_profile().await {
            tracing::debug!(error = %e, "Profile fetch after login failed");
        }
        Ok(())
    }

    /// Create an account. The session stays unauthenticated.
    ///
    /// Returns the created profile when the server sent a readable one.
    ///
    /// # Errors
    ///
    /// Returns the remote failure, which is also recorded in `error`.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: RegistrationForm) -> Result<Option<UserProfile>, StoreError> {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.api.register(form).await {
            Ok(profile) => {
                self.state.update(|s| s.is_loading = false);
                tracing::info!(user_id = ?profile.as_ref().map(|p| &p.id), "Registered");
                Ok(profile)
            }
            Err(e) => {
                let e = StoreError::from(e);
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Load the current user's profile.
    ///
    /// Does nothing without a user id. Credentials found in durable storage
    /// but not in memory are adopted first. Failures leave `error` untouched.
    ///
    /// # Errors
    ///
    /// Returns the remote failure.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<(), StoreError> {
        let Some(user_id) = self.resolve_user_id() else {
            return Ok(());
        };

        self.state.update(|s| s.is_loading = true);

        match self.api.get_profile(&user_id).await {
            Ok(profile) => {
                self.set_user(&user_id, profile);
                Ok(())
            }
            Err(e) => {
                tracing::debug!(error = %e, "Profile fetch failed");
                self.state.update(|s| s.is_loading = false);
                Err(e.into())
            }
        }
    }

    /// Update the profile with the supplied fields.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotAuthenticated`] without a user id (no request is
    /// sent), otherwise the remote failure, which is also recorded in `error`.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, StoreError> {
        let user_id = self.resolve_user_id().ok_or(StoreError::NotAuthenticated)?;

        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.api.update_profile(&user_id, update).await {
            Ok(profile) => {
                self.set_user(&user_id, profile.clone());
                tracing::info!(user_id = %user_id, "Profile updated");
                Ok(profile)
            }
            Err(e) => {
                let e = StoreError::from(e);
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// End the session.
    ///
    /// Clears stored credentials, empties the session, runs the
    /// [`on_logout`](Self::on_logout) hooks and then publishes
    /// [`SessionEvent::LoggedOut`]. Everything but the event delivery has
    /// happened by the time this returns.
    pub fn logout(&self) {
        self.storage().clear_credentials();
        self.reset();
        self.on_logout.run();
        self.events().publish(SessionEvent::LoggedOut);
        tracing::info!("Logged out");
    }

    /// Register `hook` to run inside every [`logout`](Self::logout).
    ///
    /// Hooks run on the caller's thread before `logout` returns, so a login
    /// started right after logout never races them. A hook must not register
    /// further hooks.
    pub fn on_logout(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.on_logout.push(Box::new(hook));
    }

    /// Clear the last error.
    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    /// Spawn the task that empties the session when the API answers 401.
    ///
    /// A session that holds no credentials is left alone so a failed login
    /// keeps its error message. So is one whose credentials are back in
    /// storage, which means a login finished before the event arrived.
    #[must_use]
    pub fn watch_unauthorized(&self) -> JoinHandle<()> {
        let rx = self.events().subscribe();
        let store = self.clone();
        tokio::spawn(events::drive(rx, move |event| {
            if event == SessionEvent::Unauthorized
                && store.is_authenticated()
                && store.storage().token().is_none()
            {
                tracing::info!("Session expired");
                store.reset();
            }
        }))
    }

    fn reset(&self) {
        self.state.update(|s| *s = SessionState::default());
        self.persist();
    }

    /// User id from memory, falling back to durable storage.
    fn resolve_user_id(&self) -> Option<UserId> {
        if let Some(user_id) = self.state.read(|s| s.user_id().cloned()) {
            return Some(user_id);
        }

        let user_id = self.storage().user_id()?;
        if let Some(token) = self.storage().token() {
            tracing::debug!(user_id = %user_id, "Adopting stored credentials");
            self.state.update(|s| {
                s.credentials = Some(Credentials::new(user_id.clone(), token));
            });
            self.persist();
        }
        Some(user_id)
    }

    /// Store `profile` if the session still belongs to `user_id`.
    fn set_user(&self, user_id: &UserId, profile: UserProfile) {
        self.state.update(|s| {
            s.is_loading = false;
            if s.user_id() == Some(user_id) {
                s.user = Some(profile);
            } else {
                tracing::debug!(user_id = %user_id, "Dropping profile for a session that ended");
            }
        });
    }
}
