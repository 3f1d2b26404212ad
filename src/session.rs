//! Client session: token persistence, user bootstrap and job applications.
//!
//! ARCHITECTURE
//! ============
//! A [`Session`] is an explicit object built from an API client and a token
//! store. Nothing is global; hosts pass the session to whatever needs the
//! current user.
//!
//! LIFECYCLE
//! =========
//! `Unloaded` -> `Loading` -> `Resolved`, re-entered each time the stored
//! token changes. A load runs once with no retry. A present token that
//! cannot be decoded or fetched resolves to "no user" and reports
//! [`Resolution::Invalid`] so hosts can tell it apart from "never logged in".
//!
//! Applying to a job waits for the API to confirm and rolls the local set
//! back when it refuses.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::api::{ApiError, JoblyApi};
use crate::models::{JobId, LoginData, SignupData, User};
use crate::storage::{StorageError, TOKEN_STORAGE_ID, TokenStore};
use crate::token::{self, TokenError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no authenticated user")]
    NotAuthenticated,
    #[error("stored token is invalid: {0}")]
    InvalidToken(#[from] TokenError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error list returned from login and signup for display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .0.join("; "))]
pub struct AuthErrors(pub Vec<String>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Resolved,
}

/// Outcome of one user-info load.
#[derive(Debug)]
pub enum Resolution {
    /// No token is stored.
    NoSession,
    /// The token resolved to a user.
    Authenticated,
    /// A token is stored but could not be turned into a user.
    Invalid(SessionError),
}

impl Resolution {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The API confirmed the application.
    Applied,
    /// The job was already in the applied set; nothing was sent.
    AlreadyApplied,
}

pub struct Session {
    api: Arc<dyn JoblyApi>,
    store: Arc<dyn TokenStore>,
    load_state: LoadState,
    token: Option<String>,
    current_user: Option<User>,
    application_ids: BTreeSet<JobId>,
}

impl Session {
    #[must_use]
    pub fn new(api: Arc<dyn JoblyApi>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            store,
            load_state: LoadState::Unloaded,
            token: None,
            current_user: None,
            application_ids: BTreeSet::new(),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// True once the latest load has finished, whatever its outcome.
    #[must_use]
    pub fn info_loaded(&self) -> bool {
        self.load_state == LoadState::Resolved
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn application_ids(&self) -> &BTreeSet<JobId> {
        &self.application_ids
    }

    /// Admin flag from the fetched user record. The token's own flag is
    /// never consulted.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(|u| u.is_admin)
    }

    #[must_use]
    pub fn has_applied_to_job(&self, job_id: JobId) -> bool {
        self.application_ids.contains(&job_id)
    }

    // =========================================================================
    // BOOTSTRAP
    // =========================================================================

    /// Read the stored token and load the user it names.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the token store cannot be read.
    /// Token and API failures are reported through the returned
    /// [`Resolution`] instead.
    pub async fn restore(&mut self) -> Result<Resolution, SessionError> {
        self.token = self.store.get(TOKEN_STORAGE_ID)?;
        Ok(self.load_user_info().await)
    }

    /// Resolve the in-memory token into user state.
    pub async fn load_user_info(&mut self) -> Resolution {
        self.load_state = LoadState::Loading;
        tracing::debug!(has_token = self.token.is_some(), "loading user info");

        let resolution = match self.token.clone().filter(|t| !t.is_empty()) {
            None => {
                self.clear_user();
                Resolution::NoSession
            }
            Some(token) => match self.fetch_user(&token).await {
                Ok(user) => {
                    tracing::debug!(username = %user.username, applications = user.applications.len(), "user loaded");
                    self.application_ids = user.applications.iter().copied().collect();
                    self.current_user = Some(user);
                    Resolution::Authenticated
                }
                Err(e) => {
                    tracing::error!(error = %e, "problem loading user info");
                    self.clear_user();
                    Resolution::Invalid(e)
                }
            },
        };

        self.load_state = LoadState::Resolved;
        resolution
    }

    async fn fetch_user(&self, token: &str) -> Result<User, SessionError> {
        let claims = token::decode_claims(token)?;
        let user = self.api.get_current_user(token, &claims.username).await?;
        Ok(user)
    }

    fn clear_user(&mut self) {
        self.current_user = None;
        self.application_ids.clear();
    }

    /// Persist `token` and reload if it differs from the stored or current one.
    /// Returns `None` when the token was unchanged and no load ran.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the token cannot be persisted.
    pub async fn set_token(&mut self, token: Option<String>) -> Result<Option<Resolution>, SessionError> {
        if self.store_token(token)? {
            Ok(Some(self.load_user_info().await))
        } else {
            Ok(None)
        }
    }

    /// Returns whether a load is due. The stored value is compared too, so a
    /// session that never restored still removes or replaces what is on disk.
    fn store_token(&mut self, token: Option<String>) -> Result<bool, SessionError> {
        let stored = self.store.get(TOKEN_STORAGE_ID)?;
        if stored != token {
            self.store.set(TOKEN_STORAGE_ID, token.as_deref())?;
        }
        let unchanged = stored == token && self.token == token && self.load_state != LoadState::Unloaded;
        self.token = token;
        Ok(!unchanged)
    }

    // =========================================================================
    // HANDLERS
    // =========================================================================

    /// Log in and load the resulting user.
    ///
    /// # Errors
    ///
    /// Returns the API's error list when the credentials are refused, or the
    /// storage error when the token cannot be persisted.
    pub async fn login(&mut self, data: &LoginData) -> Result<Resolution, AuthErrors> {
        match self.api.login(data).await {
            Ok(token) => self.accept_token(token).await,
            Err(e) => {
                tracing::error!(error = %e, username = %data.username, "login failed");
                Err(AuthErrors(e.messages()))
            }
        }
    }

    /// Register and load the new user.
    ///
    /// # Errors
    ///
    /// Returns the API's error list when registration is refused, or the
    /// storage error when the token cannot be persisted.
    pub async fn signup(&mut self, data: &SignupData) -> Result<Resolution, AuthErrors> {
        match self.api.signup(data).await {
            Ok(token) => self.accept_token(token).await,
            Err(e) => {
                tracing::error!(error = %e, username = %data.username, "signup failed");
                Err(AuthErrors(e.messages()))
            }
        }
    }

    async fn accept_token(&mut self, token: String) -> Result<Resolution, AuthErrors> {
        self.store_token(Some(token)).map_err(|e| AuthErrors(vec![e.to_string()]))?;
        Ok(self.load_user_info().await)
    }

    /// Forget the user and remove the stored token.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the stored token cannot be removed.
    /// The in-memory user is cleared either way.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        self.clear_user();
        self.token = None;
        self.store.set(TOKEN_STORAGE_ID, None)?;
        self.load_user_info().await;
        Ok(())
    }

    /// Apply the current user to `job_id`.
    ///
    /// The ID joins the applied set before the request goes out, so a repeat
    /// call is a no-op, and leaves it again if the API refuses.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAuthenticated`] without a loaded user, or
    /// [`SessionError::Api`] when the API call fails.
    pub async fn apply_to_job(&mut self, job_id: JobId) -> Result<ApplyOutcome, SessionError> {
        if self.has_applied_to_job(job_id) {
            return Ok(ApplyOutcome::AlreadyApplied);
        }
        let (Some(token), Some(user)) = (self.token.clone(), self.current_user.as_ref()) else {
            return Err(SessionError::NotAuthenticated);
        };
        let username = user.username.clone();

        self.application_ids.insert(job_id);
        match self.api.apply_to_job(&token, &username, job_id).await {
            Ok(()) => {
                if let Some(user) = self.current_user.as_mut() {
                    if !user.applications.contains(&job_id) {
                        user.applications.push(job_id);
                    }
                }
                tracing::debug!(%username, job_id, "applied to job");
                Ok(ApplyOutcome::Applied)
            }
            Err(e) => {
                self.application_ids.remove(&job_id);
                tracing::error!(error = %e, %username, job_id, "apply to job failed; rolled back");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
