//! Session store trait

use async_trait::async_trait;
use crate::error::SessionError;
use crate::session::SessionData;

/// Trait for session storage backends
///
/// This trait mirrors the express-session store interface. Expiry is derived
/// by the store from the session's own `cookie.maxAge`.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Get a session by ID
    ///
    /// Returns None if the session doesn't exist or has expired
    async fn get(&self, sid: &str) -> Result<Option<SessionData>, SessionError>;

    /// Insert or overwrite a session
    async fn set(&self, sid: &str, session: &SessionData) -> Result<(), SessionError>;

    /// Destroy/delete a session. Deleting an unknown session is not an error.
    async fn destroy(&self, sid: &str) -> Result<(), SessionError>;

    /// Touch a session - restart its expiry from the given cookie
    ///
    /// Fails with [`SessionError::NotFound`] if the session doesn't exist
    async fn touch(&self, sid: &str, session: &SessionData) -> Result<(), SessionError>;

    /// Get all live sessions (optional)
    async fn all(&self) -> Result<Vec<SessionData>, SessionError> {
        Err(SessionError::Unsupported("all"))
    }

    /// Get the count of all stored sessions (optional)
    async fn length(&self) -> Result<usize, SessionError> {
        Err(SessionError::Unsupported("length"))
    }

    /// Clear all sessions (optional)
    async fn clear(&self) -> Result<(), SessionError> {
        Err(SessionError::Unsupported("clear"))
    }
}
