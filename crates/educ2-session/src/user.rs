//! User records and the credential lookup the login handshake consumes.
//!
//! The server never decides on its own who may log in; it asks a
//! [`CredentialStore`]. The stock implementation is a fixed list
//! ([`StaticCredentialStore`]), filled from the config file or from
//! [`default_users`]. Tests plug in their own stores.

use std::fmt;

use serde::Deserialize;

use crate::SessionError;

/// One account that may log in.
///
/// Immutable once loaded. `role` is shown by `myinfo` and gates nothing.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub role: String,
}

impl UserRecord {
    /// Convenience constructor.
    pub fn new(id: u64, username: &str, password: &str, role: &str) -> Self {
        Self {
            id,
            username: username.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        }
    }
}

// Hand-written so passwords never reach a log line.
impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &"***")
            .field("role", &self.role)
            .finish()
    }
}

/// The accounts available when no `[[users]]` are configured.
pub fn default_users() -> Vec<UserRecord> {
    vec![
        UserRecord::new(1, "admin", "admin", "admin"),
        UserRecord::new(2, "user1", "pass1", "user"),
    ]
}

/// Looks users up by username and password.
///
/// # Trait bounds
///
/// - `Send + Sync`: one store is shared by every connection task.
/// - `'static`: it lives as long as the server.
///
/// # Example
///
/// ```rust
/// use educ2_session::{CredentialStore, SessionError, UserRecord};
///
/// /// Lets anyone in as a guest.
/// struct GuestStore;
///
/// impl CredentialStore for GuestStore {
///     async fn lookup(
///         &self,
///         username: &str,
///         _password: &str,
///     ) -> Result<UserRecord, SessionError> {
///         Ok(UserRecord::new(0, username, "", "guest"))
///     }
///
///     fn user_count(&self) -> usize {
///         0
///     }
/// }
/// ```
pub trait CredentialStore: Send + Sync + 'static {
    /// Returns the user whose username *and* password both match.
    ///
    /// # Errors
    /// [`SessionError::AuthFailed`] when no user matches. The reason is
    /// for logs only; the client always sees the same failure text.
    fn lookup(
        &self,
        username: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<UserRecord, SessionError>> + Send;

    /// How many users the store knows about, for `stats`.
    fn user_count(&self) -> usize;
}

/// A [`CredentialStore`] over a fixed in-memory list.
#[derive(Debug, Clone)]
pub struct StaticCredentialStore {
    users: Vec<UserRecord>,
}

impl StaticCredentialStore {
    /// Creates a store over `users`.
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self { users }
    }
}

impl Default for StaticCredentialStore {
    fn default() -> Self {
        Self::new(default_users())
    }
}

impl CredentialStore for StaticCredentialStore {
    async fn lookup(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, SessionError> {
        self.users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .cloned()
            .ok_or_else(|| {
                SessionError::AuthFailed(format!("no match for user {username:?}"))
            })
    }

    fn user_count(&self) -> usize {
        self.users.len()
    }
}
