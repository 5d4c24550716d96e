//! Storage traits consumed by the credential engine.
//!
//! Implementations distinguish "not found" (`Ok(None)`) from actual store
//! failures (`Err`); the two are never collapsed into one rejection.

use async_trait::async_trait;

use super::types::{AuthError, Client, Grant, Token, User};

/// Failures surfaced by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique-key constraint was violated on the named column.
    #[error("unique constraint violated on {0}")]
    Conflict(&'static str),
    /// A store call exceeded its deadline. The in-memory store never emits
    /// this; networked adapters are expected to enforce their own timeouts.
    #[error("store call timed out")]
    Timeout,
    /// The store is unreachable or failed unexpectedly.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(column) => AuthError::Conflict(column.to_string()),
            other => AuthError::Store(other.to_string()),
        }
    }
}

/// Trait for persisting and retrieving registered clients.
#[async_trait]
pub trait ClientStore: Send + Sync + 'static {
    /// Persists a new client. `client_id` is a unique key.
    async fn insert_client(&self, client: Client) -> Result<(), StoreError>;

    /// Retrieves a client by its identifier.
    async fn client_by_id(&self, client_id: &str) -> Result<Option<Client>, StoreError>;
}

/// Trait for persisting and retrieving user accounts.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Persists a new user. `name` is a unique key.
    async fn insert_user(&self, user: User) -> Result<(), StoreError>;

    /// Retrieves a user by id.
    async fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Retrieves a user by account name.
    async fn user_by_name(&self, name: &str) -> Result<Option<User>, StoreError>;
}

/// Trait for persisting authorization grants.
#[async_trait]
pub trait GrantStore: Send + Sync + 'static {
    /// Persists a grant. `(client_id, code)` is a unique key.
    async fn insert_grant(&self, grant: Grant) -> Result<(), StoreError>;

    /// Retrieves a grant by exact `(client_id, code)` match.
    async fn grant_by_code(&self, client_id: &str, code: &str)
        -> Result<Option<Grant>, StoreError>;

    /// Removes a grant, reporting whether a row was actually removed.
    async fn remove_grant(&self, client_id: &str, code: &str) -> Result<bool, StoreError>;
}

/// Trait for persisting issued token pairs.
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    /// Persists a token. Both token strings are unique keys.
    async fn insert_token(&self, token: Token) -> Result<(), StoreError>;

    /// Retrieves a token by its access-token string.
    async fn token_by_access(&self, access_token: &str) -> Result<Option<Token>, StoreError>;

    /// Retrieves a token by its refresh-token string.
    async fn token_by_refresh(&self, refresh_token: &str) -> Result<Option<Token>, StoreError>;

    /// All tokens currently held by the `(client, user)` pair.
    async fn tokens_for_pair(
        &self,
        client_id: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<Token>, StoreError>;

    /// Removes every token held by the pair, returning how many went away.
    async fn remove_tokens_for_pair(
        &self,
        client_id: &str,
        user_id: Option<&str>,
    ) -> Result<usize, StoreError>;
}
