//! Mints, rotates and validates bearer token pairs.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

use super::credentials::{self, TOKEN_LEN};
use super::store::{StoreError, TokenStore};
use super::types::{AuthError, Client, Token, TokenEnvelope, User, join_scopes};

/// Default access-token lifetime in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Attempts at minting a non-colliding token pair before giving up.
const MINT_ATTEMPTS: usize = 3;

/// Handle for looking a token up by either of its strings.
#[derive(Debug, Clone, Copy)]
pub enum TokenQuery<'a> {
    AccessToken(&'a str),
    RefreshToken(&'a str),
}

/// Mints access/refresh pairs and enforces the policy that at most one
/// token row exists per `(client, user)` pair.
#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    ttl_secs: u64,
    /// Serializes the supersede-then-insert sequence per pair.
    issue_locks: Arc<DashMap<(String, Option<String>), Arc<Mutex<()>>>>,
}

impl TokenManager {
    /// Creates a manager over the given store with the given token TTL.
    pub fn new(store: Arc<dyn TokenStore>, ttl_secs: u64) -> Self {
        Self {
            store,
            ttl_secs,
            issue_locks: Arc::new(DashMap::new()),
        }
    }

    /// Issues a fresh token pair for the `(client, user)` pair, superseding
    /// any token the pair already holds.
    ///
    /// The delete-then-insert sequence runs under a per-pair lock, so
    /// concurrent calls for the same pair leave exactly one surviving row.
    /// Finding more than one existing row is an invariant violation and
    /// fails the call rather than being silently repaired.
    #[instrument(level = "debug", skip_all, fields(client_id = %client.client_id))]
    pub async fn issue(
        &self,
        client: &Client,
        user: Option<&User>,
        scopes: &[String],
    ) -> Result<TokenEnvelope, AuthError> {
        let pair = (client.client_id.clone(), user.map(|u| u.id.clone()));
        let lock = self
            .issue_locks
            .entry(pair.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let user_id = pair.1.as_deref();
        let existing = self
            .store
            .tokens_for_pair(&client.client_id, user_id)
            .await?;
        if existing.len() > 1 {
            error!(
                count = existing.len(),
                "multiple active tokens held by one (client, user) pair"
            );
            return Err(AuthError::Internal("duplicate active tokens".into()));
        }
        self.store
            .remove_tokens_for_pair(&client.client_id, user_id)
            .await?;

        let expires = Utc::now() + Duration::seconds(self.ttl_secs as i64);
        for _ in 0..MINT_ATTEMPTS {
            let token = Token {
                access_token: credentials::generate(TOKEN_LEN)?,
                refresh_token: credentials::generate(TOKEN_LEN)?,
                token_type: "bearer".to_string(),
                client_id: client.client_id.clone(),
                user_id: pair.1.clone(),
                scopes: scopes.to_vec(),
                expires,
            };
            match self.store.insert_token(token.clone()).await {
                Ok(()) => {
                    debug!("token pair issued");
                    return Ok(self.envelope(token));
                }
                Err(StoreError::Conflict(_)) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(AuthError::Internal(
            "token generation kept colliding".into(),
        ))
    }

    /// Looks a token up by one of its strings. Unknown and expired tokens
    /// are both rejected.
    #[instrument(level = "debug", skip_all)]
    pub async fn lookup(&self, query: TokenQuery<'_>) -> Result<Token, AuthError> {
        let found = match query {
            TokenQuery::AccessToken(value) => self.store.token_by_access(value).await?,
            TokenQuery::RefreshToken(value) => self.store.token_by_refresh(value).await?,
        };
        match found {
            Some(token) if !token.is_expired() => Ok(token),
            _ => Err(AuthError::InvalidToken),
        }
    }

    /// Deletes every token held by the pair. Used by `issue` internally and
    /// exposed for explicit logout flows.
    #[instrument(level = "debug", skip_all, fields(client_id = %client_id))]
    pub async fn revoke_all(
        &self,
        client_id: &str,
        user_id: Option<&str>,
    ) -> Result<usize, AuthError> {
        let removed = self
            .store
            .remove_tokens_for_pair(client_id, user_id)
            .await?;
        debug!(removed, "tokens revoked");
        Ok(removed)
    }

    fn envelope(&self, token: Token) -> TokenEnvelope {
        TokenEnvelope {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            token_type: token.token_type,
            expires_in: self.ttl_secs,
            scope: if token.scopes.is_empty() {
                None
            } else {
                Some(join_scopes(&token.scopes))
            },
        }
    }
}
