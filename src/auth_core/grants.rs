//! Issues and redeems short-lived authorization grants.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, instrument, warn};

use super::store::GrantStore;
use super::types::{AuthError, Grant, User};

/// Default grant time-to-live in seconds.
pub const DEFAULT_GRANT_TTL_SECS: u64 = 100;

/// Issues and redeems single-use authorization codes bound to a client and
/// optionally a user.
#[derive(Clone)]
pub struct GrantManager {
    store: Arc<dyn GrantStore>,
    ttl_secs: u64,
}

impl GrantManager {
    /// Creates a manager over the given store with the given code TTL.
    pub fn new(store: Arc<dyn GrantStore>, ttl_secs: u64) -> Self {
        Self { store, ttl_secs }
    }

    /// Creates and persists a grant expiring `ttl_secs` from now.
    ///
    /// Issuing over a live `(client_id, code)` pair is a conflict; an
    /// expired leftover under the same key is removed and replaced.
    #[instrument(level = "debug", skip_all, fields(client_id = %client_id))]
    pub async fn issue_grant(
        &self,
        client_id: &str,
        code: &str,
        redirect_uri: Option<&str>,
        scopes: &[String],
        user: Option<&User>,
    ) -> Result<Grant, AuthError> {
        if let Some(existing) = self.store.grant_by_code(client_id, code).await? {
            if !existing.is_expired() {
                warn!("grant code already issued");
                return Err(AuthError::Conflict("code".into()));
            }
            self.store.remove_grant(client_id, code).await?;
        }
        let grant = Grant {
            code: code.to_string(),
            client_id: client_id.to_string(),
            user_id: user.map(|u| u.id.clone()),
            redirect_uri: redirect_uri.map(|s| s.to_string()),
            scopes: scopes.to_vec(),
            expires: Utc::now() + Duration::seconds(self.ttl_secs as i64),
        };
        self.store.insert_grant(grant.clone()).await?;
        debug!("authorization grant issued");
        Ok(grant)
    }

    /// Redeems a grant by exact `(client_id, code)` match.
    ///
    /// The grant is removed before it is returned, so a code redeems at
    /// most once. Expired grants are treated as not found and cleaned up.
    #[instrument(level = "debug", skip_all, fields(client_id = %client_id))]
    pub async fn redeem_grant(&self, client_id: &str, code: &str) -> Result<Grant, AuthError> {
        let grant = match self.store.grant_by_code(client_id, code).await? {
            Some(grant) => grant,
            None => return Err(AuthError::InvalidGrant),
        };
        if grant.is_expired() {
            self.store.remove_grant(client_id, code).await?;
            warn!("rejected expired grant");
            return Err(AuthError::InvalidGrant);
        }
        // Losing the removal race to a concurrent redemption means the code
        // was already used.
        if !self.store.remove_grant(client_id, code).await? {
            return Err(AuthError::InvalidGrant);
        }
        debug!("authorization grant redeemed");
        Ok(grant)
    }
}
