//! Core entities: Client, User, Grant, Token and errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Splits a whitespace-delimited scope string into individual scopes.
pub fn split_scopes(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(|s| s.to_string()).collect()
}

/// Joins scopes back into their whitespace-delimited storage form.
pub fn join_scopes(scopes: &[String]) -> String {
    scopes.join(" ")
}

/// Represents a registered consumer application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Opaque client identifier, globally unique.
    pub client_id: String,
    /// Opaque client secret, returned to the owner exactly once.
    pub client_secret: String,
    /// Human-readable application name.
    pub name: String,
    /// Id of the owning user.
    pub user_id: String,
    /// Allowed redirect URIs.
    pub redirect_uris: Vec<String>,
    /// Scopes granted when a request names none.
    pub default_scopes: Vec<String>,
}

impl Client {
    /// No confidential-client distinction is made in this deployment.
    pub fn client_type(&self) -> &'static str {
        "public"
    }

    /// First registered redirect URI, if any.
    pub fn default_redirect_uri(&self) -> Option<&str> {
        self.redirect_uris.first().map(|s| s.as_str())
    }

    /// Constant-time comparison of a presented secret against the stored
    /// one.
    pub fn secret_matches(&self, presented: &str) -> bool {
        ring::constant_time::verify_slices_are_equal(
            self.client_secret.as_bytes(),
            presented.as_bytes(),
        )
        .is_ok()
    }
}

/// An account holder, authenticated by name and password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Unique account name.
    pub name: String,
    /// Password hash. Never the clear text.
    pub password: String,
}

/// A single-use authorization code bound to a client and optionally a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    /// The code value. Unique jointly with `client_id`.
    pub code: String,
    pub client_id: String,
    pub user_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub scopes: Vec<String>,
    /// Absolute expiry. The grant is valid only while `now < expires`.
    pub expires: DateTime<Utc>,
}

impl Grant {
    /// Whether the grant is dead for redemption purposes.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires
    }
}

/// An issued bearer credential pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Access token string, unique across all tokens.
    pub access_token: String,
    /// Refresh token string, unique across all tokens.
    pub refresh_token: String,
    /// Currently always `"bearer"`.
    pub token_type: String,
    pub client_id: String,
    pub user_id: Option<String>,
    pub scopes: Vec<String>,
    /// Absolute expiry, checked at lookup time.
    pub expires: DateTime<Utc>,
}

impl Token {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires
    }
}

/// The access/refresh pair plus metadata returned to a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEnvelope {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
    /// Granted scopes, whitespace-joined. Absent when none were granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Freshly generated client credentials, returned by registration exactly
/// once. They are not retrievable again afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Error kinds surfaced by the credential engine.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Bad client or user credentials.
    #[error("client or user authentication failed")]
    Authentication,
    /// Unknown, expired or already-consumed grant or refresh token.
    #[error("invalid or expired grant")]
    InvalidGrant,
    /// Unknown or expired access token.
    #[error("invalid or expired token")]
    InvalidToken,
    /// Uniqueness violation that survived the internal retry budget.
    #[error("unique value already in use: {0}")]
    Conflict(String),
    /// Store unavailable or timed out. Retryable at the boundary layer.
    #[error("storage backend failure: {0}")]
    Store(String),
    /// Retry budget exhausted or an invariant violation was detected.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// OAuth wire code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Authentication => "invalid_client",
            AuthError::InvalidGrant => "invalid_grant",
            AuthError::InvalidToken => "invalid_token",
            AuthError::Conflict(_) => "conflict",
            AuthError::Store(_) => "temporarily_unavailable",
            AuthError::Internal(_) => "server_error",
        }
    }

    /// Human-readable description matching the wire code.
    pub fn description(&self) -> &'static str {
        match self {
            AuthError::Authentication => "Client or user authentication failed",
            AuthError::InvalidGrant => "Invalid or expired grant",
            AuthError::InvalidToken => "The token is invalid or has expired",
            AuthError::Conflict(_) => "Unique value already in use",
            AuthError::Store(_) => "Storage backend temporarily unavailable",
            AuthError::Internal(_) => "Internal server error",
        }
    }

    /// JSON body in the standard `{"error", "error_description"}` shape.
    pub fn to_body(&self) -> serde_json::Value {
        json!({ "error": self.error_code(), "error_description": self.description() })
    }
}
