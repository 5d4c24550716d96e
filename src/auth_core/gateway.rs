//! Boundary authentication: client login and client registration.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::credentials::{self, CLIENT_ID_LEN, CLIENT_SECRET_LEN};
use super::store::{ClientStore, StoreError, UserStore};
use super::types::{AuthError, Client, ClientCredentials, User};

/// Lifetime of the login artifact in seconds.
const LOGIN_ARTIFACT_TTL_SECS: i64 = 3600;

/// Attempts at generating a non-colliding client id before giving up.
const REGISTER_ATTEMPTS: usize = 3;

/// Claims carried by the login artifact. The artifact is a
/// session-establishment credential only; nothing in this crate makes
/// authorization decisions from its payload.
#[derive(Debug, Serialize, Deserialize)]
struct LoginClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Validates client and user credentials at the system boundary.
#[derive(Clone)]
pub struct AuthGateway {
    clients: Arc<dyn ClientStore>,
    users: Arc<dyn UserStore>,
    login_key: EncodingKey,
}

impl AuthGateway {
    /// Creates a gateway signing login artifacts with `login_secret`.
    pub fn new(
        clients: Arc<dyn ClientStore>,
        users: Arc<dyn UserStore>,
        login_secret: &[u8],
    ) -> Self {
        Self {
            clients,
            users,
            login_key: EncodingKey::from_secret(login_secret),
        }
    }

    /// Checks a client id/secret pair and returns an opaque bearer artifact
    /// establishing the session. Read-only.
    #[instrument(level = "debug", skip_all, fields(client_id = %client_id))]
    pub async fn authenticate_client(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, AuthError> {
        let client = match self.clients.client_by_id(client_id).await? {
            Some(client) => client,
            None => {
                warn!("unknown client");
                return Err(AuthError::Authentication);
            }
        };
        if !client.secret_matches(client_secret) {
            warn!("client secret mismatch");
            return Err(AuthError::Authentication);
        }
        let now = Utc::now();
        let claims = LoginClaims {
            sub: client.client_id,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(LOGIN_ARTIFACT_TTL_SECS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.login_key)
            .map_err(|err| AuthError::Internal(err.to_string()))
    }

    /// Registers a new client owned by the user with the given credentials.
    ///
    /// The returned id/secret pair is handed out exactly once; it is not
    /// retrievable again afterwards.
    #[instrument(level = "debug", skip_all, fields(username = %username))]
    pub async fn register_client(
        &self,
        username: &str,
        password: &str,
        client_name: &str,
    ) -> Result<ClientCredentials, AuthError> {
        let user = match self.users.user_by_name(username).await? {
            Some(user) => user,
            None => {
                warn!("unknown user");
                return Err(AuthError::Authentication);
            }
        };
        if !credentials::verify_password(password, &user.password) {
            warn!("password mismatch");
            return Err(AuthError::Authentication);
        }
        for _ in 0..REGISTER_ATTEMPTS {
            let client = Client {
                client_id: credentials::generate(CLIENT_ID_LEN)?,
                client_secret: credentials::generate(CLIENT_SECRET_LEN)?,
                name: client_name.to_string(),
                user_id: user.id.clone(),
                redirect_uris: Vec::new(),
                default_scopes: Vec::new(),
            };
            match self.clients.insert_client(client.clone()).await {
                Ok(()) => {
                    debug!(client_id = %client.client_id, "client registered");
                    return Ok(ClientCredentials {
                        client_id: client.client_id,
                        client_secret: client.client_secret,
                    });
                }
                Err(StoreError::Conflict(_)) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(AuthError::Internal(
            "client id generation kept colliding".into(),
        ))
    }

    /// Creates a user account, hashing the password for storage.
    #[instrument(level = "debug", skip_all, fields(name = %name))]
    pub async fn create_user(&self, name: &str, password: &str) -> Result<User, AuthError> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            password: credentials::hash_password(password)?,
        };
        self.users.insert_user(user.clone()).await?;
        debug!("user created");
        Ok(user)
    }
}
