//! Explicitly constructed provider wiring stores and managers together.

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use super::credentials::{self, AUTH_CODE_LEN};
use super::gateway::AuthGateway;
use super::grants::{DEFAULT_GRANT_TTL_SECS, GrantManager};
use super::memory::MemoryStore;
use super::store::{ClientStore, GrantStore, TokenStore, UserStore};
use super::tokens::{DEFAULT_TOKEN_TTL_SECS, TokenManager, TokenQuery};
use super::types::{AuthError, ClientCredentials, Token, TokenEnvelope, User};

/// Credential issuance engine with configurable stores and lifetimes.
///
/// Construction is explicit and instances carry their own store handles;
/// there is no process-wide provider. An HTTP layer maps verbs onto the
/// operations here.
#[derive(Clone)]
pub struct AuthProvider {
    clients: Arc<dyn ClientStore>,
    users: Arc<dyn UserStore>,
    grant_store: Arc<dyn GrantStore>,
    token_store: Arc<dyn TokenStore>,
    grant_ttl_secs: u64,
    token_ttl_secs: u64,
    login_secret: Vec<u8>,
    gateway: AuthGateway,
    grants: GrantManager,
    tokens: TokenManager,
}

impl AuthProvider {
    /// Creates a provider over a shared in-memory store with default
    /// lifetimes and a random per-process login secret.
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(store.clone(), store.clone(), store.clone(), store)
    }

    /// Wires a provider from explicit store handles.
    pub fn with_stores(
        clients: Arc<dyn ClientStore>,
        users: Arc<dyn UserStore>,
        grant_store: Arc<dyn GrantStore>,
        token_store: Arc<dyn TokenStore>,
    ) -> Self {
        let login_secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
            .into_bytes();
        let gateway = AuthGateway::new(clients.clone(), users.clone(), &login_secret);
        let grants = GrantManager::new(grant_store.clone(), DEFAULT_GRANT_TTL_SECS);
        let tokens = TokenManager::new(token_store.clone(), DEFAULT_TOKEN_TTL_SECS);
        AuthProvider {
            clients,
            users,
            grant_store,
            token_store,
            grant_ttl_secs: DEFAULT_GRANT_TTL_SECS,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            login_secret,
            gateway,
            grants,
            tokens,
        }
    }

    fn rebuild(mut self) -> Self {
        self.gateway = AuthGateway::new(self.clients.clone(), self.users.clone(), &self.login_secret);
        self.grants = GrantManager::new(self.grant_store.clone(), self.grant_ttl_secs);
        self.tokens = TokenManager::new(self.token_store.clone(), self.token_ttl_secs);
        self
    }

    /// Sets a custom client store.
    pub fn client_store(mut self, store: Arc<dyn ClientStore>) -> Self {
        self.clients = store;
        self.rebuild()
    }

    /// Sets a custom user store.
    pub fn user_store(mut self, store: Arc<dyn UserStore>) -> Self {
        self.users = store;
        self.rebuild()
    }

    /// Sets a custom grant store.
    pub fn grant_store(mut self, store: Arc<dyn GrantStore>) -> Self {
        self.grant_store = store;
        self.rebuild()
    }

    /// Sets a custom token store.
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = store;
        self.rebuild()
    }

    /// Overrides the authorization-grant lifetime.
    pub fn grant_ttl(mut self, secs: u64) -> Self {
        self.grant_ttl_secs = secs;
        self.rebuild()
    }

    /// Overrides the access-token lifetime.
    pub fn token_ttl(mut self, secs: u64) -> Self {
        self.token_ttl_secs = secs;
        self.rebuild()
    }

    /// Overrides the secret used to sign login artifacts.
    pub fn login_secret(mut self, secret: &[u8]) -> Self {
        self.login_secret = secret.to_vec();
        self.rebuild()
    }

    /// Authenticates a client, returning a bearer artifact. Backs the
    /// `POST /login` endpoint.
    pub async fn login(&self, client_id: &str, client_secret: &str) -> Result<String, AuthError> {
        self.gateway.authenticate_client(client_id, client_secret).await
    }

    /// Registers a client for an authenticated user. Backs the
    /// `POST /clients` endpoint.
    pub async fn register_client(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<ClientCredentials, AuthError> {
        self.gateway.register_client(username, password, name).await
    }

    /// Creates a user account, e.g. when seeding the initial admin.
    pub async fn create_user(&self, name: &str, password: &str) -> Result<User, AuthError> {
        self.gateway.create_user(name, password).await
    }

    /// Approves an authorization request: mints a fresh code, stores the
    /// grant and returns the code for delivery to the client.
    pub async fn authorize(
        &self,
        client_id: &str,
        scopes: &[String],
        redirect_uri: Option<&str>,
        user: Option<&User>,
    ) -> Result<String, AuthError> {
        let code = credentials::generate(AUTH_CODE_LEN)?;
        self.grants
            .issue_grant(client_id, &code, redirect_uri, scopes, user)
            .await?;
        Ok(code)
    }

    /// Token exchange, authorization-code flow. The code is consumed even
    /// when later steps fail.
    #[instrument(level = "debug", skip_all, fields(client_id = %client_id))]
    pub async fn exchange_code(
        &self,
        client_id: &str,
        code: &str,
    ) -> Result<TokenEnvelope, AuthError> {
        let client = match self.clients.client_by_id(client_id).await? {
            Some(client) => client,
            None => return Err(AuthError::Authentication),
        };
        let grant = self.grants.redeem_grant(client_id, code).await?;
        let user = match grant.user_id.as_deref() {
            Some(id) => match self.users.user_by_id(id).await? {
                Some(user) => Some(user),
                None => return Err(AuthError::InvalidGrant),
            },
            None => None,
        };
        let scopes = if grant.scopes.is_empty() {
            client.default_scopes.clone()
        } else {
            grant.scopes.clone()
        };
        self.tokens.issue(&client, user.as_ref(), &scopes).await
    }

    /// Token exchange, client-credentials flow.
    #[instrument(level = "debug", skip_all, fields(client_id = %client_id))]
    pub async fn exchange_client_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenEnvelope, AuthError> {
        let client = match self.clients.client_by_id(client_id).await? {
            Some(client) => client,
            None => return Err(AuthError::Authentication),
        };
        if !client.secret_matches(client_secret) {
            return Err(AuthError::Authentication);
        }
        let scopes = client.default_scopes.clone();
        self.tokens.issue(&client, None, &scopes).await
    }

    /// Token refresh. Issuing the replacement invalidates the old pair.
    #[instrument(level = "debug", skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenEnvelope, AuthError> {
        let token = match self.tokens.lookup(TokenQuery::RefreshToken(refresh_token)).await {
            Ok(token) => token,
            Err(AuthError::InvalidToken) => return Err(AuthError::InvalidGrant),
            Err(other) => return Err(other),
        };
        let client = match self.clients.client_by_id(&token.client_id).await? {
            Some(client) => client,
            None => return Err(AuthError::Authentication),
        };
        let user = match token.user_id.as_deref() {
            Some(id) => match self.users.user_by_id(id).await? {
                Some(user) => Some(user),
                None => return Err(AuthError::InvalidGrant),
            },
            None => None,
        };
        self.tokens.issue(&client, user.as_ref(), &token.scopes).await
    }

    /// Resource-side validation of a presented access token.
    pub async fn validate(&self, access_token: &str) -> Result<Token, AuthError> {
        self.tokens.lookup(TokenQuery::AccessToken(access_token)).await
    }

    /// Explicit logout: removes every token held by the pair.
    pub async fn revoke(&self, client_id: &str, user_id: Option<&str>) -> Result<usize, AuthError> {
        self.tokens.revoke_all(client_id, user_id).await
    }
}

impl Default for AuthProvider {
    fn default() -> Self {
        Self::new()
    }
}
