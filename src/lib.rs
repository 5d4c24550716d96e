pub mod auth_core;

pub use auth_core::credentials::{
    AUTH_CODE_LEN, CLIENT_ID_LEN, CLIENT_SECRET_LEN, TOKEN_LEN, generate, hash_password,
    verify_password,
};
pub use auth_core::gateway::AuthGateway;
pub use auth_core::grants::{DEFAULT_GRANT_TTL_SECS, GrantManager};
pub use auth_core::memory::MemoryStore;
pub use auth_core::provider::AuthProvider;
pub use auth_core::store::{ClientStore, GrantStore, StoreError, TokenStore, UserStore};
pub use auth_core::tokens::{DEFAULT_TOKEN_TTL_SECS, TokenManager, TokenQuery};
pub use auth_core::types::{
    AuthError, Client, ClientCredentials, Grant, Token, TokenEnvelope, User, join_scopes,
    split_scopes,
};
