//! In-memory default implementations of the storage traits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::RwLock;

use super::store::{ClientStore, GrantStore, StoreError, TokenStore, UserStore};
use super::types::{Client, Grant, Token, User};

/// Token rows plus the refresh-token index. Held behind a single lock so
/// the two maps can never diverge.
#[derive(Default)]
struct TokenTable {
    by_access: HashMap<String, Token>,
    by_refresh: HashMap<String, String>,
}

/// Process-local store backing all four storage traits. Cheap to clone;
/// clones share the underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    clients: Arc<DashMap<String, Client>>,
    users: Arc<DashMap<String, User>>,
    user_names: Arc<DashMap<String, String>>,
    grants: Arc<RwLock<HashMap<(String, String), Grant>>>,
    tokens: Arc<RwLock<TokenTable>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn insert_client(&self, client: Client) -> Result<(), StoreError> {
        match self.clients.entry(client.client_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("client_id")),
            Entry::Vacant(slot) => {
                slot.insert(client);
                Ok(())
            }
        }
    }

    async fn client_by_id(&self, client_id: &str) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.get(client_id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        match self.user_names.entry(user.name.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("name")),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
                self.users.insert(user.id.clone(), user);
                Ok(())
            }
        }
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(id).map(|entry| entry.value().clone()))
    }

    async fn user_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        let id = match self.user_names.get(name) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn insert_grant(&self, grant: Grant) -> Result<(), StoreError> {
        let mut guard = self.grants.write().await;
        let key = (grant.client_id.clone(), grant.code.clone());
        if guard.contains_key(&key) {
            return Err(StoreError::Conflict("code"));
        }
        guard.insert(key, grant);
        Ok(())
    }

    async fn grant_by_code(
        &self,
        client_id: &str,
        code: &str,
    ) -> Result<Option<Grant>, StoreError> {
        let guard = self.grants.read().await;
        Ok(guard
            .get(&(client_id.to_string(), code.to_string()))
            .cloned())
    }

    async fn remove_grant(&self, client_id: &str, code: &str) -> Result<bool, StoreError> {
        let mut guard = self.grants.write().await;
        Ok(guard
            .remove(&(client_id.to_string(), code.to_string()))
            .is_some())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert_token(&self, token: Token) -> Result<(), StoreError> {
        let mut guard = self.tokens.write().await;
        if guard.by_access.contains_key(&token.access_token) {
            return Err(StoreError::Conflict("access_token"));
        }
        if guard.by_refresh.contains_key(&token.refresh_token) {
            return Err(StoreError::Conflict("refresh_token"));
        }
        guard
            .by_refresh
            .insert(token.refresh_token.clone(), token.access_token.clone());
        guard.by_access.insert(token.access_token.clone(), token);
        Ok(())
    }

    async fn token_by_access(&self, access_token: &str) -> Result<Option<Token>, StoreError> {
        let guard = self.tokens.read().await;
        Ok(guard.by_access.get(access_token).cloned())
    }

    async fn token_by_refresh(&self, refresh_token: &str) -> Result<Option<Token>, StoreError> {
        let guard = self.tokens.read().await;
        let access = match guard.by_refresh.get(refresh_token) {
            Some(access) => access,
            None => return Ok(None),
        };
        Ok(guard.by_access.get(access).cloned())
    }

    async fn tokens_for_pair(
        &self,
        client_id: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<Token>, StoreError> {
        let guard = self.tokens.read().await;
        Ok(guard
            .by_access
            .values()
            .filter(|t| t.client_id == client_id && t.user_id.as_deref() == user_id)
            .cloned()
            .collect())
    }

    async fn remove_tokens_for_pair(
        &self,
        client_id: &str,
        user_id: Option<&str>,
    ) -> Result<usize, StoreError> {
        let mut guard = self.tokens.write().await;
        let doomed: Vec<String> = guard
            .by_access
            .values()
            .filter(|t| t.client_id == client_id && t.user_id.as_deref() == user_id)
            .map(|t| t.access_token.clone())
            .collect();
        for access in &doomed {
            if let Some(token) = guard.by_access.remove(access) {
                guard.by_refresh.remove(&token.refresh_token);
            }
        }
        Ok(doomed.len())
    }
}
