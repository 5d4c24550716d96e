use bramble_auth::{
    Client, ClientStore, Grant, GrantStore, MemoryStore, StoreError, Token, TokenStore, User,
    UserStore, join_scopes, split_scopes,
};
use chrono::{Duration, Utc};

fn token(access: &str, refresh: &str, client_id: &str, user_id: Option<&str>) -> Token {
    Token {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        token_type: "bearer".to_string(),
        client_id: client_id.to_string(),
        user_id: user_id.map(|s| s.to_string()),
        scopes: Vec::new(),
        expires: Utc::now() + Duration::seconds(60),
    }
}

#[tokio::test]
async fn test_client_id_is_unique() {
    let store = MemoryStore::new();
    let client = Client {
        client_id: "c1".to_string(),
        client_secret: "s".to_string(),
        name: "app".to_string(),
        user_id: "u1".to_string(),
        redirect_uris: Vec::new(),
        default_scopes: Vec::new(),
    };
    store.insert_client(client.clone()).await.unwrap();

    let err = store.insert_client(client).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict("client_id")));
    assert!(store.client_by_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_user_name_is_unique() {
    let store = MemoryStore::new();
    let user = User {
        id: "u1".to_string(),
        name: "admin".to_string(),
        password: "hash".to_string(),
    };
    store.insert_user(user).await.unwrap();

    let duplicate = User {
        id: "u2".to_string(),
        name: "admin".to_string(),
        password: "hash".to_string(),
    };
    let err = store.insert_user(duplicate).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict("name")));

    // Lookup resolves through the name index.
    let found = store.user_by_name("admin").await.unwrap().unwrap();
    assert_eq!(found.id, "u1");
    assert!(store.user_by_name("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_token_strings_are_unique() {
    let store = MemoryStore::new();
    store
        .insert_token(token("a1", "r1", "c1", None))
        .await
        .unwrap();

    let err = store
        .insert_token(token("a1", "r2", "c1", None))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict("access_token")));

    let err = store
        .insert_token(token("a2", "r1", "c1", None))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict("refresh_token")));
}

#[tokio::test]
async fn test_pair_queries_distinguish_anonymous_tokens() {
    let store = MemoryStore::new();
    store
        .insert_token(token("a1", "r1", "c1", Some("u1")))
        .await
        .unwrap();
    store
        .insert_token(token("a2", "r2", "c1", None))
        .await
        .unwrap();

    assert_eq!(store.tokens_for_pair("c1", Some("u1")).await.unwrap().len(), 1);
    assert_eq!(store.tokens_for_pair("c1", None).await.unwrap().len(), 1);

    assert_eq!(
        store.remove_tokens_for_pair("c1", Some("u1")).await.unwrap(),
        1
    );
    // The refresh index went away with the row.
    assert!(store.token_by_refresh("r1").await.unwrap().is_none());
    assert!(store.token_by_access("a2").await.unwrap().is_some());
}

#[tokio::test]
async fn test_grant_round_trip() {
    let store = MemoryStore::new();
    let grant = Grant {
        code: "abc".to_string(),
        client_id: "c1".to_string(),
        user_id: None,
        redirect_uri: None,
        scopes: split_scopes("read write"),
        expires: Utc::now() + Duration::seconds(100),
    };
    store.insert_grant(grant).await.unwrap();

    let found = store.grant_by_code("c1", "abc").await.unwrap().unwrap();
    assert_eq!(found.scopes, vec!["read".to_string(), "write".to_string()]);

    assert!(store.remove_grant("c1", "abc").await.unwrap());
    assert!(!store.remove_grant("c1", "abc").await.unwrap());
}

#[test]
fn test_scope_round_trip() {
    let scopes = split_scopes("read write");
    assert_eq!(scopes, vec!["read".to_string(), "write".to_string()]);
    assert_eq!(join_scopes(&scopes), "read write");

    assert!(split_scopes("").is_empty());
    assert_eq!(
        split_scopes("  read   write "),
        vec!["read".to_string(), "write".to_string()]
    );
}
