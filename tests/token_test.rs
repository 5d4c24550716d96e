use std::sync::Arc;

use bramble_auth::{
    AuthError, Client, MemoryStore, TokenManager, TokenQuery, TokenStore, User,
};

fn client(id: &str) -> Client {
    Client {
        client_id: id.to_string(),
        client_secret: "s3cret".to_string(),
        name: "test-app".to_string(),
        user_id: "owner".to_string(),
        redirect_uris: vec!["https://app.local/callback".to_string()],
        default_scopes: Vec::new(),
    }
}

fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        name: format!("user-{id}"),
        password: String::new(),
    }
}

#[tokio::test]
async fn test_issue_leaves_exactly_one_row() {
    let store = Arc::new(MemoryStore::new());
    let mgr = TokenManager::new(store.clone(), 3600);
    let client = client("c1");
    let user = user("u1");

    let first = mgr
        .issue(&client, Some(&user), &["read".to_string()])
        .await
        .unwrap();
    let second = mgr
        .issue(&client, Some(&user), &["read".to_string()])
        .await
        .unwrap();

    let rows = store.tokens_for_pair("c1", Some("u1")).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].access_token, second.access_token);

    // The first pair was invalidated by the second issue.
    let err = mgr
        .lookup(TokenQuery::AccessToken(&first.access_token))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
    let err = mgr
        .lookup(TokenQuery::RefreshToken(&first.refresh_token))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
}

#[tokio::test]
async fn test_lookup_by_either_handle_returns_the_same_token() {
    let mgr = TokenManager::new(Arc::new(MemoryStore::new()), 3600);
    let envelope = mgr.issue(&client("c1"), None, &[]).await.unwrap();

    let by_access = mgr
        .lookup(TokenQuery::AccessToken(&envelope.access_token))
        .await
        .unwrap();
    let by_refresh = mgr
        .lookup(TokenQuery::RefreshToken(&envelope.refresh_token))
        .await
        .unwrap();
    assert_eq!(by_access.access_token, by_refresh.access_token);
    assert_eq!(by_access.refresh_token, by_refresh.refresh_token);
}

#[tokio::test]
async fn test_expired_tokens_are_filtered_at_lookup() {
    let store = Arc::new(MemoryStore::new());
    let mgr = TokenManager::new(store.clone(), 0);
    let envelope = mgr.issue(&client("c1"), None, &[]).await.unwrap();

    // The row still exists; only lookup filters it.
    assert_eq!(store.tokens_for_pair("c1", None).await.unwrap().len(), 1);
    let err = mgr
        .lookup(TokenQuery::AccessToken(&envelope.access_token))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
}

#[tokio::test]
async fn test_separate_pairs_do_not_supersede_each_other() {
    let mgr = TokenManager::new(Arc::new(MemoryStore::new()), 3600);
    let c = client("c1");

    let first = mgr.issue(&c, Some(&user("u1")), &[]).await.unwrap();
    let second = mgr.issue(&c, Some(&user("u2")), &[]).await.unwrap();
    let anonymous = mgr.issue(&c, None, &[]).await.unwrap();

    assert!(
        mgr.lookup(TokenQuery::AccessToken(&first.access_token))
            .await
            .is_ok()
    );
    assert!(
        mgr.lookup(TokenQuery::AccessToken(&second.access_token))
            .await
            .is_ok()
    );
    assert!(
        mgr.lookup(TokenQuery::AccessToken(&anonymous.access_token))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_concurrent_issuers_leave_one_survivor() {
    let store = Arc::new(MemoryStore::new());
    let mgr = TokenManager::new(store.clone(), 3600);
    let c = client("c1");
    let u = user("u1");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let mgr = mgr.clone();
        let c = c.clone();
        let u = u.clone();
        handles.push(tokio::spawn(async move {
            mgr.issue(&c, Some(&u), &["read".to_string()]).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let rows = store.tokens_for_pair("c1", Some("u1")).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_revoke_all_counts_removed_rows() {
    let mgr = TokenManager::new(Arc::new(MemoryStore::new()), 3600);
    let c = client("c1");
    mgr.issue(&c, None, &[]).await.unwrap();

    assert_eq!(mgr.revoke_all("c1", None).await.unwrap(), 1);
    assert_eq!(mgr.revoke_all("c1", None).await.unwrap(), 0);
}
