//! Token refresh and replay behaviour of the marketplace HTTP client

use bazaar_core::ApiResponse;
use bazaar_http::{
    ApiRequest, ClientError, CredentialUpdate, Credentials, MarketClient, MemoryTokenStore, Session,
    SessionListener, TokenSlot, TokenStore,
};
use mockall::mock;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mock! {
    Listener {}

    impl SessionListener for Listener {
        fn session_ended(&self, redirect_to: &str);
    }
}

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(ApiResponse::ok(data))
}

fn profile() -> Value {
    json!({ "nickname": "alice" })
}

/// Listener that must never fire
fn silent_listener() -> Arc<MockListener> {
    let mut listener = MockListener::new();
    listener.expect_session_ended().times(0);
    Arc::new(listener)
}

/// Listener that must fire exactly once with the auth entry point
fn teardown_listener() -> Arc<MockListener> {
    let mut listener = MockListener::new();
    listener
        .expect_session_ended()
        .withf(|redirect_to: &str| redirect_to == "/auth")
        .times(1)
        .return_const(());
    Arc::new(listener)
}

fn client(
    server: &MockServer,
    store: Arc<MemoryTokenStore>,
    listener: Arc<MockListener>,
) -> MarketClient {
    MarketClient::builder()
        .base_url(server.uri())
        .session(Session::new(store).with_listener(listener))
        .build()
        .unwrap()
}

fn order_json() -> Value {
    let user = json!({
        "uuid": "u-1",
        "user_id": "alice",
        "name": "Alice",
        "email": "alice@example.com",
        "status": "active",
        "user_state": { "points": 120 }
    });
    json!({
        "uuid": "o-1",
        "order_number": "ORD-0001",
        "status": "PENDING",
        "total_amount": 150000,
        "quantity": 1,
        "delivery_method": "direct",
        "buyer": user,
        "seller": user,
        "product": {
            "uuid": "p-1",
            "name": "Film camera",
            "description": "Works fine",
            "price": 150000,
            "category": "camera",
            "status": "Available",
            "has_nft": false,
            "attributes": {},
            "created_at": "2024-05-01T10:00:00Z"
        },
        "created_at": "2024-05-02T10:00:00Z"
    })
}

fn signed_in() -> Arc<MemoryTokenStore> {
    Arc::new(MemoryTokenStore::with_credentials(Credentials::new("A1", "R1")))
}

async fn mount_refresh(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "R1" })))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_replayed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ok(profile()))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ok(json!({ "access_token": "A2" })), 1).await;

    let store = signed_in();
    let client = client(&mock_server, store.clone(), silent_listener());

    let body: Value = client
        .execute(&ApiRequest::get("/profile"))
        .await
        .unwrap();

    assert_eq!(body, profile());
    assert_eq!(store.credentials().await, Some(Credentials::new("A2", "R1")));
}

#[tokio::test]
async fn test_refresh_request_carries_no_bearer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ok(profile()))
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ok(json!({ "access_token": "A2" })), 1).await;

    let client = client(&mock_server, signed_in(), silent_listener());
    client
        .send(&ApiRequest::get("/profile"))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let refresh = requests
        .iter()
        .find(|req| req.url.path() == "/auth/refresh")
        .unwrap();
    assert!(refresh.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_rotated_refresh_token_is_stored() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ok(profile()))
        .mount(&mock_server)
        .await;
    mount_refresh(
        &mock_server,
        ok(json!({ "access_token": "A2", "refresh_token": "R2" })),
        1,
    )
    .await;

    let store = signed_in();
    let client = client(&mock_server, store.clone(), silent_listener());
    client
        .send(&ApiRequest::get("/profile"))
        .await
        .unwrap();

    assert_eq!(store.credentials().await, Some(Credentials::new("A2", "R2")));
}

#[tokio::test]
async fn test_replay_is_attempted_only_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ok(json!({ "access_token": "A2" })), 1).await;

    let store = signed_in();
    let client = client(&mock_server, store.clone(), silent_listener());

    let result = client.send(&ApiRequest::get("/profile")).await;
    assert!(matches!(result, Err(ClientError::AuthenticationFailed(_))));

    // The refreshed credentials are kept; only a failed refresh ends the session
    assert_eq!(store.credentials().await, Some(Credentials::new("A2", "R1")));
}

#[tokio::test]
async fn test_rejected_refresh_ends_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ResponseTemplate::new(401), 1).await;

    let store = signed_in();
    let client = client(&mock_server, store.clone(), teardown_listener());

    let result = client.send(&ApiRequest::get("/profile")).await;
    assert!(matches!(result, Err(ClientError::RefreshRejected(_))));

    assert_eq!(store.get(TokenSlot::Access).await.unwrap(), None);
    assert_eq!(store.get(TokenSlot::Refresh).await.unwrap(), None);
}

#[tokio::test]
async fn test_unsuccessful_refresh_envelope_ends_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    mount_refresh(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "data": null,
            "error": ["refresh token expired"]
        })),
        1,
    )
    .await;

    let store = signed_in();
    let client = client(&mock_server, store.clone(), teardown_listener());

    match client.send(&ApiRequest::get("/profile")).await {
        Err(ClientError::RefreshRejected(msg)) => assert!(msg.contains("refresh token expired")),
        other => panic!("expected rejected refresh, got {other:?}"),
    }
    assert_eq!(store.credentials().await, None);
}

#[tokio::test]
async fn test_missing_refresh_token_ends_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ok(json!({ "access_token": "A2" })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    store
        .apply(&CredentialUpdate::AccessOnly("A1".to_string()))
        .await
        .unwrap();
    let client = client(&mock_server, store.clone(), teardown_listener());

    let result = client.send(&ApiRequest::get("/profile")).await;
    assert!(matches!(result, Err(ClientError::MissingRefreshToken)));
    assert_eq!(store.get(TokenSlot::Access).await.unwrap(), None);
}

#[tokio::test]
async fn test_server_error_does_not_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ok(json!({ "access_token": "A2" })), 0).await;

    let store = signed_in();
    let client = client(&mock_server, store.clone(), silent_listener());

    let result = client.send(&ApiRequest::get("/profile")).await;
    assert!(matches!(
        result,
        Err(ClientError::ServerError { status: 500, .. })
    ));
    assert_eq!(store.credentials().await, Some(Credentials::new("A1", "R1")));
}

#[tokio::test]
async fn test_timeout_does_not_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ok(profile()).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ok(json!({ "access_token": "A2" })), 0).await;

    let store = signed_in();
    let client = MarketClient::builder()
        .base_url(mock_server.uri())
        .timeout(Duration::from_millis(50))
        .session(Session::new(store.clone()).with_listener(silent_listener()))
        .build()
        .unwrap();

    let err = client
        .send(&ApiRequest::get("/profile"))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(store.credentials().await, Some(Credentials::new("A1", "R1")));
}

#[tokio::test]
async fn test_concurrent_rejections_share_one_refresh() {
    let mock_server = MockServer::start().await;

    // Delay the rejections so both requests are in flight with A1
    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(100)))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ok(profile()))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ok(json!({ "access_token": "A2" })), 1).await;

    let client = client(&mock_server, signed_in(), silent_listener());
    let request = ApiRequest::get("/profile");

    let (first, second) = futures::join!(client.send(&request), client.send(&request));
    assert!(first.is_ok());
    assert!(second.is_ok());
}

/// Store holding only a refresh token, as left behind by an expired access slot
async fn refresh_only() -> Arc<MemoryTokenStore> {
    let store = signed_in();
    store.remove(TokenSlot::Access).await.unwrap();
    store
}

#[tokio::test]
async fn test_concurrent_tokenless_rejections_share_one_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ok(profile()))
        .with_priority(1)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(100)))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ok(json!({ "access_token": "A2" })), 1).await;

    let store = refresh_only().await;
    let client = client(&mock_server, store.clone(), silent_listener());
    let request = ApiRequest::get("/profile");

    let (first, second) = futures::join!(client.send(&request), client.send(&request));
    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(store.credentials().await, Some(Credentials::new("A2", "R1")));
}

#[tokio::test]
async fn test_tokenless_rejection_after_teardown_notifies_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(100)))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ResponseTemplate::new(401), 1).await;

    let store = refresh_only().await;
    let client = client(&mock_server, store.clone(), teardown_listener());
    let request = ApiRequest::get("/profile");

    let (first, second) = futures::join!(client.send(&request), client.send(&request));
    let errors = [first.unwrap_err(), second.unwrap_err()];
    assert_eq!(
        errors
            .iter()
            .filter(|err| matches!(err, ClientError::RefreshRejected(_)))
            .count(),
        1
    );
    assert_eq!(
        errors
            .iter()
            .filter(|err| matches!(err, ClientError::SessionEnded))
            .count(),
        1
    );
    assert_eq!(store.credentials().await, None);
}

#[tokio::test]
async fn test_buyer_orders_recover_from_expired_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/order/@me/buyer"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/order/@me/buyer"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ok(json!([order_json()])))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ok(json!({ "access_token": "A2" })), 1).await;

    let store = signed_in();
    let client = client(&mock_server, store.clone(), silent_listener());

    let orders = client.buyer_orders().await.unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_number, "ORD-0001");
    assert_eq!(store.credentials().await, Some(Credentials::new("A2", "R1")));
}

#[tokio::test]
async fn test_concurrent_failed_refresh_notifies_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(100)))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, ResponseTemplate::new(401), 1).await;

    let store = signed_in();
    let client = client(&mock_server, store.clone(), teardown_listener());
    let request = ApiRequest::get("/profile");

    let (first, second) = futures::join!(client.send(&request), client.send(&request));
    let results = [first, second];

    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(ClientError::RefreshRejected(_))))
            .count(),
        1
    );
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(ClientError::SessionEnded)))
            .count(),
        1
    );
    assert_eq!(store.credentials().await, None);
}

#[tokio::test]
async fn test_direct_refresh_failure_leaves_store_untouched() {
    let mock_server = MockServer::start().await;
    mount_refresh(&mock_server, ResponseTemplate::new(401), 1).await;

    let store = signed_in();
    let client = client(&mock_server, store.clone(), silent_listener());

    let result = client.refresh().await;
    assert!(matches!(result, Err(ClientError::RefreshRejected(_))));
    assert_eq!(store.credentials().await, Some(Credentials::new("A1", "R1")));
}

#[tokio::test]
async fn test_direct_refresh_returns_update() {
    let mock_server = MockServer::start().await;
    mount_refresh(&mock_server, ok(json!({ "access_token": "A2" })), 1).await;

    let store = signed_in();
    let client = client(&mock_server, store.clone(), silent_listener());

    let update = client.refresh().await.unwrap();
    assert_eq!(update, CredentialUpdate::AccessOnly("A2".to_string()));
    assert_eq!(store.credentials().await, Some(Credentials::new("A2", "R1")));
}
