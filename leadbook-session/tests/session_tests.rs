use leadbook_api::{ApiError, Gateway, GatewayConfig, RequestConfig};
use leadbook_session::{
    FileStorage, MemoryStorage, SessionEvent, SessionStatus, SessionStorage, SessionStore,
};
use leadbook_types::{LoginRequest, RegisterRequest, UserPatch};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn alice() -> Value {
    json!({"_id": "u1", "name": "Alice", "email": "alice@example.com"})
}

fn gateway(server: &MockServer) -> Arc<Gateway> {
    Arc::new(Gateway::new(GatewayConfig::default().with_base_url(server.uri())).unwrap())
}

fn offline_gateway() -> Arc<Gateway> {
    Arc::new(Gateway::new(GatewayConfig::default().with_base_url("http://127.0.0.1:1/api")).unwrap())
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"login": "alice@example.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "t1",
            "user": alice()
        })))
        .mount(server)
        .await;
}

fn persisted(storage: &MemoryStorage) -> (Option<String>, Option<String>) {
    (storage.get("token").unwrap(), storage.get("user").unwrap())
}

// ── Bootstrap ───────────────────────────────────────────────────

#[test]
fn starts_loading_until_bootstrap() {
    let store = SessionStore::new(offline_gateway(), Arc::new(MemoryStorage::new()));
    let session = store.snapshot();
    assert_eq!(session.status, SessionStatus::Loading);
    assert!(session.is_loading);
    assert!(!session.is_authenticated);
}

#[test]
fn bootstrap_without_persisted_state() {
    let store = SessionStore::new(offline_gateway(), Arc::new(MemoryStorage::new()));
    let session = store.bootstrap();
    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert!(!session.is_loading);
    assert!(session.user.is_none());
}

#[test]
fn bootstrap_restores_valid_session() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set("token", "t1").unwrap();
    storage.set("user", &alice().to_string()).unwrap();

    let store = SessionStore::new(offline_gateway(), storage);
    let session = store.bootstrap();

    assert_eq!(session.status, SessionStatus::Authenticated);
    assert!(session.is_authenticated);
    assert!(!session.is_loading);
    assert_eq!(session.token.as_deref(), Some("t1"));
    assert_eq!(session.user.unwrap().name, "Alice");
}

#[test]
fn bootstrap_clears_unreadable_user() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set("token", "t1").unwrap();
    storage.set("user", "{broken").unwrap();

    let store = SessionStore::new(offline_gateway(), storage.clone());
    let session = store.bootstrap();

    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert_eq!(persisted(&storage), (None, None));
}

#[test]
fn bootstrap_clears_half_persisted_state() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set("token", "t1").unwrap();

    let store = SessionStore::new(offline_gateway(), storage.clone());
    assert!(!store.bootstrap().is_authenticated);
    assert_eq!(persisted(&storage), (None, None));
}

#[test]
fn bootstrap_clears_a_corrupt_session_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("session.json");
    std::fs::write(&file, "{not json").unwrap();
    let storage = Arc::new(FileStorage::new(&file));
    let store = SessionStore::new(offline_gateway(), storage.clone());

    let session = store.bootstrap();

    assert_eq!(session.status, SessionStatus::Unauthenticated);
    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(on_disk, json!({}));
    assert_eq!(storage.get("token").unwrap(), None);
}

#[test]
fn bootstrap_runs_once() {
    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(offline_gateway(), storage.clone());
    assert!(!store.bootstrap().is_authenticated);

    storage.set("token", "t1").unwrap();
    storage.set("user", &alice().to_string()).unwrap();
    assert!(!store.bootstrap().is_authenticated);
}

// ── Login / register / logout ───────────────────────────────────

#[tokio::test]
async fn login_persists_and_authenticates() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(gateway(&server), storage.clone());
    store.bootstrap();
    let mut events = store.events();

    let auth = store
        .login(&LoginRequest::new("alice@example.com", "secret"))
        .await
        .unwrap();
    assert_eq!(auth.token, "t1");

    let session = store.snapshot();
    assert!(session.is_authenticated);
    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(session.user.as_ref().unwrap().email, "alice@example.com");

    let (token, user) = persisted(&storage);
    assert_eq!(token.as_deref(), Some("t1"));
    assert!(user.unwrap().contains("alice@example.com"));

    assert!(matches!(events.recv().await.unwrap(), SessionEvent::LoggedIn(u) if u.name == "Alice"));
}

#[tokio::test]
async fn failed_login_changes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Credenciais inválidas"})),
        )
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(gateway(&server), storage.clone());
    store.bootstrap();

    let err = store
        .login(&LoginRequest::new("alice@example.com", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.api_error().and_then(|e| e.status()), Some(400));
    assert_eq!(store.snapshot().status, SessionStatus::Unauthenticated);
    assert_eq!(persisted(&storage), (None, None));
}

#[tokio::test]
async fn register_signs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "t9",
            "user": alice(),
            "message": "Conta criada"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = SessionStore::new(gateway(&server), Arc::new(MemoryStorage::new()));
    store.bootstrap();
    let auth = store
        .register(&RegisterRequest {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "secret".into(),
            first_name: "Alice".into(),
            last_name: "Doe".into(),
        })
        .await
        .unwrap();

    assert_eq!(auth.message.as_deref(), Some("Conta criada"));
    assert_eq!(store.token().as_deref(), Some("t9"));
}

#[tokio::test]
async fn logout_clears_everything() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(gateway(&server), storage.clone());
    store.bootstrap();
    store
        .login(&LoginRequest::new("alice@example.com", "secret"))
        .await
        .unwrap();
    let mut events = store.events();

    store.logout();

    assert!(!store.is_authenticated());
    assert!(store.user().is_none());
    assert_eq!(persisted(&storage), (None, None));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedOut);

    store.logout();
    assert!(!store.is_authenticated());
}

// ── Gateway integration ─────────────────────────────────────────

#[tokio::test]
async fn requests_carry_session_token() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let store = SessionStore::new(gateway.clone(), Arc::new(MemoryStorage::new()));
    store.bootstrap();
    store
        .login(&LoginRequest::new("alice@example.com", "secret"))
        .await
        .unwrap();

    let profile: Value = gateway
        .get("auth/profile", RequestConfig::default())
        .await
        .unwrap();
    assert_eq!(profile["name"], json!("Alice"));
}

#[tokio::test]
async fn unauthorized_response_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/leads"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    storage.set("token", "old").unwrap();
    storage.set("user", &alice().to_string()).unwrap();

    let gateway = gateway(&server);
    let store = SessionStore::new(gateway.clone(), storage.clone());
    assert!(store.bootstrap().is_authenticated);
    let mut events = store.events();
    let mut snapshots = store.subscribe();

    let err = gateway
        .get::<Value>("leads", RequestConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(store.snapshot().status, SessionStatus::Unauthenticated);
    assert_eq!(persisted(&storage), (None, None));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Expired);
    assert!(snapshots.has_changed().unwrap());
    assert!(!snapshots.borrow_and_update().is_authenticated);
}

// ── update_user ─────────────────────────────────────────────────

#[test]
fn update_user_without_session_is_noop() {
    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(offline_gateway(), storage.clone());
    store.bootstrap();

    assert_eq!(store.update_user(UserPatch::name("X")).unwrap(), None);
    assert_eq!(persisted(&storage), (None, None));
}

#[test]
fn update_user_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let storage = FileStorage::new(&path);
    storage.set("token", "t1").unwrap();
    storage.set("user", &alice().to_string()).unwrap();

    let store = SessionStore::new(offline_gateway(), Arc::new(storage));
    store.bootstrap();
    let mut events = store.events();
    let updated = store.update_user(UserPatch::name("X")).unwrap().unwrap();
    assert_eq!(updated.name, "X");
    assert_eq!(updated.email, "alice@example.com");
    assert!(matches!(events.try_recv().unwrap(), SessionEvent::UserUpdated(u) if u.name == "X"));
    drop(store);

    let reloaded = SessionStore::new(offline_gateway(), Arc::new(FileStorage::new(&path)));
    let session = reloaded.bootstrap();
    assert_eq!(session.user.unwrap().name, "X");
    assert_eq!(session.token.as_deref(), Some("t1"));
}

#[test]
fn restart_keeps_user_fields_the_client_does_not_model() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let storage = FileStorage::new(&path);
    let mut user = alice();
    user["role"] = json!("admin");
    storage.set("token", "t1").unwrap();
    storage.set("user", &user.to_string()).unwrap();

    let store = SessionStore::new(offline_gateway(), Arc::new(storage));
    store.bootstrap();
    store.update_user(UserPatch::name("X")).unwrap();
    drop(store);

    let persisted: Value =
        serde_json::from_str(&FileStorage::new(&path).get("user").unwrap().unwrap()).unwrap();
    assert_eq!(persisted["role"], json!("admin"));
    assert_eq!(persisted["name"], json!("X"));
}

#[test]
fn invalidate_publishes_expired() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set("token", "t1").unwrap();
    storage.set("user", &alice().to_string()).unwrap();
    let store = SessionStore::new(offline_gateway(), storage.clone());
    store.bootstrap();
    let mut events = store.events();

    store.invalidate();

    assert!(!store.is_authenticated());
    assert_eq!(persisted(&storage), (None, None));
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
}
