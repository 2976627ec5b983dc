//! End-to-end tests: the real router served on an ephemeral port, driven by
//! the client-side session layer over actual HTTP.

mod common;

use std::time::Duration;

use sqlx::SqlitePool;
use tokio::task::JoinHandle;

use userdesk::client::api::{ClientError, UserApi};
use userdesk::client::auth::AuthState;
use userdesk::client::cache::UserCache;
use userdesk::client::session::{ClientSession, SessionEvent};
use userdesk::client::ClientConfig;
use userdesk::users::dto::{CreateUserRequest, ProfileUpdateRequest};

struct TestServer {
    base_url: String,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn spawn(pool: SqlitePool) -> Self {
        let app = common::build_test_app(pool);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });
        Self {
            base_url: format!("http://{addr}"),
            shutdown_tx,
            handle,
        }
    }

    fn config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            admin_email: "admin@example.com".to_string(),
        }
    }

    /// Stop accepting connections, simulating a network failure.
    async fn shutdown(self) -> ClientConfig {
        let config = self.config();
        // Graceful shutdown closes idle keep-alive connections too; aborting
        // the serve task would leave already-spawned connection tasks alive.
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        config
    }
}

fn new_user(name: &str, email: &str, password: &str) -> CreateUserRequest {
    CreateUserRequest {
        name: name.into(),
        email: email.into(),
        password: password.into(),
        phone: None,
    }
}

#[sqlx::test]
async fn register_login_and_profile_flow(pool: SqlitePool) {
    let server = TestServer::spawn(pool).await;
    let mut session = ClientSession::new(&server.config()).unwrap();

    let created = session
        .register(&new_user("Ann", "ann@x.com", "abc12345"))
        .await
        .unwrap();
    assert_eq!(created.email, "ann@x.com");

    let me = session.login("ann@x.com", "abc12345").await.unwrap();
    assert_eq!(me.id, created.id);
    assert!(session.is_authenticated());
    assert!(!session.is_admin());
    assert!(session.time_remaining().is_some());

    let updated = session
        .update_profile(&ProfileUpdateRequest {
            name: Some("Ann Smith".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.name, "Ann Smith");
    assert_eq!(session.current_user().unwrap().name, "Ann Smith");

    session.logout();
    assert!(!session.is_authenticated());
    assert!(session.current_user().is_none());
}

#[sqlx::test]
async fn bad_credentials_surface_the_localized_error(pool: SqlitePool) {
    let server = TestServer::spawn(pool).await;
    let mut session = ClientSession::new(&server.config()).unwrap();

    session
        .register(&new_user("Ann", "ann@x.com", "abc12345"))
        .await
        .unwrap();

    let err = session.login("ann@x.com", "wrong-pass1").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    assert_eq!(err.to_string(), "Неверный логин или пароль");
    assert!(!session.is_authenticated());
}

#[sqlx::test]
async fn cache_serves_until_mutation_or_force_refresh(pool: SqlitePool) {
    let server = TestServer::spawn(pool).await;
    let mut session = ClientSession::new(&server.config()).unwrap();
    let mut events = session.subscribe();

    session
        .register(&new_user("Ann", "ann@x.com", "abc12345"))
        .await
        .unwrap();
    session.login("ann@x.com", "abc12345").await.unwrap();
    while events.try_recv().is_ok() {}

    let listing = session.users(false).await.unwrap();
    assert_eq!(listing.users.len(), 1);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::UsersChanged);

    // A second account is created behind the session's back.
    let api = UserApi::new(&server.base_url).unwrap();
    api.create_user(&new_user("Bob", "bob@x.com", "def67890"))
        .await
        .unwrap();

    // Within the TTL the stale cache is served as-is.
    let listing = session.users(false).await.unwrap();
    assert_eq!(listing.users.len(), 1);
    assert!(listing.stale_warning.is_none());
    assert!(events.try_recv().is_err());

    // Force refresh bypasses a still-valid cache.
    let listing = session.users(true).await.unwrap();
    assert_eq!(listing.users.len(), 2);

    // A mutation through the session invalidates the cache, so the next
    // plain fetch hits the server.
    session
        .update_profile(&ProfileUpdateRequest {
            name: Some("Ann Smith".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let listing = session.users(false).await.unwrap();
    assert!(listing
        .users
        .iter()
        .any(|u| u.name == "Ann Smith"));
}

#[sqlx::test]
async fn stale_cache_is_served_with_a_warning_on_network_failure(pool: SqlitePool) {
    let server = TestServer::spawn(pool).await;
    // Zero TTL: the cache is stale the moment it is filled, but its data
    // stays around for the tolerance path.
    let mut session = ClientSession::with_parts(
        &server.config(),
        AuthState::new(),
        UserCache::with_ttl(Duration::ZERO),
    )
    .unwrap();

    session
        .register(&new_user("Ann", "ann@x.com", "abc12345"))
        .await
        .unwrap();
    session.login("ann@x.com", "abc12345").await.unwrap();
    session.users(false).await.unwrap();

    let dead_config = server.shutdown().await;

    let listing = session.users(false).await.unwrap();
    assert_eq!(listing.users.len(), 1);
    let warning = listing.stale_warning.expect("stale data must be flagged");
    assert!(warning.starts_with("Using cached data:"), "{warning}");

    // With nothing cached the failure propagates instead.
    let mut empty = ClientSession::new(&dead_config).unwrap();
    assert!(empty.users(false).await.is_err());
}

#[sqlx::test]
async fn server_enforces_admin_rights_independently_of_the_client_gate(pool: SqlitePool) {
    let server = TestServer::spawn(pool).await;

    let mut api = UserApi::new(&server.base_url).unwrap();
    api.create_user(&new_user("Ann", "ann@x.com", "abc12345"))
        .await
        .unwrap();
    let bob = api
        .create_user(&new_user("Bob", "bob@x.com", "def67890"))
        .await
        .unwrap();
    api.login("ann@x.com", "abc12345").await.unwrap();

    // Driving the API client directly bypasses the client-side gate; the
    // server still refuses.
    let err = api
        .admin_change_user_password(bob.id, "reset123")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Forbidden));

    // Deletion stays self-only even for the admin account.
    let mut admin_api = UserApi::new(&server.base_url).unwrap();
    admin_api
        .create_user(&new_user("Admin", "admin@example.com", "root1234"))
        .await
        .unwrap();
    admin_api.login("admin@example.com", "root1234").await.unwrap();
    let err = admin_api.admin_delete_user(bob.id).await.unwrap_err();
    assert!(matches!(err, ClientError::Forbidden));

    // But the admin may reset the password, and the new one works.
    admin_api
        .admin_change_user_password(bob.id, "reset123")
        .await
        .unwrap();
    let mut bob_api = UserApi::new(&server.base_url).unwrap();
    bob_api.login("bob@x.com", "reset123").await.unwrap();
    assert!(bob_api.is_authenticated());
}

#[sqlx::test]
async fn admin_session_flow(pool: SqlitePool) {
    let server = TestServer::spawn(pool).await;
    let mut session = ClientSession::new(&server.config()).unwrap();

    session
        .register(&new_user("Admin", "admin@example.com", "root1234"))
        .await
        .unwrap();
    let bob = session
        .register(&new_user("Bob", "bob@x.com", "def67890"))
        .await
        .unwrap();

    session.login("admin@example.com", "root1234").await.unwrap();
    assert!(session.is_admin());

    session
        .admin_change_user_password(bob.id, "reset123")
        .await
        .unwrap();

    let mut bob_session = ClientSession::new(&server.config()).unwrap();
    bob_session.login("bob@x.com", "reset123").await.unwrap();
    assert!(bob_session.is_authenticated());
}
