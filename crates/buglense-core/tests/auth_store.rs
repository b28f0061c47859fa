mod support;

use buglense_core::api::Method;
use buglense_core::model::{LoginCredentials, RegisterData, UserPatch};
use buglense_core::store::{AuthStore, PersistedAuth};
use serde_json::json;
use std::sync::Arc;
use support::{FakeServer, client, message, user};

fn credentials() -> LoginCredentials {
    LoginCredentials {
        email: "u1@example.com".to_string(),
        password: "hunter2".to_string(),
        remember: None,
    }
}

fn signed_in(server: &Arc<FakeServer>) -> AuthStore {
    server.route(
        Method::Post,
        "/auth/login",
        200,
        &json!({ "user": user("U1"), "token": "tok-1" }),
    );
    let mut store = AuthStore::new(client(server));
    store.login(&credentials()).unwrap();
    store
}

#[test]
fn login_sets_session_and_bearer() {
    let server = FakeServer::new();
    let mut store = signed_in(&server);
    assert!(store.is_authenticated());
    assert_eq!(store.token(), Some("tok-1"));
    assert_eq!(store.user().map(|u| u.id.as_str()), Some("U1"));
    assert_eq!(
        server.last_json(),
        json!({ "email": "u1@example.com", "password": "hunter2" })
    );

    server.route(Method::Get, "/auth/me", 200, &json!({ "user": user("U1") }));
    store.refresh_user();
    let me = server.requests().pop().unwrap();
    assert_eq!(me.header("authorization"), Some("Bearer tok-1"));
}

#[test]
fn failed_login_keeps_prior_session() {
    let server = FakeServer::new();
    let mut store = signed_in(&server);
    let before = store.session().clone();

    server.route(
        Method::Post,
        "/auth/login",
        401,
        &json!({ "message": "Invalid credentials" }),
    );
    let err = store.login(&credentials()).unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(store.session(), &before);
    assert_eq!(store.error(), Some("Invalid credentials"));
    assert!(!store.is_loading());
}

#[test]
fn failed_login_from_signed_out_stays_signed_out() {
    let server = FakeServer::new();
    server.unreachable(Method::Post, "/auth/login");
    let mut store = AuthStore::new(client(&server));
    assert!(store.login(&credentials()).is_err());
    assert!(!store.is_authenticated());
    assert!(store.user().is_none());
    assert!(store.token().is_none());
}

#[test]
fn blank_credentials_never_reach_the_network() {
    let server = FakeServer::new();
    let mut store = AuthStore::new(client(&server));
    let err = store
        .login(&LoginCredentials {
            email: "  ".to_string(),
            ..credentials()
        })
        .unwrap_err();
    assert_eq!(err.to_string(), "Email is required");
    assert_eq!(store.error(), Some("Email is required"));
    assert!(server.requests().is_empty());
}

#[test]
fn register_checks_confirmation_then_signs_in() {
    let server = FakeServer::new();
    let mut store = AuthStore::new(client(&server));
    let mut data = RegisterData {
        name: "New".to_string(),
        email: "new@example.com".to_string(),
        password: "pw".to_string(),
        password_confirmation: "other".to_string(),
    };
    assert!(store.register(&data).is_err());
    assert!(server.requests().is_empty());

    server.route(
        Method::Post,
        "/auth/register",
        201,
        &json!({ "user": user("U9"), "token": "tok-9" }),
    );
    data.password_confirmation = "pw".to_string();
    store.register(&data).unwrap();
    assert_eq!(store.token(), Some("tok-9"));
    assert_eq!(server.last_json()["passwordConfirmation"], "pw");
}

#[test]
fn logout_clears_even_when_server_fails() {
    let server = FakeServer::new();
    let mut store = signed_in(&server);
    server.route(Method::Post, "/auth/logout", 500, &message("boom"));

    store.logout();

    assert!(!store.is_authenticated());
    assert!(store.user().is_none());
    assert!(store.token().is_none());
    assert!(store.error().is_none());
    assert_eq!(server.count(Method::Post, "/auth/logout"), 1);
}

#[test]
fn logout_when_unreachable_still_clears() {
    let server = FakeServer::new();
    let mut store = signed_in(&server);
    server.unreachable(Method::Post, "/auth/logout");
    store.logout();
    assert!(!store.is_authenticated());
}

#[test]
fn logout_without_token_skips_the_server() {
    let server = FakeServer::new();
    let mut store = AuthStore::new(client(&server));
    store.logout();
    assert!(server.requests().is_empty());
}

#[test]
fn refresh_without_token_is_a_no_op() {
    let server = FakeServer::new();
    let mut store = AuthStore::new(client(&server));
    store.refresh_user();
    assert!(server.requests().is_empty());
    assert!(store.error().is_none());
}

#[test]
fn refresh_401_signs_out() {
    let server = FakeServer::new();
    let mut store = signed_in(&server);
    server.route(Method::Get, "/auth/me", 401, &message("Token expired"));
    server.route(Method::Post, "/auth/logout", 204, &json!(null));

    store.refresh_user();

    assert!(!store.is_authenticated());
    assert!(store.token().is_none());
}

#[test]
fn refresh_500_keeps_session_and_records_error() {
    let server = FakeServer::new();
    let mut store = signed_in(&server);
    server.route(Method::Get, "/auth/me", 500, &json!({}));

    store.refresh_user();

    assert!(store.is_authenticated());
    assert_eq!(store.error(), Some("Error: 500 Internal Server Error"));
}

#[test]
fn logout_clears_a_recorded_error() {
    let server = FakeServer::new();
    let mut store = signed_in(&server);
    server.route(Method::Get, "/auth/me", 500, &json!({}));
    server.route(Method::Post, "/auth/logout", 200, &json!({}));
    store.refresh_user();
    assert!(store.error().is_some());

    store.logout();

    assert!(store.error().is_none());
    assert!(!store.is_loading());
}

#[test]
fn refresh_replaces_user() {
    let server = FakeServer::new();
    let mut store = signed_in(&server);
    let mut renamed = user("U1");
    renamed["name"] = json!("Renamed");
    server.route(Method::Get, "/auth/me", 200, &json!({ "user": renamed }));
    store.refresh_user();
    assert_eq!(store.user().map(|u| u.name.as_str()), Some("Renamed"));
}

#[test]
fn update_profile_replaces_user() {
    let server = FakeServer::new();
    let mut store = signed_in(&server);
    let mut updated = user("U1");
    updated["avatar"] = json!("https://cdn.test/a.png");
    let body = json!({ "user": updated });
    server.route(Method::Put, "/auth/profile", 200, &body);

    let patch = UserPatch {
        avatar: Some("https://cdn.test/a.png".to_string()),
        ..UserPatch::default()
    };
    let user = store.update_profile(&patch).unwrap();
    assert_eq!(user.avatar.as_deref(), Some("https://cdn.test/a.png"));
    assert_eq!(store.user(), Some(&user));
    assert_eq!(
        server.last_json(),
        json!({ "avatar": "https://cdn.test/a.png" })
    );
}

#[test]
fn persisted_slice_round_trips_through_rehydrate() {
    let server = FakeServer::new();
    let store = signed_in(&server);
    let saved = store.persisted();
    assert!(saved.is_authenticated);

    let fresh_server = FakeServer::new();
    let api = client(&fresh_server);
    let mut restored = AuthStore::new(Arc::clone(&api));
    restored.rehydrate(saved);

    assert!(restored.is_authenticated());
    assert_eq!(api.token().as_deref(), Some("tok-1"));
}

#[test]
fn rehydrate_ignores_stored_flag() {
    let server = FakeServer::new();
    let mut store = AuthStore::new(client(&server));
    store.rehydrate(PersistedAuth {
        user: None,
        token: None,
        is_authenticated: true,
    });
    assert!(!store.is_authenticated());
}
