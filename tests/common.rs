/// Common test utilities for Elevra integration tests
///
/// Shared setup for the router-level tests: a fresh application backed by
/// its own in-memory database, session token minting, and a request helper
/// that returns the status together with the decoded JSON body.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use elevra::{
    auth::{Claims, UserMetadata},
    create_app,
    db::init_pool,
    integrations::Integrations,
    run_migrations, AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Secret the test application verifies session tokens with
pub const SECRET: &str = "integration-test-secret";

/// Creates a test application with a unique shared in-memory SQLite database
///
/// Each call gets its own database, so tests stay isolated while every
/// pooled connection sees the same schema.
pub fn create_test_app() -> Router {
    create_test_app_with(Integrations::default())
}

/// Same as `create_test_app`, with the given integration clients configured
pub fn create_test_app_with(integrations: Integrations) -> Router {
    let database_url = format!("file:test_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let pool = init_pool(&database_url).expect("Failed to create pool");

    let mut conn = pool.get().expect("Failed to get connection");
    run_migrations(&mut conn).expect("Failed to run migrations");
    drop(conn);

    let state = AppState {
        integrations: Arc::new(integrations),
        ..AppState::with_pool(Arc::new(pool), Some(SECRET))
    };
    create_app(state)
}

fn mint(user_id: &str, metadata: UserMetadata) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: Utc::now().timestamp() + 3600,
        email: Some(format!("{}@example.com", user_id)),
        metadata,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes()))
        .expect("Failed to sign token")
}

/// Session token for an ordinary signed-in user
pub fn user_token(user_id: &str) -> String {
    mint(user_id, UserMetadata::default())
}

/// Session token for an admin
pub fn admin_token(user_id: &str) -> String {
    mint(user_id, UserMetadata { is_admin: true, ..Default::default() })
}

/// Session token for a sub-admin
pub fn sub_admin_token(user_id: &str) -> String {
    mint(user_id, UserMetadata { is_sub_admin: true, ..Default::default() })
}

/// Sends a request through the router
///
/// ### Arguments
///
/// * `app` - The test application
/// * `method` - HTTP method
/// * `uri` - Path and query
/// * `token` - Bearer token, if the call should be authenticated
/// * `body` - JSON body, if any
///
/// ### Returns
///
/// The status code and the decoded body (`Value::Null` for an empty body)
pub async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Creates a candidate as `token`'s user and returns the response body
pub async fn create_candidate(app: &Router, token: &str, body: Value) -> Value {
    let (status, candidate) = send(app, Method::POST, "/candidates", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", candidate);
    candidate
}

/// Creates an election as an admin and returns the response body
pub async fn create_election(app: &Router, body: Value) -> Value {
    let admin = admin_token("admin");
    let (status, election) = send(app, Method::POST, "/elections", Some(&admin), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", election);
    election
}
