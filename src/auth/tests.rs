use super::testing::*;
use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tower::ServiceExt;

fn candidate_owned_by(owner: Option<&str>) -> Candidate {
    let now = Utc::now().naive_utc();
    Candidate {
        id: 1,
        slug: "jane-doe".to_string(),
        name: "Jane Doe".to_string(),
        party: None,
        position: None,
        city: None,
        state: None,
        bio: None,
        website: None,
        linkedin: None,
        email: None,
        phone: None,
        photo_url: None,
        clerk_user_id: owner.map(str::to_string),
        verified: false,
        hidden: false,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_verify_valid_token() {
    let settings = AuthSettings::new(Some(TEST_SECRET));
    let claims = settings.verify(&token("user_1", false, true, Some("candidate"))).unwrap();
    assert_eq!(claims.sub, "user_1");
    assert!(claims.metadata.is_sub_admin);
    assert_eq!(claims.metadata.role.as_deref(), Some("candidate"));
}

#[test]
fn test_verify_rejects_wrong_secret_and_missing_secret() {
    let token = user_token("user_1");

    let wrong = AuthSettings::new(Some("another-secret"));
    assert!(matches!(wrong.verify(&token), Err(ApiError::Unauthorized(_))));

    let unconfigured = AuthSettings::new(None);
    assert!(matches!(unconfigured.verify(&token), Err(ApiError::Unauthorized(_))));

    let empty = AuthSettings::new(Some(""));
    assert!(matches!(empty.verify(&token), Err(ApiError::Unauthorized(_))));
}

#[test]
fn test_verify_rejects_expired_token() {
    let claims = json!({
        "sub": "user_1",
        "exp": Utc::now().timestamp() - 3600,
    });
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes())).unwrap();
    let settings = AuthSettings::new(Some(TEST_SECRET));
    assert!(settings.verify(&token).is_err());
}

#[test]
fn test_public_metadata_alias() {
    let claims = json!({
        "sub": "user_9",
        "exp": Utc::now().timestamp() + 60,
        "public_metadata": { "isAdmin": true, "role": "vendor" }
    });
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes())).unwrap();
    let identity: Identity = AuthSettings::new(Some(TEST_SECRET)).verify(&token).unwrap().into();
    assert!(identity.is_admin);
    assert!(!identity.is_sub_admin);
    assert_eq!(identity.role.as_deref(), Some("vendor"));
    assert_eq!(identity.email, None);
}

#[test]
fn test_identity_permissions() {
    let owner = Identity::from(AuthSettings::new(Some(TEST_SECRET)).verify(&user_token("owner")).unwrap());
    let stranger = Identity { user_id: "stranger".to_string(), ..owner.clone() };
    let sub_admin = Identity { is_sub_admin: true, ..stranger.clone() };
    let admin = Identity { is_admin: true, ..stranger.clone() };
    let candidate = candidate_owned_by(Some("owner"));

    assert!(owner.can_manage(&candidate));
    assert!(!stranger.can_manage(&candidate));
    assert!(sub_admin.can_manage(&candidate));
    assert!(matches!(stranger.require_manager(&candidate), Err(ApiError::Forbidden)));

    assert!(sub_admin.require_staff().is_ok());
    assert!(sub_admin.require_admin().is_err());
    assert!(admin.require_admin().is_ok());

    let unclaimed = candidate_owned_by(None);
    assert!(!owner.owns(&unclaimed));
}

async fn whoami(identity: Identity) -> String {
    identity.user_id
}

async fn maybe_whoami(MaybeIdentity(identity): MaybeIdentity) -> String {
    identity.map(|i| i.user_id).unwrap_or_else(|| "anonymous".to_string())
}

fn app() -> Router {
    Router::new()
        .route("/whoami", get(whoami))
        .route("/maybe", get(maybe_whoami))
        .with_state(AuthSettings::new(Some(TEST_SECRET)))
}

async fn status_for(uri: &str, authorization: Option<&str>) -> StatusCode {
    let mut request = Request::builder().uri(uri);
    if let Some(value) = authorization {
        request = request.header("Authorization", value);
    }
    app()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_identity_extractor() {
    let bearer = format!("Bearer {}", user_token("user_1"));
    assert_eq!(status_for("/whoami", Some(&bearer)).await, StatusCode::OK);
    assert_eq!(status_for("/whoami", None).await, StatusCode::UNAUTHORIZED);
    assert_eq!(status_for("/whoami", Some("Bearer not-a-token")).await, StatusCode::UNAUTHORIZED);
    assert_eq!(status_for("/whoami", Some("Basic dXNlcjpwYXNz")).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_maybe_identity_extractor() {
    let bearer = format!("Bearer {}", user_token("user_1"));
    assert_eq!(status_for("/maybe", Some(&bearer)).await, StatusCode::OK);
    assert_eq!(status_for("/maybe", None).await, StatusCode::OK);
    assert_eq!(status_for("/maybe", Some("Bearer garbage")).await, StatusCode::UNAUTHORIZED);
}
