/// Integration tests for profile claims and notifications

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

mod common;
use common::*;

fn claim(candidate: &Value) -> Value {
    json!({
        "candidate_id": candidate["id"],
        "full_name": "Jane Rivera",
        "email": "jane@example.com",
        "position": "Mayor"
    })
}

/// Tests claiming a profile and having staff approve it
#[tokio::test]
async fn test_claim_and_approve() {
    let app = create_test_app();
    let admin = admin_token("admin");
    let candidate = create_candidate(&app, &admin, json!({ "name": "Jane Rivera" })).await;
    let claimant = user_token("user_jane");

    let (status, request) = send(&app, Method::POST, "/validation-requests", Some(&claimant), Some(claim(&candidate))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "PENDING");

    let (status, _) = send(&app, Method::POST, "/validation-requests", Some(&claimant), Some(claim(&candidate))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::GET, "/validation-requests", Some(&claimant), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, queue) = send(&app, Method::GET, "/validation-requests?status=PENDING", Some(&admin), None).await;
    assert_eq!(queue.as_array().unwrap().len(), 1);

    let approve_uri = format!("/validation-requests/{}/approve", request["id"]);
    let (status, approved) = send(&app, Method::POST, &approve_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "APPROVED");

    let (_, profile) = send(&app, Method::GET, &format!("/candidates/{}", candidate["id"]), None, None).await;
    assert_eq!(profile["clerk_user_id"], "user_jane");
    assert_eq!(profile["verified"], true);

    let (_, notifications) = send(&app, Method::GET, "/notifications", Some(&claimant), None).await;
    assert_eq!(notifications.as_array().unwrap().len(), 1);
    assert_eq!(notifications[0]["kind"], "VALIDATION");

    let (status, _) = send(&app, Method::POST, &approve_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::POST, "/validation-requests", Some(&user_token("user_other")), Some(claim(&candidate))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

/// Tests denying a claim leaves the profile unowned
#[tokio::test]
async fn test_claim_denied() {
    let app = create_test_app();
    let admin = admin_token("admin");
    let candidate = create_candidate(&app, &admin, json!({ "name": "Sam Lee" })).await;

    let (_, request) = send(&app, Method::POST, "/validation-requests", Some(&user_token("user_sam")), Some(claim(&candidate))).await;
    let (status, denied) = send(
        &app,
        Method::POST,
        &format!("/validation-requests/{}/deny", request["id"]),
        Some(&sub_admin_token("sub")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(denied["status"], "DENIED");

    let (_, profile) = send(&app, Method::GET, &format!("/candidates/{}", candidate["id"]), None, None).await;
    assert!(profile["clerk_user_id"].is_null());
}

/// Tests claim input validation
#[tokio::test]
async fn test_claim_validation() {
    let app = create_test_app();
    let claimant = user_token("user_x");

    let (status, _) = send(
        &app,
        Method::POST,
        "/validation-requests",
        Some(&claimant),
        Some(json!({ "candidate_id": 9999, "full_name": "X", "email": "x@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let candidate = create_candidate(&app, &admin_token("admin"), json!({ "name": "Someone" })).await;
    let mut body = claim(&candidate);
    body["email"] = json!("not an email");
    let (status, _) = send(&app, Method::POST, "/validation-requests", Some(&claimant), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Tests staff notifications and read tracking
#[tokio::test]
async fn test_notifications_read_tracking() {
    let app = create_test_app();
    let admin = admin_token("admin");
    let reader = user_token("user_reader");

    let body = json!({ "clerk_user_id": "user_reader", "title": "Welcome", "body": "Thanks for joining" });
    let (status, _) = send(&app, Method::POST, "/notifications", Some(&reader), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, first) = send(&app, Method::POST, "/notifications", Some(&admin), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["kind"], "SYSTEM");
    assert_eq!(first["read"], false);
    send(&app, Method::POST, "/notifications", Some(&admin), Some(body)).await;

    let read_uri = format!("/notifications/{}/read", first["id"]);
    let (status, _) = send(&app, Method::POST, &read_uri, Some(&user_token("user_other")), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, read) = send(&app, Method::POST, &read_uri, Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["read"], true);

    let (_, unread) = send(&app, Method::GET, "/notifications?unread=true", Some(&reader), None).await;
    assert_eq!(unread.as_array().unwrap().len(), 1);

    let (_, updated) = send(&app, Method::POST, "/notifications/read-all", Some(&reader), None).await;
    assert_eq!(updated["updated"], 1);

    let (_, unread) = send(&app, Method::GET, "/notifications?unread=true", Some(&reader), None).await;
    assert!(unread.as_array().unwrap().is_empty());
}
