/// Integration tests for elections and ballots

use axum::http::{Method, StatusCode};
use chrono::{Days, Utc};
use serde_json::json;

mod common;
use common::*;

fn days_from_today(days: i64) -> String {
    let today = Utc::now().date_naive();
    let date = if days >= 0 {
        today.checked_add_days(Days::new(days as u64))
    } else {
        today.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    date.unwrap().format("%Y-%m-%d").to_string()
}

/// Tests creating an election and reading it back
#[tokio::test]
async fn test_create_and_get_election() {
    let app = create_test_app();
    let election = create_election(
        &app,
        json!({
            "position": "City Council District 3",
            "election_date": "2030-11-05",
            "city": "Austin",
            "state": "tx",
            "seats": 2,
            "election_type": "local"
        }),
    )
    .await;

    assert_eq!(election["state"], "TX");
    assert_eq!(election["election_type"], "LOCAL");
    assert_eq!(election["seats"], 2);
    assert_eq!(election["election_date"], "2030-11-05");

    let (status, fetched) = send(&app, Method::GET, &format!("/elections/{}", election["id"]), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["position"], "City Council District 3");
}

/// Tests that only staff may create elections and that input is checked
#[tokio::test]
async fn test_create_election_validation() {
    let app = create_test_app();
    let body = json!({
        "position": "Mayor",
        "election_date": "2030-11-05",
        "city": "Austin",
        "state": "TX"
    });

    let (status, _) = send(&app, Method::POST, "/elections", Some(&user_token("user_x")), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let staff = sub_admin_token("sub");
    let (status, _) = send(&app, Method::POST, "/elections", Some(&staff), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let bad_bodies = [
        json!({ "position": "Mayor", "election_date": "11/05/2030", "city": "Austin", "state": "TX" }),
        json!({ "position": "Mayor", "election_date": "2030-11-05", "city": "Austin", "state": "ZZ" }),
        json!({ "position": "Mayor", "election_date": "2030-11-05", "city": "Austin", "state": "TX", "seats": 0 }),
        json!({ "position": "Mayor", "election_date": "2030-11-05", "city": "Austin", "state": "TX", "election_type": "galactic" }),
        json!({ "election_date": "2030-11-05", "city": "Austin", "state": "TX" }),
    ];
    for body in bad_bodies {
        let (status, _) = send(&app, Method::POST, "/elections", Some(&staff), Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {}", body);
    }
}

/// Tests the upcoming filter, ordering and hidden elections
#[tokio::test]
async fn test_list_elections() {
    let app = create_test_app();
    let past = create_election(
        &app,
        json!({ "position": "Past Race", "election_date": days_from_today(-10), "city": "Austin", "state": "TX" }),
    )
    .await;
    create_election(
        &app,
        json!({ "position": "Later Race", "election_date": days_from_today(60), "city": "Austin", "state": "TX" }),
    )
    .await;
    create_election(
        &app,
        json!({ "position": "Soon Race", "election_date": days_from_today(5), "city": "Dallas", "state": "TX" }),
    )
    .await;
    create_election(
        &app,
        json!({ "position": "Secret Race", "election_date": days_from_today(6), "city": "Austin", "state": "TX", "hidden": true }),
    )
    .await;

    let (status, all) = send(&app, Method::GET, "/elections", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let positions: Vec<&str> = all.as_array().unwrap().iter().map(|e| e["position"].as_str().unwrap()).collect();
    assert_eq!(positions, vec!["Past Race", "Soon Race", "Later Race"]);

    let (_, upcoming) = send(&app, Method::GET, "/elections?upcoming=true", None, None).await;
    assert_eq!(upcoming.as_array().unwrap().len(), 2);

    let (_, dallas) = send(&app, Method::GET, "/elections?city=Dallas", None, None).await;
    assert_eq!(dallas.as_array().unwrap().len(), 1);

    let (_, for_staff) = send(&app, Method::GET, "/elections", Some(&admin_token("admin")), None).await;
    assert_eq!(for_staff.as_array().unwrap().len(), 4);

    let (status, _) = send(&app, Method::GET, &format!("/elections/{}", past["id"]), None, None).await;
    assert_eq!(status, StatusCode::OK);
}

/// Tests linking candidates to a ballot and removing them
#[tokio::test]
async fn test_ballot_links() {
    let app = create_test_app();
    let admin = admin_token("admin");
    let election = create_election(
        &app,
        json!({ "position": "Mayor", "election_date": "2030-11-05", "city": "Austin", "state": "TX" }),
    )
    .await;
    let candidate = create_candidate(&app, &admin, json!({ "name": "Jane Rivera", "party": "Independent" })).await;
    let link_uri = format!("/elections/{}/candidates/{}", election["id"], candidate["id"]);

    let (status, _) = send(&app, Method::POST, &link_uri, Some(&user_token("user_x")), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, link) = send(
        &app,
        Method::POST,
        &link_uri,
        Some(&admin),
        Some(json!({ "policies": ["Housing", " ", "Transit"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(link["party"], "Independent");
    assert_eq!(link["policies"], json!(["Housing", "Transit"]));

    let (status, _) = send(&app, Method::POST, &link_uri, Some(&admin), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let ballot_uri = format!("/elections/{}/candidates", election["id"]);
    let (status, ballot) = send(&app, Method::GET, &ballot_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ballot.as_array().unwrap().len(), 1);
    assert_eq!(ballot[0]["candidate"]["name"], "Jane Rivera");

    let (status, _) = send(&app, Method::DELETE, &link_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &link_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = format!("/elections/{}/candidates/9999", election["id"]);
    let (status, _) = send(&app, Method::POST, &missing, Some(&admin), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
