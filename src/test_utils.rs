use crate::db::{self, DbPool};
use crate::models::{
    Candidate, Election, JsonValue, NewCandidate, NewElection, UserRole,
};
use crate::repo;
use crate::*;
use chrono::NaiveDate;
use diesel::sql_types::Text;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use proptest::prelude::*;
use std::sync::Arc;

/// Sets up a test database with migrations applied
///
/// Each call gets its own shared in-memory database, so every connection in
/// the pool sees the same schema while tests stay isolated from each other.
///
/// ### Returns
///
/// An Arc-wrapped database connection pool connected to the in-memory database
pub fn setup_test_db() -> Arc<DbPool> {
    let unique_id = uuid::Uuid::new_v4();
    let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
    let pool = db::init_pool(&database_url).expect("Failed to create pool");

    let mut conn = pool.get().expect("Failed to get connection");
    run_migrations(&mut conn).expect("Failed to run migrations");
    drop(conn);

    Arc::new(pool)
}

/// Inserts a visible, unclaimed candidate through the repository
pub fn insert_candidate(pool: &DbPool, name: &str) -> Candidate {
    repo::create_candidate(pool, NewCandidate::new(name.to_string())).expect("Failed to create candidate")
}

/// Inserts a candidate owned by `owner`
pub fn insert_owned_candidate(pool: &DbPool, name: &str, owner: &str) -> Candidate {
    let mut new_candidate = NewCandidate::new(name.to_string());
    new_candidate.clerk_user_id = Some(owner.to_string());
    repo::create_candidate(pool, new_candidate).expect("Failed to create candidate")
}

/// Inserts an election in Austin, TX on the given date
pub fn insert_election(pool: &DbPool, position: &str, date: NaiveDate) -> Election {
    repo::create_election(
        pool,
        NewElection::new(position.to_string(), date, "Austin".to_string(), "TX".to_string()),
    )
    .expect("Failed to create election")
}

/// Records a user so that email lookups find an address
pub fn insert_user(pool: &DbPool, clerk_user_id: &str, email: &str) {
    repo::upsert_user(
        pool,
        clerk_user_id,
        Some(email.to_string()),
        None,
        UserRole::Voter,
    )
    .expect("Failed to create user");
}

pub fn string_list(values: &[&str]) -> JsonValue {
    JsonValue::string_list(values.iter().copied())
}

/// Generates display names with spaces, punctuation and non-ASCII letters
pub fn arb_messy_string() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z]{1,12}( [A-Za-z]{1,12}){0,3}",
        "[A-Za-z0-9 .,'&-]{1,30}",
        "\\PC{1,20}",
    ]
}

#[derive(QueryableByName, Debug)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

#[test]
fn test_setup_test_db() {
    let pool = setup_test_db();
    let mut conn = pool.get().unwrap();

    let table_names: Vec<TableName> = diesel::sql_query("SELECT name FROM sqlite_master WHERE type='table'")
        .load(&mut conn)
        .expect("Failed to load table names");
    let names: Vec<&str> = table_names.iter().map(|t| t.name.as_str()).collect();

    for expected in [
        "users",
        "candidates",
        "vendors",
        "elections",
        "election_links",
        "donations",
        "content_blocks",
        "endorsements",
        "candidate_views",
        "user_validation_requests",
        "notifications",
        "batch_jobs",
    ] {
        assert!(names.contains(&expected), "missing table {}", expected);
    }
}

#[test]
fn test_test_databases_are_isolated() {
    let first = setup_test_db();
    let second = setup_test_db();
    insert_candidate(&first, "Only In First");
    assert_eq!(repo::count_candidates(&first).unwrap(), 1);
    assert_eq!(repo::count_candidates(&second).unwrap(), 0);
}
