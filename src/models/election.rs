use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;
use super::JsonValue;

text_enum! {
    /// The level of government (or institution) an election belongs to
    ElectionType {
        Local => "LOCAL",
        State => "STATE",
        Federal => "FEDERAL",
        University => "UNIVERSITY",
    }
}

/// A race on a ballot
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::elections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Election {
    pub id: i32,
    /// The office being contested
    pub position: String,
    pub election_date: NaiveDate,
    pub city: String,
    pub state: String,
    pub description: String,
    /// Number of seats being filled
    pub seats: i32,
    pub election_type: ElectionType,
    pub hidden: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::elections)]
pub struct NewElection {
    pub position: String,
    pub election_date: NaiveDate,
    pub city: String,
    pub state: String,
    pub description: String,
    pub seats: i32,
    pub election_type: ElectionType,
    pub hidden: bool,
    pub created_at: NaiveDateTime,
}

impl NewElection {
    pub fn new(position: String, election_date: NaiveDate, city: String, state: String) -> Self {
        Self {
            position,
            election_date,
            city,
            state,
            description: String::new(),
            seats: 1,
            election_type: ElectionType::Local,
            hidden: false,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Ties a candidate to an election, with race-specific details
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::election_links)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ElectionLink {
    pub election_id: i32,
    pub candidate_id: i32,
    /// Party label for this race, which may differ from the profile's
    pub party: String,
    /// Policy positions as a JSON list of strings
    pub policies: JsonValue,
    /// Source links as a JSON list of strings
    pub sources: JsonValue,
    pub additional_notes: Option<String>,
    pub voting_link: Option<String>,
    pub created_at: NaiveDateTime,
}

impl ElectionLink {
    pub fn new(election_id: i32, candidate_id: i32) -> Self {
        Self {
            election_id,
            candidate_id,
            party: String::new(),
            policies: JsonValue::empty_list(),
            sources: JsonValue::empty_list(),
            additional_notes: None,
            voting_link: None,
            created_at: Utc::now().naive_utc(),
        }
    }
}
