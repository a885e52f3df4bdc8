use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A statement of support for a candidate written by another user
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::endorsements)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Endorsement {
    pub id: i32,
    pub candidate_id: i32,
    pub endorser_clerk_user_id: String,
    pub endorser_name: String,
    /// How the endorser knows the candidate
    pub relationship: Option<String>,
    pub content: String,
    pub is_public: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::endorsements)]
pub struct NewEndorsement {
    pub candidate_id: i32,
    pub endorser_clerk_user_id: String,
    pub endorser_name: String,
    pub relationship: Option<String>,
    pub content: String,
    pub is_public: bool,
    pub created_at: NaiveDateTime,
}

impl NewEndorsement {
    pub fn new(candidate_id: i32, endorser_clerk_user_id: String, endorser_name: String, content: String) -> Self {
        Self {
            candidate_id,
            endorser_clerk_user_id,
            endorser_name,
            relationship: None,
            content,
            is_public: true,
            created_at: Utc::now().naive_utc(),
        }
    }
}
