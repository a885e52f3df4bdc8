use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A single visit to a candidate's public profile
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::candidate_views)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CandidateView {
    pub id: i32,
    pub candidate_id: i32,
    pub viewed_at: NaiveDateTime,
    pub referrer: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::candidate_views)]
pub struct NewCandidateView {
    pub candidate_id: i32,
    pub viewed_at: NaiveDateTime,
    pub referrer: Option<String>,
}
