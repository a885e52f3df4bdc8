use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;

text_enum! {
    ValidationStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Denied => "DENIED",
    }
}

/// A user's claim that they are the person behind a candidate profile
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::user_validation_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserValidationRequest {
    pub id: i32,
    pub candidate_id: i32,
    /// The user asking to own the profile
    pub clerk_user_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: ValidationStatus,
    pub created_at: NaiveDateTime,
    pub decided_at: Option<NaiveDateTime>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::user_validation_requests)]
pub struct NewValidationRequest {
    pub candidate_id: i32,
    pub clerk_user_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: ValidationStatus,
    pub created_at: NaiveDateTime,
}

impl NewValidationRequest {
    pub fn new(candidate_id: i32, clerk_user_id: String, full_name: String, email: String) -> Self {
        Self {
            candidate_id,
            clerk_user_id,
            full_name,
            email,
            phone: None,
            position: None,
            city: None,
            state: None,
            status: ValidationStatus::Pending,
            created_at: Utc::now().naive_utc(),
        }
    }
}
