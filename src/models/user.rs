use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;

text_enum! {
    /// The role a user picked when signing up
    UserRole {
        Voter => "voter",
        Candidate => "candidate",
        Vendor => "vendor",
    }
}

/// A person known to the identity provider who has used the application
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    /// Identity-provider user id
    pub clerk_user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: UserRole,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub clerk_user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: UserRole,
    pub created_at: NaiveDateTime,
}

impl NewUser {
    pub fn new(clerk_user_id: String, email: Option<String>, name: Option<String>, role: UserRole) -> Self {
        Self {
            clerk_user_id,
            email,
            name,
            role,
            created_at: Utc::now().naive_utc(),
        }
    }
}
