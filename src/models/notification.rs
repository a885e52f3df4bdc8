use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;

text_enum! {
    NotificationKind {
        Donation => "DONATION",
        Endorsement => "ENDORSEMENT",
        Validation => "VALIDATION",
        System => "SYSTEM",
    }
}

/// An in-app message for a single user
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Notification {
    pub id: i32,
    /// Recipient
    pub clerk_user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::notifications)]
pub struct NewNotification {
    pub clerk_user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

impl NewNotification {
    pub fn new(clerk_user_id: String, kind: NotificationKind, title: String, body: String, link: Option<String>) -> Self {
        Self {
            clerk_user_id,
            kind,
            title,
            body,
            link,
            read: false,
            created_at: Utc::now().naive_utc(),
        }
    }
}
