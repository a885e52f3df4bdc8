use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A candidate profile shown on the public site
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::candidates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Candidate {
    pub id: i32,
    /// URL-safe unique handle derived from the name
    pub slug: String,
    pub name: String,
    pub party: Option<String>,
    /// The office the candidate is running for
    pub position: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
    /// Identity-provider user who owns this profile, once claimed
    pub clerk_user_id: Option<String>,
    pub verified: bool,
    pub hidden: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Candidate {
    /// Whether the given identity-provider user owns this profile
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.clerk_user_id.as_deref() == Some(user_id)
    }
}

/// Insertable form of a candidate; the slug is resolved by the repository
#[derive(Insertable, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::candidates)]
pub struct NewCandidate {
    pub slug: String,
    pub name: String,
    pub party: Option<String>,
    pub position: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
    pub clerk_user_id: Option<String>,
    pub verified: bool,
    pub hidden: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewCandidate {
    /// Creates a new, unverified and visible candidate with only a name set
    pub fn new(name: String) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            name,
            created_at: now,
            updated_at: now,
            ..Self::default()
        }
    }
}

/// Partial update of a candidate
///
/// Outer `None` leaves a column untouched; `Some(None)` clears a nullable one.
#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::candidates)]
pub struct CandidateChanges {
    pub name: Option<String>,
    pub party: Option<Option<String>>,
    pub position: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub linkedin: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub photo_url: Option<Option<String>>,
    pub verified: Option<bool>,
    pub hidden: Option<bool>,
    pub updated_at: Option<NaiveDateTime>,
}
