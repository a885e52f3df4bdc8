use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;

text_enum! {
    /// Moderation state of a vendor listing
    VendorStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
}

text_enum! {
    /// Marketplace subscription tier
    Subscription {
        Free => "FREE",
        Standard => "STANDARD",
        Premium => "PREMIUM",
    }
}

/// A campaign-services business listed in the marketplace
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::vendors)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Vendor {
    pub id: i32,
    pub clerk_user_id: String,
    pub slug: String,
    pub name: String,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Service category, e.g. "Printing" or "Photography"
    pub category: Option<String>,
    pub subscription: Subscription,
    pub status: VendorStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::vendors)]
pub struct NewVendor {
    pub clerk_user_id: String,
    pub slug: String,
    pub name: String,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub category: Option<String>,
    pub subscription: Subscription,
    pub status: VendorStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewVendor {
    /// A pending, free-tier listing owned by the given user
    pub fn new(clerk_user_id: String, name: String) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            clerk_user_id,
            slug: String::new(),
            name,
            bio: None,
            email: None,
            phone: None,
            website: None,
            city: None,
            state: None,
            category: None,
            subscription: Subscription::Free,
            status: VendorStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a vendor listing
#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::vendors)]
pub struct VendorChanges {
    pub name: Option<String>,
    pub bio: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub subscription: Option<Subscription>,
    pub status: Option<VendorStatus>,
    pub updated_at: Option<NaiveDateTime>,
}
