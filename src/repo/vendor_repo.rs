use crate::db::DbPool;
use crate::models::{NewVendor, Vendor, VendorChanges, VendorStatus};
use crate::schema::vendors;
use crate::repo::{contains_pattern, escape_like};
use crate::services::slug::unique_slug;
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Filters for listing vendors
#[derive(Debug, Clone, Default)]
pub struct VendorFilter {
    /// Substring matched against name, category and bio
    pub search: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub category: Option<String>,
    /// Restrict to one moderation status; `None` lists every listing
    pub status: Option<VendorStatus>,
    pub limit: i64,
    pub offset: i64,
}

/// Lists vendors matching a filter, ordered by name
#[instrument(skip(pool))]
pub fn list_vendors(pool: &DbPool, filter: &VendorFilter) -> Result<Vec<Vendor>> {
    let conn = &mut pool.get()?;

    let mut query = vendors::table.into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(vendors::status.eq(status));
    }
    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        query = query.filter(
            vendors::name
                .like(pattern.clone())
                .escape('\\')
                .or(vendors::category.like(pattern.clone()).escape('\\'))
                .or(vendors::bio.like(pattern).escape('\\')),
        );
    }
    if let Some(city) = &filter.city {
        query = query.filter(vendors::city.like(escape_like(city.trim())).escape('\\'));
    }
    if let Some(state) = &filter.state {
        query = query.filter(vendors::state.eq(state.trim().to_ascii_uppercase()));
    }
    if let Some(category) = &filter.category {
        query = query.filter(vendors::category.like(escape_like(category.trim())).escape('\\'));
    }

    let results = query
        .order((vendors::name.asc(), vendors::id.asc()))
        .limit(filter.limit)
        .offset(filter.offset)
        .select(Vendor::as_select())
        .load(conn)?;
    debug!("Found {} vendors", results.len());
    Ok(results)
}

#[instrument(skip(pool))]
pub fn get_vendor(pool: &DbPool, vendor_id: i32) -> Result<Option<Vendor>> {
    let conn = &mut pool.get()?;
    let vendor = vendors::table
        .find(vendor_id)
        .select(Vendor::as_select())
        .first(conn)
        .optional()?;
    Ok(vendor)
}

#[instrument(skip(pool))]
pub fn get_vendor_by_slug(pool: &DbPool, slug: &str) -> Result<Option<Vendor>> {
    let conn = &mut pool.get()?;
    let vendor = vendors::table
        .filter(vendors::slug.eq(slug))
        .select(Vendor::as_select())
        .first(conn)
        .optional()?;
    Ok(vendor)
}

#[instrument(skip(pool))]
pub fn get_vendor_by_owner(pool: &DbPool, clerk_user_id: &str) -> Result<Option<Vendor>> {
    let conn = &mut pool.get()?;
    let vendor = vendors::table
        .filter(vendors::clerk_user_id.eq(clerk_user_id))
        .select(Vendor::as_select())
        .first(conn)
        .optional()?;
    Ok(vendor)
}

/// Creates a vendor listing with a unique slug derived from its name
///
/// ### Errors
///
/// A unique violation when the owner already has a listing
#[instrument(skip(pool, new_vendor), fields(name = %new_vendor.name))]
pub fn create_vendor(pool: &DbPool, mut new_vendor: NewVendor) -> Result<Vendor> {
    let conn = &mut pool.get()?;

    let vendor = conn.transaction(|conn| {
        new_vendor.slug = unique_slug(&new_vendor.name, "vendor", |slug| {
            let count: i64 = vendors::table.filter(vendors::slug.eq(slug)).count().get_result(conn)?;
            Ok(count > 0)
        })?;

        let vendor = diesel::insert_into(vendors::table)
            .values(&new_vendor)
            .returning(Vendor::as_returning())
            .get_result(conn)?;
        Ok::<_, anyhow::Error>(vendor)
    })?;

    info!("Created vendor {} with slug {}", vendor.id, vendor.slug);
    Ok(vendor)
}

#[instrument(skip(pool, changes))]
pub fn update_vendor(pool: &DbPool, vendor_id: i32, mut changes: VendorChanges) -> Result<Vendor> {
    let conn = &mut pool.get()?;
    changes.updated_at = Some(Utc::now().naive_utc());

    let vendor = diesel::update(vendors::table.find(vendor_id))
        .set(&changes)
        .returning(Vendor::as_returning())
        .get_result(conn)?;
    info!("Updated vendor {}", vendor_id);
    Ok(vendor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Subscription;
    use crate::test_utils::setup_test_db;

    fn vendor(pool: &DbPool, owner: &str, name: &str, category: &str) -> Vendor {
        let mut new_vendor = NewVendor::new(owner.to_string(), name.to_string());
        new_vendor.category = Some(category.to_string());
        new_vendor.city = Some("Austin".to_string());
        new_vendor.state = Some("TX".to_string());
        create_vendor(pool, new_vendor).unwrap()
    }

    fn approve(pool: &DbPool, id: i32) {
        update_vendor(
            pool,
            id,
            VendorChanges {
                status: Some(VendorStatus::Approved),
                ..Default::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn test_create_vendor_defaults_and_slugs() {
        let pool = setup_test_db();
        let first = vendor(&pool, "user_1", "Lone Star Print", "Printing");
        let second = vendor(&pool, "user_2", "Lone Star Print", "Printing");

        assert_eq!(first.slug, "lone-star-print");
        assert_eq!(second.slug, "lone-star-print-2");
        assert_eq!(first.status, VendorStatus::Pending);
        assert_eq!(first.subscription, Subscription::Free);
    }

    #[test]
    fn test_one_vendor_per_owner() {
        let pool = setup_test_db();
        vendor(&pool, "user_1", "Lone Star Print", "Printing");

        let err = create_vendor(&pool, NewVendor::new("user_1".to_string(), "Second Shop".to_string())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<diesel::result::Error>(),
            Some(diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _))
        ));
        assert!(get_vendor_by_slug(&pool, "second-shop").unwrap().is_none());
    }

    #[test]
    fn test_list_vendors_by_status_and_search() {
        let pool = setup_test_db();
        let printer = vendor(&pool, "user_1", "Lone Star Print", "Printing");
        vendor(&pool, "user_2", "Hill Country Photo", "Photography");
        approve(&pool, printer.id);

        let approved = VendorFilter {
            status: Some(VendorStatus::Approved),
            limit: 50,
            ..Default::default()
        };
        let listed = list_vendors(&pool, &approved).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, printer.id);

        let everything = VendorFilter { limit: 50, ..Default::default() };
        assert_eq!(list_vendors(&pool, &everything).unwrap().len(), 2);

        let photo = VendorFilter {
            search: Some("photo".to_string()),
            limit: 50,
            ..Default::default()
        };
        assert_eq!(list_vendors(&pool, &photo).unwrap()[0].name, "Hill Country Photo");

        let by_category = VendorFilter {
            category: Some("printing".to_string()),
            state: Some("tx".to_string()),
            limit: 50,
            ..Default::default()
        };
        assert_eq!(list_vendors(&pool, &by_category).unwrap().len(), 1);
    }

    #[test]
    fn test_update_vendor_and_lookups() {
        let pool = setup_test_db();
        let created = vendor(&pool, "user_1", "Lone Star Print", "Printing");

        let updated = update_vendor(
            &pool,
            created.id,
            VendorChanges {
                bio: Some(Some("Yard signs".to_string())),
                category: Some(None),
                subscription: Some(Subscription::Premium),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Yard signs"));
        assert_eq!(updated.category, None);
        assert_eq!(updated.subscription, Subscription::Premium);
        assert_eq!(updated.slug, created.slug);

        assert_eq!(get_vendor_by_owner(&pool, "user_1").unwrap().unwrap().id, created.id);
        assert_eq!(get_vendor(&pool, created.id).unwrap().unwrap().name, "Lone Star Print");
        assert!(get_vendor(&pool, 999).unwrap().is_none());
    }
}
