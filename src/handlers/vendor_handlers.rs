use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{optional_email, optional_state, page};
use crate::auth::{Identity, MaybeIdentity};
use crate::db::DbPool;
use crate::dto::{patch_nullable, CreateVendorDto, UpdateVendorDto, VendorQueryDto};
use crate::errors::{parse_id, ApiError};
use crate::models::{NewVendor, Vendor, VendorChanges, VendorStatus};
use crate::repo::{self, VendorFilter};
use crate::services::validation::{non_blank, require};

/// Approved listings are public; the others only exist for their owner and staff
fn visible_to(vendor: Vendor, identity: &MaybeIdentity) -> Result<Vendor, ApiError> {
    let is_owner = identity.user_id() == Some(vendor.clerk_user_id.as_str());
    if vendor.status == VendorStatus::Approved || is_owner || identity.is_staff() {
        Ok(vendor)
    } else {
        Err(ApiError::NotFound("Vendor".to_string()))
    }
}

/// Handler for browsing the vendor marketplace
///
/// This function handles GET requests to `/vendors`. Only approved
/// listings are shown, except to staff, who see every listing.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `identity` - The caller, if signed in
/// * `query` - Search, location, category and paging filters
///
/// ### Returns
///
/// The matching vendors, ordered by name
#[instrument(skip(pool, identity))]
pub async fn list_vendors_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    identity: MaybeIdentity,
    // Extract the query parameters
    Query(query): Query<VendorQueryDto>,
) -> Result<Json<Vec<Vendor>>, ApiError> {
    let (limit, offset) = page(query.limit, query.offset)?;

    let filter = VendorFilter {
        search: non_blank(query.search.as_deref()),
        city: non_blank(query.city.as_deref()),
        state: non_blank(query.state.as_deref()).map(|s| s.to_ascii_uppercase()),
        category: non_blank(query.category.as_deref()),
        status: (!identity.is_staff()).then_some(VendorStatus::Approved),
        limit,
        offset,
    };

    let vendors = repo::list_vendors(&pool, &filter).map_err(ApiError::Database)?;
    debug!("Returning {} vendors", vendors.len());
    Ok(Json(vendors))
}

/// Handler for retrieving a vendor by id
///
/// This function handles GET requests to `/vendors/{id}`.
#[instrument(skip(pool, identity))]
pub async fn get_vendor_handler(
    State(pool): State<Arc<DbPool>>,
    identity: MaybeIdentity,
    // Extract the vendor ID from the URL path
    Path(vendor_id): Path<String>,
) -> Result<Json<Vendor>, ApiError> {
    let vendor_id = parse_id(&vendor_id, "vendor")?;
    let vendor = repo::get_vendor(&pool, vendor_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Vendor".to_string()))?;
    Ok(Json(visible_to(vendor, &identity)?))
}

/// Handler for retrieving a vendor by slug
///
/// This function handles GET requests to `/vendors/slug/{slug}`.
#[instrument(skip(pool, identity))]
pub async fn get_vendor_by_slug_handler(
    State(pool): State<Arc<DbPool>>,
    identity: MaybeIdentity,
    Path(slug): Path<String>,
) -> Result<Json<Vendor>, ApiError> {
    let vendor = repo::get_vendor_by_slug(&pool, &slug)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Vendor".to_string()))?;
    Ok(Json(visible_to(vendor, &identity)?))
}

/// Handler for creating a vendor listing
///
/// This function handles POST requests to `/vendors`. Each user may own one
/// listing; it starts PENDING on the free tier until staff approve it.
///
/// ### Returns
///
/// 201 with the new listing
///
/// ### Errors
///
/// - 400 for a blank name or malformed email or state
/// - 409 when the caller already has a listing
#[instrument(skip(pool, identity, payload), fields(user_id = %identity.user_id))]
pub async fn create_vendor_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateVendorDto>,
) -> Result<(StatusCode, Json<Vendor>), ApiError> {
    let name = require(Some(&payload.name), "name").map_err(ApiError::BadRequest)?;

    if repo::get_vendor_by_owner(&pool, &identity.user_id)
        .map_err(ApiError::Database)?
        .is_some()
    {
        return Err(ApiError::Conflict("You already have a vendor listing".to_string()));
    }

    let mut new_vendor = NewVendor::new(identity.user_id.clone(), name);
    new_vendor.email = optional_email(payload.email.as_deref())?;
    new_vendor.state = optional_state(payload.state.as_deref())?;
    new_vendor.bio = non_blank(payload.bio.as_deref());
    new_vendor.phone = non_blank(payload.phone.as_deref());
    new_vendor.website = non_blank(payload.website.as_deref());
    new_vendor.city = non_blank(payload.city.as_deref());
    new_vendor.category = non_blank(payload.category.as_deref());

    let vendor = repo::create_vendor(&pool, new_vendor).map_err(|e| ApiError::from_repo(e, "Vendor"))?;
    info!("Created vendor {} ({})", vendor.id, vendor.slug);
    Ok((StatusCode::CREATED, Json(vendor)))
}

/// Handler for updating a vendor listing
///
/// This function handles PATCH requests to `/vendors/{id}`. The owner edits
/// the profile fields; `status` and `subscription` are staff only.
#[instrument(skip(pool, identity, payload), fields(user_id = %identity.user_id))]
pub async fn update_vendor_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    Path(vendor_id): Path<String>,
    Json(payload): Json<UpdateVendorDto>,
) -> Result<Json<Vendor>, ApiError> {
    let vendor_id = parse_id(&vendor_id, "vendor")?;
    let vendor = repo::get_vendor(&pool, vendor_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Vendor".to_string()))?;

    let is_owner = vendor.clerk_user_id == identity.user_id;
    if !is_owner && !identity.is_staff() {
        return Err(ApiError::Forbidden);
    }
    if (payload.status.is_some() || payload.subscription.is_some()) && !identity.is_staff() {
        return Err(ApiError::Forbidden);
    }

    let name = match payload.name.as_deref() {
        Some(name) => Some(require(Some(name), "name").map_err(ApiError::BadRequest)?),
        None => None,
    };
    let email = match payload.email.as_deref() {
        Some(email) => Some(optional_email(Some(email))?),
        None => None,
    };
    let state = match payload.state.as_deref() {
        Some(state) => Some(optional_state(Some(state))?),
        None => None,
    };

    let changes = VendorChanges {
        name,
        bio: patch_nullable(payload.bio),
        email,
        phone: patch_nullable(payload.phone),
        website: patch_nullable(payload.website),
        city: patch_nullable(payload.city),
        state,
        category: patch_nullable(payload.category),
        subscription: payload.subscription,
        status: payload.status,
        updated_at: None,
    };

    let updated = repo::update_vendor(&pool, vendor.id, changes).map_err(|e| ApiError::from_repo(e, "Vendor"))?;
    if updated.status != vendor.status {
        info!("Vendor {} moved from {} to {}", updated.id, vendor.status, updated.status);
    }
    Ok(Json(updated))
}
