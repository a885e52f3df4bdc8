use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{load_candidate, load_visible_candidate};
use crate::auth::{Identity, MaybeIdentity};
use crate::db::DbPool;
use crate::dto::ReplaceContentBlocksDto;
use crate::errors::{parse_id, ApiError};
use crate::models::{BlockContent, ContentBlock};
use crate::repo;

/// Loads a block together with the candidate that owns it, checking the
/// caller may edit it
fn load_managed_block(pool: &DbPool, identity: &Identity, raw_id: &str) -> Result<ContentBlock, ApiError> {
    let block_id = parse_id(raw_id, "content block")?;
    let block = repo::get_content_block(pool, block_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Content block".to_string()))?;
    let candidate = load_candidate(pool, &block.candidate_id.to_string())?;
    identity.require_manager(&candidate)?;
    Ok(block)
}

/// Handler for listing a candidate's profile blocks
///
/// This function handles GET requests to `/candidates/{id}/content-blocks`.
///
/// ### Returns
///
/// The blocks in display order
#[instrument(skip(pool, identity))]
pub async fn list_content_blocks_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    identity: MaybeIdentity,
    // Extract the candidate ID from the URL path
    Path(candidate_id): Path<String>,
) -> Result<Json<Vec<ContentBlock>>, ApiError> {
    let candidate = load_visible_candidate(&pool, &candidate_id, &identity)?;
    let blocks = repo::list_content_blocks(&pool, candidate.id).map_err(ApiError::Database)?;
    Ok(Json(blocks))
}

/// Handler for appending a block to the end of a profile
///
/// This function handles POST requests to `/candidates/{id}/content-blocks`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `identity` - The caller; must own the profile or be staff
/// * `candidate_id` - The profile to append to
/// * `payload` - The block
///
/// ### Returns
///
/// 201 with the stored block
#[instrument(skip(pool, identity, payload), fields(user_id = %identity.user_id))]
pub async fn append_content_block_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    Path(candidate_id): Path<String>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<BlockContent>,
) -> Result<(StatusCode, Json<ContentBlock>), ApiError> {
    let candidate = load_candidate(&pool, &candidate_id)?;
    identity.require_manager(&candidate)?;
    payload.validate().map_err(ApiError::BadRequest)?;

    let block = repo::append_content_block(&pool, candidate.id, payload).map_err(ApiError::Database)?;
    info!("Appended {} block at position {} for candidate {}", block.kind, block.position, candidate.id);
    Ok((StatusCode::CREATED, Json(block)))
}

/// Handler for replacing every block on a profile
///
/// This function handles PUT requests to `/candidates/{id}/content-blocks`.
/// Either all blocks are valid and the profile is replaced, or nothing changes.
#[instrument(skip(pool, identity, payload), fields(user_id = %identity.user_id, count = payload.blocks.len()))]
pub async fn replace_content_blocks_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    Path(candidate_id): Path<String>,
    Json(payload): Json<ReplaceContentBlocksDto>,
) -> Result<Json<Vec<ContentBlock>>, ApiError> {
    let candidate = load_candidate(&pool, &candidate_id)?;
    identity.require_manager(&candidate)?;

    for (index, block) in payload.blocks.iter().enumerate() {
        block
            .validate()
            .map_err(|msg| ApiError::BadRequest(format!("Block {}: {}", index, msg)))?;
    }

    let blocks = repo::replace_content_blocks(&pool, candidate.id, payload.blocks).map_err(ApiError::Database)?;
    info!("Replaced content of candidate {} with {} blocks", candidate.id, blocks.len());
    Ok(Json(blocks))
}

/// Handler for restoring the default profile template
///
/// This function handles POST requests to `/candidates/{id}/content-blocks/reset`.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn reset_content_blocks_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    Path(candidate_id): Path<String>,
) -> Result<Json<Vec<ContentBlock>>, ApiError> {
    let candidate = load_candidate(&pool, &candidate_id)?;
    identity.require_manager(&candidate)?;

    let blocks = repo::reset_content_blocks(&pool, candidate.id).map_err(ApiError::Database)?;
    info!("Reset content of candidate {}", candidate.id);
    Ok(Json(blocks))
}

/// Handler for editing one block
///
/// This function handles PATCH requests to `/content-blocks/{id}`. The body
/// is the full new content; the block keeps its position.
#[instrument(skip(pool, identity, payload), fields(user_id = %identity.user_id))]
pub async fn update_content_block_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    // Extract the block ID from the URL path
    Path(block_id): Path<String>,
    Json(payload): Json<BlockContent>,
) -> Result<Json<ContentBlock>, ApiError> {
    let block = load_managed_block(&pool, &identity, &block_id)?;
    payload.validate().map_err(ApiError::BadRequest)?;

    let updated = repo::update_content_block(&pool, block.id, &payload)
        .map_err(|e| ApiError::from_repo(e, "Content block"))?;
    Ok(Json(updated))
}

/// Handler for removing one block
///
/// This function handles DELETE requests to `/content-blocks/{id}`. The
/// blocks after it move up one position.
#[instrument(skip(pool, identity), fields(user_id = %identity.user_id))]
pub async fn delete_content_block_handler(
    State(pool): State<Arc<DbPool>>,
    identity: Identity,
    Path(block_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let block = load_managed_block(&pool, &identity, &block_id)?;

    let deleted = repo::delete_content_block(&pool, block.id).map_err(ApiError::Database)?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Content block".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
