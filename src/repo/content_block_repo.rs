use crate::db::DbPool;
use crate::models::{BlockContent, ContentBlock, NewContentBlock};
use crate::repo::candidate_repo::seed_default_blocks;
use crate::schema::content_blocks;
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, instrument};

fn load_blocks(conn: &mut SqliteConnection, candidate_id: i32) -> QueryResult<Vec<ContentBlock>> {
    content_blocks::table
        .filter(content_blocks::candidate_id.eq(candidate_id))
        .order((content_blocks::position.asc(), content_blocks::id.asc()))
        .select(ContentBlock::as_select())
        .load(conn)
}

/// Lists a candidate's content blocks in page order
#[instrument(skip(pool))]
pub fn list_content_blocks(pool: &DbPool, candidate_id: i32) -> Result<Vec<ContentBlock>> {
    let conn = &mut pool.get()?;
    let blocks = load_blocks(conn, candidate_id)?;
    debug!("Found {} content blocks for candidate {}", blocks.len(), candidate_id);
    Ok(blocks)
}

/// Retrieves a single content block
#[instrument(skip(pool))]
pub fn get_content_block(pool: &DbPool, block_id: i32) -> Result<Option<ContentBlock>> {
    let conn = &mut pool.get()?;
    let block = content_blocks::table
        .find(block_id)
        .select(ContentBlock::as_select())
        .first(conn)
        .optional()?;
    Ok(block)
}

/// Adds a block after the last one on the page
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `candidate_id` - The candidate whose page grows
/// * `content` - The block to add
///
/// ### Returns
///
/// A Result containing the newly created ContentBlock
#[instrument(skip(pool, content))]
pub fn append_content_block(pool: &DbPool, candidate_id: i32, content: BlockContent) -> Result<ContentBlock> {
    let conn = &mut pool.get()?;

    conn.transaction(|conn| {
        let last: Option<i32> = content_blocks::table
            .filter(content_blocks::candidate_id.eq(candidate_id))
            .select(diesel::dsl::max(content_blocks::position))
            .first(conn)?;
        let position = last.map_or(0, |p| p + 1);

        let block = diesel::insert_into(content_blocks::table)
            .values(NewContentBlock::new(candidate_id, position, content))
            .returning(ContentBlock::as_returning())
            .get_result(conn)?;
        info!("Appended block {} at position {} for candidate {}", block.id, position, candidate_id);
        Ok(block)
    })
}

/// Replaces the whole page with `blocks`, numbering positions from zero
///
/// ### Errors
///
/// Returns an error if any insert fails; the previous page is then kept
#[instrument(skip(pool, blocks), fields(count = blocks.len()))]
pub fn replace_content_blocks(pool: &DbPool, candidate_id: i32, blocks: Vec<BlockContent>) -> Result<Vec<ContentBlock>> {
    let conn = &mut pool.get()?;

    conn.transaction(|conn| {
        diesel::delete(content_blocks::table.filter(content_blocks::candidate_id.eq(candidate_id))).execute(conn)?;

        let rows: Vec<NewContentBlock> = blocks
            .into_iter()
            .enumerate()
            .map(|(position, content)| NewContentBlock::new(candidate_id, position as i32, content))
            .collect();
        diesel::insert_into(content_blocks::table).values(&rows).execute(conn)?;

        info!("Replaced page for candidate {} with {} blocks", candidate_id, rows.len());
        Ok(load_blocks(conn, candidate_id)?)
    })
}

/// Throws away the page and restores the starter template
#[instrument(skip(pool))]
pub fn reset_content_blocks(pool: &DbPool, candidate_id: i32) -> Result<Vec<ContentBlock>> {
    let conn = &mut pool.get()?;

    conn.transaction(|conn| {
        diesel::delete(content_blocks::table.filter(content_blocks::candidate_id.eq(candidate_id))).execute(conn)?;
        seed_default_blocks(conn, candidate_id)?;
        info!("Reset page for candidate {}", candidate_id);
        Ok(load_blocks(conn, candidate_id)?)
    })
}

/// Overwrites a block's content, keeping its position
#[instrument(skip(pool, content))]
pub fn update_content_block(pool: &DbPool, block_id: i32, content: &BlockContent) -> Result<ContentBlock> {
    let conn = &mut pool.get()?;
    let block = diesel::update(content_blocks::table.find(block_id))
        .set((content, content_blocks::updated_at.eq(Utc::now().naive_utc())))
        .returning(ContentBlock::as_returning())
        .get_result(conn)?;
    info!("Updated content block {}", block_id);
    Ok(block)
}

/// Deletes a block and closes the gap it leaves in the page order
///
/// ### Returns
///
/// The number of blocks deleted (0 or 1)
#[instrument(skip(pool))]
pub fn delete_content_block(pool: &DbPool, block_id: i32) -> Result<usize> {
    let conn = &mut pool.get()?;

    conn.transaction(|conn| {
        let target: Option<(i32, i32)> = content_blocks::table
            .find(block_id)
            .select((content_blocks::candidate_id, content_blocks::position))
            .first(conn)
            .optional()?;
        let Some((candidate_id, position)) = target else {
            return Ok(0);
        };

        let deleted = diesel::delete(content_blocks::table.find(block_id)).execute(conn)?;
        diesel::update(
            content_blocks::table
                .filter(content_blocks::candidate_id.eq(candidate_id))
                .filter(content_blocks::position.gt(position)),
        )
        .set(content_blocks::position.eq(content_blocks::position - 1))
        .execute(conn)?;

        info!("Deleted content block {} from candidate {}", block_id, candidate_id);
        Ok(deleted)
    })
}
