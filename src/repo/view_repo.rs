use crate::db::DbPool;
use crate::models::NewCandidateView;
use crate::schema::candidate_views;
use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Records one profile view at the current time
#[instrument(skip(pool))]
pub fn record_view(pool: &DbPool, candidate_id: i32, referrer: Option<String>) -> Result<()> {
    let conn = &mut pool.get()?;
    diesel::insert_into(candidate_views::table)
        .values(NewCandidateView {
            candidate_id,
            viewed_at: Utc::now().naive_utc(),
            referrer,
        })
        .execute(conn)?;
    debug!("Recorded view for candidate {}", candidate_id);
    Ok(())
}

/// Timestamps of every view of a candidate at or after `since`
#[instrument(skip(pool))]
pub fn list_view_times(pool: &DbPool, candidate_id: i32, since: NaiveDateTime) -> Result<Vec<NaiveDateTime>> {
    let conn = &mut pool.get()?;
    let times = candidate_views::table
        .filter(candidate_views::candidate_id.eq(candidate_id))
        .filter(candidate_views::viewed_at.ge(since))
        .select(candidate_views::viewed_at)
        .order(candidate_views::viewed_at.asc())
        .load(conn)?;
    Ok(times)
}

/// Deletes views recorded before `cutoff`
///
/// ### Returns
///
/// The number of views deleted
#[instrument(skip(pool))]
pub fn purge_views_before(pool: &DbPool, cutoff: NaiveDateTime) -> Result<usize> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(candidate_views::table.filter(candidate_views::viewed_at.lt(cutoff))).execute(conn)?;
    info!("Purged {} candidate view(s) before {}", deleted, cutoff);
    Ok(deleted)
}
