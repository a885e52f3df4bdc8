use crate::db::DbPool;
use crate::models::{Candidate, Election, ElectionLink, NewElection};
use crate::repo::escape_like;
use crate::schema::{candidates, election_links, elections};
use anyhow::Result;
use chrono::NaiveDate;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Filters for listing elections
#[derive(Debug, Clone, Default)]
pub struct ElectionFilter {
    pub city: Option<String>,
    pub state: Option<String>,
    /// Only elections on or after this date
    pub on_or_after: Option<NaiveDate>,
    pub include_hidden: bool,
    pub limit: i64,
    pub offset: i64,
}

/// Lists elections matching a filter, soonest first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `filter` - The filter and page to apply
///
/// ### Returns
///
/// A Result containing the matching elections
#[instrument(skip(pool))]
pub fn list_elections(pool: &DbPool, filter: &ElectionFilter) -> Result<Vec<Election>> {
    let conn = &mut pool.get()?;

    let mut query = elections::table.into_boxed();
    if !filter.include_hidden {
        query = query.filter(elections::hidden.eq(false));
    }
    if let Some(city) = &filter.city {
        query = query.filter(elections::city.like(escape_like(city.trim())).escape('\\'));
    }
    if let Some(state) = &filter.state {
        query = query.filter(elections::state.eq(state.trim().to_ascii_uppercase()));
    }
    if let Some(date) = filter.on_or_after {
        query = query.filter(elections::election_date.ge(date));
    }

    let results = query
        .order((elections::election_date.asc(), elections::id.asc()))
        .limit(filter.limit)
        .offset(filter.offset)
        .select(Election::as_select())
        .load(conn)?;

    debug!("Found {} elections", results.len());
    Ok(results)
}

#[instrument(skip(pool))]
pub fn get_election(pool: &DbPool, election_id: i32) -> Result<Option<Election>> {
    let conn = &mut pool.get()?;
    let election = elections::table
        .find(election_id)
        .select(Election::as_select())
        .first(conn)
        .optional()?;
    Ok(election)
}

#[instrument(skip(pool, new_election), fields(position = %new_election.position))]
pub fn create_election(pool: &DbPool, new_election: NewElection) -> Result<Election> {
    let conn = &mut pool.get()?;
    let election = diesel::insert_into(elections::table)
        .values(&new_election)
        .returning(Election::as_returning())
        .get_result(conn)?;
    info!("Created election {} on {}", election.id, election.election_date);
    Ok(election)
}

/// Candidates running in an election together with their race details
///
/// Hidden candidates are left out unless `include_hidden` is set.
#[instrument(skip(pool))]
pub fn list_election_candidates(
    pool: &DbPool,
    election_id: i32,
    include_hidden: bool,
) -> Result<Vec<(ElectionLink, Candidate)>> {
    let conn = &mut pool.get()?;

    let mut query = election_links::table
        .inner_join(candidates::table)
        .filter(election_links::election_id.eq(election_id))
        .into_boxed();
    if !include_hidden {
        query = query.filter(candidates::hidden.eq(false));
    }

    let rows = query
        .order(candidates::name.asc())
        .select((ElectionLink::as_select(), Candidate::as_select()))
        .load(conn)?;
    Ok(rows)
}

/// Links a candidate to an election
///
/// ### Errors
///
/// A unique violation when the pair is already linked
#[instrument(skip(pool, link), fields(election_id = link.election_id, candidate_id = link.candidate_id))]
pub fn link_candidate(pool: &DbPool, link: ElectionLink) -> Result<ElectionLink> {
    let conn = &mut pool.get()?;
    let link = diesel::insert_into(election_links::table)
        .values(&link)
        .returning(ElectionLink::as_returning())
        .get_result(conn)?;
    info!("Linked candidate {} to election {}", link.candidate_id, link.election_id);
    Ok(link)
}

/// ### Returns
///
/// The number of links removed (0 or 1)
#[instrument(skip(pool))]
pub fn unlink_candidate(pool: &DbPool, election_id: i32, candidate_id: i32) -> Result<usize> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(election_links::table.find((election_id, candidate_id))).execute(conn)?;
    info!("Removed {} link(s) between election {} and candidate {}", deleted, election_id, candidate_id);
    Ok(deleted)
}

/// Hides every visible election dated before `before`
///
/// ### Returns
///
/// The number of elections hidden
#[instrument(skip(pool))]
pub fn hide_past_elections(pool: &DbPool, before: NaiveDate) -> Result<usize> {
    let conn = &mut pool.get()?;
    let hidden = diesel::update(
        elections::table
            .filter(elections::hidden.eq(false))
            .filter(elections::election_date.lt(before)),
    )
    .set(elections::hidden.eq(true))
    .execute(conn)?;
    info!("Hid {} election(s) dated before {}", hidden, before);
    Ok(hidden)
}
