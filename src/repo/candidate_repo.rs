use std::collections::HashSet;

use crate::db::DbPool;
use crate::models::{default_template, Candidate, CandidateChanges, NewCandidate, NewContentBlock};
use crate::schema::{candidates, content_blocks};
use crate::repo::{contains_pattern, escape_like};
use crate::services::slug::unique_slug;
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, instrument};

/// Filters for listing candidates
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    /// Substring matched against name, position and party
    pub search: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub verified: Option<bool>,
    /// Restrict to these ids when non-empty
    pub ids: Vec<i32>,
    pub include_hidden: bool,
    pub limit: i64,
    pub offset: i64,
}

/// Lists candidates matching a filter, ordered by name
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `filter` - The filter and page to apply
///
/// ### Returns
///
/// A Result containing the matching candidates
#[instrument(skip(pool))]
pub fn list_candidates(pool: &DbPool, filter: &CandidateFilter) -> Result<Vec<Candidate>> {
    let conn = &mut pool.get()?;

    let mut query = candidates::table.into_boxed();

    if !filter.include_hidden {
        query = query.filter(candidates::hidden.eq(false));
    }
    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        query = query.filter(
            candidates::name
                .like(pattern.clone())
                .escape('\\')
                .or(candidates::position.like(pattern.clone()).escape('\\'))
                .or(candidates::party.like(pattern).escape('\\')),
        );
    }
    if let Some(city) = &filter.city {
        query = query.filter(candidates::city.like(escape_like(city.trim())).escape('\\'));
    }
    if let Some(state) = &filter.state {
        query = query.filter(candidates::state.eq(state.trim().to_ascii_uppercase()));
    }
    if let Some(verified) = filter.verified {
        query = query.filter(candidates::verified.eq(verified));
    }
    if !filter.ids.is_empty() {
        query = query.filter(candidates::id.eq_any(filter.ids.clone()));
    }

    let results = query
        .order((candidates::name.asc(), candidates::id.asc()))
        .limit(filter.limit)
        .offset(filter.offset)
        .select(Candidate::as_select())
        .load(conn)?;

    debug!("Found {} candidates", results.len());
    Ok(results)
}

/// Retrieves a candidate by id
#[instrument(skip(pool))]
pub fn get_candidate(pool: &DbPool, candidate_id: i32) -> Result<Option<Candidate>> {
    let conn = &mut pool.get()?;
    let candidate = candidates::table
        .find(candidate_id)
        .select(Candidate::as_select())
        .first(conn)
        .optional()?;
    Ok(candidate)
}

/// Retrieves a candidate by slug
#[instrument(skip(pool))]
pub fn get_candidate_by_slug(pool: &DbPool, slug: &str) -> Result<Option<Candidate>> {
    let conn = &mut pool.get()?;
    let candidate = candidates::table
        .filter(candidates::slug.eq(slug))
        .select(Candidate::as_select())
        .first(conn)
        .optional()?;
    Ok(candidate)
}

/// Retrieves the candidate profile owned by a user, if any
#[instrument(skip(pool))]
pub fn get_candidate_by_owner(pool: &DbPool, clerk_user_id: &str) -> Result<Option<Candidate>> {
    let conn = &mut pool.get()?;
    let candidate = candidates::table
        .filter(candidates::clerk_user_id.eq(clerk_user_id))
        .select(Candidate::as_select())
        .first(conn)
        .optional()?;
    Ok(candidate)
}

#[cfg(test)]
pub fn count_candidates(pool: &DbPool) -> Result<i64> {
    let conn = &mut pool.get()?;
    Ok(candidates::table.count().get_result(conn)?)
}

/// Id, name and slug of every visible candidate
#[instrument(skip(pool))]
pub fn list_candidate_refs(pool: &DbPool) -> Result<Vec<(i32, String, String)>> {
    let conn = &mut pool.get()?;
    let refs = candidates::table
        .filter(candidates::hidden.eq(false))
        .select((candidates::id, candidates::name, candidates::slug))
        .order(candidates::id.asc())
        .load(conn)?;
    Ok(refs)
}

fn slug_taken(conn: &mut SqliteConnection, slug: &str) -> Result<bool> {
    let count: i64 = candidates::table
        .filter(candidates::slug.eq(slug))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

/// Inserts the starter content blocks for a candidate
pub(crate) fn seed_default_blocks(conn: &mut SqliteConnection, candidate_id: i32) -> QueryResult<usize> {
    let blocks: Vec<NewContentBlock> = default_template()
        .into_iter()
        .enumerate()
        .map(|(position, content)| NewContentBlock::new(candidate_id, position as i32, content))
        .collect();
    diesel::insert_into(content_blocks::table).values(&blocks).execute(conn)
}

/// Creates a candidate with a unique slug and the default profile page
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `new_candidate` - The candidate to insert; its slug is derived from the name
///
/// ### Returns
///
/// A Result containing the newly created Candidate
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The owner already has a candidate profile (unique violation)
/// - The insert fails
#[instrument(skip(pool, new_candidate), fields(name = %new_candidate.name))]
pub fn create_candidate(pool: &DbPool, mut new_candidate: NewCandidate) -> Result<Candidate> {
    let conn = &mut pool.get()?;

    let candidate = conn.transaction(|conn| {
        new_candidate.slug = unique_slug(&new_candidate.name, "candidate", |slug| slug_taken(conn, slug))?;

        let candidate = diesel::insert_into(candidates::table)
            .values(&new_candidate)
            .returning(Candidate::as_returning())
            .get_result(conn)?;

        seed_default_blocks(conn, candidate.id)?;
        Ok::<_, anyhow::Error>(candidate)
    })?;

    info!("Created candidate {} with slug {}", candidate.id, candidate.slug);
    Ok(candidate)
}

/// Applies a partial update to a candidate
///
/// ### Returns
///
/// The updated candidate, or a not-found error if it doesn't exist
#[instrument(skip(pool, changes))]
pub fn update_candidate(pool: &DbPool, candidate_id: i32, mut changes: CandidateChanges) -> Result<Candidate> {
    let conn = &mut pool.get()?;
    changes.updated_at = Some(Utc::now().naive_utc());

    let candidate = diesel::update(candidates::table.find(candidate_id))
        .set(&changes)
        .returning(Candidate::as_returning())
        .get_result(conn)?;

    info!("Updated candidate {}", candidate_id);
    Ok(candidate)
}

/// Deletes a candidate and, through cascades, everything attached to it
///
/// ### Returns
///
/// The number of candidates deleted (0 or 1)
#[instrument(skip(pool))]
pub fn delete_candidate(pool: &DbPool, candidate_id: i32) -> Result<usize> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(candidates::table.find(candidate_id)).execute(conn)?;
    info!("Deleted {} candidate(s) with id {}", deleted, candidate_id);
    Ok(deleted)
}

/// Recomputes every slug from the candidate's current name
///
/// Candidates are processed oldest first, so earlier profiles keep the
/// unsuffixed slug when names collide.
///
/// ### Returns
///
/// The number of candidates whose slug changed
#[instrument(skip(pool))]
pub fn regenerate_candidate_slugs(pool: &DbPool) -> Result<usize> {
    let conn = &mut pool.get()?;

    conn.transaction(|conn| {
        let rows: Vec<(i32, String, String)> = candidates::table
            .select((candidates::id, candidates::name, candidates::slug))
            .order(candidates::id.asc())
            .load(conn)?;

        let mut assigned = HashSet::new();
        let mut changes = Vec::new();
        for (id, name, current) in rows {
            let slug = unique_slug(&name, "candidate", |s| Ok(assigned.contains(s)))?;
            assigned.insert(slug.clone());
            if slug != current {
                changes.push((id, slug));
            }
        }

        // Park changed rows on placeholder slugs first so swaps don't collide
        for (id, _) in &changes {
            diesel::update(candidates::table.find(*id))
                .set(candidates::slug.eq(format!("__regenerating-{}", id)))
                .execute(conn)?;
        }
        for (id, slug) in &changes {
            diesel::update(candidates::table.find(*id))
                .set(candidates::slug.eq(slug))
                .execute(conn)?;
        }

        info!("Regenerated {} candidate slug(s)", changes.len());
        Ok(changes.len())
    })
}

#[cfg(test)]
mod tests;
