use crate::db::DbPool;
use crate::models::{Endorsement, NewEndorsement};
use crate::schema::endorsements;
use anyhow::Result;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Lists endorsements for a candidate, newest first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `candidate_id` - The endorsed candidate
/// * `include_private` - Whether to include endorsements not marked public
#[instrument(skip(pool))]
pub fn list_endorsements(pool: &DbPool, candidate_id: i32, include_private: bool) -> Result<Vec<Endorsement>> {
    let conn = &mut pool.get()?;

    let mut query = endorsements::table
        .filter(endorsements::candidate_id.eq(candidate_id))
        .into_boxed();
    if !include_private {
        query = query.filter(endorsements::is_public.eq(true));
    }

    let results = query
        .order((endorsements::created_at.desc(), endorsements::id.desc()))
        .select(Endorsement::as_select())
        .load(conn)?;
    debug!("Found {} endorsements for candidate {}", results.len(), candidate_id);
    Ok(results)
}

#[instrument(skip(pool))]
pub fn get_endorsement(pool: &DbPool, endorsement_id: i32) -> Result<Option<Endorsement>> {
    let conn = &mut pool.get()?;
    let endorsement = endorsements::table
        .find(endorsement_id)
        .select(Endorsement::as_select())
        .first(conn)
        .optional()?;
    Ok(endorsement)
}

/// Stores an endorsement
///
/// ### Errors
///
/// A unique violation when the endorser already endorsed this candidate
#[instrument(skip(pool, new_endorsement), fields(candidate_id = new_endorsement.candidate_id))]
pub fn create_endorsement(pool: &DbPool, new_endorsement: NewEndorsement) -> Result<Endorsement> {
    let conn = &mut pool.get()?;
    let endorsement = diesel::insert_into(endorsements::table)
        .values(&new_endorsement)
        .returning(Endorsement::as_returning())
        .get_result(conn)?;
    info!("Created endorsement {}", endorsement.id);
    Ok(endorsement)
}

#[instrument(skip(pool))]
pub fn delete_endorsement(pool: &DbPool, endorsement_id: i32) -> Result<usize> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(endorsements::table.find(endorsement_id)).execute(conn)?;
    info!("Deleted {} endorsement(s) with id {}", deleted, endorsement_id);
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_candidate, setup_test_db};

    fn endorse(pool: &DbPool, candidate_id: i32, user: &str, public: bool) -> Result<Endorsement> {
        let mut new_endorsement =
            NewEndorsement::new(candidate_id, user.to_string(), "Pat".to_string(), "Great neighbor".to_string());
        new_endorsement.is_public = public;
        create_endorsement(pool, new_endorsement)
    }

    #[test]
    fn test_private_endorsements_are_filtered() {
        let pool = setup_test_db();
        let candidate = insert_candidate(&pool, "Jane Doe");
        endorse(&pool, candidate.id, "user_1", true).unwrap();
        endorse(&pool, candidate.id, "user_2", false).unwrap();

        assert_eq!(list_endorsements(&pool, candidate.id, false).unwrap().len(), 1);
        assert_eq!(list_endorsements(&pool, candidate.id, true).unwrap().len(), 2);
    }

    #[test]
    fn test_one_endorsement_per_user() {
        let pool = setup_test_db();
        let candidate = insert_candidate(&pool, "Jane Doe");
        endorse(&pool, candidate.id, "user_1", true).unwrap();

        let err = endorse(&pool, candidate.id, "user_1", true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<diesel::result::Error>(),
            Some(diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _))
        ));
    }

    #[test]
    fn test_get_and_delete() {
        let pool = setup_test_db();
        let candidate = insert_candidate(&pool, "Jane Doe");
        let endorsement = endorse(&pool, candidate.id, "user_1", true).unwrap();

        assert_eq!(get_endorsement(&pool, endorsement.id).unwrap().unwrap().endorser_clerk_user_id, "user_1");
        assert_eq!(delete_endorsement(&pool, endorsement.id).unwrap(), 1);
        assert!(get_endorsement(&pool, endorsement.id).unwrap().is_none());
    }
}
