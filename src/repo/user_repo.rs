use crate::db::DbPool;
use crate::models::{NewUser, User, UserRole};
use crate::schema::users;
use anyhow::Result;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates the user on first sight, or refreshes the stored profile
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `clerk_user_id` - The identity-provider user id
/// * `email` - Email from the session token, if any
/// * `name` - Display name, if known
/// * `role` - Role from the token's metadata
///
/// ### Returns
///
/// The stored user
#[instrument(skip(pool, email, name))]
pub fn upsert_user(
    pool: &DbPool,
    clerk_user_id: &str,
    email: Option<String>,
    name: Option<String>,
    role: UserRole,
) -> Result<User> {
    let conn = &mut pool.get()?;

    conn.transaction(|conn| {
        let existing = users::table
            .filter(users::clerk_user_id.eq(clerk_user_id))
            .select(User::as_select())
            .first(conn)
            .optional()?;

        match existing {
            Some(user) => {
                debug!("Refreshing user {}", user.id);
                let user = diesel::update(users::table.find(user.id))
                    .set((
                        users::email.eq(email.or(user.email)),
                        users::name.eq(name.or(user.name)),
                        users::role.eq(role),
                    ))
                    .returning(User::as_returning())
                    .get_result(conn)?;
                Ok(user)
            }
            None => {
                let user = diesel::insert_into(users::table)
                    .values(NewUser::new(clerk_user_id.to_string(), email, name, role))
                    .returning(User::as_returning())
                    .get_result(conn)?;
                info!("Created user {} for {}", user.id, clerk_user_id);
                Ok(user)
            }
        }
    })
}

/// Looks up a user by identity-provider id
#[instrument(skip(pool))]
pub fn get_user_by_clerk_id(pool: &DbPool, clerk_user_id: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;
    let user = users::table
        .filter(users::clerk_user_id.eq(clerk_user_id))
        .select(User::as_select())
        .first(conn)
        .optional()?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_upsert_creates_then_updates() {
        let pool = setup_test_db();

        let created = upsert_user(&pool, "user_1", Some("a@example.com".to_string()), None, UserRole::Voter).unwrap();
        assert_eq!(created.email.as_deref(), Some("a@example.com"));
        assert_eq!(created.role, UserRole::Voter);

        let updated = upsert_user(&pool, "user_1", None, Some("Alex".to_string()), UserRole::Candidate).unwrap();
        assert_eq!(updated.id, created.id);
        // Email is kept when the token doesn't carry one
        assert_eq!(updated.email.as_deref(), Some("a@example.com"));
        assert_eq!(updated.name.as_deref(), Some("Alex"));
        assert_eq!(updated.role, UserRole::Candidate);
    }

    #[test]
    fn test_get_user_by_clerk_id() {
        let pool = setup_test_db();
        assert!(get_user_by_clerk_id(&pool, "missing").unwrap().is_none());

        upsert_user(&pool, "user_2", None, None, UserRole::Vendor).unwrap();
        let user = get_user_by_clerk_id(&pool, "user_2").unwrap().unwrap();
        assert_eq!(user.role, UserRole::Vendor);
    }
}
