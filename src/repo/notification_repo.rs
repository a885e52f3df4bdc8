use crate::db::DbPool;
use crate::models::{NewNotification, Notification};
use crate::schema::notifications;
use anyhow::Result;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

#[instrument(skip(pool, new_notification), fields(recipient = %new_notification.clerk_user_id))]
pub fn create_notification(pool: &DbPool, new_notification: NewNotification) -> Result<Notification> {
    let conn = &mut pool.get()?;
    let notification = diesel::insert_into(notifications::table)
        .values(&new_notification)
        .returning(Notification::as_returning())
        .get_result(conn)?;
    info!("Created {} notification {}", notification.kind, notification.id);
    Ok(notification)
}

/// Lists a user's notifications, newest first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `clerk_user_id` - The recipient
/// * `unread_only` - Skip notifications already read
#[instrument(skip(pool))]
pub fn list_notifications(pool: &DbPool, clerk_user_id: &str, unread_only: bool) -> Result<Vec<Notification>> {
    let conn = &mut pool.get()?;

    let mut query = notifications::table
        .filter(notifications::clerk_user_id.eq(clerk_user_id))
        .into_boxed();
    if unread_only {
        query = query.filter(notifications::read.eq(false));
    }

    let results = query
        .order((notifications::created_at.desc(), notifications::id.desc()))
        .select(Notification::as_select())
        .load(conn)?;
    debug!("Found {} notifications", results.len());
    Ok(results)
}

/// Marks one notification read, if it belongs to `clerk_user_id`
///
/// ### Returns
///
/// The notification, or `None` when it doesn't exist or belongs to someone else
#[instrument(skip(pool))]
pub fn mark_notification_read(pool: &DbPool, notification_id: i32, clerk_user_id: &str) -> Result<Option<Notification>> {
    let conn = &mut pool.get()?;
    let notification = diesel::update(
        notifications::table
            .find(notification_id)
            .filter(notifications::clerk_user_id.eq(clerk_user_id)),
    )
    .set(notifications::read.eq(true))
    .returning(Notification::as_returning())
    .get_result(conn)
    .optional()?;
    Ok(notification)
}

/// ### Returns
///
/// The number of notifications that changed from unread to read
#[instrument(skip(pool))]
pub fn mark_all_notifications_read(pool: &DbPool, clerk_user_id: &str) -> Result<usize> {
    let conn = &mut pool.get()?;
    let updated = diesel::update(
        notifications::table
            .filter(notifications::clerk_user_id.eq(clerk_user_id))
            .filter(notifications::read.eq(false)),
    )
    .set(notifications::read.eq(true))
    .execute(conn)?;
    info!("Marked {} notification(s) read", updated);
    Ok(updated)
}
