use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::Event;
use crate::ports::repo::{EventUpdate, NewEvent};

pub async fn list_events_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        "SELECT id, user_id, title, description, start_time, end_time, event_type, created_at
         FROM events
         WHERE user_id = ?1
         ORDER BY start_time IS NULL, start_time, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get_event(pool: &SqlitePool, id: i64) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        "SELECT id, user_id, title, description, start_time, end_time, event_type, created_at
         FROM events WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create_event(pool: &SqlitePool, event: &NewEvent) -> Result<Event, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        "INSERT INTO events (user_id, title, description, start_time, end_time, event_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         RETURNING id, user_id, title, description, start_time, end_time, event_type, created_at",
    )
    .bind(event.user_id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.start_time)
    .bind(event.end_time)
    .bind(&event.event_type)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn update_event(
    pool: &SqlitePool,
    id: i64,
    update: &EventUpdate,
) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        "UPDATE events SET
           title = COALESCE(?1, title),
           description = COALESCE(?2, description),
           start_time = COALESCE(?3, start_time),
           end_time = COALESCE(?4, end_time),
           event_type = COALESCE(?5, event_type)
         WHERE id = ?6
         RETURNING id, user_id, title, description, start_time, end_time, event_type, created_at",
    )
    .bind(&update.title)
    .bind(&update.description)
    .bind(update.start_time)
    .bind(update.end_time)
    .bind(&update.event_type)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_event(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM events WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
