//! GPS fixes and assistant conversation logs.
use chrono::Utc;
use sqlx::PgPool;

use crate::models::{GpsLocation, VoiceLog};
use crate::ports::repo::{NewLocation, NewVoiceLog};

pub async fn list_locations(
    pool: &PgPool,
    device_id: i64,
) -> Result<Vec<GpsLocation>, sqlx::Error> {
    sqlx::query_as::<_, GpsLocation>(
        "SELECT id, device_id, latitude, longitude, accuracy, recorded_at
         FROM gps_locations
         WHERE device_id = $1
         ORDER BY recorded_at DESC, id DESC",
    )
    .bind(device_id)
    .fetch_all(pool)
    .await
}

pub async fn add_location(
    pool: &PgPool,
    device_id: i64,
    fix: &NewLocation,
) -> Result<GpsLocation, sqlx::Error> {
    sqlx::query_as::<_, GpsLocation>(
        "INSERT INTO gps_locations (device_id, latitude, longitude, accuracy, recorded_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, device_id, latitude, longitude, accuracy, recorded_at",
    )
    .bind(device_id)
    .bind(fix.latitude)
    .bind(fix.longitude)
    .bind(fix.accuracy)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn latest_location(
    pool: &PgPool,
    device_id: i64,
) -> Result<Option<GpsLocation>, sqlx::Error> {
    sqlx::query_as::<_, GpsLocation>(
        "SELECT id, device_id, latitude, longitude, accuracy, recorded_at
         FROM gps_locations
         WHERE device_id = $1
         ORDER BY recorded_at DESC, id DESC
         LIMIT 1",
    )
    .bind(device_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_voice_logs(pool: &PgPool, user_id: i64) -> Result<Vec<VoiceLog>, sqlx::Error> {
    sqlx::query_as::<_, VoiceLog>(
        "SELECT id, user_id, message, response, error, created_at
         FROM voice_logs
         WHERE user_id = $1
         ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn insert_voice_log(pool: &PgPool, log: &NewVoiceLog) -> Result<VoiceLog, sqlx::Error> {
    sqlx::query_as::<_, VoiceLog>(
        "INSERT INTO voice_logs (user_id, message, response, error, created_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, user_id, message, response, error, created_at",
    )
    .bind(log.user_id)
    .bind(&log.message)
    .bind(&log.response)
    .bind(&log.error)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}
