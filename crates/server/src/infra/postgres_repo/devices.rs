use chrono::Utc;
use sqlx::PgPool;

use crate::models::Device;
use crate::ports::repo::DeviceRegistration;

/// Re-registering a known MAC keeps its name/owner unless new values are given.
pub async fn register_device(
    pool: &PgPool,
    device: &DeviceRegistration,
) -> Result<Device, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        "INSERT INTO devices (mac, name, user_id, created_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (mac) DO UPDATE SET
           name = COALESCE(excluded.name, devices.name),
           user_id = COALESCE(excluded.user_id, devices.user_id)
         RETURNING id, mac, name, user_id, created_at",
    )
    .bind(&device.mac)
    .bind(&device.name)
    .bind(device.user_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn get_device(pool: &PgPool, id: i64) -> Result<Option<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        "SELECT id, mac, name, user_id, created_at FROM devices WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn get_device_by_mac(
    pool: &PgPool,
    mac: &str,
) -> Result<Option<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        "SELECT id, mac, name, user_id, created_at FROM devices WHERE mac = $1",
    )
    .bind(mac)
    .fetch_optional(pool)
    .await
}

pub async fn rename_device(
    pool: &PgPool,
    mac: &str,
    name: &str,
) -> Result<Option<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        "UPDATE devices SET name = $1 WHERE mac = $2
         RETURNING id, mac, name, user_id, created_at",
    )
    .bind(name)
    .bind(mac)
    .fetch_optional(pool)
    .await
}

pub async fn list_devices_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>(
        "SELECT id, mac, name, user_id, created_at FROM devices
         WHERE user_id = $1
         ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
