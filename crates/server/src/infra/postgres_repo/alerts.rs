use chrono::Utc;
use sqlx::PgPool;

use crate::models::{AlertRecord, AlertView, Contact};
use crate::ports::repo::NewAlert;

const ALERT_SELECT: &str = r#"
    SELECT a.id, a.message, a.lat, a.lng, a.device_id, a.user_id, a.handled, a.created_at,
           d.mac AS device_mac, d.name AS device_name,
           u.email AS user_email, u.first_name AS user_first_name, u.last_name AS user_last_name
    FROM alerts a
    LEFT JOIN devices d ON d.id = a.device_id
    LEFT JOIN users u ON u.id = a.user_id
"#;

pub async fn list_alerts(
    pool: &PgPool,
    device_id: Option<i64>,
) -> Result<Vec<AlertView>, sqlx::Error> {
    let sql = format!(
        "{ALERT_SELECT}
         WHERE ($1 IS NULL OR a.device_id = $1)
         ORDER BY a.created_at DESC, a.id DESC"
    );
    let rows = sqlx::query_as::<_, AlertRecord>(&sql)
        .bind(device_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(AlertView::from).collect())
}

pub async fn get_alert(pool: &PgPool, id: i64) -> Result<Option<AlertView>, sqlx::Error> {
    let sql = format!("{ALERT_SELECT} WHERE a.id = $1");
    let row = sqlx::query_as::<_, AlertRecord>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(AlertView::from))
}

pub async fn create_alert(pool: &PgPool, alert: &NewAlert) -> Result<AlertView, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO alerts (message, lat, lng, device_id, user_id, handled, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id",
    )
    .bind(&alert.message)
    .bind(alert.lat)
    .bind(alert.lng)
    .bind(alert.device_id)
    .bind(alert.user_id)
    .bind(false)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    get_alert(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn set_alert_handled(
    pool: &PgPool,
    id: i64,
    handled: bool,
) -> Result<Option<AlertView>, sqlx::Error> {
    let result = sqlx::query("UPDATE alerts SET handled = $1 WHERE id = $2")
        .bind(handled)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_alert(pool, id).await
}

pub async fn delete_alert(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM alerts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn linked_caregiver_contacts(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>(
        "SELECT DISTINCT u.id AS user_id, u.email, u.first_name, u.fcm_token
         FROM patients p
         JOIN caregiver_patient_links l ON l.patient_id = p.id
         JOIN caregivers c ON c.id = l.caregiver_id
         JOIN users u ON u.id = c.user_id
         WHERE p.user_id = $1
         ORDER BY user_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
