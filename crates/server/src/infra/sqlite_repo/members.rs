//! Caregivers, patients and the links between them.
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{Caregiver, CaregiverPatientLink, MemberRecord, MemberSummary, Patient};

const CAREGIVER_SELECT: &str = r#"
    SELECT c.id, c.user_id, c.created_at,
           u.email AS user_email, u.first_name AS user_first_name, u.last_name AS user_last_name
    FROM caregivers c
    JOIN users u ON u.id = c.user_id
"#;

const PATIENT_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.created_at,
           u.email AS user_email, u.first_name AS user_first_name, u.last_name AS user_last_name
    FROM patients p
    JOIN users u ON u.id = p.user_id
"#;

fn summaries(rows: Vec<MemberRecord>) -> Vec<MemberSummary> {
    rows.into_iter().map(MemberSummary::from).collect()
}

pub async fn list_caregivers(pool: &SqlitePool) -> Result<Vec<MemberSummary>, sqlx::Error> {
    let sql = format!("{CAREGIVER_SELECT} ORDER BY c.id");
    let rows = sqlx::query_as::<_, MemberRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(summaries(rows))
}

pub async fn get_caregiver(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<MemberSummary>, sqlx::Error> {
    let sql = format!("{CAREGIVER_SELECT} WHERE c.id = ?1");
    let row = sqlx::query_as::<_, MemberRecord>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(MemberSummary::from))
}

pub async fn create_caregiver(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<MemberSummary, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO caregivers (user_id, created_at) VALUES (?1, ?2) RETURNING id",
    )
    .bind(user_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    get_caregiver(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn delete_caregiver(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM caregivers WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_caregivers_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<Caregiver>, sqlx::Error> {
    sqlx::query_as::<_, Caregiver>(
        "SELECT id, user_id, created_at FROM caregivers WHERE user_id = ?1 ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn patients_of_caregiver(
    pool: &SqlitePool,
    caregiver_id: i64,
) -> Result<Vec<MemberSummary>, sqlx::Error> {
    let sql = format!(
        "{PATIENT_SELECT}
         JOIN caregiver_patient_links l ON l.patient_id = p.id
         WHERE l.caregiver_id = ?1
         ORDER BY p.id"
    );
    let rows = sqlx::query_as::<_, MemberRecord>(&sql)
        .bind(caregiver_id)
        .fetch_all(pool)
        .await?;
    Ok(summaries(rows))
}

pub async fn link_patient(
    pool: &SqlitePool,
    caregiver_id: i64,
    patient_id: i64,
) -> Result<CaregiverPatientLink, sqlx::Error> {
    sqlx::query_as::<_, CaregiverPatientLink>(
        "INSERT INTO caregiver_patient_links (caregiver_id, patient_id, created_at)
         VALUES (?1, ?2, ?3)
         RETURNING id, caregiver_id, patient_id, created_at",
    )
    .bind(caregiver_id)
    .bind(patient_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn unlink_patient(
    pool: &SqlitePool,
    caregiver_id: i64,
    patient_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM caregiver_patient_links WHERE caregiver_id = ?1 AND patient_id = ?2",
    )
    .bind(caregiver_id)
    .bind(patient_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_patients(
    pool: &SqlitePool,
    user_id: Option<i64>,
) -> Result<Vec<MemberSummary>, sqlx::Error> {
    let sql = format!(
        "{PATIENT_SELECT}
         WHERE (?1 IS NULL OR p.user_id = ?1)
         ORDER BY p.id"
    );
    let rows = sqlx::query_as::<_, MemberRecord>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(summaries(rows))
}

pub async fn get_patient(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<MemberSummary>, sqlx::Error> {
    let sql = format!("{PATIENT_SELECT} WHERE p.id = ?1");
    let row = sqlx::query_as::<_, MemberRecord>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(MemberSummary::from))
}

pub async fn create_patient(pool: &SqlitePool, user_id: i64) -> Result<MemberSummary, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO patients (user_id, created_at) VALUES (?1, ?2) RETURNING id",
    )
    .bind(user_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    get_patient(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn delete_patient(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM patients WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_patients_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>(
        "SELECT id, user_id, created_at FROM patients WHERE user_id = ?1 ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn caregivers_of_patient(
    pool: &SqlitePool,
    patient_id: i64,
) -> Result<Vec<MemberSummary>, sqlx::Error> {
    let sql = format!(
        "{CAREGIVER_SELECT}
         JOIN caregiver_patient_links l ON l.caregiver_id = c.id
         WHERE l.patient_id = ?1
         ORDER BY c.id"
    );
    let rows = sqlx::query_as::<_, MemberRecord>(&sql)
        .bind(patient_id)
        .fetch_all(pool)
        .await?;
    Ok(summaries(rows))
}
