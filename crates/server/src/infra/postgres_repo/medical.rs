use chrono::Utc;
use sqlx::PgPool;

use crate::models::MedicalRecord;
use crate::ports::repo::{MedicalRecordUpdate, NewMedicalRecord};

pub async fn list_medical_records(
    pool: &PgPool,
    patient_id: Option<i64>,
) -> Result<Vec<MedicalRecord>, sqlx::Error> {
    sqlx::query_as::<_, MedicalRecord>(
        "SELECT id, patient_id, medical_condition, notes, created_at, updated_at
         FROM medical_records
         WHERE ($1 IS NULL OR patient_id = $1)
         ORDER BY created_at DESC, id DESC",
    )
    .bind(patient_id)
    .fetch_all(pool)
    .await
}

pub async fn create_medical_record(
    pool: &PgPool,
    record: &NewMedicalRecord,
) -> Result<MedicalRecord, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, MedicalRecord>(
        "INSERT INTO medical_records (patient_id, medical_condition, notes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $4)
         RETURNING id, patient_id, medical_condition, notes, created_at, updated_at",
    )
    .bind(record.patient_id)
    .bind(&record.medical_condition)
    .bind(&record.notes)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update_medical_record(
    pool: &PgPool,
    id: i64,
    update: &MedicalRecordUpdate,
) -> Result<Option<MedicalRecord>, sqlx::Error> {
    sqlx::query_as::<_, MedicalRecord>(
        "UPDATE medical_records SET
           medical_condition = COALESCE($1, medical_condition),
           notes = COALESCE($2, notes),
           updated_at = $3
         WHERE id = $4
         RETURNING id, patient_id, medical_condition, notes, created_at, updated_at",
    )
    .bind(&update.medical_condition)
    .bind(&update.notes)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_medical_record(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM medical_records WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
