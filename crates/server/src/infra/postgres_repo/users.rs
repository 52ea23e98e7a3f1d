use chrono::Utc;
use sqlx::PgPool;

use crate::models::{Profile, UserCredentials, UserRow};
use crate::ports::repo::{NewUser, ProfileUpdate, UserUpdate};

const USER_COLUMNS: &str = "id, email, fcm_token, first_name, last_name, phone, created_at";

const PROFILE_COLUMNS: &str = r#"
    id, email, first_name, last_name, address, phone, emergency_name, emergency_phone,
    medical_info, date_of_birth, gender, blood_type, allergies, chronic_conditions,
    current_medications, past_surgeries, primary_physician, physician_contact,
    preferred_pharmacy, insurance_provider, insurance_policy, vaccination_records
"#;

pub async fn list_users(pool: &PgPool) -> Result<Vec<UserRow>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
    sqlx::query_as::<_, UserRow>(&sql).fetch_all(pool).await
}

pub async fn get_user(pool: &PgPool, id: i64) -> Result<Option<UserRow>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_credentials(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserCredentials>, sqlx::Error> {
    sqlx::query_as::<_, UserCredentials>(
        "SELECT id, email, password_hash FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn create_user(pool: &PgPool, user: &NewUser) -> Result<UserRow, sqlx::Error> {
    let sql = format!(
        "INSERT INTO users (email, password_hash, fcm_token, created_at)
         VALUES ($1, $2, $3, $4)
         RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.fcm_token)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
}

pub async fn ensure_user(pool: &PgPool, user: &NewUser) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (email, password_hash, fcm_token, created_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.fcm_token)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_user(
    pool: &PgPool,
    id: i64,
    update: &UserUpdate,
) -> Result<Option<UserRow>, sqlx::Error> {
    let sql = format!(
        "UPDATE users SET
           email = COALESCE($1, email),
           password_hash = COALESCE($2, password_hash),
           fcm_token = COALESCE($3, fcm_token)
         WHERE id = $4
         RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(&update.email)
        .bind(&update.password_hash)
        .bind(&update.fcm_token)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn delete_user(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_profile(pool: &PgPool, user_id: i64) -> Result<Option<Profile>, sqlx::Error> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, Profile>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn update_profile(
    pool: &PgPool,
    user_id: i64,
    update: &ProfileUpdate,
) -> Result<Option<Profile>, sqlx::Error> {
    let sql = format!(
        "UPDATE users SET
           first_name = COALESCE($1, first_name),
           last_name = COALESCE($2, last_name),
           address = COALESCE($3, address),
           phone = COALESCE($4, phone),
           emergency_name = COALESCE($5, emergency_name),
           emergency_phone = COALESCE($6, emergency_phone),
           medical_info = COALESCE($7, medical_info),
           date_of_birth = CASE WHEN $21 THEN $8 ELSE date_of_birth END,
           gender = COALESCE($9, gender),
           blood_type = COALESCE($10, blood_type),
           allergies = COALESCE($11, allergies),
           chronic_conditions = COALESCE($12, chronic_conditions),
           current_medications = COALESCE($13, current_medications),
           past_surgeries = COALESCE($14, past_surgeries),
           primary_physician = COALESCE($15, primary_physician),
           physician_contact = COALESCE($16, physician_contact),
           preferred_pharmacy = COALESCE($17, preferred_pharmacy),
           insurance_provider = COALESCE($18, insurance_provider),
           insurance_policy = COALESCE($19, insurance_policy),
           vaccination_records = COALESCE($20, vaccination_records)
         WHERE id = $22
         RETURNING {PROFILE_COLUMNS}"
    );
    sqlx::query_as::<_, Profile>(&sql)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.address)
        .bind(&update.phone)
        .bind(&update.emergency_name)
        .bind(&update.emergency_phone)
        .bind(&update.medical_info)
        .bind(update.date_of_birth.flatten())
        .bind(&update.gender)
        .bind(&update.blood_type)
        .bind(&update.allergies)
        .bind(&update.chronic_conditions)
        .bind(&update.current_medications)
        .bind(&update.past_surgeries)
        .bind(&update.primary_physician)
        .bind(&update.physician_contact)
        .bind(&update.preferred_pharmacy)
        .bind(&update.insurance_provider)
        .bind(&update.insurance_policy)
        .bind(&update.vaccination_records)
        .bind(update.date_of_birth.is_some())
        .bind(user_id)
        .fetch_optional(pool)
        .await
}
