use chrono::Utc;
use sqlx::PgPool;

use crate::models::Subscription;
use crate::ports::repo::{NewSubscription, SubscriptionUpdate};

const SUBSCRIPTION_SELECT: &str = r#"
    SELECT s.id, s.user_id, s.plan, s.status, s.renewal_date, s.created_at,
           u.email AS user_email
    FROM subscriptions s
    LEFT JOIN users u ON u.id = s.user_id
"#;

pub async fn list_subscriptions(pool: &PgPool) -> Result<Vec<Subscription>, sqlx::Error> {
    let sql = format!("{SUBSCRIPTION_SELECT} ORDER BY s.created_at DESC, s.id DESC");
    sqlx::query_as::<_, Subscription>(&sql).fetch_all(pool).await
}

pub async fn get_subscription(
    pool: &PgPool,
    id: i64,
) -> Result<Option<Subscription>, sqlx::Error> {
    let sql = format!("{SUBSCRIPTION_SELECT} WHERE s.id = $1");
    sqlx::query_as::<_, Subscription>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn latest_subscription_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<Subscription>, sqlx::Error> {
    let sql = format!(
        "{SUBSCRIPTION_SELECT}
         WHERE s.user_id = $1
         ORDER BY s.created_at DESC, s.id DESC
         LIMIT 1"
    );
    sqlx::query_as::<_, Subscription>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn create_subscription(
    pool: &PgPool,
    sub: &NewSubscription,
) -> Result<Subscription, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO subscriptions (user_id, plan, status, renewal_date, created_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(sub.user_id)
    .bind(&sub.plan)
    .bind(&sub.status)
    .bind(sub.renewal_date)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    get_subscription(pool, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_subscription(
    pool: &PgPool,
    id: i64,
    update: &SubscriptionUpdate,
) -> Result<Option<Subscription>, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE subscriptions SET
           plan = COALESCE($1, plan),
           status = COALESCE($2, status),
           renewal_date = COALESCE($3, renewal_date)
         WHERE id = $4",
    )
    .bind(&update.plan)
    .bind(&update.status)
    .bind(update.renewal_date)
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_subscription(pool, id).await
}

pub async fn delete_subscription(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn activate_subscription(
    pool: &PgPool,
    sub: &NewSubscription,
) -> Result<Subscription, sqlx::Error> {
    let Some(existing) = latest_subscription_for_user(pool, sub.user_id).await? else {
        return create_subscription(pool, sub).await;
    };
    let update = SubscriptionUpdate {
        plan: Some(sub.plan.clone()),
        status: Some(sub.status.clone()),
        renewal_date: Some(sub.renewal_date),
    };
    update_subscription(pool, existing.id, &update)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}
