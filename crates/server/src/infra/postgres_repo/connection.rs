//! Pool construction and schema bootstrap for Postgres.
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use tracing::info;

use crate::config::PostgresConfig;

const SCHEMA_SQL: &str = include_str!("../../../res/sql/postgres/schema.sql");

const TABLES: [&str; 11] = [
    "voice_logs",
    "gps_locations",
    "subscriptions",
    "events",
    "medical_records",
    "caregiver_patient_links",
    "patients",
    "caregivers",
    "alerts",
    "devices",
    "users",
];

/// `schema` must already be validated; it is created on first connect.
pub async fn create_pool(cfg: &PostgresConfig, schema: &str) -> Result<PgPool, sqlx::Error> {
    let ssl_mode = cfg.ssl_mode.parse::<PgSslMode>()?;
    let opts = PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .database(&cfg.database)
        .username(&cfg.user)
        .password(&cfg.password)
        .ssl_mode(ssl_mode);

    PgPoolOptions::new()
        .max_connections(10)
        .after_connect(set_search_path(schema.to_string()))
        .connect_with(opts)
        .await
}

#[allow(clippy::type_complexity)]
fn set_search_path(
    schema: String,
) -> impl Fn(
    &mut sqlx::PgConnection,
    sqlx::pool::PoolConnectionMetadata,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), sqlx::Error>> + Send + '_>>
{
    move |conn, _meta| {
        let schema_ident = quote_ident(&schema);
        Box::pin(async move {
            sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {schema_ident}"))
                .execute(&mut *conn)
                .await?;
            sqlx::query(&format!("SET search_path TO {schema_ident}"))
                .execute(&mut *conn)
                .await?;
            Ok(())
        })
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA_SQL.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("postgres schema applied");
    Ok(())
}

pub async fn reset(pool: &PgPool) -> Result<(), sqlx::Error> {
    let table_list = TABLES
        .iter()
        .map(|t| quote_ident(t))
        .collect::<Vec<_>>()
        .join(", ");
    sqlx::query(&format!(
        "TRUNCATE TABLE {table_list} RESTART IDENTITY CASCADE"
    ))
    .execute(pool)
    .await?;
    info!(tables = TABLES.len(), "postgres tables truncated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::quote_ident;

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(quote_ident("care"), "\"care\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
