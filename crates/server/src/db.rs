use std::path::Path;
use std::sync::Arc;

use crate::auth::hash_password;
use crate::config::{AppMode, ConfigError, ServerConfig, SqlDialect, validate_schema_name};
use crate::infra::postgres_repo::PostgresRepo;
use crate::infra::sqlite_repo::SqliteRepo;
use crate::ports::repo::{NewUser, Repo};

pub async fn connect_repo(
    config: &ServerConfig,
    config_path: &Path,
) -> Result<Arc<dyn Repo>, ConfigError> {
    match config.dialect()? {
        SqlDialect::Sqlite => {
            let base_dir = config_path
                .parent()
                .ok_or_else(|| ConfigError::Invalid("config path has no parent".into()))?;
            let path = config.sqlite_path(base_dir);

            let repo = SqliteRepo::open(&path)
                .await
                .map_err(|e| ConfigError::Invalid(format!("sqlite connect failed: {e}")))?;

            tracing::info!(path = %path.display(), "sqlite repository ready");
            Ok(Arc::new(repo))
        }
        SqlDialect::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .ok_or_else(|| ConfigError::Invalid("postgres section missing".into()))?;
            let schema = validate_schema_name(&pg.schema)?;

            let repo = PostgresRepo::connect(pg, &schema)
                .await
                .map_err(|e| ConfigError::Invalid(format!("postgres connect failed: {e}")))?;

            tracing::info!(host = %pg.host, schema = %schema, "postgres repository ready");
            Ok(Arc::new(repo))
        }
    }
}

/// Applies the schema, then in dev mode optionally wipes data and ensures
/// the seed account exists.
pub async fn prepare_database(config: &ServerConfig, repo: &dyn Repo) -> Result<(), ConfigError> {
    repo.apply_schema()
        .await
        .map_err(|e| ConfigError::Invalid(format!("schema apply failed: {e}")))?;

    if config.app.mode != AppMode::Dev {
        return Ok(());
    }

    if config.dev.reset_on_start {
        repo.reset()
            .await
            .map_err(|e| ConfigError::Invalid(format!("dev reset failed: {e}")))?;
        tracing::warn!("dev reset cleared all tables");
    }

    ensure_seed_user(repo, &config.seed.email, &config.seed.password).await
}

pub async fn ensure_seed_user(
    repo: &dyn Repo,
    email: &str,
    password: &str,
) -> Result<(), ConfigError> {
    let password_hash =
        hash_password(password).map_err(|e| ConfigError::Invalid(format!("hash password: {e}")))?;

    let user = NewUser {
        email: email.trim().to_string(),
        password_hash,
        fcm_token: None,
    };

    let created = repo
        .ensure_user(&user)
        .await
        .map_err(|e| ConfigError::Invalid(format!("seed user insert failed: {e}")))?;

    if created {
        tracing::info!(email = %user.email, "seed user created");
    }

    Ok(())
}
