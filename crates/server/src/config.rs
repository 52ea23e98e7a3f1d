use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config invalid: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    Sqlite,
    Postgres,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub app: AppConfig,
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub sqlite: SqliteConfig,
    pub postgres: Option<PostgresConfig>,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub dev: DevConfig,
    pub seed: SeedConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub maps: MapsConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub mode: AppMode,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub dialect: String,
}

#[derive(Debug, Deserialize)]
pub struct SqliteConfig {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: String,
    pub schema: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_seconds: u64,
    pub device_api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct DevConfig {
    pub reset_on_start: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeedConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub from: String,
    pub fallback_recipient: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: "alert@smartsafety.local".to_string(),
            fallback_recipient: "admin@example.com".to_string(),
            endpoint: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub endpoint: Option<String>,
    pub server_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub api_base: String,
    pub model: String,
    pub api_key: String,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub rate_limit_requests: u32,
    pub rate_limit_window_seconds: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key: String::new(),
            max_retries: 3,
            base_delay_ms: 1000,
            rate_limit_requests: 10,
            rate_limit_window_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    pub api_base: String,
    pub api_key: String,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://maps.googleapis.com".to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfig {
    pub name: String,
    pub price_id: String,
    pub months: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    pub api_base: String,
    pub secret_key: String,
    pub frontend_url: String,
    pub webhook_secret: String,
    pub plans: Vec<PlanConfig>,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        let plans = [("premium_1m", 1), ("premium_3m", 3), ("premium_12m", 12)]
            .into_iter()
            .map(|(name, months)| PlanConfig {
                name: name.to_string(),
                price_id: format!("price_{name}"),
                months,
            })
            .collect();

        Self {
            api_base: "https://api.stripe.com".to_string(),
            secret_key: String::new(),
            frontend_url: "http://localhost:5173".to_string(),
            webhook_secret: String::new(),
            plans,
        }
    }
}

impl ServerConfig {
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let base_dir = path
            .parent()
            .ok_or_else(|| ConfigError::Invalid("config path has no parent".into()))?;

        let schema_path = base_dir.join("schemas").join("server.schema.json");
        let schema = load_schema(&schema_path).await?;
        let content = tokio::fs::read_to_string(path).await?;

        validate_toml(&schema, &content, &path.display().to_string())?;

        let mut config: ServerConfig = toml::from_str(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());

        if config.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret cannot be empty".into(),
            ));
        }

        Ok(config)
    }

    /// Secrets from the environment win over the file.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = get("DEVICE_API_KEY") {
            self.auth.device_api_key = v;
        }
        if let Some(v) = get("MAIL_API_KEY") {
            self.mail.api_key = Some(v);
        }
        if let Some(v) = get("PUSH_SERVER_KEY") {
            self.push.server_key = Some(v);
        }
        if let Some(v) = get("GEMINI_API_KEY") {
            self.assistant.api_key = v;
        }
        if let Some(v) = get("GOOGLE_MAPS_API_KEY") {
            self.maps.api_key = v;
        }
        if let Some(v) = get("STRIPE_SECRET_KEY") {
            self.payments.secret_key = v;
        }
        if let Some(v) = get("STRIPE_WEBHOOK_SECRET") {
            self.payments.webhook_secret = v;
        }
    }

    pub fn dialect(&self) -> Result<SqlDialect, ConfigError> {
        match self.database.dialect.trim().to_lowercase().as_str() {
            "sqlite" => Ok(SqlDialect::Sqlite),
            "postgres" => Ok(SqlDialect::Postgres),
            other => Err(ConfigError::Invalid(format!(
                "invalid database.dialect '{other}'"
            ))),
        }
    }

    pub fn sqlite_path(&self, base_dir: &Path) -> PathBuf {
        let raw = self.sqlite.path.trim();
        if raw.is_empty() {
            return base_dir.join("server.sqlite");
        }
        base_dir.join(raw)
    }
}

async fn load_schema(path: &Path) -> Result<String, ConfigError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|_| ConfigError::Invalid(format!("schema not found at {}", path.display())))
}

fn validate_toml(schema: &str, toml_input: &str, name: &str) -> Result<(), ConfigError> {
    let schema_json: serde_json::Value = serde_json::from_str(schema)
        .map_err(|e| ConfigError::Invalid(format!("schema parse error: {e}")))?;

    let compiled = jsonschema::validator_for(&schema_json)
        .map_err(|e| ConfigError::Invalid(format!("schema compile error: {e}")))?;

    let toml_value: toml::Value =
        toml::from_str(toml_input).map_err(|e| ConfigError::Invalid(format!("{name}: {e}")))?;

    let json_value =
        serde_json::to_value(toml_value).map_err(|e| ConfigError::Invalid(e.to_string()))?;

    let mut errors = compiled.iter_errors(&json_value);
    if let Some(err) = errors.next() {
        let mut messages = vec![err.to_string()];
        for e in errors.take(4) {
            messages.push(e.to_string());
        }
        return Err(ConfigError::Invalid(format!(
            "schema validation failed for {name}: {}",
            messages.join("; ")
        )));
    }

    Ok(())
}

pub(crate) fn validate_schema_name(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(
            "postgres schema cannot be empty".into(),
        ));
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::Invalid(format!(
            "invalid postgres schema '{trimmed}': only alphanumeric and '_' allowed"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = include_str!("../res/schemas/server.schema.json");
    const SAMPLE: &str = include_str!("../res/config.toml");

    async fn write_config(dir: &Path, body: &str) -> PathBuf {
        let schemas = dir.join("schemas");
        tokio::fs::create_dir_all(&schemas).await.unwrap();
        tokio::fs::write(schemas.join("server.schema.json"), SCHEMA)
            .await
            .unwrap();
        let path = dir.join("config.toml");
        tokio::fs::write(&path, body).await.unwrap();
        path
    }

    #[tokio::test]
    async fn loads_bundled_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), SAMPLE).await;

        let config = ServerConfig::load(&path).await.unwrap();

        assert_eq!(config.dialect().unwrap(), SqlDialect::Sqlite);
        assert_eq!(config.app.mode, AppMode::Dev);
        assert_eq!(config.assistant.max_retries, 3);
        assert_eq!(config.payments.plans.len(), 3);
    }

    #[tokio::test]
    async fn rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{SAMPLE}\n[surprise]\nvalue = 1\n");
        let path = write_config(dir.path(), &body).await;

        let err = ServerConfig::load(&path).await.unwrap_err();
        assert!(
            err.to_string().contains("schema validation failed"),
            "{err}"
        );
    }

    #[tokio::test]
    async fn app_section_only_takes_a_mode() {
        let dir = tempfile::tempdir().unwrap();
        let body = SAMPLE.replacen(
            "mode = \"dev\"",
            "mode = \"dev\"\ntimezone = \"Europe/Paris\"",
            1,
        );
        assert_ne!(body, SAMPLE);
        let path = write_config(dir.path(), &body).await;

        let err = ServerConfig::load(&path).await.unwrap_err();
        assert!(
            err.to_string().contains("schema validation failed"),
            "{err}"
        );
    }

    #[test]
    fn env_overrides_replace_secrets() {
        let mut config: ServerConfig = toml::from_str(SAMPLE).unwrap();

        config.apply_env_overrides(|key| match key {
            "JWT_SECRET" => Some("from-env".to_string()),
            "GEMINI_API_KEY" => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.assistant.api_key, "");
    }

    #[test]
    fn schema_names_are_restricted() {
        assert!(validate_schema_name("care_01").is_ok());
        assert!(validate_schema_name("bad-name").is_err());
        assert!(validate_schema_name("  ").is_err());
    }
}
