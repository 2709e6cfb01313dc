use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application configuration, layered from defaults, an optional
/// environment-specific file, and `APP__`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_connect_timeout_secs: u64,
    pub db_idle_timeout_secs: u64,
    pub db_acquire_timeout_secs: u64,
    pub log_level: String,
    pub environment: String,
}

impl AppConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

    let config = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8080_i64)?
        .set_default("database_url", "sqlite::memory:")?
        .set_default("db_max_connections", 10_i64)?
        .set_default("db_min_connections", 1_i64)?
        .set_default("db_connect_timeout_secs", 30_i64)?
        .set_default("db_idle_timeout_secs", 600_i64)?
        .set_default("db_acquire_timeout_secs", 8_i64)?
        .set_default("log_level", "info")?
        .set_default("environment", run_env.clone())?
        .add_source(File::with_name(&format!("config/{}", run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    config.try_deserialize()
}
