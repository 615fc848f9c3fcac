use std::time::Duration;

use anyhow::Result;
use config::{Config, ConfigBuilder, builder::DefaultState};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub invitation: InvitationConfig,
    pub activation: ActivationConfig,
    pub reconciliation: ReconciliationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
    pub timeout_ms: u64,
}

impl DatabaseConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Connection settings for the GoTrue-compatible identity provider.
#[derive(Clone, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the provider, e.g. `https://project.supabase.co`.
    pub url: String,
    /// Public (anon) key sent as the `apikey` header on user-scoped calls.
    pub api_key: String,
    /// Service-role key used for admin calls (invite, delete, list).
    pub service_role_key: String,
    pub timeout_ms: u64,
}

impl IdentityConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Keys stay out of the startup log line.
impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("service_role_key", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub serve_origin: Option<String>,
    /// Origins allowed by the CORS pre-flight. Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the server address as a string in the format "host:port".
    #[must_use]
    pub fn serve_origin(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// ## Summary
    /// Returns the server origin URL.
    #[must_use]
    pub fn origin(&self) -> String {
        if let Some(origin) = &self.serve_origin {
            origin.clone()
        } else {
            self.serve_origin()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationConfig {
    /// Attempts made for each profile-store write before giving up.
    pub write_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl InvitationConfig {
    #[must_use]
    pub const fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivationConfig {
    pub min_password_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// Identities younger than this are skipped; they may belong to an
    /// invitation that is still running.
    pub min_age_secs: i64,
}

impl ReconciliationConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Settings {
    /// ## Summary
    /// Returns a config builder pre-populated with every default value.
    ///
    /// ## Errors
    /// Returns an error if a default cannot be set.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("database.max_connections", 4)?
            .set_default("database.timeout_ms", 5000)?
            .set_default("identity.timeout_ms", 10000)?
            .set_default("logging.level", "debug")?
            .set_default("invitation.write_attempts", 4)?
            .set_default("invitation.retry_base_delay_ms", 200)?
            .set_default("activation.min_password_length", 6)?
            .set_default("reconciliation.enabled", true)?
            .set_default("reconciliation.interval_secs", 300)?
            .set_default("reconciliation.min_age_secs", 120)?)
    }

    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// Nested keys use a double underscore, e.g. `IDENTITY__SERVICE_ROLE_KEY`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Self::defaults()?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
