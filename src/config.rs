use anyhow::Result;
use config::{Config, Environment, File};
use sea_orm::Database;
use serde::Deserialize;
use service::PasswordHasher;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::auth::JwtService;
use crate::schemas::AppState;

const DEV_JWT_SECRET: &str = "moneybook-development-secret";

/// Runtime settings, layered from built-in defaults, an optional
/// `moneybook.{toml,yaml,json}` file and environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub jwt_expires_in_secs: i64,
    /// bcrypt cost factor
    pub password_hash_cost: u32,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("moneybook").required(false))
                .add_source(Environment::default().try_parsing(true)),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let settings = builder
            .set_default("database_url", "sqlite://moneybook.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("jwt_expires_in_secs", 86_400)?
            .set_default("password_hash_cost", i64::from(service::password::DEFAULT_COST))?
            .set_default("request_timeout_secs", 30)?
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        if config.jwt_secret == DEV_JWT_SECRET {
            warn!("JWT_SECRET is not set, using the built-in development secret");
        }
        debug!(
            "Loaded configuration: bind_address={}, jwt_expires_in_secs={}, password_hash_cost={}",
            config.bind_address, config.jwt_expires_in_secs, config.password_hash_cost
        );
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Connect to the database and wire the services together
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url).await?;

    let hasher = PasswordHasher::new(config.password_hash_cost);
    let jwt = JwtService::new(&config.jwt_secret, config.jwt_expires_in_secs);

    Ok(AppState::new(db, hasher, jwt, config.request_timeout()))
}
