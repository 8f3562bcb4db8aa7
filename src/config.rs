use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, str::FromStr};

use crate::game::GameDefaults;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub game: GameDefaults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            max_connections: env_number("DATABASE_MAX_CONNECTIONS", "10")?,
        };

        let server = ServerConfig {
            host: env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_number("PORT", "3000")?,
        };

        let game = GameDefaults {
            default_score: env_number("DEFAULT_SCORE", "10")?,
            default_key_count: env_number("DEFAULT_KEY_COUNT", "3")?,
            reveal_delay_ms: env_number("REVEAL_DELAY_MS", "200")?,
            finished_game_ttl_secs: env_number("FINISHED_GAME_TTL_SECS", "600")?,
            idle_game_ttl_secs: env_number("IDLE_GAME_TTL_SECS", "3600")?,
        };

        Ok(Config {
            database,
            server,
            game,
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Read a numeric variable; unset means `default`, anything unparsable is an error
fn env_number<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_number(name, env::var(name).ok().as_deref(), default)
}

fn parse_number<T>(name: &str, value: Option<&str>, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .unwrap_or(default)
        .parse()
        .with_context(|| format!("{} must be a number", name))
}
