use anyhow::{Context, Result};
use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub skip_migrations: bool,
    pub port: u16,
    pub jwt_secret: String,
    pub allowed_origins: Vec<String>,
    /// Offset of the pools' local time from UTC, used to render slot times.
    pub pool_utc_offset_minutes: i32,
    /// 0 disables the expiry sweeper.
    pub reservation_pending_ttl_minutes: u64,
    pub reservation_sweep_interval_secs: u64,
    pub gql_introspection: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 30),
            skip_migrations: env::var("SKIP_MIGRATIONS")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            port: parse_or("PORT", 8080),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:3001".to_string())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            pool_utc_offset_minutes: parse_or("POOL_UTC_OFFSET_MINUTES", 540),
            reservation_pending_ttl_minutes: parse_or("RESERVATION_PENDING_TTL_MINUTES", 0),
            reservation_sweep_interval_secs: parse_or("RESERVATION_SWEEP_INTERVAL_SECS", 60),
            gql_introspection: env::var("GQL_INTROSPECTION")
                .map(|v| v == "true")
                .unwrap_or(false),
        })
    }

    /// Configuration for tests and tools that never touch the environment.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            database_max_connections: 5,
            skip_migrations: true,
            port: 0,
            jwt_secret: jwt_secret.to_string(),
            allowed_origins: Vec::new(),
            pool_utc_offset_minutes: 540,
            reservation_pending_ttl_minutes: 0,
            reservation_sweep_interval_secs: 60,
            gql_introspection: true,
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
