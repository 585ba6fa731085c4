use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::csv_upload::DEFAULT_MAX_UPLOAD_BYTES;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5002";
const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:3000,https://localhost:3000,http://localhost:5174,https://localhost:5174";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!(
                "Invalid STORE_BACKEND: {}. Must be 'postgres' or 'memory'",
                other
            )),
        }
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("Invalid {} {}: {}", key, raw, e)),
        None => Ok(default),
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_db_connections: u32,
    pub run_migrations: bool,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = lookup("STORE_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .parse::<StoreBackend>()?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid BIND_ADDR {}: {}", bind_addr, e))?;

        let config = Self {
            store_backend,
            database_url: lookup("DATABASE_URL"),
            max_db_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                lookup("DATABASE_MAX_CONNECTIONS"),
                10,
            )?,
            run_migrations: parse_or("RUN_MIGRATIONS", lookup("RUN_MIGRATIONS"), true)?,
            bind_addr,
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                lookup("MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.store_backend == StoreBackend::Postgres && self.database_url.is_none() {
            return Err("STORE_BACKEND is postgres but DATABASE_URL is not set".to_string());
        }
        if self.max_db_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than zero".to_string());
        }
        if self.max_upload_bytes == 0 {
            return Err("MAX_UPLOAD_BYTES must be greater than zero".to_string());
        }
        Ok(())
    }
}
