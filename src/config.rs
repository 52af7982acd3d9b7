use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Backing store for accounts and holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!(
                "Invalid LEDGER_STORE: {}. Must be 'postgres' or 'memory'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub purchase_timeout: Duration,
    pub store_backend: StoreBackend,
    pub run_migrations: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid BIND_ADDR: {}", e))?;
        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|e| format!("Invalid DATABASE_MAX_CONNECTIONS: {}", e))?;
        let timeout_ms = lookup("PURCHASE_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u64>()
            .map_err(|e| format!("Invalid PURCHASE_TIMEOUT_MS: {}", e))?;
        let store_backend = lookup("LEDGER_STORE")
            .unwrap_or_else(|| "postgres".to_string())
            .parse::<StoreBackend>()?;
        let run_migrations = lookup("RUN_MIGRATIONS")
            .unwrap_or_else(|| "true".to_string())
            .trim()
            .parse::<bool>()
            .map_err(|e| format!("Invalid RUN_MIGRATIONS: {}", e))?;

        let config = Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            bind_addr,
            max_connections,
            purchase_timeout: Duration::from_millis(timeout_ms),
            store_backend,
            run_migrations,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.store_backend == StoreBackend::Postgres && self.database_url.is_none() {
            return Err("LEDGER_STORE is postgres but DATABASE_URL is not set".to_string());
        }
        if self.purchase_timeout.is_zero() {
            return Err("PURCHASE_TIMEOUT_MS must be greater than zero".to_string());
        }
        if self.max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than zero".to_string());
        }
        Ok(())
    }
}
