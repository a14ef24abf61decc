//! Service configuration from environment variables.

use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use storage::TemporalRule;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8085";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 64;

/// Which catalog implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub listen_addr: String,
    pub storage: StorageBackend,
    /// Required when `storage` is Postgres.
    pub database_url: Option<String>,
    pub max_upload_mb: usize,
    pub temporal_rule: TemporalRule,
    /// Run schema migrations at startup.
    pub migrate: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            storage: StorageBackend::default(),
            database_url: None,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            temporal_rule: TemporalRule::default(),
            migrate: false,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("GEO_API_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(backend) = lookup("GEO_API_STORAGE") {
            config.storage = backend.parse()?;
        }
        config.database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if let Some(mb) = lookup("GEO_API_MAX_UPLOAD_MB") {
            config.max_upload_mb = mb
                .trim()
                .parse()
                .with_context(|| format!("GEO_API_MAX_UPLOAD_MB is not a number: {}", mb))?;
        }
        if let Some(rule) = lookup("GEO_API_TEMPORAL_RULE") {
            config.temporal_rule = rule.parse()?;
        }
        if let Some(migrate) = lookup("GEO_API_MIGRATE") {
            config.migrate = matches!(migrate.trim(), "1" | "true" | "yes");
        }

        if config.storage == StorageBackend::Postgres && config.database_url.is_none() {
            return Err(anyhow!("DATABASE_URL is required for the postgres backend"));
        }

        Ok(config)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}
