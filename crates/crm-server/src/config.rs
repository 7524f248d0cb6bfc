use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Delay between background maintenance passes.
    pub maintenance_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("CRM_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("CRM_PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .context("CRM_PORT must be a port number")?;
        let db_path = lookup("CRM_DB_PATH").unwrap_or_else(|| "crm.db".into()).into();
        let maintenance_secs: u64 = lookup("CRM_MAINTENANCE_SECS")
            .unwrap_or_else(|| "3600".into())
            .parse()
            .context("CRM_MAINTENANCE_SECS must be a whole number of seconds")?;
        anyhow::ensure!(maintenance_secs > 0, "CRM_MAINTENANCE_SECS must be positive");

        Ok(Self {
            host,
            port,
            db_path,
            maintenance_interval: Duration::from_secs(maintenance_secs),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
