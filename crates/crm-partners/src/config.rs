use std::net::SocketAddr;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Origin of the CRM the lure posts to.
    pub target_base: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("PARTNERS_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("PARTNERS_PORT")
            .unwrap_or_else(|| "9999".into())
            .parse()
            .context("PARTNERS_PORT must be a port number")?;
        let target_base =
            lookup("PARTNERS_TARGET_URL").unwrap_or_else(|| "http://localhost:8080".into());
        anyhow::ensure!(
            target_base.starts_with("http://") || target_base.starts_with("https://"),
            "PARTNERS_TARGET_URL must be an http(s) origin"
        );

        Ok(Self {
            host,
            port,
            target_base,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.addr().unwrap().to_string(), "0.0.0.0:9999");
        assert_eq!(cfg.target_base, "http://localhost:8080");
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("PARTNERS_HOST", "127.0.0.1"),
            ("PARTNERS_PORT", "9000"),
            ("PARTNERS_TARGET_URL", "http://crm.lab:8080"),
        ])
        .unwrap();
        assert_eq!(cfg.addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.target_base, "http://crm.lab:8080");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("PARTNERS_PORT", "ninety")]).is_err());
        assert!(config(&[("PARTNERS_PORT", "99999")]).is_err());
        assert!(config(&[("PARTNERS_TARGET_URL", "localhost:8080")]).is_err());
        assert!(config(&[("PARTNERS_HOST", "not a host")]).unwrap().addr().is_err());
    }
}
