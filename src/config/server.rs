use crate::utils::error::{Result, TrackerError};
use crate::utils::validation::{self, Validate};
use std::net::SocketAddr;
use std::time::Duration;

/// Runtime settings of the web service, read from `APP_NAME`, `APP_ENV`, `PORT`
/// and optional overrides from the command line.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub app_name: String,
    pub app_env: String,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
    pub job_ttl: Duration,
    pub cleanup_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: "reddit-tracker".to_string(),
            app_env: "production".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: 4,
            request_timeout: Duration::from_secs(300),
            max_body_bytes: 16 * 1024 * 1024,
            job_ttl: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(3600),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup("APP_NAME").filter(|v| !v.is_empty()) {
            config.app_name = name;
        }
        if let Some(env) = lookup("APP_ENV").filter(|v| !v.is_empty()) {
            config.app_env = env;
        }
        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| TrackerError::InvalidConfigValueError {
                    field: "PORT".to_string(),
                    value: port.clone(),
                    reason: "must be a port number".to_string(),
                })?;
        }

        Ok(config)
    }

    /// `--bind host:port` overrides host and port together.
    pub fn apply_bind(&mut self, bind: &str) -> Result<()> {
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| TrackerError::InvalidConfigValueError {
                field: "bind".to_string(),
                value: bind.to_string(),
                reason: format!("{}", e),
            })?;
        self.host = addr.ip().to_string();
        self.port = addr.port();
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| TrackerError::ConfigError {
                message: format!("invalid bind address {}:{}: {}", self.host, self.port, e),
            })
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("APP_NAME", &self.app_name)?;
        validation::validate_range("workers", self.workers, 1, 256)?;
        validation::validate_range("timeout", self.request_timeout.as_secs(), 1, 3600)?;
        self.bind_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.workers, 4);
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert!(config.is_production());
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_port_from_env_and_bind_override() {
        let mut config = ServerConfig::from_lookup(|key| match key {
            "PORT" => Some("9090".to_string()),
            "APP_ENV" => Some("development".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.port, 9090);
        assert!(!config.is_production());

        config.apply_bind("127.0.0.1:8000").unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert!(config.apply_bind("not-an-addr").is_err());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = ServerConfig::from_lookup(|key| (key == "PORT").then(|| "http".to_string()));
        assert!(err.is_err());
    }
}
