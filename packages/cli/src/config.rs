use std::env;
use std::num::ParseIntError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid update interval: {0}")]
    InvalidInterval(ParseIntError),
    #[error("Update interval must be at least 1ms, got {0}")]
    IntervalOutOfRange(u64),
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub cors_origin: String,
    pub update_interval_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_str = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let interval_str =
            env::var("UPDATE_INTERVAL_MS").unwrap_or_else(|_| "2000".to_string());

        Self::parse(&port_str, cors_origin, &interval_str)
    }

    fn parse(
        port_str: &str,
        cors_origin: String,
        interval_str: &str,
    ) -> Result<Self, ConfigError> {
        let port = port_str.parse::<u16>()?;
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let update_interval_ms = interval_str
            .parse::<u64>()
            .map_err(ConfigError::InvalidInterval)?;
        if update_interval_ms == 0 {
            return Err(ConfigError::IntervalOutOfRange(update_interval_ms));
        }

        Ok(Config {
            port,
            cors_origin,
            update_interval_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_cleanly() {
        let config = Config::parse("3000", "http://localhost:3000".to_string(), "2000").unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.update_interval_ms, 2000);
    }

    #[test]
    fn port_zero_is_rejected() {
        let err = Config::parse("0", String::new(), "2000").unwrap_err();
        assert!(matches!(err, ConfigError::PortOutOfRange(0)));
    }

    #[test]
    fn garbage_port_is_rejected() {
        assert!(Config::parse("not-a-port", String::new(), "2000").is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = Config::parse("3000", String::new(), "0").unwrap_err();
        assert!(matches!(err, ConfigError::IntervalOutOfRange(0)));
    }
}
