//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Lifetime of a login session.
    pub session_ttl_hours: i64,
    /// Interval between access-expiry sweeps.
    pub expiry_sweep: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `AGRILOG_ADDR` | Server bind address | `127.0.0.1:8080` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:agrilog.db?mode=rwc` |
    /// | `SESSION_TTL_HOURS` | Session lifetime | `168` |
    /// | `EXPIRY_SWEEP_SECS` | Expiry sweep interval | `300` |
    ///
    /// The AI gateway reads its own `AI_GATEWAY_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("AGRILOG_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:agrilog.db?mode=rwc".to_string());

        let session_ttl_hours = parse_var("SESSION_TTL_HOURS", 168)?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError::InvalidNumber("SESSION_TTL_HOURS"));
        }

        let sweep_secs = parse_var("EXPIRY_SWEEP_SECS", 300)?;
        if sweep_secs <= 0 {
            return Err(ConfigError::InvalidNumber("EXPIRY_SWEEP_SECS"));
        }

        Ok(Self {
            addr,
            database_url,
            session_ttl_hours,
            expiry_sweep: Duration::from_secs(sweep_secs as u64),
        })
    }
}

fn parse_var(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid AGRILOG_ADDR format")]
    InvalidAddr,

    #[error("{0} must be a positive whole number")]
    InvalidNumber(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_vars() {
            for var in ["AGRILOG_ADDR", "DATABASE_URL", "SESSION_TTL_HOURS", "EXPIRY_SWEEP_SECS"] {
                env::remove_var(var);
            }
        }

        clear_vars();
        let config = Config::from_env().unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_url, "sqlite:agrilog.db?mode=rwc");
        assert_eq!(config.session_ttl_hours, 168);
        assert_eq!(config.expiry_sweep, Duration::from_secs(300));

        env::set_var("AGRILOG_ADDR", "0.0.0.0:9000");
        env::set_var("SESSION_TTL_HOURS", "12");
        env::set_var("EXPIRY_SWEEP_SECS", "60");
        let config = Config::from_env().unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.session_ttl_hours, 12);
        assert_eq!(config.expiry_sweep, Duration::from_secs(60));

        env::set_var("AGRILOG_ADDR", "nowhere");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidAddr)));

        clear_vars();
        env::set_var("EXPIRY_SWEEP_SECS", "0");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidNumber("EXPIRY_SWEEP_SECS"))
        ));

        clear_vars();
    }
}
