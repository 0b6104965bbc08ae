use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Redis,
    Memory,
}

impl FromStr for Storage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(Storage::Redis),
            "memory" => Ok(Storage::Memory),
            other => Err(format!("expected redis or memory, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub storage: Storage,
    pub session_ttl: Duration,
    pub password_cost: u32,
}

impl Config {
    pub fn load() -> Result<Self> {
        let redis_url = match read_secret("REDIS_URL") {
            Some(url) => url,
            None => try_load("REDIS_URL", "redis://127.0.0.1:6379")?,
        };

        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            redis_url,
            storage: try_load("STORAGE", "redis")?,
            session_ttl: Duration::from_secs(try_load("SESSION_TTL_SECS", "604800")?),
            password_cost: password_cost(try_load("PASSWORD_COST", "12")?)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 1111,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            storage: Storage::Memory,
            session_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// bcrypt accepts work factors 4 through 31.
fn password_cost(cost: u32) -> Result<u32> {
    if (4..=31).contains(&cost) {
        Ok(cost)
    } else {
        warn!("Invalid PASSWORD_COST value: {cost}");
        Err(anyhow!("PASSWORD_COST must be between 4 and 31, got {cost}"))
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            anyhow!("Invalid {key} value: {e}")
        })
        .context("Environment misconfigured!")
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No {secret_name} secret mounted ({e}), falling back to environment");
        })
        .ok()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_parsing() {
        assert_eq!("redis".parse(), Ok(Storage::Redis));
        assert_eq!(" Memory ".parse(), Ok(Storage::Memory));
        assert!("postgres".parse::<Storage>().is_err());
    }

    #[test]
    fn test_password_cost_bounds() {
        assert_eq!(password_cost(4).unwrap(), 4);
        assert_eq!(password_cost(12).unwrap(), 12);
        assert!(password_cost(3).is_err());
        assert!(password_cost(32).is_err());
    }

    #[test]
    fn test_try_load_falls_back_to_default() {
        let port: u16 = try_load("CARBON_TEST_UNSET_PORT", "4321").unwrap();
        assert_eq!(port, 4321);
    }

    #[test]
    fn test_try_load_rejects_bad_default() {
        assert!(try_load::<u16>("CARBON_TEST_UNSET_PORT", "not-a-port").is_err());
    }
}
