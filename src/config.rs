use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::services::profile::InsightThresholds;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_CACHE_CAPACITY: u64 = 64;

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub max_file_size: usize,
    pub cache_capacity: u64,
    pub cv_threshold: f64,
    pub cardinality_ratio: f64,
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let defaults = InsightThresholds::default();

        Ok(Config {
            addr: env_or("SHEET_PROFILER_ADDR", DEFAULT_ADDR.parse()?)?,
            max_file_size: env_or("SHEET_PROFILER_MAX_FILE_SIZE", default_max_file_size())?,
            cache_capacity: env_or("SHEET_PROFILER_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY)?,
            cv_threshold: env_or("SHEET_PROFILER_CV_THRESHOLD", defaults.cv_threshold)?,
            cardinality_ratio: env_or(
                "SHEET_PROFILER_CARDINALITY_RATIO",
                defaults.cardinality_ratio,
            )?,
        })
    }

    pub fn thresholds(&self) -> InsightThresholds {
        InsightThresholds {
            cv_threshold: self.cv_threshold,
            cardinality_ratio: self.cardinality_ratio,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let defaults = InsightThresholds::default();
        Config {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_file_size: default_max_file_size(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cv_threshold: defaults.cv_threshold,
            cardinality_ratio: defaults.cardinality_ratio,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_keeps_policy_thresholds() {
        let config = Config::default();
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.thresholds().cv_threshold, 50.0);
        assert_eq!(config.thresholds().cardinality_ratio, 0.1);
    }

    #[test]
    fn env_or_falls_back_when_unset() {
        let value: usize = env_or("SHEET_PROFILER_TEST_UNSET_KEY", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn env_or_rejects_garbage() {
        std::env::set_var("SHEET_PROFILER_TEST_GARBAGE", "not-a-number");
        let result: Result<f64> = env_or("SHEET_PROFILER_TEST_GARBAGE", 1.0);
        assert!(result.is_err());
        std::env::remove_var("SHEET_PROFILER_TEST_GARBAGE");
    }
}
