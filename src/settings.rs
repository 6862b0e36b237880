//! Typed, environment-overridable tunables for this crate's own pool sizing,
//! timeouts, and algorithm defaults. This is not a general configuration
//! subsystem: it knows nothing about application config files, and callers
//! wire the result into [`crate::pool::PoolConfig`] and
//! [`crate::executor::ExecutionParams`] themselves.

use crate::pool::PoolConfig;
use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub struct Settings {
    pub min_workers: usize,
    pub max_workers: usize,
    pub idle_timeout_ms: u64,
    pub max_queue: usize,
    pub task_timeout_ms: u64,
    pub drain_timeout_ms: u64,
    pub default_kerf: u32,
    pub default_min_usable_waste: u32,
    pub default_allow_rotation: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            min_workers: 1,
            max_workers: 4,
            idle_timeout_ms: 30_000,
            max_queue: 256,
            task_timeout_ms: 60_000,
            drain_timeout_ms: 10_000,
            default_kerf: 3,
            default_min_usable_waste: 50,
            default_allow_rotation: true,
        }
    }
}

impl Settings {
    /// Reads overrides from `CUTSTOCK_*` environment variables, falling back
    /// field-by-field to [`Settings::default`]. A malformed value is logged
    /// as a warning and the default is kept rather than failing the whole
    /// load.
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Settings {
            min_workers: env_usize("CUTSTOCK_MIN_WORKERS", defaults.min_workers),
            max_workers: env_usize("CUTSTOCK_MAX_WORKERS", defaults.max_workers),
            idle_timeout_ms: env_u64("CUTSTOCK_IDLE_TIMEOUT_MS", defaults.idle_timeout_ms),
            max_queue: env_usize("CUTSTOCK_MAX_QUEUE", defaults.max_queue),
            task_timeout_ms: env_u64("CUTSTOCK_TASK_TIMEOUT_MS", defaults.task_timeout_ms),
            drain_timeout_ms: env_u64("CUTSTOCK_DRAIN_TIMEOUT_MS", defaults.drain_timeout_ms),
            default_kerf: env_u32("CUTSTOCK_DEFAULT_KERF", defaults.default_kerf),
            default_min_usable_waste: env_u32("CUTSTOCK_DEFAULT_MIN_USABLE_WASTE", defaults.default_min_usable_waste),
            default_allow_rotation: defaults.default_allow_rotation,
        }
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            min_workers: self.min_workers,
            max_workers: self.max_workers,
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            max_queue: self.max_queue,
            task_timeout: Duration::from_millis(self.task_timeout_ms),
            drain_timeout: Duration::from_millis(self.drain_timeout_ms),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    parse_env(key, default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    parse_env(key, default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    parse_env(key, default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            log::warn!(target: "cutstock_core::settings", "ignoring malformed {key}={value:?}");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.max_workers, 4);
        assert_eq!(settings.default_kerf, 3);
    }

    #[test]
    fn malformed_env_value_falls_back_to_default() {
        std::env::set_var("CUTSTOCK_MAX_WORKERS", "not-a-number");
        let settings = Settings::from_env();
        assert_eq!(settings.max_workers, Settings::default().max_workers);
        std::env::remove_var("CUTSTOCK_MAX_WORKERS");
    }

    #[test]
    fn valid_env_value_overrides_default() {
        std::env::set_var("CUTSTOCK_DEFAULT_KERF", "7");
        let settings = Settings::from_env();
        assert_eq!(settings.default_kerf, 7);
        std::env::remove_var("CUTSTOCK_DEFAULT_KERF");
    }
}
