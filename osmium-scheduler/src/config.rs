use std::env;
use std::time::Duration;

use osmium_common::error::Error;
use osmium_common::lock::DEFAULT_LOCK_TIMEOUT;

/// Scheduler-wide tunables.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Cap on completed attempts; a task failing transiently at the cap
    /// becomes permanently failed.
    pub max_attempts: i32,
    /// Per-lock acquisition timeout.
    pub lock_timeout: Duration,
    /// Delay between scheduler ticks.
    pub tick_interval: Duration,
    /// Delay between registrator sweeps.
    pub registration_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            tick_interval: Duration::from_secs(10),
            registration_interval: Duration::from_secs(60),
        }
    }
}

impl SchedulerConfig {
    /// Read overrides from `OSMIUM_*` environment variables, falling back
    /// to the defaults for anything unset.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(v) = parse_env::<i32>("OSMIUM_MAX_ATTEMPTS")? {
            config.max_attempts = v;
        }
        if let Some(v) = parse_env::<u64>("OSMIUM_LOCK_TIMEOUT_SECS")? {
            config.lock_timeout = Duration::from_secs(v);
        }
        if let Some(v) = parse_env::<u64>("OSMIUM_TICK_INTERVAL_SECS")? {
            config.tick_interval = Duration::from_secs(v);
        }
        if let Some(v) = parse_env::<u64>("OSMIUM_REGISTRATION_INTERVAL_SECS")? {
            config.registration_interval = Duration::from_secs(v);
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, Error>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("invalid {name}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = SchedulerConfig::default();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.lock_timeout, Duration::from_secs(3));
    }
}
