use crate::config::types::{Config, FetchConfig, StorageConfig, Task, ThrottleEntry};
use crate::ConfigError;
use std::collections::HashSet;

/// Validates the entire configuration
///
/// Every failure here is fatal at startup, before any fetch is attempted.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_storage_config(&config.storage)?;
    validate_tasks(&config.tasks)?;
    validate_throttles(&config.throttles)?;
    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.dir.is_empty() {
        return Err(ConfigError::Validation(
            "storage dir cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates fetch pool configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            config.concurrency
        )));
    }

    if config.write_concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "write-concurrency must be >= 1, got {}",
            config.write_concurrency
        )));
    }

    if config.id.is_empty() {
        return Err(ConfigError::Validation(
            "fetch id cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the task list
fn validate_tasks(tasks: &[Task]) -> Result<(), ConfigError> {
    if tasks.is_empty() {
        return Err(ConfigError::Validation(
            "no tasks found in the configuration file".to_string(),
        ));
    }

    for (i, task) in tasks.iter().enumerate() {
        if task.link.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "task {} has an empty link",
                i
            )));
        }
        if task.parser.is_empty() {
            return Err(ConfigError::Validation(format!(
                "task {} ('{}') has an empty parser name",
                i, task.link
            )));
        }
    }

    Ok(())
}

/// Validates throttle entries: durations must parse, hosts must be unique
fn validate_throttles(throttles: &[ThrottleEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for throttle in throttles {
        if throttle.host.is_empty() {
            return Err(ConfigError::Validation(
                "throttle host cannot be empty".to_string(),
            ));
        }

        if !seen.insert(throttle.host.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate throttle entry for host '{}'",
                throttle.host
            )));
        }

        throttle.duration()?;
    }

    Ok(())
}
