//! Configuration validation.
//!
//! Validates numeric ranges and backend coordinates, collecting all errors
//! into a single `ConfigError` so the user sees everything at once.

use studyhall_common::ConfigError;

use crate::schema::StudyhallConfig;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &StudyhallConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_backend(&mut errors, config);
    validate_realtime(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_backend(errors: &mut Vec<String>, config: &StudyhallConfig) {
    // Empty coordinates are allowed (offline / test use), but a ref without
    // a key or vice versa is always a mistake.
    let has_ref = !config.backend.project_ref.is_empty();
    let has_key = !config.backend.api_key.is_empty();
    if has_ref != has_key {
        errors.push("backend.project_ref and backend.api_key must be set together".into());
    }
}

fn validate_realtime(errors: &mut Vec<String>, config: &StudyhallConfig) {
    validate_range(
        errors,
        "realtime.heartbeat_interval",
        config.realtime.heartbeat_interval,
        5,
        300,
    );
    validate_range(
        errors,
        "realtime.reconnect_delay",
        config.realtime.reconnect_delay,
        1,
        60,
    );
    if config.realtime.max_reconnect_delay < config.realtime.reconnect_delay {
        errors.push(format!(
            "realtime.max_reconnect_delay = {} is less than realtime.reconnect_delay = {}",
            config.realtime.max_reconnect_delay, config.realtime.reconnect_delay
        ));
    }
    validate_range(
        errors,
        "realtime.event_buffer",
        u64::from(config.realtime.event_buffer),
        16,
        65536,
    );
}

/// Push an error if `value` is outside `[min, max]`.
fn validate_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate(&StudyhallConfig::default()).is_ok());
    }

    #[test]
    fn zero_heartbeat_fails() {
        let mut config = StudyhallConfig::default();
        config.realtime.heartbeat_interval = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("realtime.heartbeat_interval"));
    }

    #[test]
    fn max_reconnect_below_base_fails() {
        let mut config = StudyhallConfig::default();
        config.realtime.reconnect_delay = 10;
        config.realtime.max_reconnect_delay = 5;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("max_reconnect_delay"));
    }

    #[test]
    fn backend_key_without_ref_fails() {
        let mut config = StudyhallConfig::default();
        config.backend.api_key = "anon".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("must be set together"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = StudyhallConfig::default();
        config.realtime.heartbeat_interval = 0;
        config.realtime.event_buffer = 1;
        config.backend.project_ref = "abc".into();
        let err = validate(&config).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("heartbeat_interval"));
        assert!(msg.contains("event_buffer"));
        assert!(msg.contains("must be set together"));
    }
}
