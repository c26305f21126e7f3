use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - At least one client is configured
/// - Every client has a pre-import path
/// - Smart mode threshold lies within [0, 1]
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.clients.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one client must be configured under [clients.<name>]".to_string(),
        ));
    }

    for (name, client) in &config.clients {
        if client.pre_import_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "clients.{}.pre_import_path cannot be empty",
                name
            )));
        }
    }

    let threshold = config.smart_mode.threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ConfigError::ValidationError(format!(
            "smart_mode.threshold must be between 0 and 1, got {}",
            threshold
        )));
    }

    Ok(())
}
