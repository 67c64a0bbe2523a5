use crate::config::types::{ButtonLabels, Cooldown, Settings};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    validate_main_address(&settings.main_address)?;

    if settings.cache_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "cache_dir cannot be empty".to_string(),
        ));
    }

    validate_button_labels(&settings.button_labels)?;
    validate_cooldown(&settings.cooldown)?;

    if settings.checkpoint_timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "checkpoint_timeout_seconds must be > 0".to_string(),
        ));
    }

    if settings.element_timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "element_timeout_seconds must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates the site root address
fn validate_main_address(address: &str) -> Result<(), ConfigError> {
    let url = Url::parse(address)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid main_address '{}': {}", address, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "main_address '{}' must use http or https",
            address
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "main_address '{}' has no host",
            address
        )));
    }

    Ok(())
}

/// Labels drive state detection, so they must be present and tell states apart
fn validate_button_labels(labels: &ButtonLabels) -> Result<(), ConfigError> {
    for (name, value) in [
        ("message", &labels.message),
        ("connect", &labels.connect),
        ("follow", &labels.follow),
        ("show_more", &labels.show_more),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "button label '{}' cannot be empty",
                name
            )));
        }
    }

    if labels.message == labels.connect
        || labels.message == labels.follow
        || labels.connect == labels.follow
    {
        return Err(ConfigError::Validation(format!(
            "button labels must be distinct, got message='{}' connect='{}' follow='{}'",
            labels.message, labels.connect, labels.follow
        )));
    }

    Ok(())
}

/// Validates the cooldown range
fn validate_cooldown(cooldown: &Cooldown) -> Result<(), ConfigError> {
    if !cooldown.min.is_finite() || !cooldown.max.is_finite() {
        return Err(ConfigError::Validation(
            "cooldown bounds must be finite numbers".to_string(),
        ));
    }

    if cooldown.min < 0.0 {
        return Err(ConfigError::Validation(format!(
            "cooldown.min must be >= 0, got {}",
            cooldown.min
        )));
    }

    if cooldown.min > cooldown.max {
        return Err(ConfigError::Validation(format!(
            "cooldown.min ({}) must not exceed cooldown.max ({})",
            cooldown.min, cooldown.max
        )));
    }

    Ok(())
}
