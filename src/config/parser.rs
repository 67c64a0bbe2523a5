use crate::config::types::Settings;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Parses settings from TOML text without applying overrides or validation
pub fn parse_settings(content: &str) -> Result<Settings, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Loads, overrides and validates settings from the given path
///
/// Environment overrides (`MAIN_ADDRESS`, `COOLDOWN_MIN`, ...) are applied
/// after the file is parsed and before validation, so the returned
/// settings are final for the rest of the run.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use linkreach::config::load_settings;
///
/// let settings = load_settings(Path::new("linkreach.toml")).unwrap();
/// println!("Cooldown: {:?}", settings.cooldown);
/// ```
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    load_settings_from(path, |key| std::env::var(key).ok())
}

/// Resolves settings from an optional file plus the process environment
///
/// Without a file the defaults are used as the base layer.
pub fn resolve_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    match path {
        Some(path) => load_settings(path),
        None => {
            let mut settings = Settings::default();
            apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
            validate(&settings)?;
            Ok(settings)
        }
    }
}

/// Same as [`load_settings`] with an explicit variable lookup
pub fn load_settings_from<F>(path: &Path, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let content = std::fs::read_to_string(path)?;
    let mut settings = parse_settings(&content)?;
    apply_env_overrides(&mut settings, lookup)?;
    validate(&settings)?;
    Ok(settings)
}

/// Applies environment-style overrides on top of parsed settings
///
/// Empty values are ignored. Numeric values that fail to parse are
/// reported rather than silently replaced by defaults.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(value) = get("MAIN_ADDRESS") {
        settings.main_address = value;
    }
    if let Some(value) = get("CACHE_DIR") {
        settings.cache_dir = PathBuf::from(value);
    }
    if let Some(value) = get("PROFILEBUTTON_MESSAGE") {
        settings.button_labels.message = value;
    }
    if let Some(value) = get("PROFILEBUTTON_CONNECT") {
        settings.button_labels.connect = value;
    }
    if let Some(value) = get("PROFILEBUTTON_FOLLOW") {
        settings.button_labels.follow = value;
    }
    if let Some(value) = get("PROFILEBUTTON_SHOWMORE") {
        settings.button_labels.show_more = value;
    }

    let mut cooldown = settings.cooldown;
    if let Some(value) = get("COOLDOWN_MIN") {
        cooldown.min = parse_number("COOLDOWN_MIN", &value)?;
    }
    if let Some(value) = get("COOLDOWN_MAX") {
        cooldown.max = parse_number("COOLDOWN_MAX", &value)?;
    }
    settings.cooldown = cooldown;

    if let Some(value) = get("TIMEOUT") {
        settings.checkpoint_timeout_seconds = value.trim().parse().map_err(|_| {
            ConfigError::Validation(format!("TIMEOUT must be a whole number of seconds, got '{}'", value))
        })?;
    }
    if let Some(value) = get("HEADLESS") {
        settings.headless = match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            other => {
                return Err(ConfigError::Validation(format!(
                    "HEADLESS must be a boolean, got '{}'",
                    other
                )))
            }
        };
    }

    Ok(())
}

fn parse_number(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::Validation(format!("{} must be a number of seconds, got '{}'", key, value)))
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a run can be matched to the configuration it used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads settings and returns them together with the file hash
pub fn load_settings_with_hash(path: &Path) -> Result<(Settings, String), ConfigError> {
    let settings = load_settings(path)?;
    let hash = compute_config_hash(path)?;
    Ok((settings, hash))
}
