// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as a parseable base URL and non-zero timings.

use crate::diagnostic::ConfigError;
use crate::model::CellarConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CellarConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.api.base_url.trim();
    match reqwest::Url::parse(base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ConfigError::Validation {
            message: format!(
                "api.base_url must use http or https, got scheme `{}`",
                url.scheme()
            ),
        }),
        Err(e) => errors.push(ConfigError::Validation {
            message: format!("api.base_url `{base_url}` is not a valid URL: {e}"),
        }),
    }

    if config.api.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "api.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.auth.token_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "auth.token_path must not be empty".to_string(),
        });
    }

    if config.search.debounce_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "search.debounce_ms must be greater than 0".to_string(),
        });
    }

    if config.search.max_results == 0 {
        errors.push(ConfigError::Validation {
            message: "search.max_results must be greater than 0".to_string(),
        });
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&CellarConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = CellarConfig::default();
        config.api.base_url = "ftp://cellar".into();
        config.api.timeout_secs = 0;
        config.search.debounce_ms = 0;
        config.logging.level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors[0].to_string().contains("http or https"));
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let mut config = CellarConfig::default();
        config.api.base_url = "not a url".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("not a valid URL"), "got: {}", errors[0]);
    }

    #[test]
    fn partial_sections_keep_field_defaults() {
        let toml_str = r#"
            [api]
            base_url = "https://cellar.example/"

            [logging]
            level = "DEBUG"
        "#;
        let config: CellarConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.search.max_results, 8);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_field_is_rejected_by_serde() {
        let toml_str = r#"
            [search]
            debounce = 100
        "#;
        let result = toml::from_str::<CellarConfig>(toml_str);
        assert!(result.is_err());
    }
}
