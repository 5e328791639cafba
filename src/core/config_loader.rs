//! Configuration file loader for sword-depositor
//!
//! This module provides configuration loading, environment-variable
//! expansion for credential fields, and structural validation.

use crate::core::config::DepositConfig;
use crate::core::error::DepositError;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".sword-deposit.yaml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    /// Is configuration valid?
    pub valid: bool,

    /// Validation errors
    pub errors: Vec<ConfigValidationError>,

    /// Validation warnings
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "deposit_points[0].url")
    pub field: String,

    /// Error message
    pub message: String,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    /// Field path
    pub field: String,

    /// Warning message
    pub message: String,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from an explicit path, or from
    /// `./.sword-deposit.yaml` when none is given.
    pub async fn load(path: Option<&Path>) -> Result<DepositConfig, DepositError> {
        let path: PathBuf = match path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(CONFIG_FILENAME),
        };

        let content = fs::read_to_string(&path).await.map_err(|e| {
            DepositError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let env: HashMap<String, String> = std::env::vars().collect();
        Self::parse(&content, &env)
    }

    /// Parse configuration from YAML text, expanding `${VAR}` references
    /// in endpoint URLs and credential fields from the given environment.
    pub fn parse(
        content: &str,
        env: &HashMap<String, String>,
    ) -> Result<DepositConfig, DepositError> {
        let mut config: DepositConfig = serde_yaml::from_str(content)
            .map_err(|e| DepositError::Config(format!("failed to parse YAML config: {}", e)))?;

        for point in &mut config.deposit_points {
            point.url = Self::expand_string(&point.url, env);
            if let Some(username) = &point.username {
                point.username = Some(Self::expand_string(username, env));
            }
            point.password = point.password.take().map(|p| Self::expand_secret(p, env));
            point.api_key = point.api_key.take().map(|k| Self::expand_secret(k, env));
        }

        Ok(config)
    }

    /// Expand environment variables in a single string. Unknown variables
    /// are left in place so validation can flag them.
    fn expand_string(input: &str, env: &HashMap<String, String>) -> String {
        let env_var_regex = Regex::new(ENV_VAR_PATTERN).unwrap();

        let mut result = input.to_string();
        for cap in env_var_regex.captures_iter(input) {
            let var_name = &cap[1];
            if let Some(value) = env.get(var_name) {
                result = result.replace(&format!("${{{}}}", var_name), value);
            }
        }

        result
    }

    fn expand_secret(input: SecretString, env: &HashMap<String, String>) -> SecretString {
        let expanded = Self::expand_string(input.expose_secret(), env);
        SecretString::new(expanded.into())
    }

    /// Validate configuration
    pub fn validate(config: &DepositConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Version
        if config.version != "1.0" {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!(
                    "unknown version: {} (currently supported version is \"1.0\")",
                    config.version
                ),
            });
        }

        // 2. Context
        if config.context_id <= 0 {
            errors.push(ConfigValidationError {
                field: "context_id".to_string(),
                message: "context_id must be a positive id".to_string(),
            });
        }

        // 3. Deposit points
        if config.deposit_points.is_empty() {
            warnings.push(ConfigValidationWarning {
                field: "deposit_points".to_string(),
                message: "no deposit points configured; deposits will have no target".to_string(),
            });
        }

        let mut seen_ids = std::collections::HashSet::new();
        for (i, point) in config.deposit_points.iter().enumerate() {
            if point.id <= 0 {
                errors.push(ConfigValidationError {
                    field: format!("deposit_points[{}].id", i),
                    message: "id must be a positive id".to_string(),
                });
            } else if !seen_ids.insert(point.id) {
                errors.push(ConfigValidationError {
                    field: format!("deposit_points[{}].id", i),
                    message: format!("duplicate deposit point id {}", point.id),
                });
            }

            if point.name.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("deposit_points[{}].name", i),
                    message: "name is required".to_string(),
                });
            }

            match reqwest::Url::parse(&point.url) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
                Ok(url) => errors.push(ConfigValidationError {
                    field: format!("deposit_points[{}].url", i),
                    message: format!("unsupported URL scheme \"{}\"", url.scheme()),
                }),
                Err(e) => errors.push(ConfigValidationError {
                    field: format!("deposit_points[{}].url", i),
                    message: format!("invalid endpoint URL: {}", e),
                }),
            }

            if point.url.contains("${") {
                errors.push(ConfigValidationError {
                    field: format!("deposit_points[{}].url", i),
                    message: "unresolved environment variable in URL".to_string(),
                });
            }

            if point.username.is_some() && point.password.is_none() && point.api_key.is_none() {
                warnings.push(ConfigValidationWarning {
                    field: format!("deposit_points[{}].password", i),
                    message: "username configured without a stored password or API key"
                        .to_string(),
                });
            }
        }

        // 4. Timeout
        if config.timeout_secs == 0 {
            errors.push(ConfigValidationError {
                field: "timeout_secs".to_string(),
                message: "timeout_secs must be greater than zero".to_string(),
            });
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("✅ Configuration validation succeeded".to_string());
        } else {
            lines.push("❌ Configuration has errors".to_string());
        }

        if !result.errors.is_empty() {
            lines.push("\n🔴 Errors:".to_string());
            for error in &result.errors {
                lines.push(format!("  - [{}] {}", error.field, error.message));
            }
        }

        if !result.warnings.is_empty() {
            lines.push("\n🟡 Warnings:".to_string());
            for warning in &result.warnings {
                lines.push(format!("  - [{}] {}", warning.field, warning.message));
            }
        }

        lines.join("\n")
    }
}
