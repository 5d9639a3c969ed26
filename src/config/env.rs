//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::models::config::parse_region_domains;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path).map_err(|e| {
                AppError::config(format!("Failed to load {}: {}", path.display(), e))
            })?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "BOSPROBE_REGION_DOMAINS" => {
                parse_region_domains(value)?;
            }
            "BOSPROBE_ENDPOINT_TTL" => {
                let ttl: i64 = value.trim().parse().map_err(|e| {
                    AppError::config(format!(
                        "Invalid BOSPROBE_ENDPOINT_TTL value '{}': {}",
                        value, e
                    ))
                })?;
                if ttl <= 0 {
                    return Err(AppError::config(format!(
                        "BOSPROBE_ENDPOINT_TTL must be greater than 0, got: {}",
                        ttl
                    )));
                }
            }
            "BOSPROBE_LANG" => {
                if crate::i18n::Locale::parse(value).is_none() {
                    return Err(AppError::config(format!(
                        "Invalid BOSPROBE_LANG value '{}', expected en or zh",
                        value
                    )));
                }
            }
            "BOSPROBE_HTTPS" | "ENABLE_COLOR" => {
                let normalized = value.trim().to_lowercase();
                let accepted = ["1", "0", "true", "false", "yes", "no", "on", "off"];
                if !accepted.contains(&normalized.as_str()) {
                    return Err(AppError::config(format!("Invalid {} value '{}'", key, value)));
                }
            }
            "BOSPROBE_REFERENCE_HOST" | "BOSPROBE_DEFAULT_ENDPOINT" => {
                if value.trim().is_empty() || value.contains("://") {
                    return Err(AppError::config(format!(
                        "{} must be a bare host name, got '{}'",
                        key, value
                    )));
                }
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("BCE_ACCESS_KEY_ID", "Access key id when --ak is not given", "your-access-key"),
            (
                "BCE_SECRET_ACCESS_KEY",
                "Secret access key when --sk is not given",
                "your-secret-key",
            ),
            ("BOSPROBE_CACHE_PATH", "Endpoint cache file", "~/.cache/bosprobe/endpoint_cache"),
            ("BOSPROBE_REFERENCE_HOST", "Host pinged to check the local network", "www.baidu.com"),
            ("BOSPROBE_DEFAULT_ENDPOINT", "Endpoint asked for bucket locations", "bj.bcebos.com"),
            (
                "BOSPROBE_REGION_DOMAINS",
                "Extra region to endpoint mappings",
                "bj=bj.bcebos.com,gz=gz.bcebos.com",
            ),
            ("BOSPROBE_ENDPOINT_TTL", "Seconds a cached endpoint stays valid", "3600"),
            ("BOSPROBE_LOG_DIR", "Directory for the run log", "."),
            ("BOSPROBE_LANG", "Report language (en, zh)", "zh"),
            ("BOSPROBE_HTTPS", "Talk to the endpoint over HTTPS", "false"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<26} {}\n", var, description));
            help.push_str(&format!("  {:<26} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        let mut warnings = Vec::new();

        for (var_name, _, _) in Self::get_supported_env_vars() {
            if let Ok(value) = std::env::var(var_name) {
                if let Err(e) = Self::validate_env_var(var_name, &value) {
                    warnings.push(e.to_string());
                }
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_env_var() {
        assert!(EnvManager::validate_env_var("BOSPROBE_ENDPOINT_TTL", "600").is_ok());
        assert!(EnvManager::validate_env_var("BOSPROBE_ENDPOINT_TTL", "0").is_err());
        assert!(EnvManager::validate_env_var("BOSPROBE_ENDPOINT_TTL", "soon").is_err());

        assert!(
            EnvManager::validate_env_var("BOSPROBE_REGION_DOMAINS", "bj=bj.bcebos.com").is_ok()
        );
        assert!(EnvManager::validate_env_var("BOSPROBE_REGION_DOMAINS", "bj").is_err());

        assert!(EnvManager::validate_env_var("BOSPROBE_LANG", "zh_CN").is_ok());
        assert!(EnvManager::validate_env_var("BOSPROBE_HTTPS", "maybe").is_err());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "off").is_ok());
        assert!(
            EnvManager::validate_env_var("BOSPROBE_DEFAULT_ENDPOINT", "https://bj.bcebos.com")
                .is_err()
        );

        // Unknown variables are ignored
        assert!(EnvManager::validate_env_var("UNRELATED", "anything").is_ok());
    }

    #[test]
    fn test_env_help_lists_every_variable() {
        let help = EnvManager::display_env_help();
        for (var, _, _) in EnvManager::get_supported_env_vars() {
            assert!(help.contains(var), "{} missing from help", var);
        }
        assert!(help.contains("Configuration Priority"));
    }

    #[test]
    fn test_load_env_file_from() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "BOSPROBE_TEST_ONLY_DOTENV=loaded").unwrap();

        EnvManager::load_env_file_from(file.path(), false).unwrap();
        assert_eq!(std::env::var("BOSPROBE_TEST_ONLY_DOTENV").unwrap(), "loaded");

        // A missing file is not an error
        assert!(EnvManager::load_env_file_from(Path::new("/no/such/.env"), false).is_ok());
    }
}
