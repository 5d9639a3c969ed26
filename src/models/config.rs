//! Configuration data model and validation

use crate::defaults;
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Endpoint cache store; `None` uses the XDG cache location
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Host pinged to tell a dead endpoint from a dead local network
    #[serde(default = "default_reference_host")]
    pub reference_host: String,

    /// Endpoint that answers bucket location lookups
    #[serde(default = "default_endpoint")]
    pub default_endpoint: String,

    /// Region name to endpoint domain
    #[serde(default = "default_region_domains")]
    pub region_domains: BTreeMap<String, String>,

    /// Lifetime of endpoints learned from location lookups
    #[serde(default = "default_endpoint_ttl")]
    pub endpoint_ttl_secs: i64,

    /// Directory the run log is written to
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Report language tag, detected from the environment when unset
    #[serde(default)]
    pub locale: Option<String>,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Use https for storage requests
    #[serde(default = "default_use_https")]
    pub use_https: bool,

    /// Echo network tool output to the terminal
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            cache_path: None,
            reference_host: default_reference_host(),
            default_endpoint: default_endpoint(),
            region_domains: default_region_domains(),
            endpoint_ttl_secs: default_endpoint_ttl(),
            log_dir: default_log_dir(),
            locale: None,
            enable_color: default_enable_color(),
            use_https: default_use_https(),
            verbose: false,
            debug: false,
        }
    }
}

impl ProbeConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoint domain for a region, falling back to the naming template
    pub fn region_domain(&self, region: &str) -> String {
        let region = region.trim().to_lowercase();
        self.region_domains
            .get(&region)
            .cloned()
            .unwrap_or_else(|| defaults::REGION_DOMAIN_TEMPLATE.replace("{region}", &region))
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        validate_host("Reference host", &self.reference_host)?;
        validate_host("Default endpoint", &self.default_endpoint)?;

        for (region, domain) in &self.region_domains {
            if region.trim().is_empty() {
                return Err(AppError::config("Region name cannot be empty"));
            }
            validate_host(&format!("Domain for region '{}'", region), domain)?;
        }

        if self.endpoint_ttl_secs <= 0 {
            return Err(AppError::config("Endpoint TTL must be greater than 0"));
        }

        if self.log_dir.as_os_str().is_empty() {
            return Err(AppError::config("Log directory cannot be empty"));
        }

        if let Some(path) = &self.cache_path {
            if path.as_os_str().is_empty() {
                return Err(AppError::config("Cache path cannot be empty"));
            }
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("BOSPROBE_CACHE_PATH") {
            if !path.trim().is_empty() {
                self.cache_path = Some(PathBuf::from(path.trim()));
            }
        }

        if let Ok(host) = std::env::var("BOSPROBE_REFERENCE_HOST") {
            self.reference_host = host.trim().to_string();
        }

        if let Ok(endpoint) = std::env::var("BOSPROBE_DEFAULT_ENDPOINT") {
            self.default_endpoint = endpoint.trim().to_string();
        }

        if let Ok(domains) = std::env::var("BOSPROBE_REGION_DOMAINS") {
            self.region_domains.extend(parse_region_domains(&domains)?);
        }

        if let Ok(ttl) = std::env::var("BOSPROBE_ENDPOINT_TTL") {
            self.endpoint_ttl_secs = ttl.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid BOSPROBE_ENDPOINT_TTL value '{}': {}", ttl, e))
            })?;
        }

        if let Ok(dir) = std::env::var("BOSPROBE_LOG_DIR") {
            self.log_dir = PathBuf::from(dir.trim());
        }

        if let Ok(lang) = std::env::var("BOSPROBE_LANG") {
            if !lang.trim().is_empty() {
                self.locale = Some(lang.trim().to_string());
            }
        }

        if let Ok(https) = std::env::var("BOSPROBE_HTTPS") {
            self.use_https = parse_bool("BOSPROBE_HTTPS", &https)?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = parse_bool("ENABLE_COLOR", &enable_color)?;
        }

        Ok(())
    }
}

fn validate_host(what: &str, host: &str) -> Result<()> {
    if host.trim().is_empty() {
        return Err(AppError::config(format!("{} cannot be empty", what)));
    }
    if host.contains("://") || host.contains('/') || host.chars().any(char::is_whitespace) {
        return Err(AppError::config(format!(
            "{} must be a bare host name, got '{}'",
            what, host
        )));
    }
    Ok(())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::config(format!("Invalid {} value '{}'", name, other))),
    }
}

/// Parse `bj=bj.bcebos.com,gz=gz.bcebos.com`
pub fn parse_region_domains(value: &str) -> Result<BTreeMap<String, String>> {
    let mut domains = BTreeMap::new();
    for pair in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (region, domain) = pair.split_once('=').ok_or_else(|| {
            AppError::config(format!("Invalid region mapping '{}', expected region=domain", pair))
        })?;
        let (region, domain) = (region.trim(), domain.trim());
        if region.is_empty() || domain.is_empty() {
            return Err(AppError::config(format!("Invalid region mapping '{}'", pair)));
        }
        domains.insert(region.to_lowercase(), domain.to_string());
    }
    Ok(domains)
}

// Default value functions for serde
fn default_reference_host() -> String {
    defaults::DEFAULT_REFERENCE_HOST.to_string()
}

fn default_endpoint() -> String {
    defaults::DEFAULT_ENDPOINT.to_string()
}

fn default_region_domains() -> BTreeMap<String, String> {
    defaults::DEFAULT_REGION_DOMAINS
        .iter()
        .map(|&(region, domain)| (region.to_string(), domain.to_string()))
        .collect()
}

fn default_endpoint_ttl() -> i64 {
    defaults::DEFAULT_ENDPOINT_TTL_SECS
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_enable_color() -> bool {
    defaults::DEFAULT_ENABLE_COLOR
}

fn default_use_https() -> bool {
    defaults::DEFAULT_USE_HTTPS
}
