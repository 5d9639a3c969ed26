//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::ProbeConfig,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<ProbeConfig> {
        let mut config = ProbeConfig::default();

        EnvManager::load_env_file(self.cli.debug)?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut ProbeConfig) {
        if self.cli.no_color || !self.cli.use_colors() {
            config.enable_color = false;
        }

        // CLI-only flags
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;

        if let Some(lang) = &self.cli.lang {
            config.locale = Some(lang.clone());
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<ProbeConfig> {
    ConfigParser::new(cli).parse()
}

/// Configuration summary for the debug log
pub fn display_config_summary(config: &ProbeConfig) -> String {
    let mut summary = Vec::new();

    summary.push(format!(
        "Cache path: {}",
        config
            .cache_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(default)".to_string())
    ));
    summary.push(format!("Reference host: {}", config.reference_host));
    summary.push(format!("Lookup endpoint: {}", config.default_endpoint));
    summary.push(format!("Region domains: {}", config.region_domains.len()));
    summary.push(format!("Endpoint TTL: {}s", config.endpoint_ttl_secs));
    summary.push(format!("Log directory: {}", config.log_dir.display()));
    summary.push(format!("HTTPS: {}", config.use_https));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
