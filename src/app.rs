//! Main application orchestration and execution

use crate::{
    cache::EndpointCache,
    check::Checker,
    cli::Cli,
    config::{display_config_summary, load_config, EnvManager},
    credentials::ProviderChain,
    diagnostics::{NetworkDiagnostics, SystemProbeRunner},
    error::{AppError, ClientCode, Code, Result, SuggestionEngine},
    i18n::Locale,
    logging::{LogLevel, RunLog},
    pipeline::DiagnosticPipeline,
    resolver::EndpointResolver,
    storage::{HttpStorageClient, StorageClient},
};
use std::sync::Arc;

/// Exit code of a run whose probe failed
pub const EXIT_DIAGNOSED_FAILURE: i32 = 1;

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Result<Self> {
        cli.validate().map_err(AppError::validation)?;
        Ok(Self { cli })
    }

    /// Run one probe and return the process exit code
    pub async fn run(self, command_line: &str) -> Result<i32> {
        let config = load_config(self.cli.clone())?;
        let locale = Locale::detect(config.locale.as_deref());

        let target = self.cli.target();
        let (credentials, provider) = ProviderChain::standard(target.ak.clone(), target.sk.clone())
            .resolve()
            .ok_or_else(|| {
                AppError::auth(
                    "no access key pair found; pass --ak/--sk or set \
                     BCE_ACCESS_KEY_ID and BCE_SECRET_ACCESS_KEY",
                )
            })?;

        let log = Arc::new(RunLog::create(&config.log_dir, &config));
        log.write_basic_info(command_line).await;
        log.block(LogLevel::Debug, "configuration", &display_config_summary(&config)).await;
        log.debug("credentials resolved").field("provider", provider).log().await;
        for warning in EnvManager::validate_current_env() {
            log.warn(&warning).component("config").log().await;
        }

        let cache_path = config.cache_path.clone().unwrap_or_else(EndpointCache::default_path);
        let cache = Arc::new(EndpointCache::load(cache_path));
        if cache.was_corrupt() {
            let code = Code::Client(ClientCode::CacheCorrupt);
            log.warn(&SuggestionEngine::new(locale).suggest(&code, ""))
                .component("cache")
                .field("code", &code)
                .field("path", cache.path().display().to_string())
                .log()
                .await;
        }

        let storage: Arc<dyn StorageClient> =
            Arc::new(HttpStorageClient::new(credentials.clone(), config.use_https)?);
        let resolver = EndpointResolver::new(cache.clone(), storage.clone(), &config);
        let network = NetworkDiagnostics::new(
            Arc::new(SystemProbeRunner::new()),
            config.reference_host.clone(),
        );
        let pipeline = DiagnosticPipeline::new(resolver, storage, network, log.clone(), locale)
            .with_color(config.enable_color)
            .with_spinner(!config.debug);

        let request = self.cli.to_request(credentials);
        let mut checker = Checker::for_request(&request);
        let outcome = pipeline.run(&mut checker, &request).await;

        if let Err(e) = cache.save_if_dirty().await {
            log.warn("endpoint cache not saved").component("cache").error_info(&e).log().await;
        }

        Ok(if outcome.is_success() { 0 } else { EXIT_DIAGNOSED_FAILURE })
    }
}
