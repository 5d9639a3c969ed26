//! Diagnostic pipeline
//!
//! Runs the fixed stage sequence
//! `request_init → request_check → resolve_endpoint → classify_network → execute`
//! against one [`Checker`] and always finishes with the report. The first
//! failing stage sets the outcome code; the stages after it are skipped.

use crate::check::Checker;
use crate::diagnostics::NetworkDiagnostics;
use crate::error::SuggestionEngine;
use crate::i18n::{text, Locale};
use crate::logging::RunLog;
use crate::models::{CheckOutcome, Failure, ProbeRequest};
use crate::output::{LogNote, ReportRenderer, Spinner};
use crate::resolver::EndpointResolver;
use crate::storage::StorageClient;
use crate::types::Stage;
use std::sync::Arc;

pub struct DiagnosticPipeline {
    resolver: EndpointResolver,
    storage: Arc<dyn StorageClient>,
    network: NetworkDiagnostics,
    log: Arc<RunLog>,
    suggestions: SuggestionEngine,
    use_color: bool,
    show_spinner: bool,
}

impl DiagnosticPipeline {
    pub fn new(
        resolver: EndpointResolver,
        storage: Arc<dyn StorageClient>,
        network: NetworkDiagnostics,
        log: Arc<RunLog>,
        locale: Locale,
    ) -> Self {
        Self {
            resolver,
            storage,
            network,
            log,
            suggestions: SuggestionEngine::new(locale),
            use_color: false,
            show_spinner: false,
        }
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    pub fn with_spinner(mut self, show_spinner: bool) -> Self {
        self.show_spinner = show_spinner;
        self
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    pub fn locale(&self) -> Locale {
        self.suggestions.locale()
    }

    /// Run every stage and print the report
    pub async fn run(&self, checker: &mut Checker, request: &ProbeRequest) -> CheckOutcome {
        let mut outcome = CheckOutcome::new();
        self.run_stages(checker, request, &mut outcome).await;

        self.log
            .info("probe finished")
            .component("pipeline")
            .field("operation", request.kind())
            .field("code", &outcome.code)
            .field("net_status", outcome.net_status)
            .log()
            .await;

        self.report(request.kind(), &outcome).await;
        outcome
    }

    async fn run_stages(
        &self,
        checker: &mut Checker,
        request: &ProbeRequest,
        outcome: &mut CheckOutcome,
    ) {
        if let Err(failure) = checker.validate(request) {
            return self.fail(outcome, Stage::RequestInit, failure).await;
        }
        self.pass(outcome, Stage::RequestInit).await;

        if let Err(failure) = checker.request_check() {
            return self.fail(outcome, Stage::RequestCheck, failure).await;
        }
        self.pass(outcome, Stage::RequestCheck).await;

        let endpoint = match checker.resolve_endpoint(&self.resolver).await {
            Ok(endpoint) => endpoint,
            Err(failure) => return self.fail(outcome, Stage::ResolveEndpoint, failure).await,
        };
        self.log
            .info("endpoint resolved")
            .component("resolver")
            .field("endpoint", &endpoint.endpoint)
            .field("source", endpoint.source.to_string())
            .log()
            .await;
        outcome.endpoint = Some(endpoint.clone());
        self.pass(outcome, Stage::ResolveEndpoint).await;

        // The transfer is attempted whatever the network looks like
        let spinner = Spinner::start(text("spinner.network", self.locale()), self.show_spinner);
        let network = self.network.classify(endpoint.host(), &self.log).await;
        spinner.stop().await;
        outcome.net_status = network.status;
        self.pass(outcome, Stage::ClassifyNetwork).await;

        let spinner_key = format!("spinner.{}", checker.name());
        let spinner = Spinner::start(text(&spinner_key, self.locale()), self.show_spinner);
        let result = checker.execute(self.storage.as_ref(), &endpoint).await;
        spinner.stop().await;

        match result {
            Ok(execution) => {
                self.log
                    .info("transfer completed")
                    .component("execute")
                    .field("object", &execution.detail.name)
                    .field("size_bytes", execution.detail.size_bytes)
                    .field("elapsed_ms", execution.detail.elapsed_ms)
                    .log()
                    .await;
                outcome.detail = Some(execution.detail);
                outcome.response = Some(execution.response);
                self.pass(outcome, Stage::Execute).await;
            }
            Err(failure) => self.fail(outcome, Stage::Execute, failure).await,
        }
    }

    async fn pass(&self, outcome: &mut CheckOutcome, stage: Stage) {
        outcome.pass(stage);
        self.log.debug("stage passed").field("stage", stage.name()).log().await;
    }

    async fn fail(&self, outcome: &mut CheckOutcome, stage: Stage, failure: Failure) {
        self.log
            .warn("stage failed")
            .field("stage", stage.name())
            .field("code", &failure.code)
            .field("error", &failure.error)
            .log()
            .await;
        outcome.fail(stage, failure);
    }

    async fn report(&self, operation: &str, outcome: &CheckOutcome) {
        let note = match self.log.path() {
            Some(path) => LogNote::Saved(path),
            None => LogNote::NotSaved,
        };
        let render = |use_color: bool| {
            ReportRenderer::new(self.locale(), use_color).render(
                operation,
                outcome,
                &self.suggestions,
                note,
            )
        };
        let plain = render(false);
        if self.use_color {
            let styled = render(true);
            self.log.print_styled(&plain, &styled).await;
        } else {
            self.log.print(&plain).await;
        }
    }
}
