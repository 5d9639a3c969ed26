//! bosprobe
//!
//! Diagnoses why an upload to or download from BOS object storage fails.
//! A single probe validates the request, resolves the endpoint to test
//! against, classifies network reachability, performs one representative
//! transfer and renders a localized report with a suggestion.

pub mod app;
pub mod cache;
pub mod check;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod diagnostics;
pub mod dns;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use cache::EndpointCache;
pub use check::Checker;
pub use diagnostics::{NetworkDiagnostics, ProbeRunner, SystemProbeRunner};
pub use error::{AppError, Code, Result, SuggestionEngine};
pub use i18n::Locale;
pub use models::{
    CheckOutcome, DownloadRequest, ObjectDetail, ProbeConfig, ProbeRequest, UploadRequest,
};
pub use pipeline::DiagnosticPipeline;
pub use resolver::{EndpointResolver, EndpointSource};
pub use storage::{HttpStorageClient, StorageClient, StorageError};
pub use types::NetStatus;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    /// Host pinged to tell a dead endpoint from a dead local network
    pub const DEFAULT_REFERENCE_HOST: &str = "www.baidu.com";
    pub const DEFAULT_ENDPOINT: &str = "bj.bcebos.com";
    /// Endpoint domain for a region without an explicit mapping
    pub const REGION_DOMAIN_TEMPLATE: &str = "{region}.bcebos.com";
    pub const DEFAULT_REGION_DOMAINS: &[(&str, &str)] = &[
        ("bj", "bj.bcebos.com"),
        ("gz", "gz.bcebos.com"),
        ("su", "su.bcebos.com"),
        ("bd", "bd.bcebos.com"),
        ("fwh", "fwh.bcebos.com"),
        ("hkg", "hkg.bcebos.com"),
        ("fsh", "fsh.bcebos.com"),
        ("sin", "sin.bcebos.com"),
    ];
    pub const DEFAULT_ENDPOINT_TTL_SECS: i64 = 3600;
    /// Size of the generated upload payload when no local file is given
    pub const RANDOM_PAYLOAD_BYTES: usize = 1024 * 1024;
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const DEFAULT_USE_HTTPS: bool = false;
    pub const CACHE_FILE_NAME: &str = "endpoint_cache";
    pub const FALLBACK_CACHE_PATH: &str = "./bosprobe_endpoint_cache";
}
