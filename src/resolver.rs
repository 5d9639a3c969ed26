//! Endpoint resolution
//!
//! The endpoint to probe is taken from the first source that yields one:
//! an explicit endpoint, the host of the object URL, the endpoint cache, and
//! finally a live bucket location lookup whose answer is written back to the
//! cache.

use crate::cache::EndpointCache;
use crate::error::LocalCode;
use crate::models::{Failure, ProbeConfig};
use crate::storage::StorageClient;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Where the resolved endpoint came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndpointSource {
    Explicit,
    Url,
    Cache,
    Service,
}

impl EndpointSource {
    pub fn label_key(&self) -> &'static str {
        match self {
            EndpointSource::Explicit => "source.explicit",
            EndpointSource::Url => "source.url",
            EndpointSource::Cache => "source.cache",
            EndpointSource::Service => "source.service",
        }
    }
}

impl fmt::Display for EndpointSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EndpointSource::Explicit => "explicit",
            EndpointSource::Url => "url",
            EndpointSource::Cache => "cache",
            EndpointSource::Service => "service",
        };
        f.write_str(name)
    }
}

/// An endpoint and the source that supplied it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEndpoint {
    /// Host, optionally with a port
    pub endpoint: String,
    pub source: EndpointSource,
}

impl ResolvedEndpoint {
    pub fn new<S: Into<String>>(endpoint: S, source: EndpointSource) -> Self {
        Self {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Host without port, for network probes
    pub fn host(&self) -> &str {
        let endpoint = self.endpoint.as_str();
        if let Some(rest) = endpoint.strip_prefix('[') {
            // [v6]:port
            return rest.split(']').next().unwrap_or(rest);
        }
        match endpoint.rsplit_once(':') {
            Some((host, port))
                if !host.contains(':') && port.chars().all(|c| c.is_ascii_digit()) =>
            {
                host
            }
            _ => endpoint,
        }
    }
}

/// Strip a scheme and trailing path from a user-supplied endpoint
fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    let without_scheme = endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}

/// Host (and port) of an object URL
pub fn url_host(url: &str) -> Result<String, Failure> {
    let parsed = url::Url::parse(url.trim()).map_err(|e| {
        Failure::new(LocalCode::InvalidUrl, format!("Invalid URL '{}': {}", url, e))
    })?;
    let host = parsed.host_str().filter(|h| !h.is_empty()).ok_or_else(|| {
        Failure::new(LocalCode::InvalidUrl, format!("URL '{}' has no host", url))
    })?;
    Ok(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Resolution precedence chain
pub struct EndpointResolver {
    cache: Arc<EndpointCache>,
    storage: Arc<dyn StorageClient>,
    config: ProbeConfig,
}

impl EndpointResolver {
    pub fn new(
        cache: Arc<EndpointCache>,
        storage: Arc<dyn StorageClient>,
        config: &ProbeConfig,
    ) -> Self {
        Self {
            cache,
            storage,
            config: config.clone(),
        }
    }

    pub fn cache(&self) -> &EndpointCache {
        &self.cache
    }

    /// Drop the cached endpoint of `bucket`
    pub async fn invalidate(&self, bucket: &str) -> bool {
        self.cache.delete(bucket).await
    }

    /// Resolve the endpoint to probe
    pub async fn resolve(
        &self,
        explicit: Option<&str>,
        url: Option<&str>,
        bucket: Option<&str>,
    ) -> Result<ResolvedEndpoint, Failure> {
        if let Some(endpoint) = explicit.map(normalize_endpoint).filter(|s| !s.is_empty()) {
            return Ok(ResolvedEndpoint::new(endpoint, EndpointSource::Explicit));
        }

        if let Some(url) = url.map(str::trim).filter(|s| !s.is_empty()) {
            return url_host(url).map(|host| ResolvedEndpoint::new(host, EndpointSource::Url));
        }

        let bucket = bucket.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
            Failure::new(
                LocalCode::NoResolveTarget,
                "neither a bucket nor a URL is available to resolve an endpoint",
            )
        })?;

        if let Some(endpoint) = self.cache.get(bucket).await {
            return Ok(ResolvedEndpoint::new(endpoint, EndpointSource::Cache));
        }

        let endpoint = self.lookup(bucket).await?;
        self.cache.put(bucket, &endpoint, self.config.endpoint_ttl_secs).await;
        Ok(ResolvedEndpoint::new(endpoint, EndpointSource::Service))
    }

    async fn lookup(&self, bucket: &str) -> Result<String, Failure> {
        let region = self
            .storage
            .get_bucket_location(&self.config.default_endpoint, bucket)
            .await
            .map_err(|e| {
                Failure::new(
                    LocalCode::EndpointLookupFailed,
                    format!("location lookup for bucket '{}' failed: {}", bucket, e),
                )
                .with_response(e.response())
            })?;

        if region.trim().is_empty() {
            return Err(Failure::new(
                LocalCode::EndpointLookupFailed,
                format!("location lookup for bucket '{}' returned no region", bucket),
            ));
        }

        Ok(self.config.region_domain(&region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Code;
    use crate::models::ServiceResponse;
    use crate::storage::{PutBody, StorageError, StorageResult, TransferReceipt};
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::TempDir;

    /// Answers bucket location lookups only
    enum Location {
        Region(&'static str),
        Fails,
    }

    #[async_trait]
    impl StorageClient for Location {
        async fn put_object(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: PutBody,
        ) -> StorageResult<TransferReceipt> {
            unreachable!()
        }

        async fn get_object(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: &Path,
        ) -> StorageResult<TransferReceipt> {
            unreachable!()
        }

        async fn get_one_object_from_bucket(
            &self,
            _: &str,
            _: &str,
        ) -> StorageResult<Option<String>> {
            unreachable!()
        }

        async fn get_object_from_url(&self, _: &str, _: &Path) -> StorageResult<TransferReceipt> {
            unreachable!()
        }

        async fn get_bucket_location(&self, _: &str, _: &str) -> StorageResult<String> {
            match self {
                Location::Region(region) => Ok(region.to_string()),
                Location::Fails => Err(StorageError::Service {
                    status: 404,
                    code: "NoSuchBucket".to_string(),
                    message: "The specified bucket does not exist".to_string(),
                    request_id: Some("req-1".to_string()),
                    debug_id: Some("dbg-1".to_string()),
                }),
            }
        }
    }

    fn resolver(dir: &TempDir, storage: Location) -> EndpointResolver {
        let cache = Arc::new(EndpointCache::load(dir.path().join("endpoint_cache")));
        EndpointResolver::new(cache, Arc::new(storage), &ProbeConfig::default())
    }

    #[tokio::test]
    async fn test_lookup_service_error() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(&dir, Location::Fails);

        let failure = resolver.resolve(None, None, Some("b")).await.unwrap_err();
        assert_eq!(failure.code, Code::Local(LocalCode::EndpointLookupFailed));
        assert!(failure.error.contains("NoSuchBucket"));
        assert_eq!(
            failure.response,
            Some(ServiceResponse {
                status: 404,
                request_id: Some("req-1".to_string()),
                debug_id: Some("dbg-1".to_string()),
            })
        );
        assert!(resolver.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_lookup_empty_region() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(&dir, Location::Region("  "));

        let failure = resolver.resolve(None, None, Some("b")).await.unwrap_err();
        assert_eq!(failure.code, Code::Local(LocalCode::EndpointLookupFailed));
        assert_eq!(failure.response, None);
        assert!(resolver.cache().is_empty().await);
        assert!(!resolver.cache().is_dirty().await);
    }

    #[tokio::test]
    async fn test_lookup_writes_back() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(&dir, Location::Region("gz"));

        let resolved = resolver.resolve(None, None, Some("b")).await.unwrap();
        assert_eq!(resolved, ResolvedEndpoint::new("gz.bcebos.com", EndpointSource::Service));
        assert_eq!(resolver.cache().get("b").await.as_deref(), Some("gz.bcebos.com"));
    }

    #[tokio::test]
    async fn test_blank_explicit_endpoint_falls_through() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(&dir, Location::Region("gz"));

        let resolved = resolver.resolve(Some("https://"), None, Some("b")).await.unwrap();
        assert_eq!(resolved.source, EndpointSource::Service);

        let resolved = resolver
            .resolve(Some("https://bj.bcebos.com/"), None, Some("b"))
            .await
            .unwrap();
        assert_eq!(resolved, ResolvedEndpoint::new("bj.bcebos.com", EndpointSource::Explicit));
    }

    #[test]
    fn test_url_host() {
        assert_eq!(url_host("https://b.bj.bcebos.com/report.csv").unwrap(), "b.bj.bcebos.com");
        assert_eq!(url_host("http://127.0.0.1:8080/b/k").unwrap(), "127.0.0.1:8080");

        let failure = url_host("not a url").unwrap_err();
        assert_eq!(failure.code, Code::Local(LocalCode::InvalidUrl));

        let hostless = url_host("file:///tmp/x").unwrap_err();
        assert_eq!(hostless.code, Code::Local(LocalCode::InvalidUrl));
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize_endpoint("https://gz.bcebos.com/"), "gz.bcebos.com");
        assert_eq!(normalize_endpoint(" bj.bcebos.com "), "bj.bcebos.com");
        assert_eq!(normalize_endpoint("127.0.0.1:9000"), "127.0.0.1:9000");
        assert_eq!(normalize_endpoint("https://"), "");
    }

    #[test]
    fn test_host_strips_port() {
        let local = ResolvedEndpoint::new("127.0.0.1:9000", EndpointSource::Explicit);
        assert_eq!(local.host(), "127.0.0.1");
        let cached = ResolvedEndpoint::new("bj.bcebos.com", EndpointSource::Cache);
        assert_eq!(cached.host(), "bj.bcebos.com");
        assert_eq!(ResolvedEndpoint::new("[::1]:9000", EndpointSource::Url).host(), "::1");
    }
}
