//! Probe strategies
//!
//! [`Checker`] is the closed set of probes the pipeline can run. Each variant
//! binds a request in `validate`, fixes its plan in `request_check`, picks an
//! endpoint and finally performs one timed transfer. The pipeline only sees
//! the four operations and never the variant.

pub mod download;
pub mod paths;
pub mod upload;

pub use download::{DownloadCheck, DownloadTarget};
pub use upload::{UploadCheck, UploadPlan, UploadSource};

use crate::error::LocalCode;
use crate::models::{Execution, Failure, ProbeRequest};
use crate::resolver::{EndpointResolver, ResolvedEndpoint};
use crate::storage::{StorageClient, StorageError};

#[derive(Debug)]
pub enum Checker {
    Upload(UploadCheck),
    Download(DownloadCheck),
}

impl Checker {
    pub fn upload() -> Self {
        Checker::Upload(UploadCheck::default())
    }

    pub fn download() -> Self {
        Checker::Download(DownloadCheck::default())
    }

    /// The checker matching a request
    pub fn for_request(request: &ProbeRequest) -> Self {
        match request {
            ProbeRequest::Upload(_) => Self::upload(),
            ProbeRequest::Download(_) => Self::download(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Checker::Upload(_) => "upload",
            Checker::Download(_) => "download",
        }
    }

    /// Bind the request; a request of the other kind is rejected
    pub fn validate(&mut self, request: &ProbeRequest) -> Result<(), Failure> {
        match (self, request) {
            (Checker::Upload(check), ProbeRequest::Upload(r)) => {
                check.bind(r.clone());
                Ok(())
            }
            (Checker::Download(check), ProbeRequest::Download(r)) => {
                check.bind(r.clone());
                Ok(())
            }
            (checker, request) => Err(Failure::new(
                LocalCode::RequestTypeMismatch,
                format!(
                    "{} checker cannot run a {} request",
                    checker.name(),
                    request.kind()
                ),
            )),
        }
    }

    pub fn request_check(&mut self) -> Result<(), Failure> {
        match self {
            Checker::Upload(check) => check.request_check(),
            Checker::Download(check) => check.request_check(),
        }
    }

    pub async fn resolve_endpoint(
        &mut self,
        resolver: &EndpointResolver,
    ) -> Result<ResolvedEndpoint, Failure> {
        match self {
            Checker::Upload(check) => check.resolve_endpoint(resolver).await,
            Checker::Download(check) => check.resolve_endpoint(resolver).await,
        }
    }

    /// Perform the single timed transfer
    pub async fn execute(
        &self,
        storage: &dyn StorageClient,
        endpoint: &ResolvedEndpoint,
    ) -> Result<Execution, Failure> {
        match self {
            Checker::Upload(check) => check.execute(storage, endpoint).await,
            Checker::Download(check) => check.execute(storage, endpoint).await,
        }
    }
}

fn not_validated() -> Failure {
    Failure::new(LocalCode::Internal, "checker used before its request was validated")
}

/// Map a storage error; local I/O gets `io_code`
fn storage_failure(error: StorageError, io_code: LocalCode) -> Failure {
    let response = error.response();
    let code = error.code().unwrap_or(io_code.into());
    Failure::new(code, error.to_string()).with_response(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EndpointCache;
    use crate::credentials::Credentials;
    use crate::error::{ClientCode, Code};
    use crate::models::{DownloadRequest, ProbeConfig, ServiceResponse, UploadRequest};
    use crate::resolver::EndpointSource;
    use crate::storage::{PutBody, StorageResult, TransferReceipt};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeStorage {
        listing: Option<StorageResult<Option<String>>>,
        fail_transfer: Option<StorageError>,
        puts: Mutex<Vec<(String, String, String, u64)>>,
    }

    fn denied() -> StorageError {
        StorageError::Service {
            status: 403,
            code: "AccessDenied".to_string(),
            message: "Access denied".to_string(),
            request_id: Some("req-1".to_string()),
            debug_id: Some("dbg-1".to_string()),
        }
    }

    fn receipt(size: u64) -> TransferReceipt {
        TransferReceipt {
            size_bytes: size,
            response: ServiceResponse {
                status: 200,
                request_id: Some("req-ok".to_string()),
                debug_id: None,
            },
        }
    }

    fn take_error(slot: &Option<StorageError>) -> Option<StorageError> {
        slot.as_ref().map(|e| match e {
            StorageError::Service {
                status,
                code,
                message,
                request_id,
                debug_id,
            } => StorageError::Service {
                status: *status,
                code: code.clone(),
                message: message.clone(),
                request_id: request_id.clone(),
                debug_id: debug_id.clone(),
            },
            StorageError::Client { code, message } => StorageError::client(*code, message.clone()),
            StorageError::Io(e) => StorageError::Io(std::io::Error::new(e.kind(), e.to_string())),
        })
    }

    #[async_trait]
    impl StorageClient for FakeStorage {
        async fn put_object(
            &self,
            endpoint: &str,
            bucket: &str,
            key: &str,
            body: PutBody,
        ) -> StorageResult<TransferReceipt> {
            if let Some(e) = take_error(&self.fail_transfer) {
                return Err(e);
            }
            let size = match body {
                PutBody::Bytes(bytes) => bytes.len() as u64,
                PutBody::File(path) => std::fs::metadata(path)?.len(),
            };
            self.puts
                .lock()
                .unwrap()
                .push((endpoint.to_string(), bucket.to_string(), key.to_string(), size));
            Ok(receipt(size))
        }

        async fn get_object(
            &self,
            _endpoint: &str,
            _bucket: &str,
            key: &str,
            dest: &Path,
        ) -> StorageResult<TransferReceipt> {
            if let Some(e) = take_error(&self.fail_transfer) {
                return Err(e);
            }
            std::fs::write(dest, key.as_bytes())?;
            Ok(receipt(key.len() as u64))
        }

        async fn get_one_object_from_bucket(
            &self,
            _endpoint: &str,
            _bucket: &str,
        ) -> StorageResult<Option<String>> {
            match &self.listing {
                Some(Ok(key)) => Ok(key.clone()),
                Some(Err(_)) => Err(denied()),
                None => Ok(Some("listed.txt".to_string())),
            }
        }

        async fn get_object_from_url(
            &self,
            url: &str,
            dest: &Path,
        ) -> StorageResult<TransferReceipt> {
            std::fs::write(dest, url.as_bytes())?;
            Ok(receipt(url.len() as u64))
        }

        async fn get_bucket_location(
            &self,
            _endpoint: &str,
            _bucket: &str,
        ) -> StorageResult<String> {
            Ok("gz".to_string())
        }
    }

    fn endpoint() -> ResolvedEndpoint {
        ResolvedEndpoint::new("bj.bcebos.com", EndpointSource::Explicit)
    }

    fn credentials() -> Credentials {
        Credentials::new("ak", "sk")
    }

    async fn run(request: ProbeRequest, storage: &FakeStorage) -> Result<Execution, Failure> {
        let mut checker = Checker::for_request(&request);
        checker.validate(&request)?;
        checker.request_check()?;
        checker.execute(storage, &endpoint()).await
    }

    #[test]
    fn test_request_type_mismatch() {
        let mut checker = Checker::upload();
        let request = ProbeRequest::Download(DownloadRequest::default());
        let failure = checker.validate(&request).unwrap_err();
        assert_eq!(failure.code, Code::Local(LocalCode::RequestTypeMismatch));
    }

    #[test]
    fn test_request_check_before_validate_is_internal() {
        let mut checker = Checker::download();
        assert_eq!(
            checker.request_check().unwrap_err().code,
            Code::Local(LocalCode::Internal)
        );
    }

    #[tokio::test]
    async fn test_upload_random_payload() {
        let storage = FakeStorage::default();
        let execution = run(
            ProbeRequest::Upload(UploadRequest {
                credentials: credentials(),
                bucket: Some("b".to_string()),
                object: Some("probe.bin".to_string()),
                ..Default::default()
            }),
            &storage,
        )
        .await
        .unwrap();

        assert_eq!(execution.detail.name, "probe.bin");
        assert_eq!(execution.detail.size_bytes, crate::defaults::RANDOM_PAYLOAD_BYTES as u64);
        assert_eq!(execution.response.request_id.as_deref(), Some("req-ok"));
        let puts = storage.puts.lock().unwrap();
        assert_eq!(puts[0].0, "bj.bcebos.com");
        assert_eq!(puts[0].1, "b");
    }

    #[tokio::test]
    async fn test_upload_service_error_keeps_ids() {
        let storage = FakeStorage {
            fail_transfer: Some(denied()),
            ..Default::default()
        };
        let failure = run(
            ProbeRequest::Upload(UploadRequest {
                bucket: Some("b".to_string()),
                ..Default::default()
            }),
            &storage,
        )
        .await
        .unwrap_err();

        assert_eq!(failure.code, Code::service("AccessDenied"));
        let response = failure.response.unwrap();
        assert_eq!(response.request_id.as_deref(), Some("req-1"));
        assert_eq!(response.debug_id.as_deref(), Some("dbg-1"));
    }

    #[tokio::test]
    async fn test_download_picks_object_when_unnamed() {
        let dir = TempDir::new().unwrap();
        let storage = FakeStorage::default();
        let execution = run(
            ProbeRequest::Download(DownloadRequest {
                bucket: Some("b".to_string()),
                local_path: Some(format!("{}/", dir.path().display())),
                ..Default::default()
            }),
            &storage,
        )
        .await
        .unwrap();

        assert_eq!(execution.detail.name, "listed.txt");
        let written = dir.path().join("listed.txt");
        assert_eq!(execution.detail.local_path.as_deref(), Some(written.as_path()));
        assert_eq!(std::fs::read_to_string(written).unwrap(), "listed.txt");
    }

    #[tokio::test]
    async fn test_download_empty_bucket() {
        let storage = FakeStorage {
            listing: Some(Ok(None)),
            ..Default::default()
        };
        let failure = run(
            ProbeRequest::Download(DownloadRequest {
                bucket: Some("b".to_string()),
                ..Default::default()
            }),
            &storage,
        )
        .await
        .unwrap_err();
        assert_eq!(failure.code, Code::Local(LocalCode::EmptyBucket));
    }

    #[tokio::test]
    async fn test_download_listing_denied() {
        let storage = FakeStorage {
            listing: Some(Err(denied())),
            ..Default::default()
        };
        let failure = run(
            ProbeRequest::Download(DownloadRequest {
                bucket: Some("b".to_string()),
                ..Default::default()
            }),
            &storage,
        )
        .await
        .unwrap_err();
        assert_eq!(failure.code, Code::Local(LocalCode::ListingDenied));
        assert_eq!(failure.response.unwrap().request_id.as_deref(), Some("req-1"));
    }

    #[tokio::test]
    async fn test_download_url_into_directory() {
        let dir = TempDir::new().unwrap();
        let storage = FakeStorage::default();
        let url = "https://b.bj.bcebos.com/dir/cat.jpg";
        let execution = run(
            ProbeRequest::Download(DownloadRequest {
                url: Some(url.to_string()),
                local_path: Some(dir.path().to_string_lossy().into_owned()),
                ..Default::default()
            }),
            &storage,
        )
        .await
        .unwrap();

        assert_eq!(execution.detail.name, "cat.jpg");
        assert!(dir.path().join("cat.jpg").is_file());
    }

    #[tokio::test]
    async fn test_download_create_dir_failed() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let failure = run(
            ProbeRequest::Download(DownloadRequest {
                bucket: Some("b".to_string()),
                object: Some("k.txt".to_string()),
                local_path: Some(format!("{}/", blocker.join("sub").display())),
                ..Default::default()
            }),
            &FakeStorage::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(failure.code, Code::Local(LocalCode::CreateDirFailed));
    }

    #[tokio::test]
    async fn test_client_error_maps_to_client_code() {
        let storage = FakeStorage {
            fail_transfer: Some(StorageError::client(
                ClientCode::RequestFailed,
                "connection refused",
            )),
            ..Default::default()
        };
        let failure = run(
            ProbeRequest::Download(DownloadRequest {
                bucket: Some("b".to_string()),
                object: Some("k.txt".to_string()),
                local_path: Some(
                    std::env::temp_dir()
                        .join("bosprobe-never-written")
                        .display()
                        .to_string(),
                ),
                ..Default::default()
            }),
            &storage,
        )
        .await
        .unwrap_err();
        assert_eq!(failure.code, Code::Client(ClientCode::RequestFailed));
        assert!(failure.response.is_none());
    }

    #[tokio::test]
    async fn test_refresh_endpoint_drops_cached_entry() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(EndpointCache::load(dir.path().join("cache")));
        cache.put("b", "stale.bcebos.com", 3600).await;
        let storage: Arc<dyn StorageClient> = Arc::new(FakeStorage::default());
        let resolver = EndpointResolver::new(cache.clone(), storage, &ProbeConfig::default());

        let request = ProbeRequest::Upload(UploadRequest {
            bucket: Some("b".to_string()),
            refresh_endpoint: true,
            ..Default::default()
        });
        let mut checker = Checker::for_request(&request);
        checker.validate(&request).unwrap();
        checker.request_check().unwrap();
        let resolved = checker.resolve_endpoint(&resolver).await.unwrap();

        assert_eq!(resolved.source, EndpointSource::Service);
        assert_eq!(resolved.endpoint, "gz.bcebos.com");
        assert_eq!(cache.get("b").await.as_deref(), Some("gz.bcebos.com"));
    }
}
