//! Download strategy

use super::paths::{self, base_name, url_base_name};
use super::{not_validated, storage_failure};
use crate::error::LocalCode;
use crate::models::outcome::non_empty;
use crate::models::{DownloadRequest, Execution, Failure, ObjectDetail};
use crate::resolver::{EndpointResolver, ResolvedEndpoint};
use crate::storage::{StorageClient, TransferReceipt};
use std::path::PathBuf;
use std::time::Instant;

/// What to download
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadTarget {
    Url(String),
    /// A named object, or any object of the bucket when `object` is `None`
    Bucket { bucket: String, object: Option<String> },
}

#[derive(Debug, Default)]
pub struct DownloadCheck {
    request: Option<DownloadRequest>,
    target: Option<DownloadTarget>,
}

impl DownloadCheck {
    pub fn bind(&mut self, request: DownloadRequest) {
        self.request = Some(request);
        self.target = None;
    }

    pub fn target(&self) -> Option<&DownloadTarget> {
        self.target.as_ref()
    }

    /// URL and bucket addressing are exclusive; conflicts are checked in a fixed order
    pub fn request_check(&mut self) -> Result<(), Failure> {
        let request = self.request.as_ref().ok_or_else(not_validated)?;
        let bucket = non_empty(&request.bucket);
        let object = non_empty(&request.object);

        let target = match non_empty(&request.url) {
            Some(_) if bucket.is_some() => {
                return Err(Failure::new(
                    LocalCode::UrlBucketConflict,
                    "--url cannot be combined with --bucket",
                ))
            }
            Some(_) if object.is_some() => {
                return Err(Failure::new(
                    LocalCode::UrlObjectConflict,
                    "--url cannot be combined with --object",
                ))
            }
            Some(_) if non_empty(&request.endpoint).is_some() => {
                return Err(Failure::new(
                    LocalCode::UrlEndpointConflict,
                    "--url cannot be combined with --endpoint",
                ))
            }
            Some(url) => DownloadTarget::Url(url.to_string()),
            None => {
                let bucket = bucket.ok_or_else(|| {
                    Failure::new(
                        LocalCode::MissingTarget,
                        "either --url or --bucket is required for download",
                    )
                })?;
                DownloadTarget::Bucket {
                    bucket: bucket.to_string(),
                    object: object.map(str::to_string),
                }
            }
        };

        self.target = Some(target);
        Ok(())
    }

    pub async fn resolve_endpoint(
        &self,
        resolver: &EndpointResolver,
    ) -> Result<ResolvedEndpoint, Failure> {
        let request = self.request.as_ref().ok_or_else(not_validated)?;
        match self.target.as_ref().ok_or_else(not_validated)? {
            DownloadTarget::Url(url) => resolver.resolve(None, Some(url), None).await,
            DownloadTarget::Bucket { bucket, .. } => {
                if request.refresh_endpoint {
                    resolver.invalidate(bucket).await;
                }
                resolver
                    .resolve(non_empty(&request.endpoint), None, Some(bucket))
                    .await
            }
        }
    }

    pub async fn execute(
        &self,
        storage: &dyn StorageClient,
        endpoint: &ResolvedEndpoint,
    ) -> Result<Execution, Failure> {
        let request = self.request.as_ref().ok_or_else(not_validated)?;
        let local_path = non_empty(&request.local_path);

        match self.target.as_ref().ok_or_else(not_validated)? {
            DownloadTarget::Url(url) => {
                let name = url_base_name(url);
                let dest = destination(local_path, &name)?;

                let start = Instant::now();
                let receipt = storage
                    .get_object_from_url(url, &dest)
                    .await
                    .map_err(|e| storage_failure(e, LocalCode::LocalWriteFailed))?;
                Ok(finish(name, dest, receipt, start))
            }
            DownloadTarget::Bucket { bucket, object } => {
                let key = match object {
                    Some(key) => key.clone(),
                    None => pick_object(storage, &endpoint.endpoint, bucket).await?,
                };
                let dest = destination(local_path, &base_name(&key))?;

                let start = Instant::now();
                let receipt = storage
                    .get_object(&endpoint.endpoint, bucket, &key, &dest)
                    .await
                    .map_err(|e| storage_failure(e, LocalCode::LocalWriteFailed))?;
                Ok(finish(key, dest, receipt, start))
            }
        }
    }
}

async fn pick_object(
    storage: &dyn StorageClient,
    endpoint: &str,
    bucket: &str,
) -> Result<String, Failure> {
    match storage.get_one_object_from_bucket(endpoint, bucket).await {
        Ok(Some(key)) => Ok(key),
        Ok(None) => Err(Failure::new(
            LocalCode::EmptyBucket,
            format!("bucket '{}' has no object to download", bucket),
        )),
        Err(e) if e.service_code() == Some("AccessDenied") => {
            let response = e.response();
            Err(Failure::new(
                LocalCode::ListingDenied,
                format!("listing bucket '{}' was denied: {}", bucket, e),
            )
            .with_response(response))
        }
        Err(e) => Err(storage_failure(e, LocalCode::LocalWriteFailed)),
    }
}

fn destination(local_path: Option<&str>, name: &str) -> Result<PathBuf, Failure> {
    paths::destination(local_path, name).map_err(|e| {
        Failure::new(
            LocalCode::CreateDirFailed,
            format!(
                "cannot create the directory for '{}': {}",
                local_path.unwrap_or(name),
                e
            ),
        )
    })
}

fn finish(name: String, dest: PathBuf, receipt: TransferReceipt, start: Instant) -> Execution {
    Execution {
        detail: ObjectDetail {
            name,
            size_bytes: receipt.size_bytes,
            elapsed_ms: start.elapsed().as_millis() as u64,
            local_path: Some(dest),
        },
        response: receipt.response,
    }
}
