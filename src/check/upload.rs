//! Upload strategy

use super::{not_validated, storage_failure};
use crate::defaults::RANDOM_PAYLOAD_BYTES;
use crate::error::LocalCode;
use crate::models::outcome::non_empty;
use crate::models::{Execution, Failure, ObjectDetail, UploadRequest};
use crate::resolver::{EndpointResolver, ResolvedEndpoint};
use crate::storage::{PutBody, StorageClient};
use chrono::Local;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

/// What gets uploaded
#[derive(Debug, Clone, PartialEq)]
pub enum UploadSource {
    /// Generated payload of the given size
    Random(usize),
    File(PathBuf),
}

/// Upload plan fixed by the request check
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPlan {
    pub bucket: String,
    pub object: String,
    pub source: UploadSource,
}

#[derive(Debug, Default)]
pub struct UploadCheck {
    request: Option<UploadRequest>,
    plan: Option<UploadPlan>,
}

impl UploadCheck {
    pub fn bind(&mut self, request: UploadRequest) {
        self.request = Some(request);
        self.plan = None;
    }

    pub fn plan(&self) -> Option<&UploadPlan> {
        self.plan.as_ref()
    }

    pub fn request_check(&mut self) -> Result<(), Failure> {
        let request = self.request.as_ref().ok_or_else(not_validated)?;

        let bucket = non_empty(&request.bucket)
            .ok_or_else(|| {
                Failure::new(LocalCode::MissingBucket, "a bucket is required for upload")
            })?
            .to_string();

        let source = match non_empty(&request.local_path) {
            Some(raw) => UploadSource::File(readable_file(Path::new(raw))?),
            None => UploadSource::Random(RANDOM_PAYLOAD_BYTES),
        };

        let object = match (non_empty(&request.object), &source) {
            (Some(object), _) => object.to_string(),
            (None, UploadSource::File(path)) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(generated_name),
            (None, UploadSource::Random(_)) => generated_name(),
        };

        self.plan = Some(UploadPlan { bucket, object, source });
        Ok(())
    }

    pub async fn resolve_endpoint(
        &self,
        resolver: &EndpointResolver,
    ) -> Result<ResolvedEndpoint, Failure> {
        let request = self.request.as_ref().ok_or_else(not_validated)?;
        let plan = self.plan.as_ref().ok_or_else(not_validated)?;
        if request.refresh_endpoint {
            resolver.invalidate(&plan.bucket).await;
        }
        resolver
            .resolve(non_empty(&request.endpoint), None, Some(&plan.bucket))
            .await
    }

    pub async fn execute(
        &self,
        storage: &dyn StorageClient,
        endpoint: &ResolvedEndpoint,
    ) -> Result<Execution, Failure> {
        let plan = self.plan.as_ref().ok_or_else(not_validated)?;
        let (body, local_path) = match &plan.source {
            UploadSource::Random(size) => (PutBody::Bytes(random_payload(*size)), None),
            UploadSource::File(path) => (PutBody::File(path.clone()), Some(path.clone())),
        };

        let start = Instant::now();
        let receipt = storage
            .put_object(&endpoint.endpoint, &plan.bucket, &plan.object, body)
            .await
            .map_err(|e| storage_failure(e, LocalCode::LocalFileUnreadable))?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        Ok(Execution {
            detail: ObjectDetail {
                name: plan.object.clone(),
                size_bytes: receipt.size_bytes,
                elapsed_ms,
                local_path,
            },
            response: receipt.response,
        })
    }
}

fn readable_file(path: &Path) -> Result<PathBuf, Failure> {
    if !path.exists() {
        return Err(Failure::new(
            LocalCode::LocalFileNotFound,
            format!("local file '{}' does not exist", path.display()),
        ));
    }
    if !path.is_file() {
        return Err(Failure::new(
            LocalCode::LocalFileUnreadable,
            format!("'{}' is not a regular file", path.display()),
        ));
    }
    File::open(path).map_err(|e| {
        Failure::new(
            LocalCode::LocalFileUnreadable,
            format!("cannot read '{}': {}", path.display(), e),
        )
    })?;
    Ok(path.to_path_buf())
}

fn generated_name() -> String {
    format!("bosprobe-{}.tmp", Local::now().format("%Y%m%d%H%M%S"))
}

/// Random bytes for the upload body
///
/// Built from v4 UUIDs, so the version and variant bits of every 16-byte
/// chunk are fixed. Fine for a throughput probe, not for anything that
/// needs uniform randomness.
pub fn random_payload(size: usize) -> Vec<u8> {
    let mut payload = Vec::with_capacity(size);
    while payload.len() < size {
        let chunk = Uuid::new_v4();
        let take = (size - payload.len()).min(16);
        payload.extend_from_slice(&chunk.as_bytes()[..take]);
    }
    payload
}
