//! Probe requests and the accumulating outcome of a run

use crate::credentials::Credentials;
use crate::error::Code;
use crate::resolver::ResolvedEndpoint;
use crate::types::{NetStatus, Stage, StageStatus};
use serde::Serialize;
use std::path::PathBuf;

/// Returns the value only when it is present and not blank
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Upload probe parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadRequest {
    pub credentials: Credentials,
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub object: Option<String>,
    pub local_path: Option<String>,
    /// Drop the cached endpoint of the bucket before resolving
    pub refresh_endpoint: bool,
}

/// Download probe parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadRequest {
    pub credentials: Credentials,
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub object: Option<String>,
    pub local_path: Option<String>,
    /// Full object URL, exclusive with bucket, object and endpoint
    pub url: Option<String>,
    pub refresh_endpoint: bool,
}

/// A probe request, built once by the CLI layer
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeRequest {
    Upload(UploadRequest),
    Download(DownloadRequest),
}

impl ProbeRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeRequest::Upload(_) => "upload",
            ProbeRequest::Download(_) => "download",
        }
    }

    fn credentials(&self) -> &Credentials {
        match self {
            ProbeRequest::Upload(r) => &r.credentials,
            ProbeRequest::Download(r) => &r.credentials,
        }
    }

    pub fn access_key(&self) -> &str {
        &self.credentials().access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.credentials().secret_key
    }

    /// Explicit endpoint override, if any
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProbeRequest::Upload(r) => non_empty(&r.endpoint),
            ProbeRequest::Download(r) => non_empty(&r.endpoint),
        }
    }

    pub fn bucket(&self) -> Option<&str> {
        match self {
            ProbeRequest::Upload(r) => non_empty(&r.bucket),
            ProbeRequest::Download(r) => non_empty(&r.bucket),
        }
    }
}

/// Identifiers returned by the storage service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceResponse {
    pub status: u16,
    pub request_id: Option<String>,
    pub debug_id: Option<String>,
}

impl ServiceResponse {
    pub fn has_ids(&self) -> bool {
        self.request_id.is_some() || self.debug_id.is_some()
    }
}

/// The transferred object, present only on success
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDetail {
    pub name: String,
    pub size_bytes: u64,
    pub elapsed_ms: u64,
    /// Local file read or written
    pub local_path: Option<PathBuf>,
}

impl ObjectDetail {
    pub fn throughput_bytes_per_sec(&self) -> Option<f64> {
        if self.elapsed_ms == 0 {
            return None;
        }
        Some(self.size_bytes as f64 * 1000.0 / self.elapsed_ms as f64)
    }
}

/// Successful result of the execute stage
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub detail: ObjectDetail,
    pub response: ServiceResponse,
}

/// A stage failure: the code plus whatever the failure carried
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub code: Code,
    pub error: String,
    pub response: Option<ServiceResponse>,
}

impl Failure {
    pub fn new<C: Into<Code>, S: Into<String>>(code: C, error: S) -> Self {
        Self {
            code: code.into(),
            error: error.into(),
            response: None,
        }
    }

    pub fn with_response(mut self, response: Option<ServiceResponse>) -> Self {
        self.response = response;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
}

/// Result record threaded through every pipeline stage
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub code: Code,
    pub net_status: NetStatus,
    pub error: Option<String>,
    pub detail: Option<ObjectDetail>,
    pub response: Option<ServiceResponse>,
    pub stages: Vec<StageRecord>,
    pub endpoint: Option<ResolvedEndpoint>,
}

impl Default for CheckOutcome {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckOutcome {
    pub fn new() -> Self {
        Self {
            code: Code::Success,
            net_status: NetStatus::NotChecked,
            error: None,
            detail: None,
            response: None,
            stages: Stage::ALL
                .iter()
                .map(|&stage| StageRecord { stage, status: StageStatus::Pending })
                .collect(),
            endpoint: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }

    pub fn stage_status(&self, stage: Stage) -> StageStatus {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| r.status)
            .unwrap_or_default()
    }

    fn set_stage(&mut self, stage: Stage, status: StageStatus) {
        if let Some(record) = self.stages.iter_mut().find(|r| r.stage == stage) {
            record.status = status;
        }
    }

    pub fn pass(&mut self, stage: Stage) {
        self.set_stage(stage, StageStatus::Passed);
    }

    /// Record a failing stage and mark every later stage skipped
    pub fn fail(&mut self, stage: Stage, failure: Failure) {
        self.code = failure.code;
        self.error = Some(failure.error);
        if failure.response.is_some() {
            self.response = failure.response;
        }
        self.detail = None;
        self.set_stage(stage, StageStatus::Failed);
        for record in self.stages.iter_mut().filter(|r| r.stage as u8 > stage as u8) {
            record.status = StageStatus::Skipped;
        }
    }

    /// Whether the request passed init and check
    pub fn request_valid(&self) -> bool {
        self.stage_status(Stage::RequestInit) == StageStatus::Passed
            && self.stage_status(Stage::RequestCheck) == StageStatus::Passed
    }

    pub fn has_failed(&self) -> bool {
        self.stages.iter().any(|r| r.status == StageStatus::Failed)
    }
}
