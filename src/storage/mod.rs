//! Storage service collaborator
//!
//! The probe only needs five calls from the storage client. They sit behind
//! [`StorageClient`] so the pipeline can be driven by any implementation;
//! [`HttpStorageClient`] is the bundled reqwest one.

pub mod http;

pub use http::{AnonymousSigner, HttpStorageClient, RequestSigner};

use crate::error::{ClientCode, Code};
use crate::models::ServiceResponse;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the storage client
#[derive(Error, Debug)]
pub enum StorageError {
    /// The service answered with an error document
    #[error("[{status}] {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
        request_id: Option<String>,
        debug_id: Option<String>,
    },

    /// The request failed before a usable response arrived
    #[error("{message}")]
    Client { code: ClientCode, message: String },

    /// Local file I/O around the transfer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn client<S: Into<String>>(code: ClientCode, message: S) -> Self {
        Self::Client {
            code,
            message: message.into(),
        }
    }

    /// Service error code, e.g. `AccessDenied`
    pub fn service_code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Taxonomy code, `None` for local I/O which the caller classifies
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Service { code, .. } => Some(Code::service(code.clone())),
            Self::Client { code, .. } => Some(Code::Client(*code)),
            Self::Io(_) => None,
        }
    }

    /// Service identifiers carried by the error
    pub fn response(&self) -> Option<ServiceResponse> {
        match self {
            Self::Service { status, request_id, debug_id, .. } => Some(ServiceResponse {
                status: *status,
                request_id: request_id.clone(),
                debug_id: debug_id.clone(),
            }),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(error: reqwest::Error) -> Self {
        let code = if error.is_builder() {
            ClientCode::MalformedUrl
        } else if error.is_decode() || error.is_body() {
            ClientCode::InvalidResponse
        } else {
            ClientCode::RequestFailed
        };
        Self::client(code, error.to_string())
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Upload payload
#[derive(Debug, Clone)]
pub enum PutBody {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// Result of a completed transfer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferReceipt {
    pub size_bytes: u64,
    pub response: ServiceResponse,
}

/// The calls the probe makes against the storage service
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Upload one object
    async fn put_object(
        &self,
        endpoint: &str,
        bucket: &str,
        key: &str,
        body: PutBody,
    ) -> StorageResult<TransferReceipt>;

    /// Download one object to `dest`
    async fn get_object(
        &self,
        endpoint: &str,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> StorageResult<TransferReceipt>;

    /// Name of some object in the bucket, `None` when the bucket is empty
    async fn get_one_object_from_bucket(
        &self,
        endpoint: &str,
        bucket: &str,
    ) -> StorageResult<Option<String>>;

    /// Download a full object URL to `dest`
    async fn get_object_from_url(&self, url: &str, dest: &Path) -> StorageResult<TransferReceipt>;

    /// Region the bucket lives in, asked of the lookup endpoint
    async fn get_bucket_location(&self, endpoint: &str, bucket: &str) -> StorageResult<String>;
}
