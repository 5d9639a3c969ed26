//! Data models and structures for bosprobe

pub mod config;
pub mod outcome;

// Re-export main model types
pub use config::ProbeConfig;
pub use outcome::{
    CheckOutcome, DownloadRequest, Execution, Failure, ObjectDetail, ProbeRequest,
    ServiceResponse, StageRecord, UploadRequest,
};
