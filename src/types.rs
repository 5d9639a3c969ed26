//! Type definitions shared across the pipeline

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Coarse network reachability, produced once per run from ping results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NetStatus {
    /// The pipeline never reached the network stage
    #[default]
    NotChecked,
    /// The endpoint answered ping
    Reachable,
    /// The endpoint did not answer but the reference host did
    EndpointUnreachable,
    /// Neither the endpoint nor the reference host answered
    ClientOffline,
}

impl NetStatus {
    /// Reduce two ping results to a status
    pub fn classify(endpoint_ok: bool, reference_ok: bool) -> Self {
        match (endpoint_ok, reference_ok) {
            (true, _) => NetStatus::Reachable,
            (false, true) => NetStatus::EndpointUnreachable,
            (false, false) => NetStatus::ClientOffline,
        }
    }

    pub fn is_checked(&self) -> bool {
        !matches!(self, NetStatus::NotChecked)
    }

    /// Localization key for the report
    pub fn label_key(&self) -> &'static str {
        match self {
            NetStatus::NotChecked => "net.not_checked",
            NetStatus::Reachable => "net.reachable",
            NetStatus::EndpointUnreachable => "net.endpoint_unreachable",
            NetStatus::ClientOffline => "net.client_offline",
        }
    }
}

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    RequestInit,
    RequestCheck,
    ResolveEndpoint,
    ClassifyNetwork,
    Execute,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::RequestInit,
        Stage::RequestCheck,
        Stage::ResolveEndpoint,
        Stage::ClassifyNetwork,
        Stage::Execute,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::RequestInit => "request_init",
            Stage::RequestCheck => "request_check",
            Stage::ResolveEndpoint => "resolve_endpoint",
            Stage::ClassifyNetwork => "classify_network",
            Stage::Execute => "execute",
        }
    }
}

/// What happened to a stage during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StageStatus {
    #[default]
    Pending,
    Passed,
    Failed,
    /// An earlier stage failed
    Skipped,
}

impl StageStatus {
    pub fn label_key(&self) -> &'static str {
        match self {
            StageStatus::Pending => "status.pending",
            StageStatus::Passed => "status.ok",
            StageStatus::Failed => "status.failed",
            StageStatus::Skipped => "status.skipped",
        }
    }
}
