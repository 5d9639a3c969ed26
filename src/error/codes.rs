//! Diagnostic result codes
//!
//! Codes are namespaced so the three origins can never collide:
//! `probe.*` for findings of the probe itself, `client.*` for failures inside
//! the storage client that never reached the service, and `service.<Code>`
//! for error codes returned by the storage service verbatim.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Coarse kind of a failure, used to order suggestions and color the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Missing or conflicting arguments, found before any network activity
    LocalArgument,
    /// Local files and directories
    LocalResource,
    /// Client-side failures that never reached the service
    LocalClient,
    /// Responses from the storage service
    Service,
    /// Anything the probe did not expect
    ProbeInternal,
}

/// Findings produced by the probe itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalCode {
    RequestTypeMismatch,
    MissingBucket,
    MissingTarget,
    UrlBucketConflict,
    UrlObjectConflict,
    UrlEndpointConflict,
    InvalidUrl,
    NoResolveTarget,
    EndpointLookupFailed,
    EmptyBucket,
    ListingDenied,
    LocalFileNotFound,
    LocalFileUnreadable,
    CreateDirFailed,
    LocalWriteFailed,
    Internal,
}

impl LocalCode {
    pub const ALL: &'static [LocalCode] = &[
        LocalCode::RequestTypeMismatch,
        LocalCode::MissingBucket,
        LocalCode::MissingTarget,
        LocalCode::UrlBucketConflict,
        LocalCode::UrlObjectConflict,
        LocalCode::UrlEndpointConflict,
        LocalCode::InvalidUrl,
        LocalCode::NoResolveTarget,
        LocalCode::EndpointLookupFailed,
        LocalCode::EmptyBucket,
        LocalCode::ListingDenied,
        LocalCode::LocalFileNotFound,
        LocalCode::LocalFileUnreadable,
        LocalCode::CreateDirFailed,
        LocalCode::LocalWriteFailed,
        LocalCode::Internal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestTypeMismatch => "probe.request_type_mismatch",
            Self::MissingBucket => "probe.missing_bucket",
            Self::MissingTarget => "probe.missing_target",
            Self::UrlBucketConflict => "probe.url_bucket_conflict",
            Self::UrlObjectConflict => "probe.url_object_conflict",
            Self::UrlEndpointConflict => "probe.url_endpoint_conflict",
            Self::InvalidUrl => "probe.invalid_url",
            Self::NoResolveTarget => "probe.no_resolve_target",
            Self::EndpointLookupFailed => "probe.endpoint_lookup_failed",
            Self::EmptyBucket => "probe.empty_bucket",
            Self::ListingDenied => "probe.listing_denied",
            Self::LocalFileNotFound => "probe.local_file_not_found",
            Self::LocalFileUnreadable => "probe.local_file_unreadable",
            Self::CreateDirFailed => "probe.create_dir_failed",
            Self::LocalWriteFailed => "probe.local_write_failed",
            Self::Internal => "probe.internal",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RequestTypeMismatch
            | Self::MissingBucket
            | Self::MissingTarget
            | Self::UrlBucketConflict
            | Self::UrlObjectConflict
            | Self::UrlEndpointConflict
            | Self::NoResolveTarget => ErrorKind::LocalArgument,
            Self::LocalFileNotFound
            | Self::LocalFileUnreadable
            | Self::CreateDirFailed
            | Self::LocalWriteFailed => ErrorKind::LocalResource,
            Self::InvalidUrl => ErrorKind::LocalClient,
            Self::EndpointLookupFailed | Self::EmptyBucket | Self::ListingDenied => {
                ErrorKind::Service
            }
            Self::Internal => ErrorKind::ProbeInternal,
        }
    }
}

/// Failures inside the storage client that never produced a service response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientCode {
    /// The request could not be built (bad endpoint or object URL)
    MalformedUrl,
    /// Connection, TLS or transport failure before a response arrived
    RequestFailed,
    /// A response arrived but could not be understood
    InvalidResponse,
    /// The endpoint cache store was unreadable and has been discarded
    CacheCorrupt,
}

impl ClientCode {
    pub const ALL: &'static [ClientCode] = &[
        ClientCode::MalformedUrl,
        ClientCode::RequestFailed,
        ClientCode::InvalidResponse,
        ClientCode::CacheCorrupt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedUrl => "client.malformed_url",
            Self::RequestFailed => "client.request_failed",
            Self::InvalidResponse => "client.invalid_response",
            Self::CacheCorrupt => "client.cache_corrupt",
        }
    }
}

/// Outcome code of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Code {
    Success,
    Local(LocalCode),
    Client(ClientCode),
    /// Raw error code reported by the storage service, e.g. `NoSuchBucket`
    Service(String),
}

impl Code {
    pub const SUCCESS: &'static str = "success";
    const SERVICE_PREFIX: &'static str = "service.";

    pub fn service<S: Into<String>>(code: S) -> Self {
        Self::Service(code.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Kind of failure; success has no kind
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success => None,
            Self::Local(code) => Some(code.kind()),
            Self::Client(_) => Some(ErrorKind::LocalClient),
            Self::Service(_) => Some(ErrorKind::Service),
        }
    }

    /// Namespaced identifier used in reports and taxonomy tables
    pub fn id(&self) -> String {
        match self {
            Self::Success => Self::SUCCESS.to_string(),
            Self::Local(code) => code.as_str().to_string(),
            Self::Client(code) => code.as_str().to_string(),
            Self::Service(code) => format!("{}{}", Self::SERVICE_PREFIX, code),
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id())
    }
}

impl From<LocalCode> for Code {
    fn from(code: LocalCode) -> Self {
        Self::Local(code)
    }
}

impl From<ClientCode> for Code {
    fn from(code: ClientCode) -> Self {
        Self::Client(code)
    }
}

impl FromStr for Code {
    type Err = std::convert::Infallible;

    /// Parses a namespaced id. Unknown `probe.`/`client.` ids and anything
    /// without a namespace become `probe.internal` so lookups stay total.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == Self::SUCCESS {
            return Ok(Self::Success);
        }
        if let Some(service) = s.strip_prefix(Self::SERVICE_PREFIX) {
            return Ok(Self::Service(service.to_string()));
        }
        if let Some(local) = LocalCode::ALL.iter().find(|c| c.as_str() == s) {
            return Ok(Self::Local(*local));
        }
        if let Some(client) = ClientCode::ALL.iter().find(|c| c.as_str() == s) {
            return Ok(Self::Client(*client));
        }
        Ok(Self::Local(LocalCode::Internal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_namespaced_and_unique() {
        let mut seen = HashSet::new();
        for code in LocalCode::ALL {
            assert!(code.as_str().starts_with("probe."));
            assert!(seen.insert(code.as_str()));
        }
        for code in ClientCode::ALL {
            assert!(code.as_str().starts_with("client."));
            assert!(seen.insert(code.as_str()));
        }
    }

    #[test]
    fn test_service_code_cannot_collide_with_local() {
        // A service that happens to return a code spelled like a probe id
        let service = Code::service("probe.missing_bucket");
        assert_eq!(service.id(), "service.probe.missing_bucket");
        assert_ne!(service, Code::Local(LocalCode::MissingBucket));
    }

    #[test]
    fn test_parse_known_ids() {
        assert_eq!("success".parse::<Code>().unwrap(), Code::Success);
        assert_eq!(
            "probe.invalid_url".parse::<Code>().unwrap(),
            Code::Local(LocalCode::InvalidUrl)
        );
        assert_eq!(
            "client.request_failed".parse::<Code>().unwrap(),
            Code::Client(ClientCode::RequestFailed)
        );
        assert_eq!(
            "service.NoSuchBucket".parse::<Code>().unwrap(),
            Code::service("NoSuchBucket")
        );
    }

    #[test]
    fn test_parse_unknown_falls_back_to_internal() {
        assert_eq!(
            "probe.does_not_exist".parse::<Code>().unwrap(),
            Code::Local(LocalCode::Internal)
        );
        assert_eq!("garbage".parse::<Code>().unwrap(), Code::Local(LocalCode::Internal));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Code::Success.kind(), None);
        assert_eq!(Code::from(LocalCode::MissingBucket).kind(), Some(ErrorKind::LocalArgument));
        assert_eq!(Code::from(LocalCode::LocalFileNotFound).kind(), Some(ErrorKind::LocalResource));
        assert_eq!(Code::from(ClientCode::RequestFailed).kind(), Some(ErrorKind::LocalClient));
        assert_eq!(Code::service("AccessDenied").kind(), Some(ErrorKind::Service));
        assert_eq!(Code::from(LocalCode::Internal).kind(), Some(ErrorKind::ProbeInternal));
    }

    #[test]
    fn test_serializes_as_id() {
        let json = serde_json::to_string(&Code::service("NoSuchKey")).unwrap();
        assert_eq!(json, "\"service.NoSuchKey\"");
    }
}
