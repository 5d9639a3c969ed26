//! reqwest-based storage client
//!
//! Speaks the plain REST surface of the service: object PUT/GET under
//! `/{bucket}/{key}`, a one-key listing under `/{bucket}?maxKeys=1` and the
//! bucket location under `/{bucket}?location`. Error documents are JSON with
//! `code`, `message` and `requestId`; the request and debug ids also arrive
//! as `x-bce-request-id` / `x-bce-debug-id` headers.
//!
//! Requests go out unsigned unless a [`RequestSigner`] is installed.

use super::{PutBody, StorageClient, StorageError, StorageResult, TransferReceipt};
use crate::credentials::Credentials;
use crate::error::{AppError, ClientCode, Result};
use crate::models::ServiceResponse;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const REQUEST_ID_HEADER: &str = "x-bce-request-id";
const DEBUG_ID_HEADER: &str = "x-bce-debug-id";
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Hook that authorizes outgoing requests
pub trait RequestSigner: Send + Sync {
    fn sign(
        &self,
        request: RequestBuilder,
        method: &Method,
        url: &Url,
        credentials: &Credentials,
    ) -> RequestBuilder;
}

/// Sends requests without authorization
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousSigner;

impl RequestSigner for AnonymousSigner {
    fn sign(
        &self,
        request: RequestBuilder,
        _: &Method,
        _: &Url,
        _: &Credentials,
    ) -> RequestBuilder {
        request
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDocument {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListObjectsResponse {
    #[serde(default)]
    contents: Vec<ObjectSummary>,
}

#[derive(Debug, Deserialize)]
struct ObjectSummary {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationResponse {
    #[serde(default)]
    location_constraint: String,
}

/// Storage client over HTTP
pub struct HttpStorageClient {
    http: Client,
    scheme: &'static str,
    credentials: Credentials,
    signer: Arc<dyn RequestSigner>,
}

impl HttpStorageClient {
    pub fn new(credentials: Credentials, use_https: bool) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            scheme: if use_https { "https" } else { "http" },
            credentials,
            signer: Arc::new(AnonymousSigner),
        })
    }

    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = signer;
        self
    }

    fn bucket_url(&self, endpoint: &str, bucket: &str) -> StorageResult<Url> {
        let mut url = Url::parse(&format!("{}://{}/", self.scheme, endpoint)).map_err(|e| {
            StorageError::client(
                ClientCode::MalformedUrl,
                format!("Invalid endpoint '{}': {}", endpoint, e),
            )
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                StorageError::client(
                    ClientCode::MalformedUrl,
                    format!("Invalid endpoint '{}'", endpoint),
                )
            })?
            .clear()
            .push(bucket);
        Ok(url)
    }

    fn object_url(&self, endpoint: &str, bucket: &str, key: &str) -> StorageResult<Url> {
        let mut url = self.bucket_url(endpoint, bucket)?;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(key.split('/'));
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method.clone(), url.clone());
        self.signer.sign(builder, &method, &url, &self.credentials)
    }

    async fn send(&self, request: RequestBuilder) -> StorageResult<Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(service_error(response).await)
        }
    }

    async fn download(&self, response: Response, dest: &Path) -> StorageResult<TransferReceipt> {
        let meta = response_ids(&response);
        let size_bytes = save_body(response.bytes_stream(), dest).await?;
        Ok(TransferReceipt { size_bytes, response: meta })
    }
}

/// Stream a response body into `dest`. A partially written file is removed.
async fn save_body<S, B, E>(stream: S, dest: &Path) -> StorageResult<u64>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<StorageError>,
{
    let mut file = tokio::fs::File::create(dest).await?;
    let result = write_body(&mut file, stream).await;
    if result.is_err() {
        drop(file);
        let _ = tokio::fs::remove_file(dest).await;
    }
    result
}

async fn write_body<S, B, E>(file: &mut tokio::fs::File, mut stream: S) -> StorageResult<u64>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<StorageError>,
{
    let mut size_bytes = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::into)?;
        file.write_all(chunk.as_ref()).await?;
        size_bytes += chunk.as_ref().len() as u64;
    }
    file.flush().await?;
    Ok(size_bytes)
}

fn response_ids(response: &Response) -> ServiceResponse {
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    ServiceResponse {
        status: response.status().as_u16(),
        request_id: header(REQUEST_ID_HEADER),
        debug_id: header(DEBUG_ID_HEADER),
    }
}

/// Turn an error response into [`StorageError::Service`]
async fn service_error(response: Response) -> StorageError {
    let ids = response_ids(&response);
    let reason = response
        .status()
        .canonical_reason()
        .unwrap_or("UnknownError")
        .replace(' ', "");
    let body = response.text().await.unwrap_or_default();

    let document = serde_json::from_str::<ErrorDocument>(&body).ok();
    let (code, message, body_request_id) = match document {
        Some(doc) if !doc.code.is_empty() => (doc.code, doc.message, doc.request_id),
        _ => (reason, body.trim().to_string(), None),
    };

    StorageError::Service {
        status: ids.status,
        code,
        message,
        request_id: ids.request_id.or(body_request_id),
        debug_id: ids.debug_id,
    }
}

fn invalid_response(e: reqwest::Error) -> StorageError {
    StorageError::client(ClientCode::InvalidResponse, e.to_string())
}

async fn file_body(path: &Path) -> StorageResult<(reqwest::Body, u64)> {
    let file = tokio::fs::File::open(path).await?;
    let size = file.metadata().await?.len();

    let stream = futures::stream::unfold(Some(file), |state| async move {
        let mut file = state?;
        let mut buf = vec![0u8; UPLOAD_CHUNK_BYTES];
        match file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok::<_, std::io::Error>(buf), Some(file)))
            }
            Err(e) => Some((Err(e), None)),
        }
    });

    Ok((reqwest::Body::wrap_stream(stream), size))
}

#[async_trait]
impl StorageClient for HttpStorageClient {
    async fn put_object(
        &self,
        endpoint: &str,
        bucket: &str,
        key: &str,
        body: PutBody,
    ) -> StorageResult<TransferReceipt> {
        let url = self.object_url(endpoint, bucket, key)?;
        let (body, size_bytes) = match body {
            PutBody::Bytes(bytes) => {
                let size = bytes.len() as u64;
                (reqwest::Body::from(bytes), size)
            }
            PutBody::File(path) => file_body(&path).await?,
        };

        let request = self
            .request(Method::PUT, url)
            .header(reqwest::header::CONTENT_LENGTH, size_bytes)
            .body(body);
        let response = self.send(request).await?;

        Ok(TransferReceipt {
            size_bytes,
            response: response_ids(&response),
        })
    }

    async fn get_object(
        &self,
        endpoint: &str,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> StorageResult<TransferReceipt> {
        let url = self.object_url(endpoint, bucket, key)?;
        let response = self.send(self.request(Method::GET, url)).await?;
        self.download(response, dest).await
    }

    async fn get_one_object_from_bucket(
        &self,
        endpoint: &str,
        bucket: &str,
    ) -> StorageResult<Option<String>> {
        let mut url = self.bucket_url(endpoint, bucket)?;
        url.set_query(Some("maxKeys=1"));

        let response = self.send(self.request(Method::GET, url)).await?;
        let listing: ListObjectsResponse = response.json().await.map_err(invalid_response)?;
        Ok(listing.contents.into_iter().next().map(|o| o.key))
    }

    async fn get_object_from_url(&self, url: &str, dest: &Path) -> StorageResult<TransferReceipt> {
        let url = Url::parse(url).map_err(|e| {
            StorageError::client(ClientCode::MalformedUrl, format!("Invalid URL '{}': {}", url, e))
        })?;
        let response = self.send(self.request(Method::GET, url)).await?;
        self.download(response, dest).await
    }

    async fn get_bucket_location(&self, endpoint: &str, bucket: &str) -> StorageResult<String> {
        let mut url = self.bucket_url(endpoint, bucket)?;
        url.set_query(Some("location"));

        let response = self.send(self.request(Method::GET, url)).await?;
        let location: LocationResponse = response.json().await.map_err(invalid_response)?;
        Ok(location.location_constraint)
    }
}
