//! HTTP transport seam.
//!
//! Everything above this module talks to a [`Transport`]; the production
//! implementation is [`HttpTransport`] on top of `reqwest`, tests plug in
//! scripted stubs.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use pan123_protocol::Envelope;
use pan123_protocol::constants::{
    API_BASE_URL, TIMEOUT_DEFAULT, TIMEOUT_DOWNLOAD, TIMEOUT_UPLOAD_CHUNK,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION};
use reqwest::redirect::Policy;
use tracing::{debug, warn};

use crate::error::ApiError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Body of a streamed download.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ApiError>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One JSON API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Either a path relative to the API origin or an absolute URL.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            timeout: TIMEOUT_DEFAULT,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            body: Some(body),
            ..Self::get(path)
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of a non-following GET.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

impl Probe {
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// An open streamed download.
pub struct Download {
    /// From `Content-Length`, when the server sent one.
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Abstract HTTP access used by the client and the transfer engines.
pub trait Transport: Send + Sync {
    /// Sends a JSON request and decodes the response envelope.
    ///
    /// The HTTP status is not checked; the envelope code decides.
    fn send(&self, req: ApiRequest) -> BoxFuture<'_, Result<Envelope, ApiError>>;

    /// PUTs one raw part to a presigned URL and returns the HTTP status.
    fn put_part(&self, url: &str, data: Vec<u8>) -> BoxFuture<'_, Result<u16, ApiError>>;

    /// GETs `url` without following redirects.
    fn probe(&self, url: &str) -> BoxFuture<'_, Result<Probe, ApiError>>;

    /// Opens a streamed GET. Non-2xx statuses are errors.
    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<Download, ApiError>>;
}

/// `reqwest` backed [`Transport`].
pub struct HttpTransport {
    api: reqwest::Client,
    /// No redirects and no certificate checks; only used to read the
    /// `Location` of download links.
    probe: reqwest::Client,
    /// Connect and per-read timeouts instead of a whole-request deadline, so
    /// large bodies are not cut off.
    stream: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(API_BASE_URL)
    }

    /// Creates a transport whose relative paths resolve against `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let api = reqwest::Client::builder().build().map_err(build_error)?;
        let probe = reqwest::Client::builder()
            .redirect(Policy::none())
            .danger_accept_invalid_certs(true)
            .timeout(TIMEOUT_DEFAULT)
            .build()
            .map_err(build_error)?;
        let stream = reqwest::Client::builder()
            .connect_timeout(TIMEOUT_DOWNLOAD)
            .read_timeout(TIMEOUT_DOWNLOAD)
            .build()
            .map_err(build_error)?;

        Ok(Self {
            api,
            probe,
            stream,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}

fn build_error(e: reqwest::Error) -> ApiError {
    ApiError::Transport(format!("client setup: {e}"))
}

fn transport_error(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

/// Converts header pairs, skipping any the HTTP stack would refuse.
fn header_map(pairs: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(n), Ok(v)) => {
                map.insert(n, v);
            }
            _ => warn!(header = %name, "skipping invalid header"),
        }
    }
    map
}

impl Transport for HttpTransport {
    fn send(&self, req: ApiRequest) -> BoxFuture<'_, Result<Envelope, ApiError>> {
        Box::pin(async move {
            let url = self.url_for(&req.path);
            debug!(method = ?req.method, url = %url, "api request");

            let builder = match req.method {
                Method::Get => self.api.get(&url),
                Method::Post => self.api.post(&url),
            };
            let mut builder = builder
                .headers(header_map(&req.headers))
                .query(&req.query)
                .timeout(req.timeout);
            if let Some(body) = &req.body {
                builder = builder.json(body);
            }

            let resp = builder.send().await.map_err(transport_error)?;
            let status = resp.status().as_u16();
            let bytes = resp.bytes().await.map_err(transport_error)?;
            serde_json::from_slice::<Envelope>(&bytes).map_err(|e| {
                debug!(status, len = bytes.len(), "response is not an envelope");
                ApiError::Decode(e.to_string())
            })
        })
    }

    fn put_part(&self, url: &str, data: Vec<u8>) -> BoxFuture<'_, Result<u16, ApiError>> {
        let url = url.to_string();
        Box::pin(async move {
            let resp = self
                .stream
                .put(&url)
                .timeout(TIMEOUT_UPLOAD_CHUNK)
                .body(data)
                .send()
                .await
                .map_err(transport_error)?;
            Ok(resp.status().as_u16())
        })
    }

    fn probe(&self, url: &str) -> BoxFuture<'_, Result<Probe, ApiError>> {
        let url = url.to_string();
        Box::pin(async move {
            let resp = self.probe.get(&url).send().await.map_err(transport_error)?;
            let status = resp.status().as_u16();
            let location = resp
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = resp.text().await.map_err(transport_error)?;
            Ok(Probe {
                status,
                location,
                body,
            })
        })
    }

    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<Download, ApiError>> {
        let url = url.to_string();
        Box::pin(async move {
            let resp = self.stream.get(&url).send().await.map_err(transport_error)?;
            let status = resp.status();
            if !status.is_success() {
                return Err(ApiError::Status(status.as_u16()));
            }
            let content_length = resp.content_length();
            let body = resp
                .bytes_stream()
                .map(|chunk| chunk.map(|b| b.to_vec()).map_err(transport_error));
            Ok(Download {
                content_length,
                body: Box::pin(body),
            })
        })
    }
}
