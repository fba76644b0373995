//! HTTP plumbing behind the tile loader.
//!
//! The loader only needs "send this request, give me status and body"; the
//! [`TileTransport`] trait is that seam, so the status classification can be
//! driven by a scripted transport in tests and by `reqwest` in production.

use async_trait::async_trait;

use crate::{core::config::TileLoaderConfig, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One tile fetch, fully resolved: URL, method, headers and optional JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct TileRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Ask for the raw bytes rather than text (MVT/protobuf payloads)
    pub binary: bool,
}

impl TileRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            binary: false,
        }
    }

    /// POST with a JSON body and the matching `Content-Type` header
    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
            binary: false,
        }
    }

    pub fn binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and raw body of a completed request
#[derive(Debug, Clone, PartialEq)]
pub struct TileResponse {
    /// `0` for transports without HTTP semantics (local files)
    pub status: u16,
    pub body: Vec<u8>,
}

impl TileResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends tile requests. An `Err` means the request never produced a status
/// (connection refused, DNS, timeout).
#[async_trait]
pub trait TileTransport: Send + Sync {
    async fn send(&self, request: &TileRequest) -> Result<TileResponse>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &TileLoaderConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Reuse an existing client (shared connection pool)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TileTransport for ReqwestTransport {
    async fn send(&self, request: &TileRequest) -> Result<TileResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(TileResponse { status, body })
    }
}
