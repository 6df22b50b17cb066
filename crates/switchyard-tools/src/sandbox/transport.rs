//! Network seams of the sandbox: outbound HTTP and DNS resolution

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method, Response};
use serde_json::Value;
use switchyard_core::{Error, Result};
use url::Url;

use crate::execution::HttpMethod;

/// Connect timeout for every HTTP tool call
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fully prepared outbound call
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub json: Option<Value>,
    /// Read timeout
    pub timeout: Duration,
    /// Body bytes read before the call is aborted
    pub max_body_bytes: usize,
    /// Addresses the host was checked against; the connection is pinned
    /// to them when non-empty
    pub resolved_addrs: Vec<IpAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse>;
}

#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Production transport over `reqwest`
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client(client_builder())?,
        })
    }

    /// Shared client, or a one-off client whose DNS for the target host is
    /// fixed to the addresses egress validation saw
    fn client_for(&self, request: &OutboundRequest) -> Result<Client> {
        if request.resolved_addrs.is_empty() {
            return Ok(self.client.clone());
        }

        let url = Url::parse(&request.url).map_err(|e| Error::Request(format!("invalid HTTP tool URL: {e}")))?;
        let Some(host) = url.host_str() else {
            return Ok(self.client.clone());
        };
        // port is taken from the URL
        let addrs: Vec<SocketAddr> = request
            .resolved_addrs
            .iter()
            .map(|ip| SocketAddr::new(*ip, 0))
            .collect();
        build_client(client_builder().resolve_to_addrs(host, &addrs))
    }
}

fn client_builder() -> ClientBuilder {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
}

fn build_client(builder: ClientBuilder) -> Result<Client> {
    builder
        .build()
        .map_err(|e| Error::Request(format!("failed to build HTTP tool client: {e}")))
}

fn body_too_large(limit: usize) -> Error {
    Error::Request(format!("HTTP tool response exceeded {limit} bytes"))
}

/// Append `chunk` unless the body would grow past `limit`
fn append_limited(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<()> {
    if body.len().saturating_add(chunk.len()) > limit {
        return Err(body_too_large(limit));
    }
    body.extend_from_slice(chunk);
    Ok(())
}

/// Stream the body, giving up as soon as it passes `limit`
async fn read_limited(mut response: Response, limit: usize) -> Result<String> {
    if response
        .content_length()
        .is_some_and(|len| len > u64::try_from(limit).unwrap_or(u64::MAX))
    {
        return Err(body_too_large(limit));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| Error::Request(format!("failed to read HTTP tool response: {e}")))?
    {
        append_limited(&mut body, &chunk, limit)?;
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

const fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse> {
        let mut builder = self
            .client_for(&request)?
            .request(method(request.method), &request.url)
            .timeout(request.timeout)
            .query(&request.query);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.json {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(url = %request.url, error = %e, "http tool request failed");
            Error::Request(format!("HTTP tool request failed: {e}"))
        })?;

        let status = response.status().as_u16();
        let body = read_limited(response, request.max_body_bytes).await.inspect_err(|e| {
            tracing::warn!(url = %request.url, error = %e, "http tool response rejected");
        })?;

        Ok(OutboundResponse { status, body })
    }
}

/// Resolver backed by tokio's `lookup_host`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioResolver;

#[async_trait]
impl HostResolver for TokioResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 443)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}
