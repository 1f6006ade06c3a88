//! reqwest-backed HTTP transport

use pantry_core::HttpMethod;
use pantry_core::environment::{HttpRequest, HttpResponse, HttpTransport};
use pantry_core::error::TransportError;
use reqwest::{Client, Method};
use serde_json::Value;
use std::future::Future;

/// Production transport
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a default client
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport over an existing client (shared pool, proxies, ...)
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        let client = self.client.clone();
        async move { send(&client, request).await }
    }
}

async fn send(client: &Client, request: HttpRequest) -> Result<HttpResponse, TransportError> {
    let url = request.full_url();
    let mut builder = client
        .request(method(request.method), &url)
        .query(&request.query);
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let response = builder.send().await.map_err(|e| {
        tracing::error!(method = %request.method, url = %url, error = %e, "Request failed");
        TransportError::network(e.to_string())
    })?;

    let status = response.status();
    let text = response.text().await.map_err(|e| {
        tracing::error!(status = status.as_u16(), url = %url, error = %e, "Reading body failed");
        TransportError::status(status.as_u16(), None, e.to_string())
    })?;
    let body = parse_body(&text);

    if status.is_success() {
        return Ok(HttpResponse {
            status: status.as_u16(),
            body: body.unwrap_or(Value::Null),
        });
    }

    tracing::error!(method = %request.method, url = %url, status = status.as_u16(), "Request returned an error status");
    Err(TransportError::status(
        status.as_u16(),
        body,
        format!("{} {url}: {status}", request.method),
    ))
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Connect => Method::CONNECT,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Trace => Method::TRACE,
        HttpMethod::Head => Method::HEAD,
    }
}

/// JSON when possible, otherwise the raw text as a JSON string.
fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}
