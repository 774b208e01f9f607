//! The seam between request building and the network.
//!
//! # Design
//! [`Transport`] executes one [`HttpRequest`] and hands back the response as
//! data. Non-2xx statuses are data too; only a failed round-trip is an
//! error. [`UreqTransport`] is the bundled blocking implementation, and any
//! `Fn(&HttpRequest) -> Result<HttpResponse>` closure is a transport as well,
//! which keeps tests free of sockets.

use tracing::debug;

use crate::error::{OrdrinError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes a request. Shared across threads when the client is.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
///
/// The agent returns 4xx/5xx responses as data so the caller can read the
/// service's error payload.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

fn with_headers<B>(
    builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    headers
        .iter()
        .fold(builder, |b, (name, value)| b.header(name.as_str(), value.as_str()))
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = request.url.as_str();
        let headers = request.headers.as_slice();
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
        };
        let mut response = result.map_err(|e| OrdrinError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| OrdrinError::Transport(e.to_string()))?;
        debug!(status, bytes = body.len(), "ureq round-trip complete");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
