//! Blocking HTTP transport backed by `ureq`.
//!
//! # Design
//! Every HTTP status is returned as data (`http_status_as_error(false)`) and
//! redirects are never followed, so the driver sees exactly what the server
//! answered and applies its own status policy. The context is checked before
//! the request leaves; its deadline, together with the configured timeout,
//! bounds the whole exchange.

use std::io::Read;
use std::time::Duration;

use url::Url;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::TransportError;
use crate::http::{Body, HttpRequest, HttpResponse, Transport};

/// `Transport` that talks to a real server over HTTP(S).
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    base_url: Url,
    token: Option<String>,
    user_agent: String,
    timeout: Option<Duration>,
}

impl UreqTransport {
    pub fn new(base_url: Url, config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .build()
            .new_agent();

        Self {
            agent,
            base_url,
            token: config.token.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
        }
    }

    /// Absolute URL for a request path.
    pub fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|e| TransportError::InvalidRequest(format!("{path}: {e}")))
    }

    /// The tighter of the configured timeout and the context deadline.
    fn timeout_for(&self, ctx: &Context) -> Option<Duration> {
        match (self.timeout, ctx.remaining()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn builder(&self, request: &HttpRequest) -> Result<http::request::Builder, TransportError> {
        let url = self.resolve(&request.path)?;
        let mut builder = http::Request::builder()
            .method(http::Method::from(request.method))
            .uri(url.as_str())
            .header(http::header::ACCEPT, "application/json")
            .header(http::header::USER_AGENT, self.user_agent.as_str());
        if let Some(token) = &self.token {
            builder = builder.header(http::header::AUTHORIZATION, format!("token {token}"));
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        Ok(builder)
    }

    fn execute<S: ureq::AsSendBody>(
        &self,
        ctx: &Context,
        request: http::Request<S>,
    ) -> Result<HttpResponse, TransportError> {
        let request = match self.timeout_for(ctx) {
            Some(timeout) => self
                .agent
                .configure_request(request)
                .timeout_global(Some(timeout))
                .build(),
            None => request,
        };

        let response = self.agent.run(request)?;
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

        let mut bytes = Vec::new();
        response.into_body().into_reader().read_to_end(&mut bytes)?;

        Ok(HttpResponse {
            status,
            headers,
            body: Body::from_bytes(bytes),
        })
    }
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Transport for UreqTransport {
    fn send(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        ctx.check()?;
        let builder = self.builder(&request)?;
        match request.body {
            Some(body) => {
                let request = builder
                    .body(body)
                    .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                self.execute(ctx, request)
            }
            None => {
                let request = builder
                    .body(())
                    .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                self.execute(ctx, request)
            }
        }
    }
}
