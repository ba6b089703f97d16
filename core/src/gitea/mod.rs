//! Gitea driver.
//!
//! # Overview
//! `new` parses and normalizes the base endpoint, builds a transport, and
//! wires the nine Gitea services onto a `Client`. Each service holds an
//! `Arc<Wrapper>` and funnels every call through `Wrapper::do_request`, which
//! encodes the input, performs the exchange, classifies the status and
//! decodes or copies the body.
//!
//! # Design
//! - Status codes above 300 are failures. This includes redirects; the ureq
//!   transport never follows them, so a 3xx reaches the caller as an error.
//! - The output destination is an explicit `Output` variant chosen by the
//!   calling service rather than inferred from the target's type.
//! - The response body is owned by the call frame and dropped on every exit
//!   path, so it is released exactly once per request.

mod content;
mod git;
mod issue;
mod org;
mod pr;
mod repo;
mod review;
mod user;
mod webhook;

#[cfg(test)]
pub(crate) mod testing;

use std::io::{self, Read, Write};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::{form_urlencoded, Url};

use crate::client::{Client, Services};
use crate::config::{ClientConfig, Service};
use crate::context::Context;
use crate::error::ScmError;
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::services::{
    ContentService, GitService, IssueService, OrganizationService, PullRequestService,
    RepositoryService, ReviewService, ScmResult, UserService, WebhookService,
};
use crate::transport::UreqTransport;
use crate::types::{Driver, ListOptions, Response};

pub use content::GiteaContentService;
pub use git::GiteaGitService;
pub use issue::GiteaIssueService;
pub use org::GiteaOrganizationService;
pub use pr::GiteaPullRequestService;
pub use repo::GiteaRepositoryService;
pub use review::GiteaReviewService;
pub use user::GiteaUserService;
pub use webhook::GiteaWebhookService;

/// Builds a Gitea client for `uri` with every service enabled.
///
/// No network I/O happens here.
pub fn new(uri: &str) -> Result<Client, ScmError> {
    with_config(&ClientConfig::new(uri))
}

/// Builds a Gitea client talking HTTP through `ureq`.
pub fn with_config(config: &ClientConfig) -> Result<Client, ScmError> {
    let base_url = normalize_base_url(&config.base_url)?;
    let transport = Arc::new(UreqTransport::new(base_url.clone(), config));
    Ok(wire(base_url, config, transport))
}

/// Builds a Gitea client on top of a caller-supplied transport.
///
/// The transport is expected to resolve request paths against the same base
/// URL the client reports.
pub fn with_transport(
    config: &ClientConfig,
    transport: Arc<dyn Transport>,
) -> Result<Client, ScmError> {
    let base_url = normalize_base_url(&config.base_url)?;
    Ok(wire(base_url, config, transport))
}

/// A webhook parser that needs no client.
pub fn new_webhook_service() -> GiteaWebhookService {
    GiteaWebhookService::new()
}

/// Parses `uri` and guarantees exactly one trailing `/` on its path.
pub fn normalize_base_url(uri: &str) -> Result<Url, ScmError> {
    let mut base = Url::parse(uri).map_err(|e| ScmError::InvalidUrl {
        url: uri.to_string(),
        reason: e.to_string(),
    })?;
    if base.cannot_be_a_base() {
        return Err(ScmError::InvalidUrl {
            url: uri.to_string(),
            reason: "not usable as a base URL".to_string(),
        });
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

fn wire(base_url: Url, config: &ClientConfig, transport: Arc<dyn Transport>) -> Client {
    let wrapper = Arc::new(Wrapper::new(transport));
    let issues = Arc::new(GiteaIssueService::new(Arc::clone(&wrapper)));

    let services = Services {
        contents: enabled(config, Service::Contents, || {
            Arc::new(GiteaContentService::new(Arc::clone(&wrapper))) as Arc<dyn ContentService>
        }),
        git: enabled(config, Service::Git, || {
            Arc::new(GiteaGitService::new(Arc::clone(&wrapper))) as Arc<dyn GitService>
        }),
        issues: enabled(config, Service::Issues, || {
            Arc::clone(&issues) as Arc<dyn IssueService>
        }),
        organizations: enabled(config, Service::Organizations, || {
            Arc::new(GiteaOrganizationService::new(Arc::clone(&wrapper)))
                as Arc<dyn OrganizationService>
        }),
        pull_requests: enabled(config, Service::PullRequests, || {
            Arc::new(GiteaPullRequestService::new(Arc::clone(&issues)))
                as Arc<dyn PullRequestService>
        }),
        repositories: enabled(config, Service::Repositories, || {
            Arc::new(GiteaRepositoryService::new(Arc::clone(&wrapper)))
                as Arc<dyn RepositoryService>
        }),
        reviews: enabled(config, Service::Reviews, || {
            Arc::new(GiteaReviewService::new()) as Arc<dyn ReviewService>
        }),
        users: enabled(config, Service::Users, || {
            Arc::new(GiteaUserService::new(Arc::clone(&wrapper))) as Arc<dyn UserService>
        }),
        webhooks: enabled(config, Service::Webhooks, || {
            Arc::new(GiteaWebhookService::new()) as Arc<dyn WebhookService>
        }),
    };

    debug!(
        base_url = base_url.as_str(),
        services = config.services.iter().count(),
        "gitea client ready"
    );
    Client::new(Driver::Gitea, base_url, services)
}

/// Runs the service factory only when `service` is in the configured set.
fn enabled<T: ?Sized>(
    config: &ClientConfig,
    service: Service,
    make: impl FnOnce() -> Arc<T>,
) -> Option<Arc<T>> {
    config.services.contains(service).then(make)
}

// ---------------------------------------------------------------------------
// Request wrapper
// ---------------------------------------------------------------------------

/// Placeholder for calls that send no request body.
pub(crate) const NO_INPUT: Option<&()> = None;

/// A value the wrapper can decode a JSON body into.
pub trait DecodeTarget {
    fn decode_from(&mut self, reader: &mut dyn Read) -> Result<(), serde_json::Error>;
}

impl<T: DeserializeOwned> DecodeTarget for T {
    fn decode_from(&mut self, reader: &mut dyn Read) -> Result<(), serde_json::Error> {
        *self = serde_json::from_reader(reader)?;
        Ok(())
    }
}

/// Where a successful response body goes.
pub enum Output<'a> {
    /// The body is discarded.
    None,
    /// The body is decoded as JSON into the target.
    DecodeInto(&'a mut dyn DecodeTarget),
    /// The body is copied byte for byte into the sink.
    CopyRawInto(&'a mut dyn Write),
}

/// Shared request/response plumbing for all Gitea services.
pub struct Wrapper {
    transport: Arc<dyn Transport>,
}

impl Wrapper {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Performs one HTTP round trip.
    ///
    /// On a status above 300 the error carries the response metadata and the
    /// output is left untouched.
    pub fn do_request<I>(
        &self,
        ctx: &Context,
        method: HttpMethod,
        path: &str,
        input: Option<&I>,
        output: Output<'_>,
    ) -> Result<Response, ScmError>
    where
        I: Serialize + ?Sized,
    {
        let mut request = HttpRequest::new(method, path);
        if let Some(input) = input {
            let body = serde_json::to_vec(input).map_err(ScmError::Encode)?;
            request
                .headers
                .push(("Content-Type".to_string(), "application/json".to_string()));
            request.body = Some(body);
        }

        debug!(%method, path, "sending gitea request");
        let mut res = self.transport.send(ctx, request)?;
        let response = Response {
            status: res.status,
            headers: std::mem::take(&mut res.headers),
        };
        debug!(%method, path, status = response.status, "gitea response");

        if response.status > 300 {
            let text = status_text(response.status);
            warn!(%method, path, status = response.status, "gitea request failed: {text}");
            return Err(ScmError::Status { text, response });
        }

        match output {
            Output::None => {}
            Output::CopyRawInto(sink) => {
                io::copy(&mut res.body, sink)?;
            }
            Output::DecodeInto(target) => {
                target.decode_from(&mut res.body).map_err(ScmError::Decode)?;
            }
        }
        Ok(response)
    }

    /// GET `path` and decode the body.
    pub(crate) fn get<T>(&self, ctx: &Context, path: &str) -> ScmResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let mut out = T::default();
        let res = self.do_request(ctx, HttpMethod::Get, path, NO_INPUT, Output::DecodeInto(&mut out))?;
        Ok((out, res))
    }

    /// Send `input` with `method` and decode the body.
    pub(crate) fn send<I, T>(
        &self,
        ctx: &Context,
        method: HttpMethod,
        path: &str,
        input: &I,
    ) -> ScmResult<T>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let mut out = T::default();
        let res = self.do_request(ctx, method, path, Some(input), Output::DecodeInto(&mut out))?;
        Ok((out, res))
    }
}

/// Standard reason phrase for `status`.
fn status_text(status: u16) -> String {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("status code {status}"))
}

/// Page query for list endpoints. Gitea calls the page size `limit`.
pub(crate) fn encode_list_options(opts: ListOptions) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    append_list_options(&mut query, opts);
    query.finish()
}

/// Adds the page query to filters already in `query`.
pub(crate) fn append_list_options(query: &mut form_urlencoded::Serializer<'_, String>, opts: ListOptions) {
    if opts.page != 0 {
        query.append_pair("page", &opts.page.to_string());
    }
    if opts.size != 0 {
        query.append_pair("limit", &opts.size.to_string());
    }
}

/// Appends `query` to `path` when it is non-empty.
pub(crate) fn with_query(path: String, query: &str) -> String {
    if query.is_empty() {
        path
    } else {
        format!("{path}?{query}")
    }
}
