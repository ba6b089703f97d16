//! Provider-neutral source-control client with a Gitea driver.
//!
//! # Overview
//! `gitea::new` turns a base URL into a `Client` exposing content, git,
//! issue, organization, pull request, repository, review, user and webhook
//! services. Every service speaks the traits in `services`, so callers stay
//! ignorant of Gitea's JSON shapes and endpoint layout.
//!
//! # Design
//! - Calls are synchronous and take a `Context` carrying cancellation and a
//!   deadline.
//! - HTTP goes through the `Transport` trait. `UreqTransport` is the default;
//!   tests plug in their own.
//! - Services can be switched off through `ClientConfig::services`; a
//!   disabled service reports `ScmError::ServiceDisabled`.
//! - Domain types own their data (`String`, `Vec`) and are plain values.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod gitea;
pub mod http;
pub mod services;
pub mod transport;
pub mod types;
pub mod webhook;

pub use client::Client;
pub use config::{ClientConfig, Service, ServiceSet};
pub use context::Context;
pub use error::{ScmError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use services::ScmResult;
pub use types::{Driver, Response};
pub use webhook::{Webhook, WebhookRequest};
