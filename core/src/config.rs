//! Client configuration and the enabled capability set.
//!
//! # Design
//! A `ClientConfig` is built once and passed by reference to the driver
//! constructor, which hands it to each service factory. The `services` set
//! decides which service handles the client carries; nothing is registered
//! globally.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScmError;

/// One named facet of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Contents,
    Git,
    Issues,
    Organizations,
    PullRequests,
    Repositories,
    Reviews,
    Users,
    Webhooks,
}

impl Service {
    pub const ALL: [Service; 9] = [
        Service::Contents,
        Service::Git,
        Service::Issues,
        Service::Organizations,
        Service::PullRequests,
        Service::Repositories,
        Service::Reviews,
        Service::Users,
        Service::Webhooks,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Service::Contents => "contents",
            Service::Git => "git",
            Service::Issues => "issues",
            Service::Organizations => "organizations",
            Service::PullRequests => "pull_requests",
            Service::Repositories => "repositories",
            Service::Reviews => "reviews",
            Service::Users => "users",
            Service::Webhooks => "webhooks",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of services a client is built with. Defaults to all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceSet(BTreeSet<Service>);

impl ServiceSet {
    pub fn all() -> Self {
        Self(Service::ALL.into_iter().collect())
    }

    pub fn only(services: impl IntoIterator<Item = Service>) -> Self {
        Self(services.into_iter().collect())
    }

    pub fn contains(&self, service: Service) -> bool {
        self.0.contains(&service)
    }

    pub fn iter(&self) -> impl Iterator<Item = Service> + '_ {
        self.0.iter().copied()
    }
}

impl Default for ServiceSet {
    fn default() -> Self {
        Self::all()
    }
}

/// Settings for building a client.
///
/// ```toml
/// base_url = "https://gitea.example.com"
/// token = "0123abcd"
/// timeout_secs = 30
/// services = ["repositories", "issues", "pull_requests"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request bound. `timeout_secs` in TOML; fractions are kept and
    /// `0` means no bound.
    #[serde(
        default,
        rename = "timeout_secs",
        with = "timeout_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub services: ServiceSet,
}

fn default_user_agent() -> String {
    concat!("scm-core/", env!("CARGO_PKG_VERSION")).to_string()
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            user_agent: default_user_agent(),
            timeout: None,
            services: ServiceSet::all(),
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ScmError> {
        toml::from_str(raw).map_err(|e| ScmError::Config(e.to_string()))
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn with_services(mut self, services: ServiceSet) -> Self {
        self.services = services;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

mod timeout_secs {
    use std::time::Duration;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_f64(d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let Some(secs) = Option::<f64>::deserialize(d)? else {
            return Ok(None);
        };
        let timeout = Duration::try_from_secs_f64(secs)
            .map_err(|_| D::Error::custom(format!("invalid timeout_secs {secs}")))?;
        Ok((!timeout.is_zero()).then_some(timeout))
    }
}
