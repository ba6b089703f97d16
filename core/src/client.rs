//! The provider-neutral client handle.
//!
//! # Design
//! `Client` is assembled once by a driver constructor and is immutable
//! afterwards. It holds the normalized base URL and one shared handle per
//! enabled service; the handles themselves forward to the driver's request
//! wrapper. A service left out of the configured `ServiceSet` is absent, and
//! its accessor reports `ScmError::ServiceDisabled`.

use std::sync::Arc;

use url::Url;

use crate::config::Service;
use crate::error::ScmError;
use crate::services::{
    ContentService, GitService, IssueService, OrganizationService, PullRequestService,
    RepositoryService, ReviewService, UserService, WebhookService,
};
use crate::types::Driver;

/// Service handles a driver wires into a `Client`.
#[derive(Default, Clone)]
pub struct Services {
    pub contents: Option<Arc<dyn ContentService>>,
    pub git: Option<Arc<dyn GitService>>,
    pub issues: Option<Arc<dyn IssueService>>,
    pub organizations: Option<Arc<dyn OrganizationService>>,
    pub pull_requests: Option<Arc<dyn PullRequestService>>,
    pub repositories: Option<Arc<dyn RepositoryService>>,
    pub reviews: Option<Arc<dyn ReviewService>>,
    pub users: Option<Arc<dyn UserService>>,
    pub webhooks: Option<Arc<dyn WebhookService>>,
}

/// A client bound to one provider endpoint.
#[derive(Clone)]
pub struct Client {
    driver: Driver,
    base_url: Url,
    services: Services,
}

impl Client {
    pub fn new(driver: Driver, base_url: Url, services: Services) -> Self {
        Self {
            driver,
            base_url,
            services,
        }
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// Base URL every request path is resolved against. Always ends in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether `service` was enabled when the client was built.
    pub fn has(&self, service: Service) -> bool {
        match service {
            Service::Contents => self.services.contents.is_some(),
            Service::Git => self.services.git.is_some(),
            Service::Issues => self.services.issues.is_some(),
            Service::Organizations => self.services.organizations.is_some(),
            Service::PullRequests => self.services.pull_requests.is_some(),
            Service::Repositories => self.services.repositories.is_some(),
            Service::Reviews => self.services.reviews.is_some(),
            Service::Users => self.services.users.is_some(),
            Service::Webhooks => self.services.webhooks.is_some(),
        }
    }

    pub fn contents(&self) -> Result<&dyn ContentService, ScmError> {
        enabled(&self.services.contents, Service::Contents)
    }

    pub fn git(&self) -> Result<&dyn GitService, ScmError> {
        enabled(&self.services.git, Service::Git)
    }

    pub fn issues(&self) -> Result<&dyn IssueService, ScmError> {
        enabled(&self.services.issues, Service::Issues)
    }

    pub fn organizations(&self) -> Result<&dyn OrganizationService, ScmError> {
        enabled(&self.services.organizations, Service::Organizations)
    }

    pub fn pull_requests(&self) -> Result<&dyn PullRequestService, ScmError> {
        enabled(&self.services.pull_requests, Service::PullRequests)
    }

    pub fn repositories(&self) -> Result<&dyn RepositoryService, ScmError> {
        enabled(&self.services.repositories, Service::Repositories)
    }

    pub fn reviews(&self) -> Result<&dyn ReviewService, ScmError> {
        enabled(&self.services.reviews, Service::Reviews)
    }

    pub fn users(&self) -> Result<&dyn UserService, ScmError> {
        enabled(&self.services.users, Service::Users)
    }

    pub fn webhooks(&self) -> Result<&dyn WebhookService, ScmError> {
        enabled(&self.services.webhooks, Service::Webhooks)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let enabled: Vec<&str> = Service::ALL
            .iter()
            .filter(|s| self.has(**s))
            .map(|s| s.name())
            .collect();
        f.debug_struct("Client")
            .field("driver", &self.driver)
            .field("base_url", &self.base_url.as_str())
            .field("services", &enabled)
            .finish()
    }
}

fn enabled<T: ?Sized>(handle: &Option<Arc<T>>, service: Service) -> Result<&T, ScmError> {
    handle.as_deref().ok_or(ScmError::ServiceDisabled(service))
}
