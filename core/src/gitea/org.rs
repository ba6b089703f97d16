//! Organizations the authenticated user belongs to.

use std::sync::Arc;

use serde::Deserialize;

use super::{encode_list_options, with_query, Wrapper};
use crate::context::Context;
use crate::services::{OrganizationService, ScmResult};
use crate::types::{ListOptions, Organization};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GiteaOrganization {
    username: String,
    avatar_url: String,
}

fn convert_organization(src: GiteaOrganization) -> Organization {
    Organization {
        name: src.username,
        avatar: src.avatar_url,
    }
}

pub struct GiteaOrganizationService {
    client: Arc<Wrapper>,
}

impl GiteaOrganizationService {
    pub(crate) fn new(client: Arc<Wrapper>) -> Self {
        Self { client }
    }
}

impl OrganizationService for GiteaOrganizationService {
    fn find(&self, ctx: &Context, name: &str) -> ScmResult<Organization> {
        let path = format!("api/v1/orgs/{name}");
        let (out, res) = self.client.get::<GiteaOrganization>(ctx, &path)?;
        Ok((convert_organization(out), res))
    }

    fn list(&self, ctx: &Context, opts: ListOptions) -> ScmResult<Vec<Organization>> {
        let path = with_query("api/v1/user/orgs".to_string(), &encode_list_options(opts));
        let (out, res) = self.client.get::<Vec<GiteaOrganization>>(ctx, &path)?;
        Ok((out.into_iter().map(convert_organization).collect(), res))
    }
}
