//! The authenticated user and user lookups.

use std::sync::Arc;

use serde::Deserialize;

use super::Wrapper;
use crate::context::Context;
use crate::services::{ScmResult, UserService};
use crate::types::User;

/// Gitea account as returned by the API and in webhook payloads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GiteaUser {
    pub id: i64,
    pub login: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
}

pub(crate) fn convert_user(src: GiteaUser) -> User {
    // Older Gitea releases only send `username`.
    let login = if src.login.is_empty() {
        src.username
    } else {
        src.login
    };
    User {
        id: src.id,
        login,
        name: src.full_name,
        email: src.email,
        avatar: src.avatar_url,
    }
}

pub struct GiteaUserService {
    client: Arc<Wrapper>,
}

impl GiteaUserService {
    pub(crate) fn new(client: Arc<Wrapper>) -> Self {
        Self { client }
    }
}

impl UserService for GiteaUserService {
    fn find(&self, ctx: &Context) -> ScmResult<User> {
        let (out, res) = self.client.get::<GiteaUser>(ctx, "api/v1/user")?;
        Ok((convert_user(out), res))
    }

    fn find_login(&self, ctx: &Context, login: &str) -> ScmResult<User> {
        let path = format!("api/v1/users/{login}");
        let (out, res) = self.client.get::<GiteaUser>(ctx, &path)?;
        Ok((convert_user(out), res))
    }

    fn find_email(&self, ctx: &Context) -> ScmResult<String> {
        let (user, res) = self.find(ctx)?;
        Ok((user.email, res))
    }
}
