//! Repositories, hooks and commit statuses.
//!
//! # Design
//! `GiteaRepository` is shared with the pull request and webhook code, which
//! embed it in their payloads. Status states are mapped both ways between
//! Gitea's strings and the neutral `State`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::{convert_user, GiteaUser};
use super::{encode_list_options, with_query, Output, Wrapper, NO_INPUT};
use crate::context::Context;
use crate::error::ScmError;
use crate::http::HttpMethod;
use crate::services::{RepositoryService, ScmResult};
use crate::types::{
    Hook, HookInput, ListOptions, Perm, Repository, Response, State, Status, StatusInput,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GiteaRepository {
    pub id: i64,
    pub owner: GiteaUser,
    pub name: String,
    pub full_name: String,
    pub private: bool,
    pub html_url: String,
    pub ssh_url: String,
    pub clone_url: String,
    pub default_branch: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub permissions: Option<GiteaPermissions>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GiteaPermissions {
    pub admin: bool,
    pub push: bool,
    pub pull: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GiteaHook {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    config: GiteaHookConfig,
    events: Vec<String>,
    active: bool,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct GiteaHookConfig {
    url: String,
    content_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    secret: String,
}

#[derive(Debug, Serialize)]
struct GiteaHookInput<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    config: GiteaHookConfig,
    events: Vec<String>,
    active: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GiteaStatus {
    status: String,
    target_url: String,
    description: String,
    context: String,
}

#[derive(Debug, Serialize)]
struct GiteaStatusInput<'a> {
    state: &'a str,
    target_url: &'a str,
    description: &'a str,
    context: &'a str,
}

pub(crate) fn convert_repository(src: GiteaRepository) -> Repository {
    Repository {
        id: src.id.to_string(),
        namespace: convert_user(src.owner).login,
        name: src.name,
        full_name: src.full_name,
        perm: src.permissions.map(convert_perm),
        branch: src.default_branch,
        private: src.private,
        clone: src.clone_url,
        clone_ssh: src.ssh_url,
        link: src.html_url,
        created: src.created_at,
        updated: src.updated_at,
    }
}

fn convert_perm(src: GiteaPermissions) -> Perm {
    Perm {
        pull: src.pull,
        push: src.push,
        admin: src.admin,
    }
}

fn convert_hook(src: GiteaHook) -> Hook {
    Hook {
        id: src.id.to_string(),
        name: src.kind,
        target: src.config.url,
        events: src.events,
        active: src.active,
    }
}

fn convert_status(src: GiteaStatus) -> Status {
    Status {
        state: convert_state(&src.status),
        label: src.context,
        desc: src.description,
        target: src.target_url,
    }
}

fn convert_state(src: &str) -> State {
    match src {
        "pending" => State::Pending,
        "success" => State::Success,
        "failure" | "warning" => State::Failure,
        "error" => State::Error,
        _ => State::Unknown,
    }
}

fn convert_from_state(state: State) -> &'static str {
    match state {
        State::Pending | State::Running => "pending",
        State::Success => "success",
        State::Failure => "failure",
        State::Unknown | State::Canceled | State::Error => "error",
    }
}

pub struct GiteaRepositoryService {
    client: Arc<Wrapper>,
}

impl GiteaRepositoryService {
    pub(crate) fn new(client: Arc<Wrapper>) -> Self {
        Self { client }
    }
}

impl RepositoryService for GiteaRepositoryService {
    fn find(&self, ctx: &Context, repo: &str) -> ScmResult<Repository> {
        let path = format!("api/v1/repos/{repo}");
        let (out, res) = self.client.get::<GiteaRepository>(ctx, &path)?;
        Ok((convert_repository(out), res))
    }

    fn find_perms(&self, ctx: &Context, repo: &str) -> ScmResult<Perm> {
        let (repo, res) = self.find(ctx, repo)?;
        Ok((repo.perm.unwrap_or_default(), res))
    }

    fn list(&self, ctx: &Context, opts: ListOptions) -> ScmResult<Vec<Repository>> {
        let path = with_query("api/v1/user/repos".to_string(), &encode_list_options(opts));
        let (out, res) = self.client.get::<Vec<GiteaRepository>>(ctx, &path)?;
        Ok((out.into_iter().map(convert_repository).collect(), res))
    }

    fn find_hook(&self, ctx: &Context, repo: &str, id: &str) -> ScmResult<Hook> {
        let path = format!("api/v1/repos/{repo}/hooks/{id}");
        let (out, res) = self.client.get::<GiteaHook>(ctx, &path)?;
        Ok((convert_hook(out), res))
    }

    fn list_hooks(&self, ctx: &Context, repo: &str, opts: ListOptions) -> ScmResult<Vec<Hook>> {
        let path = with_query(format!("api/v1/repos/{repo}/hooks"), &encode_list_options(opts));
        let (out, res) = self.client.get::<Vec<GiteaHook>>(ctx, &path)?;
        Ok((out.into_iter().map(convert_hook).collect(), res))
    }

    fn create_hook(&self, ctx: &Context, repo: &str, input: &HookInput) -> ScmResult<Hook> {
        let path = format!("api/v1/repos/{repo}/hooks");
        let events = if input.events.is_empty() {
            vec!["push".to_string()]
        } else {
            input.events.clone()
        };
        let body = GiteaHookInput {
            kind: "gitea",
            config: GiteaHookConfig {
                url: input.target.clone(),
                content_type: "json".to_string(),
                secret: input.secret.clone(),
            },
            events,
            active: true,
        };
        let (out, res) = self
            .client
            .send::<_, GiteaHook>(ctx, HttpMethod::Post, &path, &body)?;
        Ok((convert_hook(out), res))
    }

    fn delete_hook(&self, ctx: &Context, repo: &str, id: &str) -> Result<Response, ScmError> {
        let path = format!("api/v1/repos/{repo}/hooks/{id}");
        self.client
            .do_request(ctx, HttpMethod::Delete, &path, NO_INPUT, Output::None)
    }

    fn list_status(
        &self,
        ctx: &Context,
        repo: &str,
        reference: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Status>> {
        let path = with_query(
            format!("api/v1/repos/{repo}/statuses/{reference}"),
            &encode_list_options(opts),
        );
        let (out, res) = self.client.get::<Vec<GiteaStatus>>(ctx, &path)?;
        Ok((out.into_iter().map(convert_status).collect(), res))
    }

    fn create_status(
        &self,
        ctx: &Context,
        repo: &str,
        reference: &str,
        input: &StatusInput,
    ) -> ScmResult<Status> {
        let path = format!("api/v1/repos/{repo}/statuses/{reference}");
        let body = GiteaStatusInput {
            state: convert_from_state(input.state),
            target_url: &input.target,
            description: &input.desc,
            context: &input.label,
        };
        let (out, res) = self
            .client
            .send::<_, GiteaStatus>(ctx, HttpMethod::Post, &path, &body)?;
        Ok((convert_status(out), res))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::testing::{client, ctx, FakeTransport};
    use super::*;

    fn hello_world() -> serde_json::Value {
        json!({
            "id": 42,
            "owner": {"id": 1, "login": "octocat"},
            "name": "hello-world",
            "full_name": "octocat/hello-world",
            "private": true,
            "html_url": "https://gitea.example.com/octocat/hello-world",
            "ssh_url": "git@gitea.example.com:octocat/hello-world.git",
            "clone_url": "https://gitea.example.com/octocat/hello-world.git",
            "default_branch": "main",
            "created_at": "2024-01-02T15:04:05Z",
            "updated_at": "2024-03-04T10:00:00Z",
            "permissions": {"admin": false, "push": true, "pull": true}
        })
    }

    #[test]
    fn find_repository() {
        let fake = FakeTransport::new();
        fake.respond_json(200, hello_world());
        let (repo, _) = client(&fake)
            .repositories()
            .unwrap()
            .find(&ctx(), "octocat/hello-world")
            .unwrap();

        assert_eq!(fake.last_request().path, "api/v1/repos/octocat/hello-world");
        assert_eq!(repo.id, "42");
        assert_eq!(repo.namespace, "octocat");
        assert_eq!(repo.name, "hello-world");
        assert_eq!(repo.branch, "main");
        assert!(repo.private);
        assert_eq!(repo.clone, "https://gitea.example.com/octocat/hello-world.git");
        assert_eq!(repo.clone_ssh, "git@gitea.example.com:octocat/hello-world.git");
        assert_eq!(repo.created.to_rfc3339(), "2024-01-02T15:04:05+00:00");
    }

    #[test]
    fn find_perms_reads_permissions() {
        let fake = FakeTransport::new();
        fake.respond_json(200, hello_world());
        let (perm, _) = client(&fake)
            .repositories()
            .unwrap()
            .find_perms(&ctx(), "octocat/hello-world")
            .unwrap();
        assert_eq!(
            perm,
            Perm {
                pull: true,
                push: true,
                admin: false
            }
        );
    }

    #[test]
    fn list_sends_page_query() {
        let fake = FakeTransport::new();
        fake.respond_json(200, json!([hello_world()]));
        let (repos, _) = client(&fake)
            .repositories()
            .unwrap()
            .list(&ctx(), ListOptions { page: 2, size: 10 })
            .unwrap();
        assert_eq!(fake.last_request().path, "api/v1/user/repos?page=2&limit=10");
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].full_name, "octocat/hello-world");
    }

    #[test]
    fn create_hook_sends_gitea_shape() {
        let fake = FakeTransport::new();
        fake.respond_json(
            201,
            json!({
                "id": 7,
                "type": "gitea",
                "config": {"url": "https://ci.example.com/hook", "content_type": "json"},
                "events": ["push", "pull_request"],
                "active": true
            }),
        );
        let input = HookInput {
            target: "https://ci.example.com/hook".to_string(),
            secret: "s3cr3t".to_string(),
            events: vec!["push".to_string(), "pull_request".to_string()],
            ..HookInput::default()
        };
        let (hook, res) = client(&fake)
            .repositories()
            .unwrap()
            .create_hook(&ctx(), "octocat/hello-world", &input)
            .unwrap();

        let req = fake.last_request();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "api/v1/repos/octocat/hello-world/hooks");
        let sent: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["type"], "gitea");
        assert_eq!(sent["config"]["url"], "https://ci.example.com/hook");
        assert_eq!(sent["config"]["secret"], "s3cr3t");
        assert_eq!(sent["events"], json!(["push", "pull_request"]));
        assert_eq!(res.status, 201);
        assert_eq!(hook.id, "7");
        assert_eq!(hook.target, "https://ci.example.com/hook");
    }

    #[test]
    fn delete_hook_has_no_body() {
        let fake = FakeTransport::new();
        fake.respond(204, "");
        let res = client(&fake)
            .repositories()
            .unwrap()
            .delete_hook(&ctx(), "octocat/hello-world", "7")
            .unwrap();
        let req = fake.last_request();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "api/v1/repos/octocat/hello-world/hooks/7");
        assert_eq!(res.status, 204);
    }

    #[test]
    fn create_status_maps_state() {
        let fake = FakeTransport::new();
        fake.respond_json(
            201,
            json!({
                "id": 1,
                "status": "success",
                "target_url": "https://ci.example.com/build/1",
                "description": "Build passed",
                "context": "ci/build"
            }),
        );
        let input = StatusInput {
            state: State::Running,
            label: "ci/build".to_string(),
            desc: "Build running".to_string(),
            target: "https://ci.example.com/build/1".to_string(),
        };
        let (status, _) = client(&fake)
            .repositories()
            .unwrap()
            .create_status(&ctx(), "octocat/hello-world", "abc123", &input)
            .unwrap();

        let req = fake.last_request();
        assert_eq!(req.path, "api/v1/repos/octocat/hello-world/statuses/abc123");
        let sent: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["state"], "pending");
        assert_eq!(sent["context"], "ci/build");
        assert_eq!(status.state, State::Success);
        assert_eq!(status.label, "ci/build");
    }

    #[test]
    fn list_status_converts_warning_to_failure() {
        let fake = FakeTransport::new();
        fake.respond_json(200, json!([{"id": 1, "status": "warning", "context": "lint"}]));
        let (statuses, _) = client(&fake)
            .repositories()
            .unwrap()
            .list_status(&ctx(), "octocat/hello-world", "main", ListOptions::default())
            .unwrap();
        assert_eq!(fake.last_request().path, "api/v1/repos/octocat/hello-world/statuses/main");
        assert_eq!(statuses[0].state, State::Failure);
    }
}
