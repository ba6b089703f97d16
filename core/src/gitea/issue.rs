//! Issues and issue comments.
//!
//! # Design
//! Listing asks Gitea for `type=issues` so pull requests stay out of the
//! result. Closing is a `PATCH` of the state. Pull request comments reuse
//! this service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::user::{convert_user, GiteaUser};
use super::{append_list_options, encode_list_options, with_query, Output, Wrapper, NO_INPUT};
use crate::context::Context;
use crate::error::ScmError;
use crate::http::HttpMethod;
use crate::services::{IssueService, ScmResult};
use crate::types::{
    Comment, CommentInput, Issue, IssueInput, IssueListOptions, ListOptions, Response,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GiteaIssue {
    pub number: i64,
    pub user: GiteaUser,
    pub title: String,
    pub body: String,
    pub labels: Vec<GiteaLabel>,
    pub state: String,
    pub is_locked: bool,
    pub html_url: String,
    pub pull_request: Option<GiteaPullRequestMeta>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GiteaLabel {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GiteaPullRequestMeta {}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GiteaComment {
    pub id: i64,
    pub html_url: String,
    pub user: GiteaUser,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct GiteaIssueInput<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct GiteaCommentInput<'a> {
    body: &'a str,
}

/// Body of an edit that only changes the state.
#[derive(Debug, Serialize)]
pub(crate) struct GiteaStateEdit {
    pub state: &'static str,
}

pub(crate) fn convert_issue(src: GiteaIssue) -> Issue {
    Issue {
        number: src.number,
        title: src.title,
        body: src.body,
        link: src.html_url,
        labels: src.labels.into_iter().map(|l| l.name).collect(),
        closed: src.state == "closed",
        locked: src.is_locked,
        author: convert_user(src.user),
        pull_request: src.pull_request.is_some(),
        created: src.created_at,
        updated: src.updated_at,
    }
}

pub(crate) fn convert_comment(src: GiteaComment) -> Comment {
    Comment {
        id: src.id,
        body: src.body,
        author: convert_user(src.user),
        link: src.html_url,
        created: src.created_at,
        updated: src.updated_at,
    }
}

/// Gitea's `state` filter: `open`, `closed` or `all`.
pub(crate) fn state_filter(open: bool, closed: bool) -> &'static str {
    match (open, closed) {
        (true, true) => "all",
        (false, true) => "closed",
        _ => "open",
    }
}

fn encode_issue_list_options(opts: IssueListOptions) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("type", "issues");
    query.append_pair("state", state_filter(opts.open, opts.closed));
    append_list_options(
        &mut query,
        ListOptions {
            page: opts.page,
            size: opts.size,
        },
    );
    query.finish()
}

pub struct GiteaIssueService {
    client: Arc<Wrapper>,
}

impl GiteaIssueService {
    pub(crate) fn new(client: Arc<Wrapper>) -> Self {
        Self { client }
    }

    /// The wrapper shared with the pull request service.
    pub(crate) fn wrapper(&self) -> &Wrapper {
        &self.client
    }
}

impl IssueService for GiteaIssueService {
    fn find(&self, ctx: &Context, repo: &str, number: i64) -> ScmResult<Issue> {
        let path = format!("api/v1/repos/{repo}/issues/{number}");
        let (out, res) = self.client.get::<GiteaIssue>(ctx, &path)?;
        Ok((convert_issue(out), res))
    }

    fn list(&self, ctx: &Context, repo: &str, opts: IssueListOptions) -> ScmResult<Vec<Issue>> {
        let path = with_query(
            format!("api/v1/repos/{repo}/issues"),
            &encode_issue_list_options(opts),
        );
        let (out, res) = self.client.get::<Vec<GiteaIssue>>(ctx, &path)?;
        Ok((out.into_iter().map(convert_issue).collect(), res))
    }

    fn create(&self, ctx: &Context, repo: &str, input: &IssueInput) -> ScmResult<Issue> {
        let path = format!("api/v1/repos/{repo}/issues");
        let body = GiteaIssueInput {
            title: &input.title,
            body: &input.body,
        };
        let (out, res) = self
            .client
            .send::<_, GiteaIssue>(ctx, HttpMethod::Post, &path, &body)?;
        Ok((convert_issue(out), res))
    }

    fn close(&self, ctx: &Context, repo: &str, number: i64) -> Result<Response, ScmError> {
        let path = format!("api/v1/repos/{repo}/issues/{number}");
        let body = GiteaStateEdit { state: "closed" };
        self.client
            .do_request(ctx, HttpMethod::Patch, &path, Some(&body), Output::None)
    }

    fn lock(&self, _ctx: &Context, _repo: &str, _number: i64) -> Result<Response, ScmError> {
        Err(ScmError::NotSupported)
    }

    fn unlock(&self, _ctx: &Context, _repo: &str, _number: i64) -> Result<Response, ScmError> {
        Err(ScmError::NotSupported)
    }

    fn find_comment(&self, ctx: &Context, repo: &str, _number: i64, id: i64) -> ScmResult<Comment> {
        let path = format!("api/v1/repos/{repo}/issues/comments/{id}");
        let (out, res) = self.client.get::<GiteaComment>(ctx, &path)?;
        Ok((convert_comment(out), res))
    }

    fn list_comments(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> ScmResult<Vec<Comment>> {
        let path = with_query(
            format!("api/v1/repos/{repo}/issues/{number}/comments"),
            &encode_list_options(opts),
        );
        let (out, res) = self.client.get::<Vec<GiteaComment>>(ctx, &path)?;
        Ok((out.into_iter().map(convert_comment).collect(), res))
    }

    fn create_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &CommentInput,
    ) -> ScmResult<Comment> {
        let path = format!("api/v1/repos/{repo}/issues/{number}/comments");
        let body = GiteaCommentInput { body: &input.body };
        let (out, res) = self
            .client
            .send::<_, GiteaComment>(ctx, HttpMethod::Post, &path, &body)?;
        Ok((convert_comment(out), res))
    }

    fn delete_comment(
        &self,
        ctx: &Context,
        repo: &str,
        _number: i64,
        id: i64,
    ) -> Result<Response, ScmError> {
        let path = format!("api/v1/repos/{repo}/issues/comments/{id}");
        self.client
            .do_request(ctx, HttpMethod::Delete, &path, NO_INPUT, Output::None)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::testing::{client, ctx, FakeTransport};
    use super::*;

    fn issue_json() -> serde_json::Value {
        json!({
            "id": 101,
            "number": 1,
            "user": {"id": 1, "login": "octocat"},
            "title": "Bug found",
            "body": "I'm having a problem with this.",
            "labels": [{"id": 1, "name": "bug"}],
            "state": "open",
            "is_locked": false,
            "html_url": "https://gitea.example.com/octocat/hello-world/issues/1",
            "pull_request": null,
            "created_at": "2024-01-02T15:04:05Z",
            "updated_at": "2024-01-02T15:04:05Z"
        })
    }

    #[test]
    fn find_issue() {
        let fake = FakeTransport::new();
        fake.respond_json(200, issue_json());
        let (issue, _) = client(&fake)
            .issues()
            .unwrap()
            .find(&ctx(), "octocat/hello-world", 1)
            .unwrap();
        assert_eq!(fake.last_request().path, "api/v1/repos/octocat/hello-world/issues/1");
        assert_eq!(issue.number, 1);
        assert_eq!(issue.title, "Bug found");
        assert_eq!(issue.labels, vec!["bug".to_string()]);
        assert_eq!(issue.author.login, "octocat");
        assert!(!issue.closed);
        assert!(!issue.pull_request);
    }

    #[test]
    fn list_filters_state_and_type() {
        let fake = FakeTransport::new();
        fake.respond_json(200, json!([issue_json()]));
        let opts = IssueListOptions {
            page: 1,
            size: 20,
            open: true,
            closed: true,
        };
        let (issues, _) = client(&fake)
            .issues()
            .unwrap()
            .list(&ctx(), "octocat/hello-world", opts)
            .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(
            fake.last_request().path,
            "api/v1/repos/octocat/hello-world/issues?type=issues&state=all&page=1&limit=20"
        );
    }

    #[test]
    fn state_filter_defaults_to_open() {
        assert_eq!(state_filter(false, false), "open");
        assert_eq!(state_filter(true, false), "open");
        assert_eq!(state_filter(false, true), "closed");
        assert_eq!(state_filter(true, true), "all");
    }

    #[test]
    fn create_issue_posts_title_and_body() {
        let fake = FakeTransport::new();
        fake.respond_json(201, issue_json());
        let input = IssueInput {
            title: "Bug found".to_string(),
            body: "I'm having a problem with this.".to_string(),
        };
        let (issue, res) = client(&fake)
            .issues()
            .unwrap()
            .create(&ctx(), "octocat/hello-world", &input)
            .unwrap();
        let req = fake.last_request();
        assert_eq!(req.method, HttpMethod::Post);
        let sent: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, json!({"title": "Bug found", "body": "I'm having a problem with this."}));
        assert_eq!(res.status, 201);
        assert_eq!(issue.number, 1);
    }

    #[test]
    fn close_patches_state() {
        let fake = FakeTransport::new();
        fake.respond_json(201, issue_json());
        client(&fake)
            .issues()
            .unwrap()
            .close(&ctx(), "octocat/hello-world", 1)
            .unwrap();
        let req = fake.last_request();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, "api/v1/repos/octocat/hello-world/issues/1");
        assert_eq!(req.body.as_deref(), Some(br#"{"state":"closed"}"#.as_slice()));
    }

    #[test]
    fn locking_is_not_supported() {
        let fake = FakeTransport::new();
        let c = client(&fake);
        assert!(matches!(
            c.issues().unwrap().lock(&ctx(), "octocat/hello-world", 1),
            Err(ScmError::NotSupported)
        ));
        assert!(matches!(
            c.issues().unwrap().unlock(&ctx(), "octocat/hello-world", 1),
            Err(ScmError::NotSupported)
        ));
    }

    #[test]
    fn comments_round_trip_paths() {
        let fake = FakeTransport::new();
        let comment = json!({
            "id": 9,
            "html_url": "https://gitea.example.com/octocat/hello-world/issues/1#issuecomment-9",
            "user": {"id": 1, "login": "octocat"},
            "body": "Me too",
            "created_at": "2024-01-03T00:00:00Z",
            "updated_at": "2024-01-03T00:00:00Z"
        });
        fake.respond_json(200, comment.clone());
        fake.respond_json(200, json!([comment.clone()]));
        fake.respond_json(201, comment);
        fake.respond(204, "");

        let c = client(&fake);
        let issues = c.issues().unwrap();
        let (found, _) = issues.find_comment(&ctx(), "octocat/hello-world", 1, 9).unwrap();
        assert_eq!(found.id, 9);
        assert_eq!(found.author.login, "octocat");

        let (all, _) = issues
            .list_comments(&ctx(), "octocat/hello-world", 1, ListOptions::default())
            .unwrap();
        assert_eq!(all.len(), 1);

        let input = CommentInput {
            body: "Me too".to_string(),
        };
        let (created, _) = issues
            .create_comment(&ctx(), "octocat/hello-world", 1, &input)
            .unwrap();
        assert_eq!(created.body, "Me too");

        let res = issues.delete_comment(&ctx(), "octocat/hello-world", 1, 9).unwrap();
        assert_eq!(res.status, 204);

        let paths: Vec<String> = fake.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![
                "api/v1/repos/octocat/hello-world/issues/comments/9",
                "api/v1/repos/octocat/hello-world/issues/1/comments",
                "api/v1/repos/octocat/hello-world/issues/1/comments",
                "api/v1/repos/octocat/hello-world/issues/comments/9",
            ]
        );
    }
}
