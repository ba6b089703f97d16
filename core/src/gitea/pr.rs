//! Pull requests.
//!
//! # Design
//! Gitea models a pull request as an issue, so this service wraps the issue
//! service and shares its wrapper. `reference` is synthesized as
//! `refs/pull/{number}/head`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::issue::{state_filter, GiteaIssueService, GiteaStateEdit};
use super::repo::GiteaRepository;
use super::user::{convert_user, GiteaUser};
use super::{append_list_options, with_query, Output};
use crate::context::Context;
use crate::error::ScmError;
use crate::http::HttpMethod;
use crate::services::{IssueService, PullRequestService, ScmResult};
use crate::types::{
    Change, Comment, CommentInput, ListOptions, PullRequest, PullRequestListOptions, Response,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GiteaPullRequest {
    pub number: i64,
    pub user: GiteaUser,
    pub title: String,
    pub body: String,
    pub state: String,
    pub html_url: String,
    pub diff_url: String,
    pub merged: bool,
    pub head: GiteaBranchRef,
    pub base: GiteaBranchRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GiteaBranchRef {
    #[serde(rename = "ref")]
    pub reference: String,
    pub sha: String,
    pub repo: Option<GiteaRepository>,
}

#[derive(Debug, Serialize)]
struct GiteaMergeInput {
    #[serde(rename = "Do")]
    strategy: &'static str,
}

pub(crate) fn convert_pull_request(src: GiteaPullRequest) -> PullRequest {
    let fork = src
        .head
        .repo
        .map(|r| r.full_name)
        .unwrap_or_default();
    PullRequest {
        number: src.number,
        title: src.title,
        body: src.body,
        sha: src.head.sha,
        reference: format!("refs/pull/{}/head", src.number),
        source: src.head.reference,
        target: src.base.reference,
        fork,
        link: src.html_url,
        diff: src.diff_url,
        closed: src.state == "closed",
        merged: src.merged,
        author: convert_user(src.user),
        created: src.created_at,
        updated: src.updated_at,
    }
}

fn encode_pull_request_list_options(opts: PullRequestListOptions) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
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

/// Pull requests are issues in Gitea: comments go through the issue service,
/// and requests share its wrapper.
pub struct GiteaPullRequestService {
    issues: Arc<GiteaIssueService>,
}

impl GiteaPullRequestService {
    pub(crate) fn new(issues: Arc<GiteaIssueService>) -> Self {
        Self { issues }
    }
}

impl PullRequestService for GiteaPullRequestService {
    fn find(&self, ctx: &Context, repo: &str, number: i64) -> ScmResult<PullRequest> {
        let path = format!("api/v1/repos/{repo}/pulls/{number}");
        let (out, res) = self.issues.wrapper().get::<GiteaPullRequest>(ctx, &path)?;
        Ok((convert_pull_request(out), res))
    }

    fn list(
        &self,
        ctx: &Context,
        repo: &str,
        opts: PullRequestListOptions,
    ) -> ScmResult<Vec<PullRequest>> {
        let path = with_query(
            format!("api/v1/repos/{repo}/pulls"),
            &encode_pull_request_list_options(opts),
        );
        let (out, res) = self
            .issues
            .wrapper()
            .get::<Vec<GiteaPullRequest>>(ctx, &path)?;
        Ok((out.into_iter().map(convert_pull_request).collect(), res))
    }

    fn list_changes(
        &self,
        _ctx: &Context,
        _repo: &str,
        _number: i64,
        _opts: ListOptions,
    ) -> ScmResult<Vec<Change>> {
        Err(ScmError::NotSupported)
    }

    fn merge(&self, ctx: &Context, repo: &str, number: i64) -> Result<Response, ScmError> {
        let path = format!("api/v1/repos/{repo}/pulls/{number}/merge");
        let body = GiteaMergeInput { strategy: "merge" };
        self.issues
            .wrapper()
            .do_request(ctx, HttpMethod::Post, &path, Some(&body), Output::None)
    }

    fn close(&self, ctx: &Context, repo: &str, number: i64) -> Result<Response, ScmError> {
        let path = format!("api/v1/repos/{repo}/pulls/{number}");
        let body = GiteaStateEdit { state: "closed" };
        self.issues
            .wrapper()
            .do_request(ctx, HttpMethod::Patch, &path, Some(&body), Output::None)
    }

    fn find_comment(&self, ctx: &Context, repo: &str, number: i64, id: i64) -> ScmResult<Comment> {
        self.issues.find_comment(ctx, repo, number, id)
    }

    fn list_comments(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> ScmResult<Vec<Comment>> {
        self.issues.list_comments(ctx, repo, number, opts)
    }

    fn create_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &CommentInput,
    ) -> ScmResult<Comment> {
        self.issues.create_comment(ctx, repo, number, input)
    }

    fn delete_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
    ) -> Result<Response, ScmError> {
        self.issues.delete_comment(ctx, repo, number, id)
    }
}
