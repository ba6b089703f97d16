//! Service traits making up the provider-neutral client contract.
//!
//! Repositories are addressed as `"owner/name"`. Every call returns the
//! decoded value together with the `Response` metadata of the exchange.
//! Operations a provider cannot serve fail with `ScmError::NotSupported`.

use crate::context::Context;
use crate::error::ScmError;
use crate::types::{
    Change, Comment, CommentInput, Commit, CommitListOptions, Content, ContentParams, FileEntry,
    Hook, HookInput, Issue, IssueInput, IssueListOptions, ListOptions, Organization, Perm,
    PullRequest, PullRequestListOptions, Reference, Repository, Response, Review, ReviewInput,
    Status, StatusInput, User,
};
use crate::webhook::{Webhook, WebhookRequest};

/// Result of a call that yields a value.
pub type ScmResult<T> = Result<(T, Response), ScmError>;

pub trait ContentService: Send + Sync {
    /// Raw file contents at `reference`.
    fn find(&self, ctx: &Context, repo: &str, path: &str, reference: &str) -> ScmResult<Content>;

    /// Directory listing at `reference`.
    fn list(
        &self,
        ctx: &Context,
        repo: &str,
        path: &str,
        reference: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<FileEntry>>;

    fn create(
        &self,
        ctx: &Context,
        repo: &str,
        path: &str,
        params: &ContentParams,
    ) -> Result<Response, ScmError>;

    fn update(
        &self,
        ctx: &Context,
        repo: &str,
        path: &str,
        params: &ContentParams,
    ) -> Result<Response, ScmError>;

    fn delete(
        &self,
        ctx: &Context,
        repo: &str,
        path: &str,
        params: &ContentParams,
    ) -> Result<Response, ScmError>;
}

pub trait GitService: Send + Sync {
    fn find_branch(&self, ctx: &Context, repo: &str, name: &str) -> ScmResult<Reference>;
    fn find_commit(&self, ctx: &Context, repo: &str, sha: &str) -> ScmResult<Commit>;
    fn find_tag(&self, ctx: &Context, repo: &str, name: &str) -> ScmResult<Reference>;
    fn list_branches(&self, ctx: &Context, repo: &str, opts: ListOptions) -> ScmResult<Vec<Reference>>;
    fn list_commits(
        &self,
        ctx: &Context,
        repo: &str,
        opts: &CommitListOptions,
    ) -> ScmResult<Vec<Commit>>;
    fn list_tags(&self, ctx: &Context, repo: &str, opts: ListOptions) -> ScmResult<Vec<Reference>>;
    fn list_changes(
        &self,
        ctx: &Context,
        repo: &str,
        sha: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Change>>;
}

pub trait IssueService: Send + Sync {
    fn find(&self, ctx: &Context, repo: &str, number: i64) -> ScmResult<Issue>;
    fn list(&self, ctx: &Context, repo: &str, opts: IssueListOptions) -> ScmResult<Vec<Issue>>;
    fn create(&self, ctx: &Context, repo: &str, input: &IssueInput) -> ScmResult<Issue>;
    fn close(&self, ctx: &Context, repo: &str, number: i64) -> Result<Response, ScmError>;
    fn lock(&self, ctx: &Context, repo: &str, number: i64) -> Result<Response, ScmError>;
    fn unlock(&self, ctx: &Context, repo: &str, number: i64) -> Result<Response, ScmError>;
    fn find_comment(&self, ctx: &Context, repo: &str, number: i64, id: i64) -> ScmResult<Comment>;
    fn list_comments(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> ScmResult<Vec<Comment>>;
    fn create_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &CommentInput,
    ) -> ScmResult<Comment>;
    fn delete_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
    ) -> Result<Response, ScmError>;
}

pub trait OrganizationService: Send + Sync {
    fn find(&self, ctx: &Context, name: &str) -> ScmResult<Organization>;
    /// Organizations of the authenticated user.
    fn list(&self, ctx: &Context, opts: ListOptions) -> ScmResult<Vec<Organization>>;
}

pub trait PullRequestService: Send + Sync {
    fn find(&self, ctx: &Context, repo: &str, number: i64) -> ScmResult<PullRequest>;
    fn list(
        &self,
        ctx: &Context,
        repo: &str,
        opts: PullRequestListOptions,
    ) -> ScmResult<Vec<PullRequest>>;
    fn list_changes(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> ScmResult<Vec<Change>>;
    fn merge(&self, ctx: &Context, repo: &str, number: i64) -> Result<Response, ScmError>;
    fn close(&self, ctx: &Context, repo: &str, number: i64) -> Result<Response, ScmError>;
    fn find_comment(&self, ctx: &Context, repo: &str, number: i64, id: i64) -> ScmResult<Comment>;
    fn list_comments(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> ScmResult<Vec<Comment>>;
    fn create_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &CommentInput,
    ) -> ScmResult<Comment>;
    fn delete_comment(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        id: i64,
    ) -> Result<Response, ScmError>;
}

pub trait RepositoryService: Send + Sync {
    fn find(&self, ctx: &Context, repo: &str) -> ScmResult<Repository>;
    /// Permissions of the authenticated user on `repo`.
    fn find_perms(&self, ctx: &Context, repo: &str) -> ScmResult<Perm>;
    /// Repositories of the authenticated user.
    fn list(&self, ctx: &Context, opts: ListOptions) -> ScmResult<Vec<Repository>>;
    fn find_hook(&self, ctx: &Context, repo: &str, id: &str) -> ScmResult<Hook>;
    fn list_hooks(&self, ctx: &Context, repo: &str, opts: ListOptions) -> ScmResult<Vec<Hook>>;
    fn create_hook(&self, ctx: &Context, repo: &str, input: &HookInput) -> ScmResult<Hook>;
    fn delete_hook(&self, ctx: &Context, repo: &str, id: &str) -> Result<Response, ScmError>;
    fn list_status(
        &self,
        ctx: &Context,
        repo: &str,
        reference: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Status>>;
    fn create_status(
        &self,
        ctx: &Context,
        repo: &str,
        reference: &str,
        input: &StatusInput,
    ) -> ScmResult<Status>;
}

pub trait ReviewService: Send + Sync {
    fn find(&self, ctx: &Context, repo: &str, number: i64, id: i64) -> ScmResult<Review>;
    fn list(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        opts: ListOptions,
    ) -> ScmResult<Vec<Review>>;
    fn create(
        &self,
        ctx: &Context,
        repo: &str,
        number: i64,
        input: &ReviewInput,
    ) -> ScmResult<Review>;
    fn delete(&self, ctx: &Context, repo: &str, number: i64, id: i64) -> Result<Response, ScmError>;
}

pub trait UserService: Send + Sync {
    /// The authenticated user.
    fn find(&self, ctx: &Context) -> ScmResult<User>;
    fn find_login(&self, ctx: &Context, login: &str) -> ScmResult<User>;
    /// Email address of the authenticated user.
    fn find_email(&self, ctx: &Context) -> ScmResult<String>;
}

pub trait WebhookService: Send + Sync {
    /// Decodes a webhook delivery. Performs no network I/O.
    fn parse(&self, request: &WebhookRequest) -> Result<Webhook, ScmError>;
}
