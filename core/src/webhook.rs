//! Provider-neutral webhook events.
//!
//! Drivers parse their own payloads into a `Webhook`; callers match on the
//! variant and never see provider JSON.

use crate::http::find_header;
use crate::types::{Comment, Commit, Issue, PullRequest, Reference, Repository, User};

/// What happened to the object a webhook describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Action {
    #[default]
    Unknown,
    Create,
    Update,
    Delete,
    Open,
    Reopen,
    Close,
    Label,
    Unlabel,
    Sync,
    Merge,
}

/// A received webhook delivery, as plain data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookRequest {
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl WebhookRequest {
    pub fn new(headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushHook {
    pub reference: String,
    pub before: String,
    pub after: String,
    pub compare: String,
    pub repo: Repository,
    pub commits: Vec<Commit>,
    pub sender: User,
}

/// Branch creation or deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchHook {
    pub reference: Reference,
    pub repo: Repository,
    pub action: Action,
    pub sender: User,
}

/// Tag creation or deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagHook {
    pub reference: Reference,
    pub repo: Repository,
    pub action: Action,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueHook {
    pub action: Action,
    pub repo: Repository,
    pub issue: Issue,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueCommentHook {
    pub action: Action,
    pub repo: Repository,
    pub issue: Issue,
    pub comment: Comment,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestHook {
    pub action: Action,
    pub repo: Repository,
    pub pull_request: PullRequest,
    pub sender: User,
}

/// A parsed webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Webhook {
    Push(PushHook),
    Branch(BranchHook),
    Tag(TagHook),
    Issue(IssueHook),
    IssueComment(IssueCommentHook),
    PullRequest(PullRequestHook),
}

impl Webhook {
    /// Repository the event happened in.
    pub fn repository(&self) -> &Repository {
        match self {
            Webhook::Push(h) => &h.repo,
            Webhook::Branch(h) => &h.repo,
            Webhook::Tag(h) => &h.repo,
            Webhook::Issue(h) => &h.repo,
            Webhook::IssueComment(h) => &h.repo,
            Webhook::PullRequest(h) => &h.repo,
        }
    }
}
