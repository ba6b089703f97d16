//! Webhook delivery parsing.
//!
//! # Design
//! The `X-Gitea-Event` header selects the payload type. Each payload is
//! decoded into a private DTO and converted with the same functions the REST
//! services use. Nothing here touches the network.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::git::{convert_payload_commit, GiteaPayloadCommit};
use super::issue::{convert_comment, convert_issue, GiteaComment, GiteaIssue};
use super::pr::{convert_pull_request, GiteaPullRequest};
use super::repo::{convert_repository, GiteaRepository};
use super::user::{convert_user, GiteaUser};
use crate::error::ScmError;
use crate::services::WebhookService;
use crate::types::Reference;
use crate::webhook::{
    Action, BranchHook, IssueCommentHook, IssueHook, PullRequestHook, PushHook, TagHook, Webhook,
    WebhookRequest,
};

const EVENT_HEADER: &str = "X-Gitea-Event";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PushPayload {
    #[serde(rename = "ref")]
    reference: String,
    before: String,
    after: String,
    compare_url: String,
    commits: Vec<GiteaPayloadCommit>,
    repository: GiteaRepository,
    sender: GiteaUser,
}

/// Body of both `create` and `delete` deliveries. Deletions carry no sha.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RefPayload {
    #[serde(rename = "ref")]
    reference: String,
    ref_type: String,
    sha: String,
    repository: GiteaRepository,
    sender: GiteaUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IssuePayload {
    action: String,
    issue: GiteaIssue,
    repository: GiteaRepository,
    sender: GiteaUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IssueCommentPayload {
    action: String,
    issue: GiteaIssue,
    comment: GiteaComment,
    repository: GiteaRepository,
    sender: GiteaUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PullRequestPayload {
    action: String,
    pull_request: GiteaPullRequest,
    repository: GiteaRepository,
    sender: GiteaUser,
}

/// Decodes Gitea webhook deliveries. Holds no client and performs no I/O.
#[derive(Debug, Default)]
pub struct GiteaWebhookService;

impl GiteaWebhookService {
    pub fn new() -> Self {
        Self
    }
}

impl WebhookService for GiteaWebhookService {
    fn parse(&self, request: &WebhookRequest) -> Result<Webhook, ScmError> {
        let event = request
            .header(EVENT_HEADER)
            .ok_or_else(|| ScmError::InvalidWebhook(format!("missing {EVENT_HEADER} header")))?;
        debug!(event, bytes = request.body.len(), "parsing gitea webhook");

        match event {
            "push" => parse_push(&request.body),
            "create" => parse_ref(&request.body, Action::Create),
            "delete" => parse_ref(&request.body, Action::Delete),
            "issues" => parse_issue(&request.body),
            "issue_comment" => parse_issue_comment(&request.body),
            "pull_request" => parse_pull_request(&request.body),
            other => Err(ScmError::UnknownEvent(other.to_string())),
        }
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ScmError> {
    serde_json::from_slice(body).map_err(|e| ScmError::InvalidWebhook(e.to_string()))
}

fn parse_push(body: &[u8]) -> Result<Webhook, ScmError> {
    let payload: PushPayload = decode(body)?;
    Ok(Webhook::Push(PushHook {
        reference: payload.reference,
        before: payload.before,
        after: payload.after,
        compare: payload.compare_url,
        repo: convert_repository(payload.repository),
        commits: payload
            .commits
            .into_iter()
            .map(convert_payload_commit)
            .collect(),
        sender: convert_user(payload.sender),
    }))
}

fn parse_ref(body: &[u8], action: Action) -> Result<Webhook, ScmError> {
    let payload: RefPayload = decode(body)?;
    let repo = convert_repository(payload.repository);
    let sender = convert_user(payload.sender);
    match payload.ref_type.as_str() {
        "branch" => Ok(Webhook::Branch(BranchHook {
            reference: Reference {
                path: format!("refs/heads/{}", payload.reference),
                name: payload.reference,
                sha: payload.sha,
            },
            repo,
            action,
            sender,
        })),
        "tag" => Ok(Webhook::Tag(TagHook {
            reference: Reference {
                path: format!("refs/tags/{}", payload.reference),
                name: payload.reference,
                sha: payload.sha,
            },
            repo,
            action,
            sender,
        })),
        other => Err(ScmError::InvalidWebhook(format!("unknown ref_type {other:?}"))),
    }
}

fn parse_issue(body: &[u8]) -> Result<Webhook, ScmError> {
    let payload: IssuePayload = decode(body)?;
    Ok(Webhook::Issue(IssueHook {
        action: convert_action(&payload.action),
        repo: convert_repository(payload.repository),
        issue: convert_issue(payload.issue),
        sender: convert_user(payload.sender),
    }))
}

fn parse_issue_comment(body: &[u8]) -> Result<Webhook, ScmError> {
    let payload: IssueCommentPayload = decode(body)?;
    Ok(Webhook::IssueComment(IssueCommentHook {
        action: convert_action(&payload.action),
        repo: convert_repository(payload.repository),
        issue: convert_issue(payload.issue),
        comment: convert_comment(payload.comment),
        sender: convert_user(payload.sender),
    }))
}

fn parse_pull_request(body: &[u8]) -> Result<Webhook, ScmError> {
    let payload: PullRequestPayload = decode(body)?;
    let mut action = convert_action(&payload.action);
    if action == Action::Close && payload.pull_request.merged {
        action = Action::Merge;
    }
    Ok(Webhook::PullRequest(PullRequestHook {
        action,
        repo: convert_repository(payload.repository),
        pull_request: convert_pull_request(payload.pull_request),
        sender: convert_user(payload.sender),
    }))
}

fn convert_action(src: &str) -> Action {
    match src {
        "created" => Action::Create,
        "edited" => Action::Update,
        "deleted" => Action::Delete,
        "opened" => Action::Open,
        "reopened" => Action::Reopen,
        "closed" => Action::Close,
        "label_updated" => Action::Label,
        "label_cleared" => Action::Unlabel,
        "synchronized" => Action::Sync,
        _ => Action::Unknown,
    }
}
