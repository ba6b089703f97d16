//! Branches, tags and commits.
//!
//! # Design
//! Branch and tag lookups return the neutral `Reference`. The commits API
//! and push payloads describe a commit differently, so each has its own DTO
//! and converter.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::form_urlencoded;

use super::user::GiteaUser;
use super::{append_list_options, encode_list_options, with_query, Wrapper};
use crate::context::Context;
use crate::error::ScmError;
use crate::services::{GitService, ScmResult};
use crate::types::{
    Change, Commit, CommitListOptions, ListOptions, Reference, Signature,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GiteaBranch {
    name: String,
    commit: GiteaPayloadCommit,
}

/// Commit summary embedded in branch listings and push webhooks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GiteaPayloadCommit {
    pub id: String,
    pub message: String,
    pub url: String,
    pub author: GiteaPayloadUser,
    pub committer: GiteaPayloadUser,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GiteaPayloadUser {
    pub name: String,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GiteaCommit {
    sha: String,
    html_url: String,
    commit: GiteaRepoCommit,
    author: Option<GiteaUser>,
    committer: Option<GiteaUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GiteaRepoCommit {
    message: String,
    author: GiteaCommitUser,
    committer: GiteaCommitUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GiteaCommitUser {
    name: String,
    email: String,
    date: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GiteaTag {
    name: String,
    commit: GiteaCommitMeta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GiteaCommitMeta {
    sha: String,
}

fn convert_branch(src: GiteaBranch) -> Reference {
    Reference {
        path: format!("refs/heads/{}", src.name),
        name: src.name,
        sha: src.commit.id,
    }
}

fn convert_tag(src: GiteaTag) -> Reference {
    Reference {
        path: format!("refs/tags/{}", src.name),
        name: src.name,
        sha: src.commit.sha,
    }
}

fn convert_commit(src: GiteaCommit) -> Commit {
    let (author_login, author_avatar) = account(src.author);
    let (committer_login, committer_avatar) = account(src.committer);
    Commit {
        sha: src.sha,
        message: src.commit.message,
        author: Signature {
            name: src.commit.author.name,
            email: src.commit.author.email,
            date: src.commit.author.date,
            login: author_login,
            avatar: author_avatar,
        },
        committer: Signature {
            name: src.commit.committer.name,
            email: src.commit.committer.email,
            date: src.commit.committer.date,
            login: committer_login,
            avatar: committer_avatar,
        },
        link: src.html_url,
    }
}

fn account(user: Option<GiteaUser>) -> (String, String) {
    user.map(|u| (u.login, u.avatar_url)).unwrap_or_default()
}

/// Converts a webhook commit summary.
pub(crate) fn convert_payload_commit(src: GiteaPayloadCommit) -> Commit {
    Commit {
        sha: src.id,
        message: src.message,
        author: Signature {
            name: src.author.name,
            email: src.author.email,
            date: src.timestamp,
            login: src.author.username,
            avatar: String::new(),
        },
        committer: Signature {
            name: src.committer.name,
            email: src.committer.email,
            date: src.timestamp,
            login: src.committer.username,
            avatar: String::new(),
        },
        link: src.url,
    }
}

fn encode_commit_list_options(opts: &CommitListOptions) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if !opts.reference.is_empty() {
        query.append_pair("sha", &opts.reference);
    }
    if !opts.path.is_empty() {
        query.append_pair("path", &opts.path);
    }
    append_list_options(
        &mut query,
        ListOptions {
            page: opts.page,
            size: opts.size,
        },
    );
    query.finish()
}

pub struct GiteaGitService {
    client: Arc<Wrapper>,
}

impl GiteaGitService {
    pub(crate) fn new(client: Arc<Wrapper>) -> Self {
        Self { client }
    }
}

impl GitService for GiteaGitService {
    fn find_branch(&self, ctx: &Context, repo: &str, name: &str) -> ScmResult<Reference> {
        let path = format!("api/v1/repos/{repo}/branches/{name}");
        let (out, res) = self.client.get::<GiteaBranch>(ctx, &path)?;
        Ok((convert_branch(out), res))
    }

    fn find_commit(&self, ctx: &Context, repo: &str, sha: &str) -> ScmResult<Commit> {
        let path = format!("api/v1/repos/{repo}/git/commits/{sha}");
        let (out, res) = self.client.get::<GiteaCommit>(ctx, &path)?;
        Ok((convert_commit(out), res))
    }

    fn find_tag(&self, _ctx: &Context, _repo: &str, _name: &str) -> ScmResult<Reference> {
        Err(ScmError::NotSupported)
    }

    fn list_branches(&self, ctx: &Context, repo: &str, opts: ListOptions) -> ScmResult<Vec<Reference>> {
        let path = with_query(format!("api/v1/repos/{repo}/branches"), &encode_list_options(opts));
        let (out, res) = self.client.get::<Vec<GiteaBranch>>(ctx, &path)?;
        Ok((out.into_iter().map(convert_branch).collect(), res))
    }

    fn list_commits(
        &self,
        ctx: &Context,
        repo: &str,
        opts: &CommitListOptions,
    ) -> ScmResult<Vec<Commit>> {
        let path = with_query(
            format!("api/v1/repos/{repo}/commits"),
            &encode_commit_list_options(opts),
        );
        let (out, res) = self.client.get::<Vec<GiteaCommit>>(ctx, &path)?;
        Ok((out.into_iter().map(convert_commit).collect(), res))
    }

    fn list_tags(&self, ctx: &Context, repo: &str, opts: ListOptions) -> ScmResult<Vec<Reference>> {
        let path = with_query(format!("api/v1/repos/{repo}/tags"), &encode_list_options(opts));
        let (out, res) = self.client.get::<Vec<GiteaTag>>(ctx, &path)?;
        Ok((out.into_iter().map(convert_tag).collect(), res))
    }

    fn list_changes(
        &self,
        _ctx: &Context,
        _repo: &str,
        _sha: &str,
        _opts: ListOptions,
    ) -> ScmResult<Vec<Change>> {
        Err(ScmError::NotSupported)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::testing::{client, ctx, FakeTransport};
    use super::*;

    #[test]
    fn find_branch_builds_reference() {
        let fake = FakeTransport::new();
        fake.respond_json(
            200,
            json!({"name": "main", "commit": {"id": "7fd1a60b01f91b31", "message": "Update README"}}),
        );
        let (branch, _) = client(&fake)
            .git()
            .unwrap()
            .find_branch(&ctx(), "octocat/hello-world", "main")
            .unwrap();
        assert_eq!(fake.last_request().path, "api/v1/repos/octocat/hello-world/branches/main");
        assert_eq!(
            branch,
            Reference {
                name: "main".to_string(),
                path: "refs/heads/main".to_string(),
                sha: "7fd1a60b01f91b31".to_string(),
            }
        );
    }

    #[test]
    fn find_commit_converts_signatures() {
        let fake = FakeTransport::new();
        fake.respond_json(
            200,
            json!({
                "sha": "7fd1a60b01f91b31",
                "html_url": "https://gitea.example.com/octocat/hello-world/commit/7fd1a60b01f91b31",
                "commit": {
                    "message": "Update README\n",
                    "author": {"name": "The Octocat", "email": "octocat@example.com", "date": "2024-01-02T15:04:05Z"},
                    "committer": {"name": "Gitea", "email": "noreply@example.com", "date": "2024-01-02T15:05:00Z"}
                },
                "author": {"id": 1, "login": "octocat", "avatar_url": "https://gitea.example.com/avatars/1"},
                "committer": null
            }),
        );
        let (commit, _) = client(&fake)
            .git()
            .unwrap()
            .find_commit(&ctx(), "octocat/hello-world", "7fd1a60b01f91b31")
            .unwrap();

        assert_eq!(
            fake.last_request().path,
            "api/v1/repos/octocat/hello-world/git/commits/7fd1a60b01f91b31"
        );
        assert_eq!(commit.message, "Update README\n");
        assert_eq!(commit.author.login, "octocat");
        assert_eq!(commit.author.email, "octocat@example.com");
        assert_eq!(commit.committer.name, "Gitea");
        assert_eq!(commit.committer.login, "");
    }

    #[test]
    fn list_commits_encodes_ref_and_paging() {
        let fake = FakeTransport::new();
        fake.respond_json(200, json!([]));
        let opts = CommitListOptions {
            reference: "feature/x".to_string(),
            page: 1,
            size: 5,
            ..CommitListOptions::default()
        };
        let (commits, _) = client(&fake)
            .git()
            .unwrap()
            .list_commits(&ctx(), "octocat/hello-world", &opts)
            .unwrap();
        assert!(commits.is_empty());
        assert_eq!(
            fake.last_request().path,
            "api/v1/repos/octocat/hello-world/commits?sha=feature%2Fx&page=1&limit=5"
        );
    }

    #[test]
    fn list_tags_builds_tag_paths() {
        let fake = FakeTransport::new();
        fake.respond_json(200, json!([{"name": "v1.0.0", "commit": {"sha": "abc"}}]));
        let (tags, _) = client(&fake)
            .git()
            .unwrap()
            .list_tags(&ctx(), "octocat/hello-world", ListOptions::default())
            .unwrap();
        assert_eq!(tags[0].path, "refs/tags/v1.0.0");
        assert_eq!(tags[0].sha, "abc");
    }

    #[test]
    fn unsupported_operations_send_nothing() {
        let fake = FakeTransport::new();
        let c = client(&fake);
        let git = c.git().unwrap();
        assert!(matches!(
            git.find_tag(&ctx(), "octocat/hello-world", "v1"),
            Err(ScmError::NotSupported)
        ));
        assert!(matches!(
            git.list_changes(&ctx(), "octocat/hello-world", "abc", ListOptions::default()),
            Err(ScmError::NotSupported)
        ));
        assert!(fake.requests().is_empty());
    }
}
