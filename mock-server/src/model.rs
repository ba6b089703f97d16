//! Gitea API wire types and the seeded forge state.

use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

pub const CREATED: &str = "2024-01-01T12:00:00Z";
pub const WEB_ROOT: &str = "http://localhost:3000";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: i64,
    pub login: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiOrg {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiPermissions {
    pub admin: bool,
    pub push: bool,
    pub pull: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiRepo {
    pub id: i64,
    pub owner: ApiUser,
    pub name: String,
    pub full_name: String,
    pub private: bool,
    pub fork: bool,
    pub html_url: String,
    pub ssh_url: String,
    pub clone_url: String,
    pub default_branch: String,
    pub created_at: String,
    pub updated_at: String,
    pub permissions: ApiPermissions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiPayloadUser {
    pub name: String,
    pub email: String,
    pub username: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiPayloadCommit {
    pub id: String,
    pub message: String,
    pub url: String,
    pub author: ApiPayloadUser,
    pub committer: ApiPayloadUser,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiBranch {
    pub name: String,
    pub commit: ApiPayloadCommit,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiCommitUser {
    pub name: String,
    pub email: String,
    pub date: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiRepoCommit {
    pub message: String,
    pub author: ApiCommitUser,
    pub committer: ApiCommitUser,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiCommit {
    pub sha: String,
    pub html_url: String,
    pub commit: ApiRepoCommit,
    pub author: Option<ApiUser>,
    pub committer: Option<ApiUser>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiCommitMeta {
    pub sha: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiTag {
    pub name: String,
    pub commit: ApiCommitMeta,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiLabel {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiPullMeta {
    pub merged: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiIssue {
    pub id: i64,
    pub number: i64,
    pub user: ApiUser,
    pub title: String,
    pub body: String,
    pub labels: Vec<ApiLabel>,
    pub state: String,
    pub is_locked: bool,
    pub html_url: String,
    pub pull_request: Option<ApiPullMeta>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiComment {
    pub id: i64,
    pub html_url: String,
    pub user: ApiUser,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiPullBranch {
    pub label: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub sha: String,
    pub repo: ApiRepo,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiPullRequest {
    pub id: i64,
    pub number: i64,
    pub user: ApiUser,
    pub title: String,
    pub body: String,
    pub state: String,
    pub html_url: String,
    pub diff_url: String,
    pub merged: bool,
    pub head: ApiPullBranch,
    pub base: ApiPullBranch,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiHookConfig {
    pub url: String,
    pub content_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiHook {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub config: ApiHookConfig,
    pub events: Vec<String>,
    pub active: bool,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiStatus {
    pub id: i64,
    pub status: String,
    pub target_url: String,
    pub description: String,
    pub context: String,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiContents {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// --- inputs ---

#[derive(Debug, Deserialize)]
pub struct CreateIssue {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditIssue {
    pub title: Option<String>,
    pub body: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct MergePull {
    #[serde(rename = "Do")]
    pub style: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateHook {
    #[serde(rename = "type")]
    pub kind: String,
    pub config: BTreeMap<String, String>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateStatus {
    pub state: String,
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct FileOptions {
    pub content: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub sha: String,
    pub author: Option<Identity>,
}

// --- state ---

/// One repository and everything stored under it.
#[derive(Clone, Debug)]
pub struct RepoData {
    pub repo: ApiRepo,
    pub branches: Vec<ApiBranch>,
    pub commits: Vec<ApiCommit>,
    pub tags: Vec<ApiTag>,
    pub issues: Vec<ApiIssue>,
    pub pulls: Vec<ApiPullRequest>,
    /// Comments keyed by the issue or pull request number they belong to.
    pub comments: Vec<(i64, ApiComment)>,
    pub hooks: Vec<ApiHook>,
    /// Statuses keyed by commit sha.
    pub statuses: Vec<(String, ApiStatus)>,
    /// File tree of the default branch.
    pub files: BTreeMap<String, Vec<u8>>,
}

impl RepoData {
    /// Issues and pull requests share one number sequence.
    pub fn next_number(&self) -> i64 {
        let issues = self.issues.iter().map(|i| i.number);
        let pulls = self.pulls.iter().map(|p| p.number);
        issues.chain(pulls).max().unwrap_or(0) + 1
    }

    /// Resolves a branch or tag name to a commit sha; anything else is
    /// taken to be a sha already.
    pub fn resolve(&self, reference: &str) -> String {
        if let Some(branch) = self.branches.iter().find(|b| b.name == reference) {
            return branch.commit.id.clone();
        }
        if let Some(tag) = self.tags.iter().find(|t| t.name == reference) {
            return tag.commit.sha.clone();
        }
        reference.to_string()
    }

    pub fn has_ref(&self, reference: &str) -> bool {
        self.branches.iter().any(|b| b.name == reference)
            || self.tags.iter().any(|t| t.name == reference)
            || self.commits.iter().any(|c| c.sha == reference)
    }
}

/// The whole in-memory forge.
#[derive(Clone, Debug)]
pub struct Forge {
    /// The authenticated account.
    pub me: ApiUser,
    pub users: Vec<ApiUser>,
    pub orgs: Vec<ApiOrg>,
    pub repos: BTreeMap<String, RepoData>,
    /// When set, every request must carry `Authorization: token <value>`.
    pub token: Option<String>,
    next_id: i64,
}

impl Forge {
    pub fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn user(&self, login: &str) -> Option<&ApiUser> {
        self.users.iter().find(|u| u.login == login)
    }

    /// Seed data: two users, one organization and `octocat/hello-world`
    /// with branches, a tag, an issue, a pull request, a hook, a status and
    /// a few files.
    pub fn seeded() -> Self {
        let octocat = user(1, "octocat", "The Octocat");
        let hubot = user(2, "hubot", "Hubot");
        let repo = repository(42, &octocat, "hello-world");

        let initial = commit(
            "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d",
            "Initial commit\n",
            &octocat,
            &repo,
        );
        let feature = commit(
            "2eba238e33607c1fa49253182e9fff42baafa1eb",
            "Add feature\n",
            &hubot,
            &repo,
        );

        let mut files = BTreeMap::new();
        files.insert("README.md".to_string(), b"# hello-world\n\nMy first repository.\n".to_vec());
        files.insert("docs/guide.md".to_string(), b"Read the guide.\n".to_vec());
        files.insert("docs/img/logo.svg".to_string(), b"<svg/>".to_vec());

        let issue = ApiIssue {
            id: 100,
            number: 1,
            user: hubot.clone(),
            title: "Found a bug".to_string(),
            body: "I'm having a problem with this.".to_string(),
            labels: vec![ApiLabel {
                id: 1,
                name: "bug".to_string(),
                color: "ee0701".to_string(),
            }],
            state: "open".to_string(),
            is_locked: false,
            html_url: format!("{}/issues/1", repo.html_url),
            pull_request: None,
            created_at: CREATED.to_string(),
            updated_at: CREATED.to_string(),
        };
        let comment = ApiComment {
            id: 200,
            html_url: format!("{}/issues/1#issuecomment-200", repo.html_url),
            user: octocat.clone(),
            body: "Can you share the logs?".to_string(),
            created_at: CREATED.to_string(),
            updated_at: CREATED.to_string(),
        };
        let pull = ApiPullRequest {
            id: 300,
            number: 2,
            user: hubot.clone(),
            title: "Add feature".to_string(),
            body: "Please pull these awesome changes".to_string(),
            state: "open".to_string(),
            html_url: format!("{}/pulls/2", repo.html_url),
            diff_url: format!("{}/pulls/2.diff", repo.html_url),
            merged: false,
            head: ApiPullBranch {
                label: "feature".to_string(),
                reference: "feature".to_string(),
                sha: feature.sha.clone(),
                repo: repo.clone(),
            },
            base: ApiPullBranch {
                label: "main".to_string(),
                reference: "main".to_string(),
                sha: initial.sha.clone(),
                repo: repo.clone(),
            },
            created_at: CREATED.to_string(),
            updated_at: CREATED.to_string(),
        };
        let hook = ApiHook {
            id: 400,
            kind: "gitea".to_string(),
            config: ApiHookConfig {
                url: "https://ci.example.com/hook".to_string(),
                content_type: "json".to_string(),
            },
            events: vec!["push".to_string()],
            active: true,
            created_at: CREATED.to_string(),
        };
        let status = ApiStatus {
            id: 500,
            status: "success".to_string(),
            target_url: "https://ci.example.com/builds/1".to_string(),
            description: "Build passed".to_string(),
            context: "ci/build".to_string(),
            created_at: CREATED.to_string(),
        };

        let data = RepoData {
            branches: vec![branch("main", &initial), branch("feature", &feature)],
            tags: vec![ApiTag {
                name: "v1.0.0".to_string(),
                commit: ApiCommitMeta {
                    sha: initial.sha.clone(),
                },
            }],
            statuses: vec![(initial.sha.clone(), status)],
            commits: vec![feature, initial],
            issues: vec![issue],
            pulls: vec![pull],
            comments: vec![(1, comment)],
            hooks: vec![hook],
            files,
            repo,
        };

        let mut repos = BTreeMap::new();
        repos.insert(data.repo.full_name.clone(), data);

        Self {
            me: octocat.clone(),
            users: vec![octocat, hubot],
            orgs: vec![ApiOrg {
                id: 3,
                username: "gitea".to_string(),
                full_name: "Gitea".to_string(),
                avatar_url: format!("{WEB_ROOT}/avatars/3"),
            }],
            repos,
            token: None,
            next_id: 1000,
        }
    }
}

fn user(id: i64, login: &str, full_name: &str) -> ApiUser {
    ApiUser {
        id,
        login: login.to_string(),
        full_name: full_name.to_string(),
        email: format!("{login}@example.com"),
        avatar_url: format!("{WEB_ROOT}/avatars/{id}"),
    }
}

fn repository(id: i64, owner: &ApiUser, name: &str) -> ApiRepo {
    let full_name = format!("{}/{name}", owner.login);
    ApiRepo {
        id,
        owner: owner.clone(),
        name: name.to_string(),
        html_url: format!("{WEB_ROOT}/{full_name}"),
        ssh_url: format!("git@localhost:{full_name}.git"),
        clone_url: format!("{WEB_ROOT}/{full_name}.git"),
        full_name,
        private: false,
        fork: false,
        default_branch: "main".to_string(),
        created_at: CREATED.to_string(),
        updated_at: CREATED.to_string(),
        permissions: ApiPermissions {
            admin: true,
            push: true,
            pull: true,
        },
    }
}

fn commit(sha: &str, message: &str, author: &ApiUser, repo: &ApiRepo) -> ApiCommit {
    let signature = ApiCommitUser {
        name: author.full_name.clone(),
        email: author.email.clone(),
        date: CREATED.to_string(),
    };
    ApiCommit {
        sha: sha.to_string(),
        html_url: format!("{}/commit/{sha}", repo.html_url),
        commit: ApiRepoCommit {
            message: message.to_string(),
            author: signature.clone(),
            committer: signature,
        },
        author: Some(author.clone()),
        committer: Some(author.clone()),
    }
}

fn branch(name: &str, head: &ApiCommit) -> ApiBranch {
    let who = ApiPayloadUser {
        name: head.commit.author.name.clone(),
        email: head.commit.author.email.clone(),
        username: head
            .author
            .as_ref()
            .map(|u| u.login.clone())
            .unwrap_or_default(),
    };
    ApiBranch {
        name: name.to_string(),
        commit: ApiPayloadCommit {
            id: head.sha.clone(),
            message: head.commit.message.clone(),
            url: head.html_url.clone(),
            author: who.clone(),
            committer: who,
            timestamp: CREATED.to_string(),
        },
    }
}

/// Stand-in for a git blob id: stable for identical content.
pub fn blob_sha(data: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
