//! In-memory Gitea API used by the client's integration tests.
//!
//! Serves a seeded forge under `/api/v1` with the endpoints the Gitea driver
//! calls. `/api/v1/moved` always answers `301 Moved Permanently`.

pub mod model;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

use crate::model::*;

pub type Db = Arc<RwLock<Forge>>;

/// Gitea-shaped error: a status and `{"message": ...}`.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl ApiError {
    fn not_found(what: &str) -> Self {
        Self(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    fn unprocessable(message: impl Into<String>) -> Self {
        Self(StatusCode::UNPROCESSABLE_ENTITY, message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "message": self.1 }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Paging {
    pub page: usize,
    pub limit: usize,
}

impl Paging {
    fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        if self.limit == 0 {
            return items.into_iter().collect();
        }
        let skip = (self.page.max(1) - 1).saturating_mul(self.limit);
        items.into_iter().skip(skip).take(self.limit).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StateFilter {
    pub state: String,
}

impl StateFilter {
    /// Gitea lists open items when no state is given.
    fn admits(&self, state: &str) -> bool {
        match self.state.as_str() {
            "" => state == "open",
            "all" => true,
            wanted => wanted == state,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefQuery {
    #[serde(rename = "ref")]
    pub reference: String,
    pub sha: String,
}

pub fn app() -> Router {
    app_with(Forge::seeded())
}

/// Like `app`, but every request must authenticate with `token`.
pub fn app_with_token(token: &str) -> Router {
    let mut forge = Forge::seeded();
    forge.token = Some(token.to_string());
    app_with(forge)
}

pub fn app_with(forge: Forge) -> Router {
    let db: Db = Arc::new(RwLock::new(forge));
    let repo = "/api/v1/repos/{owner}/{repo}";
    Router::new()
        .route("/api/v1/moved", get(moved))
        .route("/api/v1/user", get(current_user))
        .route("/api/v1/users/{login}", get(find_user))
        .route("/api/v1/user/orgs", get(list_orgs))
        .route("/api/v1/orgs/{org}", get(find_org))
        .route("/api/v1/user/repos", get(list_repos))
        .route(repo, get(find_repo))
        .route(&format!("{repo}/branches"), get(list_branches))
        .route(&format!("{repo}/branches/{{branch}}"), get(find_branch))
        .route(&format!("{repo}/git/commits/{{sha}}"), get(find_commit))
        .route(&format!("{repo}/commits"), get(list_commits))
        .route(&format!("{repo}/tags"), get(list_tags))
        .route(&format!("{repo}/issues"), get(list_issues).post(create_issue))
        .route(&format!("{repo}/issues/{{index}}"), get(find_issue).patch(edit_issue))
        .route(
            &format!("{repo}/issues/{{index}}/comments"),
            get(list_comments).post(create_comment),
        )
        .route(
            &format!("{repo}/issues/comments/{{id}}"),
            get(find_comment).delete(delete_comment),
        )
        .route(&format!("{repo}/pulls"), get(list_pulls))
        .route(&format!("{repo}/pulls/{{index}}"), get(find_pull).patch(edit_pull))
        .route(&format!("{repo}/pulls/{{index}}/merge"), post(merge_pull))
        .route(&format!("{repo}/hooks"), get(list_hooks).post(create_hook))
        .route(&format!("{repo}/hooks/{{id}}"), get(find_hook).delete(delete_hook))
        .route(&format!("{repo}/statuses/{{sha}}"), get(list_statuses).post(create_status))
        .route(&format!("{repo}/raw/{{*path}}"), get(raw_file))
        .route(
            &format!("{repo}/contents/{{*path}}"),
            get(get_contents).post(create_file).put(update_file),
        )
        .layer(middleware::from_fn_with_state(db.clone(), authenticate))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

/// Serves `router` on `listener` until the task is dropped.
pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

async fn authenticate(State(db): State<Db>, request: Request, next: Next) -> Response {
    let expected = db.read().await.token.clone();
    if let Some(token) = expected {
        let given = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if given != Some(format!("token {token}").as_str()) {
            return ApiError(StatusCode::UNAUTHORIZED, "token is required".to_string())
                .into_response();
        }
    }
    next.run(request).await
}

async fn moved() -> Response {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, "/api/v1/user")],
        Json(json!({ "message": "moved" })),
    )
        .into_response()
}

// --- users and organizations ---

async fn current_user(State(db): State<Db>) -> Json<ApiUser> {
    let forge = db.read().await;
    Json(forge.me.clone())
}

async fn find_user(State(db): State<Db>, Path(login): Path<String>) -> ApiResult<Json<ApiUser>> {
    let forge = db.read().await;
    forge
        .user(&login)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("user"))
}

async fn list_orgs(State(db): State<Db>, Query(paging): Query<Paging>) -> Json<Vec<ApiOrg>> {
    let forge = db.read().await;
    Json(paging.apply(forge.orgs.iter().cloned()))
}

async fn find_org(State(db): State<Db>, Path(org): Path<String>) -> ApiResult<Json<ApiOrg>> {
    let forge = db.read().await;
    forge
        .orgs
        .iter()
        .find(|o| o.username == org)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("organization"))
}

// --- repositories ---

fn repo_data<'a>(forge: &'a Forge, owner: &str, repo: &str) -> ApiResult<&'a RepoData> {
    forge
        .repos
        .get(&format!("{owner}/{repo}"))
        .ok_or_else(|| ApiError::not_found("repository"))
}

fn repo_data_mut<'a>(forge: &'a mut Forge, owner: &str, repo: &str) -> ApiResult<&'a mut RepoData> {
    forge
        .repos
        .get_mut(&format!("{owner}/{repo}"))
        .ok_or_else(|| ApiError::not_found("repository"))
}

async fn list_repos(State(db): State<Db>, Query(paging): Query<Paging>) -> Json<Vec<ApiRepo>> {
    let forge = db.read().await;
    Json(paging.apply(forge.repos.values().map(|d| d.repo.clone())))
}

async fn find_repo(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
) -> ApiResult<Json<ApiRepo>> {
    let forge = db.read().await;
    Ok(Json(repo_data(&forge, &owner, &repo)?.repo.clone()))
}

// --- git ---

async fn list_branches(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
    Query(paging): Query<Paging>,
) -> ApiResult<Json<Vec<ApiBranch>>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    Ok(Json(paging.apply(data.branches.iter().cloned())))
}

async fn find_branch(
    State(db): State<Db>,
    Path((owner, repo, branch)): Path<(String, String, String)>,
) -> ApiResult<Json<ApiBranch>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    data.branches
        .iter()
        .find(|b| b.name == branch)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("branch"))
}

async fn find_commit(
    State(db): State<Db>,
    Path((owner, repo, sha)): Path<(String, String, String)>,
) -> ApiResult<Json<ApiCommit>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    data.commits
        .iter()
        .find(|c| c.sha == sha)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("commit"))
}

/// Commits newest first, starting at `sha` when given. The `path` filter is
/// accepted and ignored.
async fn list_commits(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<RefQuery>,
    Query(paging): Query<Paging>,
) -> ApiResult<Json<Vec<ApiCommit>>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    let start = if query.sha.is_empty() {
        0
    } else {
        let sha = data.resolve(&query.sha);
        data.commits
            .iter()
            .position(|c| c.sha == sha)
            .ok_or_else(|| ApiError::not_found("reference"))?
    };
    Ok(Json(paging.apply(data.commits[start..].iter().cloned())))
}

async fn list_tags(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
    Query(paging): Query<Paging>,
) -> ApiResult<Json<Vec<ApiTag>>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    Ok(Json(paging.apply(data.tags.iter().cloned())))
}

// --- issues and comments ---

/// Issue view of a pull request, as Gitea's issue endpoints return it.
fn pull_as_issue(pull: &ApiPullRequest) -> ApiIssue {
    ApiIssue {
        id: pull.id,
        number: pull.number,
        user: pull.user.clone(),
        title: pull.title.clone(),
        body: pull.body.clone(),
        labels: Vec::new(),
        state: pull.state.clone(),
        is_locked: false,
        html_url: pull.html_url.clone(),
        pull_request: Some(ApiPullMeta {
            merged: pull.merged,
        }),
        created_at: pull.created_at.clone(),
        updated_at: pull.updated_at.clone(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IssueFilter {
    #[serde(rename = "type")]
    pub kind: String,
}

async fn list_issues(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
    Query(filter): Query<StateFilter>,
    Query(kind): Query<IssueFilter>,
    Query(paging): Query<Paging>,
) -> ApiResult<Json<Vec<ApiIssue>>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    let mut items: Vec<ApiIssue> = data.issues.clone();
    if kind.kind != "issues" {
        items.extend(data.pulls.iter().map(pull_as_issue));
    }
    if kind.kind == "pulls" {
        items.retain(|i| i.pull_request.is_some());
    }
    items.retain(|i| filter.admits(&i.state));
    items.sort_by_key(|i| std::cmp::Reverse(i.number));
    Ok(Json(paging.apply(items)))
}

async fn create_issue(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
    Json(input): Json<CreateIssue>,
) -> ApiResult<(StatusCode, Json<ApiIssue>)> {
    if input.title.trim().is_empty() {
        return Err(ApiError::unprocessable("title is required"));
    }
    let mut forge = db.write().await;
    let id = forge.next_id();
    let me = forge.me.clone();
    let data = repo_data_mut(&mut forge, &owner, &repo)?;
    let number = data.next_number();
    let issue = ApiIssue {
        id,
        number,
        user: me,
        title: input.title,
        body: input.body,
        labels: Vec::new(),
        state: "open".to_string(),
        is_locked: false,
        html_url: format!("{}/issues/{number}", data.repo.html_url),
        pull_request: None,
        created_at: CREATED.to_string(),
        updated_at: CREATED.to_string(),
    };
    data.issues.push(issue.clone());
    debug!(repo = %data.repo.full_name, number, "issue created");
    Ok((StatusCode::CREATED, Json(issue)))
}

async fn find_issue(
    State(db): State<Db>,
    Path((owner, repo, index)): Path<(String, String, i64)>,
) -> ApiResult<Json<ApiIssue>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    if let Some(issue) = data.issues.iter().find(|i| i.number == index) {
        return Ok(Json(issue.clone()));
    }
    data.pulls
        .iter()
        .find(|p| p.number == index)
        .map(|p| Json(pull_as_issue(p)))
        .ok_or_else(|| ApiError::not_found("issue"))
}

async fn edit_issue(
    State(db): State<Db>,
    Path((owner, repo, index)): Path<(String, String, i64)>,
    Json(input): Json<EditIssue>,
) -> ApiResult<(StatusCode, Json<ApiIssue>)> {
    let mut forge = db.write().await;
    let data = repo_data_mut(&mut forge, &owner, &repo)?;
    let issue = data
        .issues
        .iter_mut()
        .find(|i| i.number == index)
        .ok_or_else(|| ApiError::not_found("issue"))?;
    if let Some(state) = input.state {
        if state != "open" && state != "closed" {
            return Err(ApiError::unprocessable(format!("invalid state {state}")));
        }
        issue.state = state;
    }
    if let Some(title) = input.title {
        issue.title = title;
    }
    if let Some(body) = input.body {
        issue.body = body;
    }
    Ok((StatusCode::CREATED, Json(issue.clone())))
}

fn has_thread(data: &RepoData, index: i64) -> bool {
    data.issues.iter().any(|i| i.number == index) || data.pulls.iter().any(|p| p.number == index)
}

async fn list_comments(
    State(db): State<Db>,
    Path((owner, repo, index)): Path<(String, String, i64)>,
    Query(paging): Query<Paging>,
) -> ApiResult<Json<Vec<ApiComment>>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    if !has_thread(data, index) {
        return Err(ApiError::not_found("issue"));
    }
    let comments = data
        .comments
        .iter()
        .filter(|(n, _)| *n == index)
        .map(|(_, c)| c.clone());
    Ok(Json(paging.apply(comments)))
}

async fn create_comment(
    State(db): State<Db>,
    Path((owner, repo, index)): Path<(String, String, i64)>,
    Json(input): Json<CreateComment>,
) -> ApiResult<(StatusCode, Json<ApiComment>)> {
    let mut forge = db.write().await;
    let id = forge.next_id();
    let me = forge.me.clone();
    let data = repo_data_mut(&mut forge, &owner, &repo)?;
    if !has_thread(data, index) {
        return Err(ApiError::not_found("issue"));
    }
    let comment = ApiComment {
        id,
        html_url: format!("{}/issues/{index}#issuecomment-{id}", data.repo.html_url),
        user: me,
        body: input.body,
        created_at: CREATED.to_string(),
        updated_at: CREATED.to_string(),
    };
    data.comments.push((index, comment.clone()));
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn find_comment(
    State(db): State<Db>,
    Path((owner, repo, id)): Path<(String, String, i64)>,
) -> ApiResult<Json<ApiComment>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    data.comments
        .iter()
        .find(|(_, c)| c.id == id)
        .map(|(_, c)| Json(c.clone()))
        .ok_or_else(|| ApiError::not_found("comment"))
}

async fn delete_comment(
    State(db): State<Db>,
    Path((owner, repo, id)): Path<(String, String, i64)>,
) -> ApiResult<StatusCode> {
    let mut forge = db.write().await;
    let data = repo_data_mut(&mut forge, &owner, &repo)?;
    let before = data.comments.len();
    data.comments.retain(|(_, c)| c.id != id);
    if data.comments.len() == before {
        return Err(ApiError::not_found("comment"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- pull requests ---

async fn list_pulls(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
    Query(filter): Query<StateFilter>,
    Query(paging): Query<Paging>,
) -> ApiResult<Json<Vec<ApiPullRequest>>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    let pulls = data.pulls.iter().filter(|p| filter.admits(&p.state)).cloned();
    Ok(Json(paging.apply(pulls)))
}

async fn find_pull(
    State(db): State<Db>,
    Path((owner, repo, index)): Path<(String, String, i64)>,
) -> ApiResult<Json<ApiPullRequest>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    data.pulls
        .iter()
        .find(|p| p.number == index)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("pull request"))
}

async fn edit_pull(
    State(db): State<Db>,
    Path((owner, repo, index)): Path<(String, String, i64)>,
    Json(input): Json<EditIssue>,
) -> ApiResult<(StatusCode, Json<ApiPullRequest>)> {
    let mut forge = db.write().await;
    let data = repo_data_mut(&mut forge, &owner, &repo)?;
    let pull = data
        .pulls
        .iter_mut()
        .find(|p| p.number == index)
        .ok_or_else(|| ApiError::not_found("pull request"))?;
    if let Some(state) = input.state {
        if pull.merged && state == "open" {
            return Err(ApiError::unprocessable("cannot reopen a merged pull request"));
        }
        pull.state = state;
    }
    if let Some(title) = input.title {
        pull.title = title;
    }
    if let Some(body) = input.body {
        pull.body = body;
    }
    Ok((StatusCode::CREATED, Json(pull.clone())))
}

async fn merge_pull(
    State(db): State<Db>,
    Path((owner, repo, index)): Path<(String, String, i64)>,
    Json(input): Json<MergePull>,
) -> ApiResult<StatusCode> {
    if !matches!(input.style.as_str(), "merge" | "rebase" | "rebase-merge" | "squash") {
        return Err(ApiError::unprocessable(format!("unknown merge style {}", input.style)));
    }
    let mut forge = db.write().await;
    let data = repo_data_mut(&mut forge, &owner, &repo)?;
    let pull = data
        .pulls
        .iter_mut()
        .find(|p| p.number == index)
        .ok_or_else(|| ApiError::not_found("pull request"))?;
    if pull.merged || pull.state != "open" {
        return Err(ApiError(
            StatusCode::METHOD_NOT_ALLOWED,
            "pull request is not mergeable".to_string(),
        ));
    }
    pull.merged = true;
    pull.state = "closed".to_string();
    info!(repo = %data.repo.full_name, index, "pull request merged");
    Ok(StatusCode::OK)
}

// --- hooks and statuses ---

async fn list_hooks(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
    Query(paging): Query<Paging>,
) -> ApiResult<Json<Vec<ApiHook>>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    Ok(Json(paging.apply(data.hooks.iter().cloned())))
}

async fn find_hook(
    State(db): State<Db>,
    Path((owner, repo, id)): Path<(String, String, i64)>,
) -> ApiResult<Json<ApiHook>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    data.hooks
        .iter()
        .find(|h| h.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("hook"))
}

async fn create_hook(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
    Json(input): Json<CreateHook>,
) -> ApiResult<(StatusCode, Json<ApiHook>)> {
    let url = input
        .config
        .get("url")
        .filter(|u| !u.is_empty())
        .cloned()
        .ok_or_else(|| ApiError::unprocessable("config.url is required"))?;
    let mut forge = db.write().await;
    let id = forge.next_id();
    let data = repo_data_mut(&mut forge, &owner, &repo)?;
    let hook = ApiHook {
        id,
        kind: input.kind,
        config: ApiHookConfig {
            url,
            content_type: input.config.get("content_type").cloned().unwrap_or_default(),
        },
        events: input.events,
        active: input.active,
        created_at: CREATED.to_string(),
    };
    data.hooks.push(hook.clone());
    Ok((StatusCode::CREATED, Json(hook)))
}

async fn delete_hook(
    State(db): State<Db>,
    Path((owner, repo, id)): Path<(String, String, i64)>,
) -> ApiResult<StatusCode> {
    let mut forge = db.write().await;
    let data = repo_data_mut(&mut forge, &owner, &repo)?;
    let before = data.hooks.len();
    data.hooks.retain(|h| h.id != id);
    if data.hooks.len() == before {
        return Err(ApiError::not_found("hook"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_statuses(
    State(db): State<Db>,
    Path((owner, repo, reference)): Path<(String, String, String)>,
    Query(paging): Query<Paging>,
) -> ApiResult<Json<Vec<ApiStatus>>> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    let sha = data.resolve(&reference);
    let statuses = data
        .statuses
        .iter()
        .filter(|(s, _)| *s == sha)
        .map(|(_, st)| st.clone());
    Ok(Json(paging.apply(statuses)))
}

async fn create_status(
    State(db): State<Db>,
    Path((owner, repo, reference)): Path<(String, String, String)>,
    Json(input): Json<CreateStatus>,
) -> ApiResult<(StatusCode, Json<ApiStatus>)> {
    if !matches!(
        input.state.as_str(),
        "pending" | "success" | "error" | "failure" | "warning"
    ) {
        return Err(ApiError::unprocessable(format!("invalid state {}", input.state)));
    }
    let mut forge = db.write().await;
    let id = forge.next_id();
    let data = repo_data_mut(&mut forge, &owner, &repo)?;
    let sha = data.resolve(&reference);
    let status = ApiStatus {
        id,
        status: input.state,
        target_url: input.target_url,
        description: input.description,
        context: input.context,
        created_at: CREATED.to_string(),
    };
    data.statuses.push((sha, status.clone()));
    Ok((StatusCode::CREATED, Json(status)))
}

// --- files ---

/// Splits `raw/{ref}/{path}` from `raw/{path}`: a leading segment naming a
/// branch, tag or commit is the ref.
fn split_ref<'a>(data: &RepoData, path: &'a str) -> (Option<&'a str>, &'a str) {
    match path.split_once('/') {
        Some((first, rest)) if data.has_ref(first) => (Some(first), rest),
        _ => (None, path),
    }
}

async fn raw_file(
    State(db): State<Db>,
    Path((owner, repo, path)): Path<(String, String, String)>,
) -> ApiResult<Response> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    let (_, file) = split_ref(data, &path);
    let bytes = data
        .files
        .get(file)
        .cloned()
        .ok_or_else(|| ApiError::not_found("file"))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from(bytes),
    )
        .into_response())
}

fn file_entry(path: &str, bytes: &[u8], with_content: bool) -> ApiContents {
    ApiContents {
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        sha: blob_sha(bytes),
        kind: "file".to_string(),
        size: bytes.len() as i64,
        encoding: with_content.then(|| "base64".to_string()),
        content: with_content.then(|| STANDARD.encode(bytes)),
    }
}

fn dir_entry(path: &str) -> ApiContents {
    ApiContents {
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        sha: blob_sha(path.as_bytes()),
        kind: "dir".to_string(),
        size: 0,
        encoding: None,
        content: None,
    }
}

/// A file answers with one object; a directory with its direct children.
async fn get_contents(
    State(db): State<Db>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    Query(query): Query<RefQuery>,
) -> ApiResult<Response> {
    let forge = db.read().await;
    let data = repo_data(&forge, &owner, &repo)?;
    if !query.reference.is_empty() && !data.has_ref(&query.reference) {
        return Err(ApiError::not_found("reference"));
    }
    let path = path.trim_end_matches('/');
    if let Some(bytes) = data.files.get(path) {
        return Ok(Json(file_entry(path, bytes, true)).into_response());
    }

    let prefix = format!("{path}/");
    let mut entries: Vec<ApiContents> = Vec::new();
    for (file, bytes) in data.files.range(prefix.clone()..) {
        let Some(rest) = file.strip_prefix(&prefix) else {
            break;
        };
        match rest.split_once('/') {
            None => entries.push(file_entry(file, bytes, false)),
            Some((dir, _)) => {
                let dir_path = format!("{prefix}{dir}");
                if !entries.iter().any(|e| e.path == dir_path) {
                    entries.push(dir_entry(&dir_path));
                }
            }
        }
    }
    if entries.is_empty() {
        return Err(ApiError::not_found("path"));
    }
    Ok(Json(entries).into_response())
}

fn decode_content(input: &FileOptions) -> ApiResult<Vec<u8>> {
    STANDARD
        .decode(&input.content)
        .map_err(|e| ApiError::unprocessable(format!("content is not base64: {e}")))
}

fn check_branch(data: &RepoData, branch: &str) -> ApiResult<()> {
    if branch.is_empty() || data.branches.iter().any(|b| b.name == branch) {
        Ok(())
    } else {
        Err(ApiError::not_found("branch"))
    }
}

async fn create_file(
    State(db): State<Db>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    Json(input): Json<FileOptions>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let bytes = decode_content(&input)?;
    let mut forge = db.write().await;
    let data = repo_data_mut(&mut forge, &owner, &repo)?;
    check_branch(data, &input.branch)?;
    if data.files.contains_key(&path) {
        return Err(ApiError::unprocessable("repository file already exists"));
    }
    let entry = file_entry(&path, &bytes, true);
    data.files.insert(path, bytes);
    debug!(
        message = %input.message,
        author = input.author.as_ref().map(|a| a.email.as_str()),
        "file created"
    );
    Ok((StatusCode::CREATED, Json(json!({ "content": entry }))))
}

async fn update_file(
    State(db): State<Db>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(input): Json<FileOptions>,
) -> ApiResult<Json<serde_json::Value>> {
    let bytes = decode_content(&input)?;
    let mut forge = db.write().await;
    let data = repo_data_mut(&mut forge, &owner, &repo)?;
    check_branch(data, &input.branch)?;
    let current = data
        .files
        .get(&path)
        .ok_or_else(|| ApiError::not_found("file"))?;
    if input.sha != blob_sha(current) {
        return Err(ApiError::unprocessable("sha does not match"));
    }
    let entry = file_entry(&path, &bytes, true);
    data.files.insert(path, bytes);
    debug!(
        message = %input.message,
        agent = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()),
        "file updated"
    );
    Ok(Json(json!({ "content": entry })))
}
