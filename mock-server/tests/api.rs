use axum::http::{self, header, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::model::{ApiComment, ApiContents, ApiIssue, ApiPullRequest, ApiStatus, ApiUser};
use mock_server::{app, app_with_token};
use tower::ServiceExt;

const REPO: &str = "/api/v1/repos/octocat/hello-world";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- users ---

#[tokio::test]
async fn current_user_is_octocat() {
    let resp = app().oneshot(get("/api/v1/user")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let user: ApiUser = body_json(resp).await;
    assert_eq!(user.login, "octocat");
    assert_eq!(user.email, "octocat@example.com");
}

#[tokio::test]
async fn unknown_user_returns_404_with_message() {
    let resp = app().oneshot(get("/api/v1/users/nobody")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["message"], "user not found");
}

#[tokio::test]
async fn moved_answers_301() {
    let resp = app().oneshot(get("/api/v1/moved")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.headers()[header::LOCATION], "/api/v1/user");
}

// --- auth ---

#[tokio::test]
async fn token_is_enforced_when_configured() {
    let app = app_with_token("s3cret");

    let resp = app.clone().oneshot(get("/api/v1/user")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let authed = Request::builder()
        .uri("/api/v1/user")
        .header(header::AUTHORIZATION, "token s3cret")
        .body(String::new())
        .unwrap();
    let resp = app.oneshot(authed).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- issues ---

#[tokio::test]
async fn issue_list_filters_type_and_state() {
    let resp = app()
        .oneshot(get(&format!("{REPO}/issues?type=issues&state=all")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let issues: Vec<ApiIssue> = body_json(resp).await;
    assert_eq!(issues.len(), 1);
    assert!(issues[0].pull_request.is_none());

    let resp = app().oneshot(get(&format!("{REPO}/issues?state=all"))).await.unwrap();
    let everything: Vec<ApiIssue> = body_json(resp).await;
    assert_eq!(everything.len(), 2);
    assert_eq!(everything[0].number, 2, "newest first");
}

#[tokio::test]
async fn create_issue_without_title_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", &format!("{REPO}/issues"), r#"{"title":"  "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn non_numeric_index_returns_400() {
    let resp = app().oneshot(get(&format!("{REPO}/issues/abc"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn issue_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &format!("{REPO}/issues"),
            r#"{"title":"Crash on start","body":"stack trace"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: ApiIssue = body_json(resp).await;
    assert_eq!(created.number, 3);
    assert_eq!(created.state, "open");

    // comment
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &format!("{REPO}/issues/3/comments"),
            r#"{"body":"on it"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comment: ApiComment = body_json(resp).await;

    // comment is listed under the issue only
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("{REPO}/issues/3/comments")))
        .await
        .unwrap();
    let comments: Vec<ApiComment> = body_json(resp).await;
    assert_eq!(comments, vec![comment.clone()]);

    // delete the comment
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri(format!("{REPO}/issues/comments/{}", comment.id))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // close
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PATCH",
            &format!("{REPO}/issues/3"),
            r#"{"state":"closed"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let closed: ApiIssue = body_json(resp).await;
    assert_eq!(closed.state, "closed");
    assert_eq!(closed.title, "Crash on start");

    // open listing no longer has it
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("{REPO}/issues?type=issues")))
        .await
        .unwrap();
    let open: Vec<ApiIssue> = body_json(resp).await;
    assert!(open.iter().all(|i| i.number != 3));
}

// --- pull requests ---

#[tokio::test]
async fn merge_closes_and_second_merge_is_refused() {
    use tower::Service;

    let mut app = app().into_service();
    let merge = || json_request("POST", &format!("{REPO}/pulls/2/merge"), r#"{"Do":"merge"}"#);

    let resp = ServiceExt::ready(&mut app).await.unwrap().call(merge()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("{REPO}/pulls/2")))
        .await
        .unwrap();
    let pull: ApiPullRequest = body_json(resp).await;
    assert!(pull.merged);
    assert_eq!(pull.state, "closed");

    let resp = ServiceExt::ready(&mut app).await.unwrap().call(merge()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unknown_merge_style_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", &format!("{REPO}/pulls/2/merge"), r#"{"Do":"octopus"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- statuses ---

#[tokio::test]
async fn statuses_resolve_branch_names() {
    let resp = app().oneshot(get(&format!("{REPO}/statuses/main"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let statuses: Vec<ApiStatus> = body_json(resp).await;
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].context, "ci/build");
}

#[tokio::test]
async fn invalid_status_state_returns_422() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            &format!("{REPO}/statuses/main"),
            r#"{"state":"exploded"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- files ---

#[tokio::test]
async fn raw_serves_bytes_with_and_without_ref() {
    let resp = app().oneshot(get(&format!("{REPO}/raw/main/README.md"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    assert!(bytes.starts_with(b"# hello-world"));

    let resp = app().oneshot(get(&format!("{REPO}/raw/docs/guide.md"))).await.unwrap();
    assert_eq!(body_bytes(resp).await.as_ref(), b"Read the guide.\n");
}

#[tokio::test]
async fn directory_listing_shows_direct_children() {
    let resp = app().oneshot(get(&format!("{REPO}/contents/docs?ref=main"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let entries: Vec<ApiContents> = body_json(resp).await;
    let kinds: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e.path.as_str(), e.kind.as_str()))
        .collect();
    assert_eq!(kinds, [("docs/guide.md", "file"), ("docs/img", "dir")]);
}

#[tokio::test]
async fn update_requires_current_sha() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("{REPO}/contents/README.md")))
        .await
        .unwrap();
    let current: ApiContents = body_json(resp).await;

    let stale = r#"{"content":"eA==","message":"edit","sha":"0000"}"#;
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", &format!("{REPO}/contents/README.md"), stale))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let fresh = format!(r#"{{"content":"eA==","message":"edit","sha":"{}"}}"#, current.sha);
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", &format!("{REPO}/contents/README.md"), &fresh))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("{REPO}/raw/README.md")))
        .await
        .unwrap();
    assert_eq!(body_bytes(resp).await.as_ref(), b"x");
}
