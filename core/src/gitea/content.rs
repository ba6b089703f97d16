//! Repository file contents.
//!
//! # Design
//! `find` reads the bytes through the raw endpoint and takes no metadata from
//! Gitea, so the returned `Content` carries path and data only. Writes send
//! base64 content through the contents API. Deletion is not offered.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::{append_list_options, with_query, Output, Wrapper, NO_INPUT};
use crate::context::Context;
use crate::error::ScmError;
use crate::http::HttpMethod;
use crate::services::{ContentService, ScmResult};
use crate::types::{Content, ContentParams, FileEntry, ListOptions, Response};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GiteaContents {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    size: i64,
}

/// The contents endpoint answers with an object for a file and an array for
/// a directory.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GiteaListing {
    Many(Vec<GiteaContents>),
    One(GiteaContents),
}

impl Default for GiteaListing {
    fn default() -> Self {
        GiteaListing::Many(Vec::new())
    }
}

#[derive(Debug, Serialize)]
struct GiteaIdentity<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct GiteaFileOptions<'a> {
    content: String,
    message: &'a str,
    #[serde(skip_serializing_if = "is_blank")]
    branch: &'a str,
    #[serde(skip_serializing_if = "is_blank")]
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<GiteaIdentity<'a>>,
}

fn is_blank(value: &&str) -> bool {
    value.is_empty()
}

impl<'a> GiteaFileOptions<'a> {
    fn new(params: &'a ContentParams) -> Self {
        let author = (!params.signature.name.is_empty()).then(|| GiteaIdentity {
            name: &params.signature.name,
            email: &params.signature.email,
        });
        Self {
            content: STANDARD.encode(&params.data),
            message: &params.message,
            branch: &params.branch,
            sha: &params.sha,
            author,
        }
    }
}

fn convert_entry(src: GiteaContents) -> FileEntry {
    FileEntry {
        name: src.name,
        path: src.path,
        kind: src.kind,
        sha: src.sha,
        size: src.size,
    }
}

pub struct GiteaContentService {
    client: Arc<Wrapper>,
}

impl GiteaContentService {
    pub(crate) fn new(client: Arc<Wrapper>) -> Self {
        Self { client }
    }
}

impl ContentService for GiteaContentService {
    fn find(&self, ctx: &Context, repo: &str, path: &str, reference: &str) -> ScmResult<Content> {
        let endpoint = if reference.is_empty() {
            format!("api/v1/repos/{repo}/raw/{path}")
        } else {
            format!("api/v1/repos/{repo}/raw/{reference}/{path}")
        };
        let mut data = Vec::new();
        let res = self.client.do_request(
            ctx,
            HttpMethod::Get,
            &endpoint,
            NO_INPUT,
            Output::CopyRawInto(&mut data),
        )?;
        let content = Content {
            path: path.to_string(),
            data,
            sha: String::new(),
        };
        Ok((content, res))
    }

    fn list(
        &self,
        ctx: &Context,
        repo: &str,
        path: &str,
        reference: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<FileEntry>> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if !reference.is_empty() {
            query.append_pair("ref", reference);
        }
        append_list_options(&mut query, opts);
        let endpoint = with_query(format!("api/v1/repos/{repo}/contents/{path}"), &query.finish());
        let (out, res) = self.client.get::<GiteaListing>(ctx, &endpoint)?;
        let entries = match out {
            GiteaListing::Many(items) => items.into_iter().map(convert_entry).collect(),
            GiteaListing::One(item) => vec![convert_entry(item)],
        };
        Ok((entries, res))
    }

    fn create(
        &self,
        ctx: &Context,
        repo: &str,
        path: &str,
        params: &ContentParams,
    ) -> Result<Response, ScmError> {
        let endpoint = format!("api/v1/repos/{repo}/contents/{path}");
        let body = GiteaFileOptions::new(params);
        self.client
            .do_request(ctx, HttpMethod::Post, &endpoint, Some(&body), Output::None)
    }

    fn update(
        &self,
        ctx: &Context,
        repo: &str,
        path: &str,
        params: &ContentParams,
    ) -> Result<Response, ScmError> {
        let endpoint = format!("api/v1/repos/{repo}/contents/{path}");
        let body = GiteaFileOptions::new(params);
        self.client
            .do_request(ctx, HttpMethod::Put, &endpoint, Some(&body), Output::None)
    }

    fn delete(
        &self,
        _ctx: &Context,
        _repo: &str,
        _path: &str,
        _params: &ContentParams,
    ) -> Result<Response, ScmError> {
        Err(ScmError::NotSupported)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::testing::{client, ctx, FakeTransport};
    use super::*;
    use crate::types::Signature;

    #[test]
    fn find_copies_raw_bytes() {
        let fake = FakeTransport::new();
        fake.respond(200, "# Hello\n\nnot { json");
        let (content, res) = client(&fake)
            .contents()
            .unwrap()
            .find(&ctx(), "octocat/hello-world", "README.md", "main")
            .unwrap();

        assert_eq!(fake.last_request().path, "api/v1/repos/octocat/hello-world/raw/main/README.md");
        assert_eq!(res.status, 200);
        assert_eq!(content.path, "README.md");
        assert_eq!(content.data, b"# Hello\n\nnot { json");
        assert_eq!(fake.released(), 1);
    }

    #[test]
    fn find_without_reference_uses_default_branch() {
        let fake = FakeTransport::new();
        fake.respond(200, "x");
        client(&fake)
            .contents()
            .unwrap()
            .find(&ctx(), "octocat/hello-world", "docs/a.md", "")
            .unwrap();
        assert_eq!(fake.last_request().path, "api/v1/repos/octocat/hello-world/raw/docs/a.md");
    }

    #[test]
    fn find_missing_file_leaves_no_content() {
        let fake = FakeTransport::new();
        fake.respond(404, "Not Found");
        let err = client(&fake)
            .contents()
            .unwrap()
            .find(&ctx(), "octocat/hello-world", "nope.txt", "main")
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn list_accepts_directory_and_file_answers() {
        let fake = FakeTransport::new();
        fake.respond_json(
            200,
            json!([
                {"name": "a.md", "path": "docs/a.md", "sha": "1", "type": "file", "size": 10},
                {"name": "img", "path": "docs/img", "sha": "2", "type": "dir", "size": 0}
            ]),
        );
        fake.respond_json(
            200,
            json!({"name": "a.md", "path": "docs/a.md", "sha": "1", "type": "file", "size": 10}),
        );
        let c = client(&fake);
        let contents = c.contents().unwrap();

        let (dir, _) = contents
            .list(&ctx(), "octocat/hello-world", "docs", "main", ListOptions::default())
            .unwrap();
        assert_eq!(fake.last_request().path, "api/v1/repos/octocat/hello-world/contents/docs?ref=main");
        assert_eq!(dir.len(), 2);
        assert_eq!(dir[1].kind, "dir");

        let (file, _) = contents
            .list(&ctx(), "octocat/hello-world", "docs/a.md", "", ListOptions::default())
            .unwrap();
        assert_eq!(file.len(), 1);
        assert_eq!(file[0].path, "docs/a.md");
    }

    #[test]
    fn create_sends_base64_content() {
        let fake = FakeTransport::new();
        fake.respond_json(201, json!({"content": {"path": "new.txt"}}));
        let params = ContentParams {
            branch: "main".to_string(),
            message: "add new.txt".to_string(),
            data: b"hello".to_vec(),
            signature: Signature {
                name: "The Octocat".to_string(),
                email: "octocat@example.com".to_string(),
                ..Signature::default()
            },
            ..ContentParams::default()
        };
        let res = client(&fake)
            .contents()
            .unwrap()
            .create(&ctx(), "octocat/hello-world", "new.txt", &params)
            .unwrap();

        let req = fake.last_request();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "api/v1/repos/octocat/hello-world/contents/new.txt");
        let sent: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["content"], "aGVsbG8=");
        assert_eq!(sent["message"], "add new.txt");
        assert_eq!(sent["branch"], "main");
        assert_eq!(sent["author"]["email"], "octocat@example.com");
        assert!(sent.get("sha").is_none());
        assert_eq!(res.status, 201);
    }

    #[test]
    fn update_sends_blob_sha() {
        let fake = FakeTransport::new();
        fake.respond_json(200, json!({}));
        let params = ContentParams {
            message: "edit".to_string(),
            data: b"v2".to_vec(),
            sha: "3b18e512dba79e4c".to_string(),
            ..ContentParams::default()
        };
        client(&fake)
            .contents()
            .unwrap()
            .update(&ctx(), "octocat/hello-world", "new.txt", &params)
            .unwrap();
        let req = fake.last_request();
        assert_eq!(req.method, HttpMethod::Put);
        let sent: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["sha"], "3b18e512dba79e4c");
        assert!(sent.get("author").is_none());
    }

    #[test]
    fn delete_is_not_supported() {
        let fake = FakeTransport::new();
        let err = client(&fake)
            .contents()
            .unwrap()
            .delete(&ctx(), "octocat/hello-world", "new.txt", &ContentParams::default())
            .unwrap_err();
        assert!(matches!(err, ScmError::NotSupported));
    }
}
