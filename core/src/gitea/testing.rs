//! In-memory transport for driver unit tests.

use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::client::Client;
use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::TransportError;
use crate::http::{Body, HttpRequest, HttpResponse, Transport};

struct Canned {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

/// Answers requests from a queue of canned responses and records what was sent.
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<Canned>>,
    requests: Mutex<Vec<HttpRequest>>,
    released: Arc<AtomicUsize>,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.respond_with_headers(status, Vec::new(), body);
    }

    pub(crate) fn respond_json(&self, status: u16, body: serde_json::Value) {
        self.respond_with_headers(
            status,
            vec![("Content-Type".to_string(), "application/json".to_string())],
            body.to_string(),
        );
    }

    pub(crate) fn respond_with_headers(
        &self,
        status: u16,
        headers: Vec<(String, String)>,
        body: impl Into<Vec<u8>>,
    ) {
        self.responses.lock().unwrap().push_back(Canned {
            status,
            headers,
            body: body.into(),
        });
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    /// Number of response bodies dropped so far.
    pub(crate) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl Transport for FakeTransport {
    fn send(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        ctx.check()?;
        self.requests.lock().unwrap().push(request);
        let canned = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::InvalidRequest("no canned response left".to_string()))?;
        Ok(HttpResponse {
            status: canned.status,
            headers: canned.headers,
            body: Body::new(TrackedBody {
                inner: Cursor::new(canned.body),
                released: Arc::clone(&self.released),
            }),
        })
    }
}

struct TrackedBody {
    inner: Cursor<Vec<u8>>,
    released: Arc<AtomicUsize>,
}

impl Read for TrackedBody {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// A Gitea client with every service enabled, backed by `fake`.
pub(crate) fn client(fake: &Arc<FakeTransport>) -> Client {
    super::with_transport(
        &ClientConfig::new("https://gitea.example.com/"),
        Arc::clone(fake) as Arc<dyn Transport>,
    )
    .unwrap()
}

pub(crate) fn ctx() -> Context {
    Context::background()
}
