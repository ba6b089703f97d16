use crate::context::Context;
use crate::error::ScmError;
use crate::services::{ReviewService, ScmResult};
use crate::types::{ListOptions, Response, Review, ReviewInput};

/// Gitea exposes no review comment API, so every operation is unsupported
/// and nothing is sent.
#[derive(Debug, Default)]
pub struct GiteaReviewService;

impl GiteaReviewService {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl ReviewService for GiteaReviewService {
    fn find(&self, _ctx: &Context, _repo: &str, _number: i64, _id: i64) -> ScmResult<Review> {
        Err(ScmError::NotSupported)
    }

    fn list(
        &self,
        _ctx: &Context,
        _repo: &str,
        _number: i64,
        _opts: ListOptions,
    ) -> ScmResult<Vec<Review>> {
        Err(ScmError::NotSupported)
    }

    fn create(
        &self,
        _ctx: &Context,
        _repo: &str,
        _number: i64,
        _input: &ReviewInput,
    ) -> ScmResult<Review> {
        Err(ScmError::NotSupported)
    }

    fn delete(&self, _ctx: &Context, _repo: &str, _number: i64, _id: i64) -> Result<Response, ScmError> {
        Err(ScmError::NotSupported)
    }
}
